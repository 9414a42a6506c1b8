//! Application-wide error types.
//!
//! The `#[error]` strings double as the user-facing messages surfaced in the
//! `{"success": false, "error": ...}` response envelope, so route handlers can
//! return `err.to_string()` without a separate mapping table.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A POST body arrived without a usable `url` field.
    #[error("URL is required")]
    MissingUrl,

    /// Metadata probing failed; carries the engine's message.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// The engine does not recognize the URL or has no extractor for it.
    #[error("This platform is not supported or the URL is invalid")]
    UnsupportedUrl,

    /// The media exists but cannot be fetched (private, removed, region
    /// locked).
    #[error("Video is unavailable, private, or restricted")]
    MediaUnavailable,

    /// The requested format selector matched nothing.
    #[error("Requested quality not available. Try a different quality.")]
    QualityUnavailable,

    /// Any other engine failure; carries the engine's message.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// The engine reported success but no artifact landed in the storage
    /// area.
    #[error("File not found after download")]
    ArtifactMissing,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
