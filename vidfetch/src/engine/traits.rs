//! Extraction engine trait and related types.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineFailure>;

/// Broad classification of an engine failure.
///
/// The engine is an external process, so classification is derived from its
/// output once, at the subprocess boundary. Everything above matches on this
/// enum instead of raw message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The engine has no extractor for the URL, or the URL is invalid.
    UnsupportedUrl,
    /// The media exists but cannot be fetched (private, removed, restricted).
    Unavailable,
    /// The requested format selector matched nothing.
    FormatUnavailable,
    /// Any other failure.
    Other,
}

/// A failure reported by the extraction engine.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineFailure {
    /// Structured failure classification.
    pub kind: FailureKind,
    /// The engine's own message, suitable for surfacing to the client.
    pub message: String,
}

impl EngineFailure {
    /// Create a new failure with an explicit kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an unclassified failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }
}

/// Metadata document produced by probing a URL.
///
/// Mirrors the fields of the engine's JSON dump that the analysis layer
/// consumes; everything else in the dump is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaProbe {
    #[serde(default)]
    pub title: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Name of the extractor that matched the URL.
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

/// One entry of a probe's format list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatDescriptor {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    /// Video height in pixels, if the format carries video.
    #[serde(default)]
    pub height: Option<u32>,
    /// Video codec name; the literal `"none"` marks an audio-only format.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Audio codec name; the literal `"none"` marks a video-only format.
    #[serde(default)]
    pub acodec: Option<String>,
    /// Audio bitrate in kbps.
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

/// Audio extraction applied by the engine after download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    /// Target audio format (e.g. "mp3").
    pub format: String,
    /// Target quality as understood by the engine (e.g. "192K").
    pub quality: String,
}

impl Default for AudioExtraction {
    fn default() -> Self {
        Self {
            format: "mp3".to_string(),
            quality: "192K".to_string(),
        }
    }
}

/// A single fetch invocation: one URL resolved into one artifact.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Media URL to fetch.
    pub url: String,
    /// Format selector expression passed to the engine.
    pub format_selector: String,
    /// Directory the artifact is written into.
    pub output_dir: PathBuf,
    /// Output filename template, in the engine's template syntax.
    pub output_template: String,
    /// Restrict artifact names to filesystem-safe ASCII.
    pub restrict_filenames: bool,
    /// Optional audio extraction post-processing.
    pub audio_extraction: Option<AudioExtraction>,
}

impl FetchRequest {
    /// Create a new fetch request with required fields.
    pub fn new(
        url: impl Into<String>,
        format_selector: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        output_template: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            format_selector: format_selector.into(),
            output_dir: output_dir.into(),
            output_template: output_template.into(),
            restrict_filenames: true,
            audio_extraction: None,
        }
    }

    /// Set whether artifact names are restricted to safe ASCII.
    pub fn with_restrict_filenames(mut self, restrict: bool) -> Self {
        self.restrict_filenames = restrict;
        self
    }

    /// Enable audio extraction post-processing.
    pub fn with_audio_extraction(mut self, extraction: AudioExtraction) -> Self {
        self.audio_extraction = Some(extraction);
        self
    }
}

/// Trait for extraction engines.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Probe a URL for metadata without downloading anything.
    async fn probe(&self, url: &str) -> EngineResult<MediaProbe>;

    /// Fetch a URL into `request.output_dir`.
    ///
    /// Success means the engine exited cleanly; the caller locates the
    /// artifact afterwards through its filename prefix.
    async fn fetch(&self, request: &FetchRequest) -> EngineResult<()>;

    /// Check if the engine is available (binary exists and responds).
    fn is_available(&self) -> bool;

    /// Get the engine version string.
    fn version(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_builder() {
        let request = FetchRequest::new(
            "https://example.com/watch?v=abc",
            "bestaudio/best",
            "/tmp/downloads",
            "a1b2c3d4_%(title)s.%(ext)s",
        )
        .with_audio_extraction(AudioExtraction::default());

        assert_eq!(request.url, "https://example.com/watch?v=abc");
        assert_eq!(request.format_selector, "bestaudio/best");
        assert_eq!(request.output_dir, PathBuf::from("/tmp/downloads"));
        assert_eq!(request.output_template, "a1b2c3d4_%(title)s.%(ext)s");
        assert!(request.restrict_filenames);
        assert_eq!(
            request.audio_extraction,
            Some(AudioExtraction {
                format: "mp3".to_string(),
                quality: "192K".to_string(),
            })
        );
    }

    #[test]
    fn test_engine_failure_display_is_message_only() {
        let failure = EngineFailure::new(FailureKind::Unavailable, "Private video");
        assert_eq!(failure.to_string(), "Private video");
    }

    #[test]
    fn test_media_probe_parses_partial_document() {
        let json = r#"{
            "title": "Some Clip",
            "duration": 212.5,
            "extractor": "youtube",
            "formats": [
                {"format_id": "18", "ext": "mp4", "height": 360, "vcodec": "avc1", "acodec": "mp4a"},
                {"format_id": "140", "ext": "m4a", "height": null, "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5}
            ]
        }"#;

        let probe: MediaProbe = serde_json::from_str(json).unwrap();
        assert_eq!(probe.title.as_deref(), Some("Some Clip"));
        assert_eq!(probe.duration, Some(212.5));
        assert_eq!(probe.thumbnail, None);
        assert_eq!(probe.extractor.as_deref(), Some("youtube"));
        assert_eq!(probe.formats.len(), 2);
        assert_eq!(probe.formats[0].height, Some(360));
        assert_eq!(probe.formats[1].height, None);
        assert_eq!(probe.formats[1].vcodec.as_deref(), Some("none"));
    }

    #[test]
    fn test_media_probe_tolerates_missing_fields() {
        let probe: MediaProbe = serde_json::from_str("{}").unwrap();
        assert_eq!(probe.title, None);
        assert!(probe.formats.is_empty());
    }
}
