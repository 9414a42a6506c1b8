//! API request and response models (DTOs).
//!
//! The analyze and download routes share one envelope convention: domain
//! failures come back as HTTP 200 with `success: false` and a message, so
//! clients branch on the `success` flag rather than the status code.

use serde::{Deserialize, Serialize};

use crate::analysis::QualityCatalog;
use crate::jobs::ArtifactRef;

// ============================================================================
// Analyze
// ============================================================================

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    /// Media URL to probe. Optional at the serde level so a missing field
    /// reaches the handler and produces the envelope error instead of a
    /// deserialization rejection.
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful response body for `POST /analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub title: String,
    /// Duration in seconds; null when the probe does not know it.
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    /// Heights on offer, highest first.
    pub video_qualities: Vec<u32>,
    pub has_audio: bool,
    pub platform: String,
}

impl From<QualityCatalog> for AnalyzeResponse {
    fn from(catalog: QualityCatalog) -> Self {
        Self {
            success: true,
            title: catalog.title,
            duration: catalog.duration,
            thumbnail: catalog.thumbnail,
            video_qualities: catalog.video_qualities,
            has_audio: catalog.has_audio,
            platform: catalog.platform,
        }
    }
}

// ============================================================================
// Download
// ============================================================================

/// Request body for `POST /download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// Media type: "video", "audio", or anything else for the generic
    /// best-effort branch.
    #[serde(rename = "type", default = "default_media_type")]
    pub media_type: String,
    /// Quality ceiling: "best" or a pixel height like "720".
    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_media_type() -> String {
    "video".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

/// Successful response body for `POST /download`.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub filename: String,
    pub download_url: String,
}

impl From<ArtifactRef> for DownloadResponse {
    fn from(artifact: ArtifactRef) -> Self {
        Self {
            success: true,
            filename: artifact.filename,
            download_url: artifact.download_url,
        }
    }
}

// ============================================================================
// Error envelope
// ============================================================================

/// Error envelope returned with HTTP 200 for domain failures on the
/// analyze and download routes.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    /// Create a new error envelope.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Response for the health check endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}
