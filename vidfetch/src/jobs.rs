//! Download job coordination.
//!
//! A job is transient: a fresh id, a format selector decision, one engine
//! invocation, and an artifact lookup. Nothing is persisted and nothing
//! tracks a job after its response is sent; the id lives on only as the
//! artifact's filename prefix.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{self, QualityCatalog};
use crate::engine::{
    AudioExtraction, EngineFailure, ExtractionEngine, FailureKind, FetchRequest,
};
use crate::storage::StorageArea;
use crate::{Error, Result};

/// Kind of media a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Video with audio muxed in.
    Video,
    /// Audio only, extracted to mp3.
    Audio,
    /// Anything else: the generic best-effort branch.
    Best,
}

impl MediaType {
    /// Parse a client-supplied type string.
    ///
    /// Matching is exact; unknown values fall through to the generic branch
    /// rather than erroring.
    pub fn parse(s: &str) -> Self {
        match s {
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Best,
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::Video
    }
}

/// Requested quality ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityHint {
    /// Let the engine pick the best available.
    Best,
    /// Cap video height at this many pixels.
    Height(u32),
}

impl QualityHint {
    /// Parse a client-supplied quality string.
    ///
    /// Anything that is neither `"best"` nor an unsigned integer is rejected
    /// here, before the engine is ever invoked.
    pub fn parse(s: &str) -> Result<Self> {
        if s == "best" {
            return Ok(Self::Best);
        }
        s.parse::<u32>()
            .map(Self::Height)
            .map_err(|_| Error::QualityUnavailable)
    }
}

/// Deterministic format selector policy.
///
/// Pure: the same (media type, quality) pair always yields the same selector
/// expression. The quality ceiling only applies to the video branch; audio
/// and the generic branch ignore it.
pub fn format_selector(media_type: MediaType, quality: QualityHint) -> String {
    match media_type {
        MediaType::Audio => "bestaudio/best".to_string(),
        MediaType::Video => match quality {
            QualityHint::Best => {
                "best[ext=mp4]/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best".to_string()
            }
            QualityHint::Height(height) => format!(
                "best[height<={height}][ext=mp4]/bestvideo[height<={height}]+bestaudio/best[height<={height}]/best"
            ),
        },
        MediaType::Best => "best[ext=mp4]/best".to_string(),
    }
}

/// Generate a fresh job id: the first 8 hex digits of a UUIDv4.
pub fn generate_job_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// A successfully stored artifact, addressed by its public download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// File name inside the storage area.
    pub filename: String,
    /// Route the client fetches the artifact from.
    pub download_url: String,
}

/// Coordinates download jobs: selector policy, engine invocation, artifact
/// resolution.
pub struct JobCoordinator {
    engine: Arc<dyn ExtractionEngine>,
    storage: Arc<StorageArea>,
}

impl JobCoordinator {
    /// Create a new JobCoordinator.
    pub fn new(engine: Arc<dyn ExtractionEngine>, storage: Arc<StorageArea>) -> Self {
        Self { engine, storage }
    }

    /// Probe a URL and build its quality catalog. Never writes a file.
    pub async fn analyze(&self, url: &str) -> Result<QualityCatalog> {
        debug!("Analyzing {}", url);

        let probe = self
            .engine
            .probe(url)
            .await
            .map_err(|failure| Error::Analysis(failure.message))?;

        Ok(analysis::build_catalog(&probe))
    }

    /// Run one download job to completion and resolve its artifact.
    pub async fn submit_download(
        &self,
        url: &str,
        media_type: MediaType,
        quality: QualityHint,
    ) -> Result<ArtifactRef> {
        let job_id = generate_job_id();
        let selector = format_selector(media_type, quality);

        info!(
            "Job {}: fetching {} (type: {:?}, selector: {})",
            job_id, url, media_type, selector
        );

        let mut request = FetchRequest::new(
            url,
            selector,
            self.storage.root_dir(),
            format!("{job_id}_%(title)s.%(ext)s"),
        );
        if media_type == MediaType::Audio {
            request = request.with_audio_extraction(AudioExtraction::default());
        }

        self.engine
            .fetch(&request)
            .await
            .map_err(map_engine_failure)?;

        let filename = self
            .storage
            .resolve_by_prefix(&job_id)
            .await
            .map_err(|e| Error::DownloadFailed(e.to_string()))?
            .ok_or(Error::ArtifactMissing)?;

        info!("Job {}: stored artifact {}", job_id, filename);

        Ok(ArtifactRef {
            download_url: format!("/file/{filename}"),
            filename,
        })
    }
}

/// Map a structured engine failure onto the domain taxonomy.
fn map_engine_failure(failure: EngineFailure) -> Error {
    match failure.kind {
        FailureKind::UnsupportedUrl => Error::UnsupportedUrl,
        FailureKind::Unavailable => Error::MediaUnavailable,
        FailureKind::FormatUnavailable => Error::QualityUnavailable,
        FailureKind::Other => Error::DownloadFailed(failure.message),
    }
}
