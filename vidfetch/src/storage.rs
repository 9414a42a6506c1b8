//! Storage area management for downloaded artifacts.
//!
//! Artifacts are written into a single flat directory and reclaimed by a
//! background sweep once they outlive the retention window. Expiry is keyed
//! on filesystem modification time, so a restart never loses track of files
//! written by a previous run.

use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::utils::filename::is_safe_artifact_name;

/// Configuration for the artifact storage area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory artifacts are written to. Created at startup if missing.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Seconds an artifact is kept after its last modification.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Interval between sweep cycles in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_retention_secs() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval_secs() -> u64 {
    3600 // 1 hour
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl StorageConfig {
    /// Create a new StorageConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Reads `DOWNLOADS_DIR` for the storage root.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("DOWNLOADS_DIR")
            && !dir.trim().is_empty()
        {
            config.root_dir = PathBuf::from(dir.trim());
        }

        config
    }

    /// Set the storage root directory.
    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = dir.into();
        self
    }

    /// Set the retention window in seconds.
    pub fn with_retention_secs(mut self, secs: u64) -> Self {
        self.retention_secs = secs;
        self
    }

    /// Set the sweep interval in seconds.
    pub fn with_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }
}

/// Manages the artifact directory: creation, lookup, and expiry sweeps.
pub struct StorageArea {
    config: StorageConfig,
}

impl StorageArea {
    /// Create a new StorageArea.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Get the storage root directory.
    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    /// Get the current configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Create the storage directory if it does not exist.
    ///
    /// Idempotent. A failure here means no download can ever succeed, so
    /// callers should treat it as fatal at startup.
    pub fn ensure_ready(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.root_dir)?;
        Ok(())
    }

    /// Find the first artifact whose file name starts with `prefix`.
    pub async fn resolve_by_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let mut entries = tokio::fs::read_dir(&self.config.root_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(prefix) {
                return Ok(Some(name.to_string()));
            }
        }

        Ok(None)
    }

    /// Resolve `filename` to a path inside the storage area.
    ///
    /// Returns `None` when the name could reference anything outside the
    /// storage directory. Existence is not checked here.
    pub fn artifact_path(&self, filename: &str) -> Option<PathBuf> {
        if !is_safe_artifact_name(filename) {
            return None;
        }
        Some(self.config.root_dir.join(filename))
    }

    /// Run a single sweep, deleting every regular file strictly older than
    /// the retention window as of `now`. Returns the number of files deleted.
    ///
    /// Per-file metadata or delete errors are logged and skipped so one bad
    /// entry never stalls reclamation of the rest.
    pub async fn sweep_expired(&self, now: SystemTime) -> Result<u64> {
        let retention = Duration::from_secs(self.config.retention_secs);
        let mut deleted: u64 = 0;

        let mut entries = tokio::fs::read_dir(&self.config.root_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: failed to read metadata: {}", path.display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("Skipping {}: no modification time: {}", path.display(), e);
                    continue;
                }
            };

            // Files stamped in the future age as zero.
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= retention {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Deleted expired artifact: {}", path.display());
                    deleted += 1;
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", path.display(), e);
                }
            }
        }

        if deleted > 0 {
            info!(
                "Swept {} expired artifacts (retention: {}s)",
                deleted, self.config.retention_secs
            );
        }

        Ok(deleted)
    }

    /// Start the background sweep task.
    ///
    /// The first sweep runs immediately, then one per interval until the
    /// token is cancelled. Sweep errors are logged and do not stop the loop.
    pub fn start_background_sweep(&self, cancellation_token: CancellationToken) {
        let config = self.config.clone();

        tokio::spawn(async move {
            let area = StorageArea {
                config: config.clone(),
            };

            let mut sweep_interval = interval(Duration::from_secs(config.sweep_interval_secs));

            info!(
                "Storage sweep started (retention: {}s, interval: {}s)",
                config.retention_secs, config.sweep_interval_secs
            );

            loop {
                tokio::select! {
                    _ = cancellation_token.cancelled() => {
                        info!("Storage sweep shutting down");
                        break;
                    }
                    _ = sweep_interval.tick() => {
                        match area.sweep_expired(SystemTime::now()).await {
                            Ok(deleted) => {
                                if deleted > 0 {
                                    debug!("Sweep cycle completed: {} artifacts deleted", deleted);
                                }
                            }
                            Err(e) => {
                                error!("Sweep cycle failed: {}", e);
                            }
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("downloads"));
        assert_eq!(config.retention_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 3600);
    }

    #[test]
    fn test_storage_config_builder() {
        let config = StorageConfig::new()
            .with_root_dir("/tmp/artifacts")
            .with_retention_secs(600)
            .with_sweep_interval_secs(60);

        assert_eq!(config.root_dir, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.retention_secs, 600);
        assert_eq!(config.sweep_interval_secs, 60);
    }

    #[test]
    fn test_ensure_ready_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("downloads");
        let area = StorageArea::new(StorageConfig::new().with_root_dir(&root));

        area.ensure_ready().unwrap();
        assert!(root.is_dir());
        area.ensure_ready().unwrap();
    }

    #[tokio::test]
    async fn test_resolve_by_prefix_finds_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a1b2c3d4_My_Video.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("ffffffff_Other.mp4"), b"x").unwrap();

        let area = StorageArea::new(StorageConfig::new().with_root_dir(dir.path()));

        let found = area.resolve_by_prefix("a1b2c3d4").await.unwrap();
        assert_eq!(found, Some("a1b2c3d4_My_Video.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_by_prefix_no_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ffffffff_Other.mp4"), b"x").unwrap();

        let area = StorageArea::new(StorageConfig::new().with_root_dir(dir.path()));

        assert_eq!(area.resolve_by_prefix("a1b2c3d4").await.unwrap(), None);
    }

    #[test]
    fn test_artifact_path_rejects_unsafe_names() {
        let area = StorageArea::new(StorageConfig::new().with_root_dir("/srv/downloads"));

        assert_eq!(
            area.artifact_path("a1b2c3d4_clip.mp4"),
            Some(PathBuf::from("/srv/downloads/a1b2c3d4_clip.mp4"))
        );
        assert_eq!(area.artifact_path("../etc/passwd"), None);
        assert_eq!(area.artifact_path(".."), None);
        assert_eq!(area.artifact_path(""), None);
    }

    #[tokio::test]
    async fn test_sweep_deletes_files_past_retention() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a1b2c3d4_clip.mp4");
        std::fs::write(&file, b"data").unwrap();
        let modified = std::fs::metadata(&file).unwrap().modified().unwrap();

        let area = StorageArea::new(
            StorageConfig::new()
                .with_root_dir(dir.path())
                .with_retention_secs(3600),
        );

        let deleted = area
            .sweep_expired(modified + Duration::from_secs(3601))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_sweep_retains_files_within_retention() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a1b2c3d4_clip.mp4");
        std::fs::write(&file, b"data").unwrap();
        let modified = std::fs::metadata(&file).unwrap().modified().unwrap();

        let area = StorageArea::new(
            StorageConfig::new()
                .with_root_dir(dir.path())
                .with_retention_secs(3600),
        );

        let deleted = area
            .sweep_expired(modified + Duration::from_secs(3599))
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_sweep_retains_file_exactly_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a1b2c3d4_clip.mp4");
        std::fs::write(&file, b"data").unwrap();
        let modified = std::fs::metadata(&file).unwrap().modified().unwrap();

        let area = StorageArea::new(
            StorageConfig::new()
                .with_root_dir(dir.path())
                .with_retention_secs(3600),
        );

        let deleted = area
            .sweep_expired(modified + Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_sweep_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let subdir = dir.path().join("keep_me");
        std::fs::create_dir(&subdir).unwrap();
        let modified = std::fs::metadata(&subdir).unwrap().modified().unwrap();

        let area = StorageArea::new(
            StorageConfig::new()
                .with_root_dir(dir.path())
                .with_retention_secs(3600),
        );

        let deleted = area
            .sweep_expired(modified + Duration::from_secs(7200))
            .await
            .unwrap();

        assert_eq!(deleted, 0);
        assert!(subdir.is_dir());
    }
}
