//! yt-dlp extraction engine implementation.
//!
//! All site extraction, format resolution, and post-processing (merging,
//! audio extraction) is delegated to the yt-dlp binary. This wrapper builds
//! argument lists, monitors process output, and turns non-zero exits into
//! structured failures.

use async_trait::async_trait;
use std::env;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::traits::{
    EngineFailure, EngineResult, ExtractionEngine, FailureKind, FetchRequest, MediaProbe,
};
use crate::utils::process;

/// Classify a failure message into a structured kind.
///
/// Checks are ordered: "No video formats found" must classify as an
/// unsupported URL even though it also contains the substring "format".
fn classify_failure(message: &str) -> FailureKind {
    if message.contains("Unsupported URL") || message.contains("No video formats found") {
        return FailureKind::UnsupportedUrl;
    }
    if message.contains("Video unavailable") || message.contains("Private video") {
        return FailureKind::Unavailable;
    }
    if message.to_lowercase().contains("format") {
        return FailureKind::FormatUnavailable;
    }
    FailureKind::Other
}

/// Pull the most useful message out of captured stderr.
///
/// yt-dlp reports failures as `ERROR: ...` lines; the last one is the most
/// specific. Falls back to the whole trimmed stderr when no such line exists.
fn extract_error_message(stderr: &str) -> Option<String> {
    let last_error = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("ERROR:"));

    if let Some(line) = last_error {
        let message = line.trim_start_matches("ERROR:").trim();
        if !message.is_empty() {
            return Some(message.to_string());
        }
    }

    let trimmed = stderr.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build a classified failure from a failed invocation.
fn failure_from_output(stderr: &str, status: &ExitStatus) -> EngineFailure {
    let message = extract_error_message(stderr).unwrap_or_else(|| match status.code() {
        Some(code) => format!("yt-dlp exited with status {code}"),
        None => "yt-dlp was terminated by a signal".to_string(),
    });
    EngineFailure::new(classify_failure(&message), message)
}

/// Configuration for the yt-dlp engine.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary.
    pub binary_path: String,
    /// Path to the ffmpeg binary handed to yt-dlp for merging and audio
    /// extraction. When None, yt-dlp uses its own lookup.
    pub ffmpeg_path: Option<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            ffmpeg_path: None,
        }
    }
}

impl YtDlpConfig {
    /// Create a new YtDlpConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Reads `YTDLP_PATH` and `FFMPEG_PATH`.
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("YTDLP_PATH")
            && !path.trim().is_empty()
        {
            config.binary_path = path.trim().to_string();
        }

        if let Ok(path) = env::var("FFMPEG_PATH")
            && !path.trim().is_empty()
        {
            config.ffmpeg_path = Some(path.trim().to_string());
        }

        config
    }

    /// Set the yt-dlp binary path.
    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Set the ffmpeg binary path.
    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }
}

/// yt-dlp-based extraction engine.
pub struct YtDlpEngine {
    /// Engine configuration.
    config: YtDlpConfig,
    /// Cached version string.
    version: Option<String>,
}

impl YtDlpEngine {
    /// Create a new yt-dlp engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(YtDlpConfig::default())
    }

    /// Create with a custom configuration.
    pub fn with_config(config: YtDlpConfig) -> Self {
        let version = Self::detect_version(&config.binary_path);

        Self { config, version }
    }

    /// Detect yt-dlp version.
    fn detect_version(path: &str) -> Option<String> {
        let mut cmd = process::std_command(path);
        cmd.arg("--version");
        cmd.output().ok().and_then(|output| {
            String::from_utf8(output.stdout)
                .ok()
                .map(|s| s.trim().to_string())
        })
    }

    /// Detect the version of the ffmpeg binary yt-dlp will use.
    ///
    /// Audio extraction and stream merging need ffmpeg; startup warns when
    /// this returns None.
    pub fn ffmpeg_version(&self) -> Option<String> {
        let path = self.config.ffmpeg_path.as_deref().unwrap_or("ffmpeg");
        let mut cmd = process::std_command(path);
        cmd.arg("-version");
        cmd.output().ok().and_then(|output| {
            String::from_utf8(output.stdout)
                .ok()
                .and_then(|s| s.lines().next().map(|line| line.trim().to_string()))
        })
    }

    /// Build arguments for a metadata probe.
    fn build_probe_args(url: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]
    }

    /// Build arguments for a fetch.
    fn build_fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            request.format_selector.clone(),
            "-P".to_string(),
            request.output_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            request.output_template.clone(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--newline".to_string(),
        ];

        if request.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }

        if let Some(ref extraction) = request.audio_extraction {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                extraction.format.clone(),
                "--audio-quality".to_string(),
                extraction.quality.clone(),
            ]);
        }

        if let Some(ref ffmpeg) = self.config.ffmpeg_path {
            args.extend(["--ffmpeg-location".to_string(), ffmpeg.clone()]);
        }

        // URL is the only positional argument.
        args.push(request.url.clone());

        args
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    async fn probe(&self, url: &str) -> EngineResult<MediaProbe> {
        let args = Self::build_probe_args(url);
        debug!("Probing {} with args: {:?}", url, args);

        let mut command = process::tokio_command(&self.config.binary_path);
        command.args(&args);

        let output = command
            .output()
            .await
            .map_err(|e| EngineFailure::other(format!("Failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let failure = failure_from_output(&stderr, &output.status);
            warn!("Probe of {} failed: {}", url, failure.message);
            return Err(failure);
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineFailure::other(format!("Failed to parse probe output: {e}")))
    }

    async fn fetch(&self, request: &FetchRequest) -> EngineResult<()> {
        let args = self.build_fetch_args(request);
        info!("Starting yt-dlp fetch for {} with args: {:?}", request.url, args);

        let mut command = process::tokio_command(&self.config.binary_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| EngineFailure::other(format!("Failed to spawn yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineFailure::other("Failed to capture yt-dlp stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineFailure::other("Failed to capture yt-dlp stderr"))?;

        // Progress lines arrive on stdout one per line thanks to --newline.
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("yt-dlp: {}", line);
            }
        });

        // Collect stderr in full for classification after exit.
        let stderr_task = tokio::spawn(async move {
            let mut captured = String::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim_start().starts_with("ERROR:") {
                    warn!("yt-dlp: {}", line);
                }
                captured.push_str(&line);
                captured.push('\n');
            }
            captured
        });

        let status = child
            .wait()
            .await
            .map_err(|e| EngineFailure::other(format!("Failed to wait for yt-dlp: {e}")))?;

        let _ = stdout_task.await;
        let captured_stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let failure = failure_from_output(&captured_stderr, &status);
            warn!("Fetch of {} failed: {}", request.url, failure.message);
            return Err(failure);
        }

        info!("yt-dlp fetch for {} completed", request.url);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.version.is_some()
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_probe_args() {
        let args = YtDlpEngine::build_probe_args("https://example.com/v/1");
        assert_eq!(
            args,
            vec![
                "--dump-single-json".to_string(),
                "--no-warnings".to_string(),
                "--no-playlist".to_string(),
                "https://example.com/v/1".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_fetch_args_video() {
        let engine = YtDlpEngine::with_config(YtDlpConfig::new().with_binary_path("yt-dlp"));
        let request = FetchRequest::new(
            "https://example.com/v/1",
            "best[ext=mp4]/best",
            PathBuf::from("downloads"),
            "a1b2c3d4_%(title)s.%(ext)s",
        );

        let args = engine.build_fetch_args(&request);
        assert_eq!(
            args,
            vec![
                "-f".to_string(),
                "best[ext=mp4]/best".to_string(),
                "-P".to_string(),
                "downloads".to_string(),
                "-o".to_string(),
                "a1b2c3d4_%(title)s.%(ext)s".to_string(),
                "--no-playlist".to_string(),
                "--no-warnings".to_string(),
                "--newline".to_string(),
                "--restrict-filenames".to_string(),
                "https://example.com/v/1".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_fetch_args_audio_extraction() {
        use crate::engine::traits::AudioExtraction;

        let engine = YtDlpEngine::with_config(YtDlpConfig::new());
        let request = FetchRequest::new(
            "https://example.com/v/1",
            "bestaudio/best",
            PathBuf::from("downloads"),
            "a1b2c3d4_%(title)s.%(ext)s",
        )
        .with_audio_extraction(AudioExtraction::default());

        let args = engine.build_fetch_args(&request);
        let extraction_flags: Vec<&str> = args
            .iter()
            .skip_while(|a| *a != "-x")
            .take(5)
            .map(String::as_str)
            .collect();

        assert_eq!(
            extraction_flags,
            vec!["-x", "--audio-format", "mp3", "--audio-quality", "192K"]
        );
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v/1"));
    }

    #[test]
    fn test_build_fetch_args_ffmpeg_location() {
        let engine =
            YtDlpEngine::with_config(YtDlpConfig::new().with_ffmpeg_path("/opt/ffmpeg/bin/ffmpeg"));
        let request = FetchRequest::new(
            "https://example.com/v/1",
            "best",
            PathBuf::from("downloads"),
            "a1b2c3d4_%(title)s.%(ext)s",
        );

        let args = engine.build_fetch_args(&request);
        let location = args.iter().position(|a| a == "--ffmpeg-location");
        assert!(location.is_some());
        assert_eq!(
            args.get(location.unwrap() + 1).map(String::as_str),
            Some("/opt/ffmpeg/bin/ffmpeg")
        );
    }

    #[test]
    fn test_classify_failure_unsupported_url() {
        assert_eq!(
            classify_failure("Unsupported URL: https://example.com"),
            FailureKind::UnsupportedUrl
        );
    }

    #[test]
    fn test_classify_failure_no_formats_is_unsupported() {
        // Contains "format" but must classify as an unsupported URL.
        assert_eq!(
            classify_failure("No video formats found; please report this issue"),
            FailureKind::UnsupportedUrl
        );
    }

    #[test]
    fn test_classify_failure_unavailable() {
        assert_eq!(
            classify_failure("Video unavailable"),
            FailureKind::Unavailable
        );
        assert_eq!(
            classify_failure("Private video. Sign in if you've been granted access"),
            FailureKind::Unavailable
        );
    }

    #[test]
    fn test_classify_failure_format() {
        assert_eq!(
            classify_failure("Requested format is not available"),
            FailureKind::FormatUnavailable
        );
        assert_eq!(
            classify_failure("FORMAT not available"),
            FailureKind::FormatUnavailable
        );
    }

    #[test]
    fn test_classify_failure_other() {
        assert_eq!(
            classify_failure("Unable to download webpage: timed out"),
            FailureKind::Other
        );
    }

    #[test]
    fn test_extract_error_message_takes_last_error_line() {
        let stderr = "WARNING: unable to use cookies\nERROR: first problem\nERROR: Video unavailable\n";
        assert_eq!(
            extract_error_message(stderr),
            Some("Video unavailable".to_string())
        );
    }

    #[test]
    fn test_extract_error_message_falls_back_to_stderr() {
        assert_eq!(
            extract_error_message("  something broke  \n"),
            Some("something broke".to_string())
        );
        assert_eq!(extract_error_message("   \n"), None);
    }

    #[test]
    fn test_failure_from_output_uses_exit_status_when_silent() {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            let status = ExitStatus::from_raw(0x100); // exit code 1
            let failure = failure_from_output("", &status);
            assert_eq!(failure.kind, FailureKind::Other);
            assert_eq!(failure.message, "yt-dlp exited with status 1");
        }
    }
}
