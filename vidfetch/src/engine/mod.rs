//! Extraction engine abstraction.
//!
//! This module defines the `ExtractionEngine` trait and related types for
//! abstracting the external media extraction backend (yt-dlp).

mod traits;
mod ytdlp;

pub use traits::{
    AudioExtraction, EngineFailure, EngineResult, ExtractionEngine, FailureKind, FetchRequest,
    FormatDescriptor, MediaProbe,
};
pub use ytdlp::{YtDlpConfig, YtDlpEngine};
