//! HTTP media download API backed by an external extraction engine.
//!
//! The crate exposes a small REST surface for analyzing a media URL,
//! downloading it through yt-dlp, and serving the resulting artifacts,
//! with an hourly sweep that expires old files.

pub mod analysis;
pub mod api;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
