//! REST API server module.
//!
//! Provides HTTP endpoints for analyzing media URLs, submitting downloads,
//! and serving finished artifacts.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
