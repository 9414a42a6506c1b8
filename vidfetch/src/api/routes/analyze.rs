//! Media analysis route.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{AnalyzeRequest, AnalyzeResponse, ErrorEnvelope};
use crate::api::server::AppState;
use crate::error::Error;

/// Create the analyze router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(analyze_url))
}

/// Probe a URL and report its title, quality options, and platform.
///
/// Domain failures come back inside the envelope with HTTP 200; the
/// `success` flag tells the client which shape it got. The URL check runs
/// before any service access so a bad request never reaches the engine.
async fn analyze_url(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Response> {
    let Some(url) = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        return Ok(Json(ErrorEnvelope::new(Error::MissingUrl.to_string())).into_response());
    };

    let coordinator = state
        .coordinator
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Job coordinator not available"))?;

    match coordinator.analyze(url).await {
        Ok(catalog) => Ok(Json(AnalyzeResponse::from(catalog)).into_response()),
        Err(e) => Ok(Json(ErrorEnvelope::new(e.to_string())).into_response()),
    }
}
