//! Download submission route.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{DownloadRequest, DownloadResponse, ErrorEnvelope};
use crate::api::server::AppState;
use crate::error::Error;
use crate::jobs::{MediaType, QualityHint};

/// Create the download router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_download))
}

/// Run a download job to completion and report where the artifact lives.
///
/// The request is held open for the whole job: engine invocation, post
/// processing, and artifact resolution. Domain failures come back as an
/// HTTP 200 envelope with `success: false`.
async fn submit_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Response> {
    let Some(url) = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        return Ok(Json(ErrorEnvelope::new(Error::MissingUrl.to_string())).into_response());
    };

    let media_type = MediaType::parse(&request.media_type);
    let quality = match QualityHint::parse(&request.quality) {
        Ok(quality) => quality,
        Err(e) => return Ok(Json(ErrorEnvelope::new(e.to_string())).into_response()),
    };

    let coordinator = state
        .coordinator
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Job coordinator not available"))?;

    match coordinator.submit_download(url, media_type, quality).await {
        Ok(artifact) => Ok(Json(DownloadResponse::from(artifact)).into_response()),
        Err(e) => Ok(Json(ErrorEnvelope::new(e.to_string())).into_response()),
    }
}
