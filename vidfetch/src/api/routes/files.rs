//! Artifact file serving route.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::services::ServeFile;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;

/// Create the files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(get_artifact))
}

/// Serve a downloaded artifact as an attachment.
///
/// Names that could escape the storage directory resolve to the same 404 as
/// any other missing file.
async fn get_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Storage area not available"))?;

    let path = storage
        .artifact_path(&filename)
        .filter(|path| path.exists())
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // Serve the file
    let req = axum::http::Request::builder()
        .body(axum::body::Body::empty())
        .map_err(|e| ApiError::internal(e.to_string()))?;

    match ServeFile::new(path).try_call(req).await {
        Ok(response) => {
            let mut response = response.into_response();
            // Restricted filenames keep this header value ASCII-clean.
            let disposition = format!("attachment; filename=\"{}\"", filename);
            if let Ok(value) = header::HeaderValue::from_str(&disposition) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            Ok(response)
        }
        Err(e) => Err(ApiError::internal(format!("Failed to serve file: {}", e))),
    }
}
