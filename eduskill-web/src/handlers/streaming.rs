//! Direct video streaming endpoint

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use tracing::info;

use super::range::{build_delivery_response, delivery_error_response, extract_range_header};
use crate::server::AppState;

/// `GET /video/{filename}`: stream a stored video, honouring `Range`.
pub async fn stream_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Response {
    let range = extract_range_header(&headers);
    info!("Attempting to serve video: {filename} (range={range:?})");

    match state.delivery.serve(&filename, range.as_deref()).await {
        Ok(delivery) => build_delivery_response(delivery),
        Err(e) => delivery_error_response(&e),
    }
}
