//! JSON API handlers for the video catalog and server health

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use eduskill_core::catalog::{CatalogError, VideoRecord, locate_video};
use eduskill_core::{DeliveryError, EduskillError, PlaybackError};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::server::AppState;

/// Error returned by JSON handlers as `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(EduskillError);

impl<E: Into<EduskillError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EduskillError::Delivery(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            EduskillError::Catalog(CatalogError::VideoNotFound { .. }) => StatusCode::NOT_FOUND,
            EduskillError::Catalog(CatalogError::FileUnavailable { source, .. })
                if source.is_not_found() =>
            {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("API request failed: {}", self.0);
        }

        let body = json!({
            "success": false,
            "message": self.0.user_message(),
        });
        (status, Json(body)).into_response()
    }
}

/// One stored file as listed by `/api/videos`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFileEntry {
    pub filename: String,
    pub url: String,
    pub direct_url: String,
}

/// Catalog record with the URLs a player should try, in order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub candidates: Vec<String>,
    pub download_url: String,
}

/// `GET /api/test`: liveness probe.
pub async fn api_test(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Video server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSeconds": state.server_started_at.elapsed().as_secs(),
    }))
}

/// `GET /api/videos`: list files in the videos directory.
pub async fn api_list_videos(State(state): State<AppState>) -> Response {
    let files = match state.media_root().list_video_files().await {
        Ok(files) => files,
        Err(e) => {
            error!("Error reading video directory: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read videos directory" })),
            )
                .into_response();
        }
    };

    let mut videos = Vec::with_capacity(files.len());
    for filename in files {
        match file_entry(&state, filename) {
            Ok(entry) => videos.push(entry),
            Err(e) => error!("Skipping unlistable video: {e}"),
        }
    }

    Json(json!({ "videos": videos })).into_response()
}

fn file_entry(state: &AppState, filename: String) -> Result<VideoFileEntry, PlaybackError> {
    let candidates = state.endpoints.build_candidates(&filename)?;
    let url = candidates.first().to_string();
    let direct_url = candidates
        .get(1)
        .map(|u| u.to_string())
        .unwrap_or_else(|| url.clone());

    Ok(VideoFileEntry {
        filename,
        url,
        direct_url,
    })
}

/// `GET /api/catalog`: every catalog record, newest first.
pub async fn api_catalog(State(state): State<AppState>) -> Json<serde_json::Value> {
    let videos = state.catalog.list();
    Json(json!({
        "success": true,
        "count": videos.len(),
        "videos": videos,
    }))
}

/// `GET /api/videos/{id}`: one record with its playback candidates.
///
/// # Errors
/// - 404 - Unknown ID, or the record's file is missing or empty
pub async fn api_get_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (record, _media) = locate_video(state.catalog.as_ref(), state.media_root(), id).await?;

    let session = state.endpoints.open_session(&record.file_url)?;
    let details = VideoDetails {
        candidates: session.candidates().to_strings(),
        download_url: session.download_url().to_string(),
        record,
    };

    Ok(Json(json!({ "success": true, "video": details })))
}

/// `POST /api/videos/{id}/view`: count one view.
///
/// # Errors
/// - 404 - Unknown ID
pub async fn api_increment_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let views = state.catalog.record_view(id)?;
    Ok(Json(json!({
        "success": true,
        "message": "View count incremented successfully",
        "views": views,
    })))
}

/// `DELETE /api/videos/{id}`: drop a record and the file it owns.
///
/// # Errors
/// - 404 - Unknown ID
/// - 500 - File could not be removed
pub async fn api_delete_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.catalog.get(id)?;
    state.media_root().remove_video(&record.file_name).await?;
    // Record goes last so a failed file removal leaves both in place
    state.catalog.remove(id)?;
    info!("Deleted video {id} ({})", record.file_name);

    Ok(Json(json!({
        "success": true,
        "message": "Video deleted successfully",
    })))
}

/// `POST /api/upload-test-video`: store and catalog a minimal MP4.
///
/// # Errors
/// - 500 - File could not be written or reads back empty
pub async fn api_upload_test_video(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let media = state
        .media_root()
        .write_test_video()
        .await
        .map_err(|e| match e {
            // A freshly written file that reads back empty is a server fault
            DeliveryError::EmptyMedia { .. } => EduskillError::Io(std::io::Error::other(
                "Failed to create test video - file is empty",
            )),
            other => other.into(),
        })?;

    let record = VideoRecord::from_media(&media, "Test Video");
    let id = record.id;
    state.catalog.insert(record);

    let entry = file_entry(&state, media.filename.clone())?;
    Ok(Json(json!({
        "success": true,
        "id": id,
        "filename": entry.filename,
        "fileSize": media.size_bytes,
        "url": entry.url,
        "directUrl": entry.direct_url,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_statuses() {
        let err = ApiError::from(CatalogError::VideoNotFound { id: Uuid::nil() });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(CatalogError::FileUnavailable {
            id: Uuid::nil(),
            source: DeliveryError::EmptyMedia {
                filename: "a.mp4".to_string(),
            },
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(std::io::Error::other("disk full"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(PlaybackError::EmptyReference);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
