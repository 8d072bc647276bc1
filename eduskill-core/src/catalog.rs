//! Video catalog: metadata records that point at stored media
//!
//! The catalog maps a video ID to the file the delivery service streams.
//! Records exclusively own their file; removing a record is the only path
//! that deletes media from disk.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::delivery::DeliveryError;
use crate::media::{MediaRoot, StoredMedia, VIDEOS_DIR};

/// Catalog entry for one uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    /// Reference relative to the media root, e.g. `videos/<file_name>`
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub thumbnail_url: Option<String>,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Build a record for media that already exists under the media root.
    pub fn from_media(media: &StoredMedia, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            file_name: media.filename.clone(),
            file_url: format!("{VIDEOS_DIR}/{}", media.filename),
            file_size: media.size_bytes,
            mime_type: media.mime_type.clone(),
            thumbnail_url: None,
            views: 0,
            created_at: Utc::now(),
        }
    }
}

/// Derive a display title from a stored filename.
pub fn title_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled Video")
        .replace(['.', '_', '-'], " ")
        .trim()
        .to_string()
}

/// Errors from catalog lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No record with this ID
    #[error("Video {id} not found")]
    VideoNotFound {
        /// ID that was looked up
        id: Uuid,
    },

    /// Record exists but its file cannot be delivered
    #[error("Video {id} file unavailable: {source}")]
    FileUnavailable {
        /// ID of the record
        id: Uuid,
        /// Why the file could not be resolved
        #[source]
        source: DeliveryError,
    },
}

/// Storage for video records.
///
/// The platform keeps these in a document database; the in-memory
/// implementation below backs the standalone media server and tests.
pub trait VideoCatalog: Send + Sync {
    /// All records, newest first.
    fn list(&self) -> Vec<VideoRecord>;

    /// Look up one record.
    ///
    /// # Errors
    /// - `CatalogError::VideoNotFound` - No record with this ID
    fn get(&self, id: Uuid) -> Result<VideoRecord, CatalogError>;

    /// Add or replace a record.
    fn insert(&self, record: VideoRecord);

    /// Increment the view counter and return the new count.
    ///
    /// # Errors
    /// - `CatalogError::VideoNotFound` - No record with this ID
    fn record_view(&self, id: Uuid) -> Result<u64, CatalogError>;

    /// Remove a record, returning it so the caller can delete its file.
    ///
    /// # Errors
    /// - `CatalogError::VideoNotFound` - No record with this ID
    fn remove(&self, id: Uuid) -> Result<VideoRecord, CatalogError>;
}

/// Look up a record and verify that its file is present and non-empty.
///
/// # Errors
/// - `CatalogError::VideoNotFound` - No record with this ID
/// - `CatalogError::FileUnavailable` - File missing, empty, or unreadable
pub async fn locate_video(
    catalog: &dyn VideoCatalog,
    root: &MediaRoot,
    id: Uuid,
) -> Result<(VideoRecord, StoredMedia), CatalogError> {
    let record = catalog.get(id)?;
    let media = root
        .resolve_video(&record.file_name)
        .await
        .map_err(|source| CatalogError::FileUnavailable { id, source })?;
    Ok((record, media))
}

/// Catalog held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryVideoCatalog {
    records: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoCatalog {
    /// Create empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog with one record per non-empty file already in the videos directory.
    ///
    /// # Errors
    /// - `std::io::Error` - Failed to read the videos directory
    pub async fn scan(root: &MediaRoot) -> Result<Self, std::io::Error> {
        let catalog = Self::new();

        for filename in root.list_video_files().await? {
            match root.resolve_video(&filename).await {
                Ok(media) => {
                    let record = VideoRecord::from_media(&media, title_from_filename(&filename));
                    debug!("Cataloged {} as {}", filename, record.id);
                    catalog.insert(record);
                }
                Err(e) => debug!("Skipping {filename}: {e}"),
            }
        }

        info!("Catalog loaded with {} videos", catalog.len());
        Ok(catalog)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the catalog has no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl VideoCatalog for InMemoryVideoCatalog {
    fn list(&self) -> Vec<VideoRecord> {
        let mut records: Vec<VideoRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    fn get(&self, id: Uuid) -> Result<VideoRecord, CatalogError> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::VideoNotFound { id })
    }

    fn insert(&self, record: VideoRecord) {
        self.records.write().insert(record.id, record);
    }

    fn record_view(&self, id: Uuid) -> Result<u64, CatalogError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&id)
            .ok_or(CatalogError::VideoNotFound { id })?;
        record.views += 1;
        Ok(record.views)
    }

    fn remove(&self, id: Uuid) -> Result<VideoRecord, CatalogError> {
        self.records
            .write()
            .remove(&id)
            .ok_or(CatalogError::VideoNotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn create_populated_root() -> (MediaRoot, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = MediaRoot::new(temp_dir.path());
        root.ensure_layout().await.unwrap();

        tokio::fs::write(root.videos_dir().join("intro_to_rust.mp4"), vec![1u8; 64])
            .await
            .unwrap();
        tokio::fs::write(root.videos_dir().join("broken.mp4"), b"")
            .await
            .unwrap();

        (root, temp_dir)
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("intro_to_rust.mp4"), "intro to rust");
        assert_eq!(title_from_filename("video-1700-42.webm"), "video 1700 42");
    }

    #[tokio::test]
    async fn test_scan_skips_empty_files() {
        let (root, _temp_dir) = create_populated_root().await;

        let catalog = InMemoryVideoCatalog::scan(&root).await.unwrap();
        assert_eq!(catalog.len(), 1);

        let record = &catalog.list()[0];
        assert_eq!(record.file_name, "intro_to_rust.mp4");
        assert_eq!(record.file_url, "videos/intro_to_rust.mp4");
        assert_eq!(record.file_size, 64);
    }

    #[tokio::test]
    async fn test_locate_video() {
        let (root, _temp_dir) = create_populated_root().await;
        let catalog = InMemoryVideoCatalog::scan(&root).await.unwrap();
        let id = catalog.list()[0].id;

        let (record, media) = locate_video(&catalog, &root, id).await.unwrap();
        assert_eq!(record.id, id);
        assert_eq!(media.size_bytes, 64);

        let unknown = Uuid::new_v4();
        let result = locate_video(&catalog, &root, unknown).await;
        assert!(matches!(result, Err(CatalogError::VideoNotFound { .. })));
    }

    #[tokio::test]
    async fn test_locate_video_with_missing_file() {
        let (root, _temp_dir) = create_populated_root().await;
        let catalog = InMemoryVideoCatalog::scan(&root).await.unwrap();
        let id = catalog.list()[0].id;

        tokio::fs::remove_file(root.videos_dir().join("intro_to_rust.mp4"))
            .await
            .unwrap();

        let result = locate_video(&catalog, &root, id).await;
        assert!(matches!(
            result,
            Err(CatalogError::FileUnavailable {
                source: DeliveryError::NotFound { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_views_and_removal() {
        let catalog = InMemoryVideoCatalog::new();
        let media = StoredMedia {
            filename: "a.mp4".to_string(),
            path: "videos/a.mp4".into(),
            size_bytes: 10,
            mime_type: "video/mp4".to_string(),
        };
        let record = VideoRecord::from_media(&media, "A");
        let id = record.id;
        catalog.insert(record);

        assert_eq!(catalog.record_view(id).unwrap(), 1);
        assert_eq!(catalog.record_view(id).unwrap(), 2);

        let removed = catalog.remove(id).unwrap();
        assert_eq!(removed.views, 2);
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.record_view(id),
            Err(CatalogError::VideoNotFound { .. })
        ));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let media = StoredMedia {
            filename: "a.mp4".to_string(),
            path: "videos/a.mp4".into(),
            size_bytes: 10,
            mime_type: "video/mp4".to_string(),
        };
        let record = VideoRecord::from_media(&media, "A");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fileName"], "a.mp4");
        assert_eq!(json["fileUrl"], "videos/a.mp4");
        assert_eq!(json["fileSize"], 10);
        assert_eq!(json["views"], 0);

        let parsed: VideoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.id, record.id);
    }
}
