//! Media root layout and stored file resolution
//!
//! Uploaded files live under a single media root with `videos/` and
//! `thumbnails/` subdirectories. Filenames are opaque identifiers assigned at
//! upload time; only the extension is ever inspected.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::delivery::DeliveryError;

/// Subdirectory of the media root holding video files.
pub const VIDEOS_DIR: &str = "videos";

/// Subdirectory of the media root holding thumbnail images.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Content type used when the extension is missing or unknown.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Smallest well-formed MP4: an `ftyp` box followed by an empty `free` box.
const MINIMAL_MP4: [u8; 40] = [
    0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', // ftyp header
    b'i', b's', b'o', b'm', 0x00, 0x00, 0x00, 0x01, // major brand + version
    b'i', b's', b'o', b'm', b'a', b'v', b'c', b'1', // compatible brands
    0x00, 0x00, 0x00, 0x10, b'f', b'r', b'e', b'e', // free header
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // free payload
];

/// A resolved, non-empty file under the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Opaque filename assigned at upload
    pub filename: String,
    /// Absolute or root-relative location on disk
    pub path: PathBuf,
    /// File size in bytes, always greater than zero
    pub size_bytes: u64,
    /// Content type inferred from the extension
    pub mime_type: String,
}

/// Infer a content type from a file's extension.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use eduskill_core::media::infer_mime_type;
/// assert_eq!(infer_mime_type(Path::new("lesson.webm")), "video/webm");
/// assert_eq!(infer_mime_type(Path::new("lesson")), "video/mp4");
/// ```
pub fn infer_mime_type(path: &Path) -> String {
    if path.extension().is_none() {
        return DEFAULT_MIME_TYPE.to_string();
    }

    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// Check that a filename names a single entry directly inside a media directory.
pub fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}

/// Storage directory for uploaded media.
#[derive(Debug, Clone)]
pub struct MediaRoot {
    root: PathBuf,
}

impl MediaRoot {
    /// Create a media root at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Top-level directory served under `/uploads`
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory holding video files
    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS_DIR)
    }

    /// Directory holding thumbnail images
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join(THUMBNAILS_DIR)
    }

    /// Create the directory layout and report what is already stored.
    ///
    /// # Errors
    /// - `std::io::Error` - Failed to create a directory or list videos
    pub async fn ensure_layout(&self) -> Result<(), std::io::Error> {
        for dir in [self.root.clone(), self.videos_dir(), self.thumbnails_dir()] {
            if !tokio::fs::try_exists(&dir).await? {
                tokio::fs::create_dir_all(&dir).await?;
                info!("Created directory: {}", dir.display());
            }
        }

        let files = self.list_video_files().await?;
        if files.is_empty() {
            warn!(
                "No video files found in {}",
                self.videos_dir().display()
            );
        } else {
            info!("Available videos: {}", files.join(", "));
        }

        Ok(())
    }

    /// Resolve a video filename to a stored, non-empty file.
    ///
    /// # Errors
    /// - `DeliveryError::NotFound` - Name is not a plain filename or no such file exists
    /// - `DeliveryError::EmptyMedia` - File exists but has zero bytes
    /// - `DeliveryError::Io` - Metadata could not be read
    pub async fn resolve_video(&self, filename: &str) -> Result<StoredMedia, DeliveryError> {
        if !is_plain_filename(filename) {
            warn!("Rejected video filename {filename:?}");
            return Err(DeliveryError::NotFound {
                filename: filename.to_string(),
            });
        }

        let path = self.videos_dir().join(filename);
        debug!("Resolving video {filename} at {}", path.display());

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("File not found: {}", path.display());
                return Err(DeliveryError::NotFound {
                    filename: filename.to_string(),
                });
            }
            Err(e) => return Err(DeliveryError::Io(e)),
        };

        if !metadata.is_file() {
            return Err(DeliveryError::NotFound {
                filename: filename.to_string(),
            });
        }

        if metadata.len() == 0 {
            warn!("Zero-sized file detected: {}", path.display());
            return Err(DeliveryError::EmptyMedia {
                filename: filename.to_string(),
            });
        }

        Ok(StoredMedia {
            filename: filename.to_string(),
            mime_type: infer_mime_type(&path),
            size_bytes: metadata.len(),
            path,
        })
    }

    /// List the names of regular files in the videos directory, sorted.
    ///
    /// # Errors
    /// - `std::io::Error` - Failed to read the directory
    pub async fn list_video_files(&self) -> Result<Vec<String>, std::io::Error> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.videos_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Write a tiny valid MP4 into the videos directory for smoke testing.
    ///
    /// # Errors
    /// - `DeliveryError::Io` - File could not be written
    /// - `DeliveryError::EmptyMedia` - File reads back as empty
    pub async fn write_test_video(&self) -> Result<StoredMedia, DeliveryError> {
        let filename = format!("test-video-{}.mp4", chrono::Utc::now().timestamp_millis());
        let path = self.videos_dir().join(&filename);

        tokio::fs::write(&path, MINIMAL_MP4).await?;
        info!("Created test video file: {filename} ({} bytes)", MINIMAL_MP4.len());

        self.resolve_video(&filename).await
    }

    /// Delete a stored video if it exists.
    ///
    /// # Errors
    /// - `DeliveryError::NotFound` - Name is not a plain filename
    /// - `DeliveryError::Io` - File exists but could not be removed
    pub async fn remove_video(&self, filename: &str) -> Result<(), DeliveryError> {
        if !is_plain_filename(filename) {
            return Err(DeliveryError::NotFound {
                filename: filename.to_string(),
            });
        }

        match tokio::fs::remove_file(self.videos_dir().join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeliveryError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn create_media_root() -> (MediaRoot, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = MediaRoot::new(temp_dir.path());
        root.ensure_layout().await.unwrap();
        (root, temp_dir)
    }

    #[test]
    fn test_infer_mime_type() {
        assert_eq!(infer_mime_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(infer_mime_type(Path::new("a.webm")), "video/webm");
        assert_eq!(infer_mime_type(Path::new("no_extension")), DEFAULT_MIME_TYPE);
        assert_eq!(infer_mime_type(Path::new("a.zzzunknown")), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_plain_filename_rules() {
        assert!(is_plain_filename("video-1700000000000-42.mp4"));
        assert!(!is_plain_filename(""));
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename("../secret.mp4"));
        assert!(!is_plain_filename("nested/a.mp4"));
        assert!(!is_plain_filename("nested\\a.mp4"));
    }

    #[tokio::test]
    async fn test_ensure_layout_creates_directories() {
        let (root, _temp_dir) = create_media_root().await;

        assert!(root.videos_dir().is_dir());
        assert!(root.thumbnails_dir().is_dir());
    }

    #[tokio::test]
    async fn test_resolve_existing_video() {
        let (root, _temp_dir) = create_media_root().await;
        tokio::fs::write(root.videos_dir().join("lesson.mp4"), vec![7u8; 1024])
            .await
            .unwrap();

        let media = root.resolve_video("lesson.mp4").await.unwrap();
        assert_eq!(media.filename, "lesson.mp4");
        assert_eq!(media.size_bytes, 1024);
        assert_eq!(media.mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_resolve_missing_and_empty() {
        let (root, _temp_dir) = create_media_root().await;
        tokio::fs::write(root.videos_dir().join("empty.mp4"), b"")
            .await
            .unwrap();

        let result = root.resolve_video("missing.mp4").await;
        assert!(matches!(result, Err(DeliveryError::NotFound { .. })));

        let result = root.resolve_video("empty.mp4").await;
        assert!(matches!(result, Err(DeliveryError::EmptyMedia { .. })));

        let result = root.resolve_video("..").await;
        assert!(matches!(result, Err(DeliveryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_and_test_video() {
        let (root, _temp_dir) = create_media_root().await;
        assert!(root.list_video_files().await.unwrap().is_empty());

        let media = root.write_test_video().await.unwrap();
        assert_eq!(media.size_bytes, 40);
        assert!(media.filename.starts_with("test-video-"));

        let files = root.list_video_files().await.unwrap();
        assert_eq!(files, vec![media.filename.clone()]);

        root.remove_video(&media.filename).await.unwrap();
        assert!(root.list_video_files().await.unwrap().is_empty());
        // Removing twice is not an error
        root.remove_video(&media.filename).await.unwrap();
    }
}
