//! Test fixtures for media delivery testing.
//!
//! Provides a scratch media root with the standard layout and deterministic
//! video content so byte ranges can be checked exactly.

use std::path::PathBuf;

use crate::media::{MediaRoot, THUMBNAILS_DIR, VIDEOS_DIR};

/// Scratch media root that is removed when dropped.
pub struct TestMediaRoot {
    temp_dir: tempfile::TempDir,
    root: MediaRoot,
}

impl TestMediaRoot {
    /// Creates a temporary media root with `videos/` and `thumbnails/`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or its subdirectories cannot be created.
    /// This is acceptable in test fixtures where failures indicate environment issues.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(VIDEOS_DIR)).unwrap();
        std::fs::create_dir_all(temp_dir.path().join(THUMBNAILS_DIR)).unwrap();

        let root = MediaRoot::new(temp_dir.path());
        Self { temp_dir, root }
    }

    /// Media root backed by the temporary directory.
    pub fn root(&self) -> &MediaRoot {
        &self.root
    }

    /// Path of the temporary directory.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Writes `contents` as `videos/<filename>` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn add_video(&self, filename: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.videos_dir().join(filename);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Default for TestMediaRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic video-like content where byte `i` is `i % 251`.
///
/// A prime modulus keeps any window distinguishable from its neighbours.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
