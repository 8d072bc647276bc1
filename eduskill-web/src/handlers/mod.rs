//! HTTP request handlers organized by functionality

pub mod api;
pub mod range;
pub mod streaming;

// Re-export handler functions
pub use api::{
    ApiError, VideoDetails, VideoFileEntry, api_catalog, api_delete_video, api_get_video,
    api_increment_view, api_list_videos, api_test, api_upload_test_video,
};
pub use streaming::stream_video;
