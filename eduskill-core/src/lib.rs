//! EduSkill Core - Media delivery for the EduSkill learning platform
//!
//! Serves uploaded lesson videos with HTTP range support and decides how a
//! player falls back across alternate URLs when a source fails. Also holds
//! configuration, tracing setup, and the video catalog interface the web
//! layer looks files up through.

pub mod catalog;
pub mod config;
pub mod delivery;
pub mod media;
pub mod playback;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use catalog::{CatalogError, InMemoryVideoCatalog, VideoCatalog, VideoRecord};
pub use config::EduskillConfig;
pub use delivery::{DeliveryError, DeliveryPlan, DeliveryService, RangePolicy};
pub use media::{MediaRoot, StoredMedia};
pub use playback::{CandidateList, FallbackStep, PlaybackEndpoints, PlaybackError};

/// Core errors that can bubble up from any EduSkill subsystem.
#[derive(Debug, thiserror::Error)]
pub enum EduskillError {
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EduskillError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            EduskillError::Delivery(e) => e.user_message().to_string(),
            EduskillError::Catalog(e) => match e {
                CatalogError::VideoNotFound { .. } => "Video not found".to_string(),
                CatalogError::FileUnavailable { source, .. } => {
                    source.user_message().to_string()
                }
            },
            EduskillError::Playback(PlaybackError::Exhausted { .. }) => {
                "This video could not be played. Try again or download it directly.".to_string()
            }
            EduskillError::Playback(_) => "Video source is invalid".to_string(),
            EduskillError::Configuration { .. } => "Configuration error occurred".to_string(),
            EduskillError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EduskillError::Configuration { .. }
                | EduskillError::Playback(PlaybackError::EmptyReference)
        )
    }
}

pub type Result<T> = std::result::Result<T, EduskillError>;

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_user_messages() {
        let err: EduskillError = DeliveryError::EmptyMedia {
            filename: "a.mp4".to_string(),
        }
        .into();
        assert_eq!(err.user_message(), "Video file is empty or corrupted");

        let err: EduskillError = CatalogError::VideoNotFound { id: Uuid::nil() }.into();
        assert_eq!(err.user_message(), "Video not found");

        let err: EduskillError = PlaybackError::Exhausted { attempted: 5 }.into();
        assert!(err.user_message().contains("download"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_user_error_classification() {
        let err = EduskillError::Configuration {
            reason: "bad port".to_string(),
        };
        assert!(err.is_user_error());

        let err: EduskillError = PlaybackError::EmptyReference.into();
        assert!(err.is_user_error());
    }
}
