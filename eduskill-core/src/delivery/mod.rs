//! Range-request video delivery
//!
//! Resolves a stored video, decides between full and partial content, and
//! opens a byte stream over exactly the bytes that response needs. The file is
//! never read into memory as a whole; the stream pulls one buffer at a time
//! and releases the file handle when it is dropped.

pub mod range;

use std::io::SeekFrom;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

pub use range::{
    ByteRange, DeliveryPlan, MalformedRange, RangePolicy, RequestedRange, parse_range_header,
};

use crate::media::{MediaRoot, StoredMedia};

/// Cache-Control value sent with every media response.
pub const MEDIA_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Byte stream over one response window of a stored file.
pub type MediaStream = ReaderStream<Take<File>>;

/// Errors that terminate a delivery request.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No stored file answers to this name
    #[error("Video not found: {filename}")]
    NotFound {
        /// Name the client asked for
        filename: String,
    },

    /// File exists but has no bytes to play
    #[error("Video file is empty: {filename}")]
    EmptyMedia {
        /// Name of the empty file
        filename: String,
    },

    /// Underlying I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Message suitable for the response body.
    pub fn user_message(&self) -> &'static str {
        match self {
            DeliveryError::NotFound { .. } => "Video not found",
            DeliveryError::EmptyMedia { .. } => "Video file is empty or corrupted",
            DeliveryError::Io(_) => "Error reading video file",
        }
    }

    /// Whether the request ends with 404 rather than a server error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeliveryError::NotFound { .. } | DeliveryError::EmptyMedia { .. }
        )
    }
}

/// Everything needed to write one media response.
#[derive(Debug)]
pub struct Delivery {
    pub media: StoredMedia,
    pub plan: DeliveryPlan,
    /// `None` for plans that carry no body
    pub body: Option<MediaStream>,
}

/// Stateless delivery of stored videos honouring byte-range requests.
#[derive(Debug, Clone)]
pub struct DeliveryService {
    root: MediaRoot,
    policy: RangePolicy,
    buffer_size: usize,
}

impl DeliveryService {
    /// Create delivery service over a media root
    pub fn new(root: MediaRoot, policy: RangePolicy, buffer_size: usize) -> Self {
        Self {
            root,
            policy,
            buffer_size,
        }
    }

    /// Media root this service reads from
    pub fn media_root(&self) -> &MediaRoot {
        &self.root
    }

    /// Active range policy
    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Resolve `filename`, plan the response for `range_header`, and open the body stream.
    ///
    /// # Errors
    /// - `DeliveryError::NotFound` - File is missing or the name is not a plain filename
    /// - `DeliveryError::EmptyMedia` - File has zero bytes
    /// - `DeliveryError::Io` - File could not be opened or positioned
    pub async fn serve(
        &self,
        filename: &str,
        range_header: Option<&str>,
    ) -> Result<Delivery, DeliveryError> {
        let media = self.root.resolve_video(filename).await?;
        let plan = self.policy.plan(range_header, media.size_bytes);

        let body = match plan {
            DeliveryPlan::Unsatisfiable { .. } => None,
            DeliveryPlan::Full { .. } | DeliveryPlan::Partial { .. } => {
                let (offset, length) = plan.byte_window();
                Some(self.open_window(&media, offset, length).await?)
            }
        };

        match plan {
            DeliveryPlan::Full { size } => info!("Serving full file {filename}: {size} bytes"),
            DeliveryPlan::Partial { range, size } => {
                info!("Serving range request {filename}: {range}/{size}")
            }
            DeliveryPlan::Unsatisfiable { size } => {
                info!("Refusing range for {filename} of {size} bytes")
            }
        }

        Ok(Delivery { media, plan, body })
    }

    /// Open a stream over `length` bytes of `media` starting at `offset`.
    async fn open_window(
        &self,
        media: &StoredMedia,
        offset: u64,
        length: u64,
    ) -> Result<MediaStream, DeliveryError> {
        let mut file = match File::open(&media.path).await {
            Ok(file) => file,
            // Deleted between resolution and open
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeliveryError::NotFound {
                    filename: media.filename.clone(),
                });
            }
            Err(e) => return Err(DeliveryError::Io(e)),
        };

        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        debug!(
            "Opened {} at offset {offset} for {length} bytes",
            media.filename
        );

        Ok(ReaderStream::with_capacity(
            file.take(length),
            self.buffer_size,
        ))
    }
}
