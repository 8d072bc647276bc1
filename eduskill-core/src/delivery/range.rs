//! HTTP Range header interpretation for media delivery
//!
//! Parses `bytes=start-end` requests and turns them into a [`DeliveryPlan`]
//! for a file of known size. What happens to a malformed or out-of-bounds
//! range is decided in exactly one place, [`RangePolicy::plan`].

use std::fmt;

use tracing::{debug, warn};

/// Inclusive byte window `[start, end]` within a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the window; zero when `end < start`.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Whether the window is inverted and covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Range as written by the client, before bounds are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedRange {
    pub start: u64,
    /// `None` for open-ended requests like `bytes=500-`
    pub end: Option<u64>,
}

/// Reasons a `Range` header could not be parsed.
///
/// Never surfaced to clients; only logged on the way to a full-content response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRange {
    #[error("range unit is not bytes")]
    UnsupportedUnit,

    #[error("range has no '-' separator")]
    MissingSeparator,

    #[error("range start {value:?} is not a non-negative integer")]
    InvalidStart { value: String },
}

/// Shape of the response for one delivery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// 200 with the entire file
    Full { size: u64 },
    /// 206 with one byte window
    Partial { range: ByteRange, size: u64 },
    /// 416, produced only by [`RangePolicy::Strict`]
    Unsatisfiable { size: u64 },
}

impl DeliveryPlan {
    /// HTTP status code for this plan.
    pub fn status_code(&self) -> u16 {
        match self {
            DeliveryPlan::Full { .. } => 200,
            DeliveryPlan::Partial { .. } => 206,
            DeliveryPlan::Unsatisfiable { .. } => 416,
        }
    }

    /// Value for the `Content-Length` header.
    pub fn content_length(&self) -> u64 {
        match self {
            DeliveryPlan::Full { size } => *size,
            DeliveryPlan::Partial { range, .. } => range.len(),
            DeliveryPlan::Unsatisfiable { .. } => 0,
        }
    }

    /// Value for the `Content-Range` header, if the plan carries one.
    pub fn content_range(&self) -> Option<String> {
        match self {
            DeliveryPlan::Full { .. } => None,
            DeliveryPlan::Partial { range, size } => {
                Some(format!("bytes {}-{}/{}", range.start, range.end, size))
            }
            DeliveryPlan::Unsatisfiable { size } => Some(format!("bytes */{size}")),
        }
    }

    /// Offset and length of the bytes to stream.
    pub fn byte_window(&self) -> (u64, u64) {
        match self {
            DeliveryPlan::Full { size } => (0, *size),
            DeliveryPlan::Partial { range, .. } => (range.start, range.len()),
            DeliveryPlan::Unsatisfiable { .. } => (0, 0),
        }
    }

    /// Total size of the underlying file.
    pub fn total_size(&self) -> u64 {
        match self {
            DeliveryPlan::Full { size }
            | DeliveryPlan::Partial { size, .. }
            | DeliveryPlan::Unsatisfiable { size } => *size,
        }
    }
}

/// Parse the raw value of a `Range` header.
///
/// Only the first range of a multi-range request is honoured. An `end` that
/// does not parse is treated as absent.
///
/// # Errors
/// - `MalformedRange::UnsupportedUnit` - Header does not start with `bytes=`
/// - `MalformedRange::MissingSeparator` - No `-` between start and end
/// - `MalformedRange::InvalidStart` - Start is empty or not a non-negative integer
///
/// # Examples
/// ```
/// use eduskill_core::delivery::{RequestedRange, parse_range_header};
/// let range = parse_range_header("bytes=100-199").unwrap();
/// assert_eq!(range, RequestedRange { start: 100, end: Some(199) });
/// ```
pub fn parse_range_header(value: &str) -> Result<RequestedRange, MalformedRange> {
    let ranges = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(MalformedRange::UnsupportedUnit)?;

    let first = ranges.split(',').next().unwrap_or_default();
    let (start_str, end_str) = first
        .split_once('-')
        .ok_or(MalformedRange::MissingSeparator)?;

    let start_str = start_str.trim();
    let start = start_str
        .parse::<u64>()
        .map_err(|_| MalformedRange::InvalidStart {
            value: start_str.to_string(),
        })?;

    let end = end_str.trim().parse::<u64>().ok();

    Ok(RequestedRange { start, end })
}

/// Decision point for malformed and out-of-bounds ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Fall back to the full file whenever the range cannot be honoured,
    /// so a confused player still gets playable bytes.
    #[default]
    Lenient,
    /// Ignore syntactically invalid headers but answer 416 for ranges that
    /// fall outside the file.
    Strict,
}

impl RangePolicy {
    /// Compute the response shape for a file of `size` bytes.
    ///
    /// `size` is expected to be non-zero; empty files are rejected before
    /// a plan is made.
    pub fn plan(self, range_header: Option<&str>, size: u64) -> DeliveryPlan {
        let Some(raw) = range_header else {
            return DeliveryPlan::Full { size };
        };

        let requested = match parse_range_header(raw) {
            Ok(requested) => requested,
            Err(e) => {
                warn!("Invalid range request {raw:?} for file size {size}: {e}");
                return DeliveryPlan::Full { size };
            }
        };

        if requested.start >= size {
            return self.reject(raw, size, "start beyond end of file");
        }

        let last_byte = size - 1;
        let end = requested.end.unwrap_or(last_byte).min(last_byte);
        if end < requested.start {
            return self.reject(raw, size, "end before start");
        }

        let range = ByteRange {
            start: requested.start,
            end,
        };
        debug!("Serving range request: {range}/{size}");
        DeliveryPlan::Partial { range, size }
    }

    fn reject(self, raw: &str, size: u64, reason: &str) -> DeliveryPlan {
        match self {
            RangePolicy::Lenient => {
                warn!("Invalid range request {raw:?} for file size {size}: {reason}, serving full file");
                DeliveryPlan::Full { size }
            }
            RangePolicy::Strict => {
                warn!("Unsatisfiable range request {raw:?} for file size {size}: {reason}");
                DeliveryPlan::Unsatisfiable { size }
            }
        }
    }
}

impl std::str::FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(RangePolicy::Lenient),
            "strict" => Ok(RangePolicy::Strict),
            _ => Err(format!(
                "Invalid range policy: '{s}'. Valid options are: lenient, strict"
            )),
        }
    }
}

impl fmt::Display for RangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangePolicy::Lenient => write!(f, "lenient"),
            RangePolicy::Strict => write!(f, "strict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_inverted_byte_range_is_empty() {
        let inverted = ByteRange { start: 5, end: 2 };
        assert!(inverted.is_empty());
        assert_eq!(inverted.len(), 0);

        let single = ByteRange { start: 7, end: 7 };
        assert!(!single.is_empty());
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_parse_range_header_valid() {
        let range = parse_range_header("bytes=100-199").unwrap();
        assert_eq!(
            range,
            RequestedRange {
                start: 100,
                end: Some(199)
            }
        );
    }

    #[test]
    fn test_parse_range_header_open_end() {
        let range = parse_range_header("bytes=500-").unwrap();
        assert_eq!(range.start, 500);
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_parse_range_header_invalid() {
        assert_eq!(
            parse_range_header("items=0-10"),
            Err(MalformedRange::UnsupportedUnit)
        );
        assert_eq!(
            parse_range_header("bytes=42"),
            Err(MalformedRange::MissingSeparator)
        );
        assert!(matches!(
            parse_range_header("bytes=abc-10"),
            Err(MalformedRange::InvalidStart { .. })
        ));
        // Suffix ranges have no start and are not supported
        assert!(matches!(
            parse_range_header("bytes=-500"),
            Err(MalformedRange::InvalidStart { .. })
        ));
    }

    #[test]
    fn test_parse_range_header_multi_range_uses_first() {
        let range = parse_range_header("bytes=0-1, 5-6").unwrap();
        assert_eq!(range.start, 0);
        assert_eq!(range.end, Some(1));
    }

    #[test]
    fn test_plan_without_header_is_full() {
        let plan = RangePolicy::Lenient.plan(None, 1000);
        assert_eq!(plan, DeliveryPlan::Full { size: 1000 });
        assert_eq!(plan.status_code(), 200);
        assert_eq!(plan.content_length(), 1000);
        assert_eq!(plan.content_range(), None);
    }

    #[test]
    fn test_plan_clamps_end() {
        let plan = RangePolicy::Lenient.plan(Some("bytes=100-999999"), 500);
        assert_eq!(
            plan,
            DeliveryPlan::Partial {
                range: ByteRange {
                    start: 100,
                    end: 499
                },
                size: 500
            }
        );
        assert_eq!(plan.content_length(), 400);
        assert_eq!(plan.content_range().as_deref(), Some("bytes 100-499/500"));
    }

    #[test]
    fn test_plan_unparsable_end_reads_to_eof() {
        let plan = RangePolicy::Lenient.plan(Some("bytes=10-xyz"), 100);
        assert_eq!(plan.byte_window(), (10, 90));
    }

    #[test]
    fn test_lenient_start_beyond_size_is_full() {
        let plan = RangePolicy::Lenient.plan(Some("bytes=500-"), 100);
        assert_eq!(plan, DeliveryPlan::Full { size: 100 });
    }

    #[test]
    fn test_lenient_end_before_start_is_full() {
        let plan = RangePolicy::Lenient.plan(Some("bytes=50-10"), 100);
        assert_eq!(plan, DeliveryPlan::Full { size: 100 });
    }

    #[test]
    fn test_strict_rejects_out_of_bounds() {
        let plan = RangePolicy::Strict.plan(Some("bytes=500-"), 100);
        assert_eq!(plan, DeliveryPlan::Unsatisfiable { size: 100 });
        assert_eq!(plan.status_code(), 416);
        assert_eq!(plan.content_range().as_deref(), Some("bytes */100"));

        let plan = RangePolicy::Strict.plan(Some("bytes=50-10"), 100);
        assert_eq!(plan.status_code(), 416);
    }

    #[test]
    fn test_strict_ignores_garbage_header() {
        let plan = RangePolicy::Strict.plan(Some("garbage"), 100);
        assert_eq!(plan, DeliveryPlan::Full { size: 100 });
    }

    #[test]
    fn test_range_policy_from_str() {
        assert_eq!("STRICT".parse::<RangePolicy>(), Ok(RangePolicy::Strict));
        assert_eq!("lenient".parse::<RangePolicy>(), Ok(RangePolicy::Lenient));
        assert!("loose".parse::<RangePolicy>().is_err());
    }

    proptest! {
        #[test]
        fn valid_ranges_are_partial(size in 1u64..1_000_000, a in any::<u64>(), b in any::<u64>()) {
            let start = a % size;
            let end = start + b % (size - start);
            let header = format!("bytes={start}-{end}");

            let plan = RangePolicy::Lenient.plan(Some(&header), size);

            prop_assert_eq!(plan.status_code(), 206);
            prop_assert_eq!(plan.content_length(), end - start + 1);
            prop_assert_eq!(plan.byte_window(), (start, end - start + 1));
        }

        #[test]
        fn lenient_never_exceeds_file(size in 1u64..1_000_000, header in "bytes=[0-9]{0,8}-[0-9]{0,8}") {
            let plan = RangePolicy::Lenient.plan(Some(&header), size);
            let (offset, len) = plan.byte_window();

            prop_assert!(plan.status_code() == 200 || plan.status_code() == 206);
            prop_assert!(len > 0);
            prop_assert!(offset + len <= size);
        }
    }
}
