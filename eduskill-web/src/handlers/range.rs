//! HTTP Range response construction for video streaming
//!
//! Turns a planned [`Delivery`] into status, headers and a streamed body.
//! Implements the RFC 7233 response shapes; which shape is used is decided by
//! the core range policy, not here.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use eduskill_core::delivery::{Delivery, DeliveryError, DeliveryPlan, MEDIA_CACHE_CONTROL};
use futures::TryStreamExt;
use tracing::{error, warn};

/// Extract the Range header value as text.
///
/// Returns None if no range header present or if the value is not visible ASCII.
pub fn extract_range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|range| range.to_str().ok())
        .map(|s| s.to_string())
}

/// Add the no-caching headers every media response carries.
pub fn apply_no_cache_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(MEDIA_CACHE_CONTROL),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}

/// Build the HTTP response for a planned delivery.
///
/// Full plans answer 200, partial plans 206 with `Content-Range`, and
/// unsatisfiable plans 416 with `Content-Range: bytes */size` and no body.
pub fn build_delivery_response(delivery: Delivery) -> Response {
    let Delivery { media, plan, body } = delivery;

    let status = match plan {
        DeliveryPlan::Full { .. } => StatusCode::OK,
        DeliveryPlan::Partial { .. } => StatusCode::PARTIAL_CONTENT,
        DeliveryPlan::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
    };

    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, &media.mime_type)
        .header(header::CONTENT_LENGTH, plan.content_length().to_string())
        .header(header::ACCEPT_RANGES, "bytes");

    if let Some(content_range) = plan.content_range() {
        response = response.header(header::CONTENT_RANGE, content_range);
    }

    let body = match body {
        Some(stream) => {
            let filename = media.filename.clone();
            Body::from_stream(stream.inspect_err(move |e| {
                warn!("Stream of {filename} aborted: {e}");
            }))
        }
        None => Body::empty(),
    };

    let mut response = response
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    apply_no_cache_headers(response.headers_mut());
    response
}

/// Plain-text response for a failed delivery.
pub fn delivery_error_response(err: &DeliveryError) -> Response {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        error!("Video delivery failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, err.user_message()).into_response()
}

#[cfg(test)]
mod tests {
    use eduskill_core::delivery::ByteRange;
    use eduskill_core::media::StoredMedia;

    use super::*;

    fn planned(plan: DeliveryPlan) -> Delivery {
        Delivery {
            media: StoredMedia {
                filename: "lesson.webm".to_string(),
                path: "videos/lesson.webm".into(),
                size_bytes: plan.total_size(),
                mime_type: "video/webm".to_string(),
            },
            plan,
            body: None,
        }
    }

    #[test]
    fn test_extract_range_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_range_header(&headers), None);

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        assert_eq!(extract_range_header(&headers).as_deref(), Some("bytes=0-99"));
    }

    #[test]
    fn test_partial_response_headers() {
        let response = build_delivery_response(planned(DeliveryPlan::Partial {
            range: ByteRange { start: 100, end: 199 },
            size: 1000,
        }));

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 100-199/1000");
        assert_eq!(headers[header::CONTENT_LENGTH], "100");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/webm");
        assert_eq!(headers[header::CACHE_CONTROL], MEDIA_CACHE_CONTROL);
    }

    #[test]
    fn test_full_response_headers() {
        let response = build_delivery_response(planned(DeliveryPlan::Full { size: 1000 }));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    }

    #[test]
    fn test_unsatisfiable_response_headers() {
        let response =
            build_delivery_response(planned(DeliveryPlan::Unsatisfiable { size: 1000 }));

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    }

    #[test]
    fn test_delivery_error_statuses() {
        let not_found = DeliveryError::NotFound {
            filename: "x.mp4".to_string(),
        };
        assert_eq!(
            delivery_error_response(&not_found).status(),
            StatusCode::NOT_FOUND
        );

        let empty = DeliveryError::EmptyMedia {
            filename: "x.mp4".to_string(),
        };
        assert_eq!(
            delivery_error_response(&empty).status(),
            StatusCode::NOT_FOUND
        );

        let io = DeliveryError::Io(std::io::Error::other("disk gone"));
        assert_eq!(
            delivery_error_response(&io).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
