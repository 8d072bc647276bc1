//! Integration tests for the static `/uploads` alternate endpoint

use eduskill_core::delivery::RangePolicy;
use eduskill_core::test_fixtures::patterned_bytes;

use super::support::{body_bytes, get, header, test_app};

#[tokio::test]
async fn test_static_mp4_headers() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(2048);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/uploads/videos/lesson.mp4", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-type"), Some("video/mp4"));
    assert_eq!(
        header(&response, "cache-control"),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(header(&response, "pragma"), Some("no-cache"));
    assert_eq!(header(&response, "expires"), Some("0"));
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_static_alternate_serves_ranges() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(2048);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/uploads/videos/lesson.mp4", Some("bytes=100-199")).await;

    assert_eq!(response.status(), 206);
    assert_eq!(
        header(&response, "content-range"),
        Some("bytes 100-199/2048")
    );
    assert_eq!(body_bytes(response).await, &data[100..200]);
}

#[tokio::test]
async fn test_static_alternate_keeps_other_types() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    std::fs::write(fixture.path().join("thumbnails/cover.png"), b"png").unwrap();

    let response = get(&app, "/uploads/thumbnails/cover.png", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-type"), Some("image/png"));
}

#[tokio::test]
async fn test_static_alternate_missing_file() {
    let (_fixture, app) = test_app(RangePolicy::Lenient).await;

    let response = get(&app, "/uploads/videos/missing.mp4", None).await;

    assert_eq!(response.status(), 404);
    assert_ne!(header(&response, "content-type"), Some("video/mp4"));
}

#[tokio::test]
async fn test_static_alternate_serves_empty_file_as_is() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    fixture.add_video("empty.mp4", b"");

    // Unlike the streaming route, static serving does not inspect file size
    let response = get(&app, "/uploads/videos/empty.mp4", None).await;
    assert_eq!(response.status(), 200);
    assert!(body_bytes(response).await.is_empty());

    let response = get(&app, "/video/empty.mp4", None).await;
    assert_eq!(response.status(), 404);
}
