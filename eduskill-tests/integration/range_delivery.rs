//! Integration tests for byte-range delivery on `/video/{filename}`
//!
//! Covers the status and header shapes for full, partial and out-of-bounds
//! requests under both range policies, and slicing under concurrency.

use eduskill_core::delivery::RangePolicy;
use eduskill_core::test_fixtures::patterned_bytes;

use super::support::{body_bytes, get, header, test_app};

const FILE_SIZE: usize = 10_000;

#[tokio::test]
async fn test_valid_range_returns_exact_slice() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=1000-1999")).await;

    assert_eq!(response.status(), 206);
    assert_eq!(header(&response, "content-length"), Some("1000"));
    assert_eq!(
        header(&response, "content-range"),
        Some("bytes 1000-1999/10000")
    );
    assert_eq!(header(&response, "accept-ranges"), Some("bytes"));
    assert_eq!(header(&response, "content-type"), Some("video/mp4"));
    assert_eq!(body_bytes(response).await, &data[1000..2000]);
}

#[tokio::test]
async fn test_open_ended_and_clamped_ranges() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=9000-")).await;
    assert_eq!(response.status(), 206);
    assert_eq!(
        header(&response, "content-range"),
        Some("bytes 9000-9999/10000")
    );
    assert_eq!(body_bytes(response).await, &data[9000..]);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=9990-20000")).await;
    assert_eq!(response.status(), 206);
    assert_eq!(header(&response, "content-length"), Some("10"));
    assert_eq!(body_bytes(response).await, &data[9990..]);
}

#[tokio::test]
async fn test_single_byte_range() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=9999-9999")).await;

    assert_eq!(response.status(), 206);
    assert_eq!(header(&response, "content-length"), Some("1"));
    assert_eq!(body_bytes(response).await, vec![data[9999]]);
}

#[tokio::test]
async fn test_no_range_returns_whole_file() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/video/lesson.mp4", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "content-length"), Some("10000"));
    assert!(header(&response, "content-range").is_none());
    assert_eq!(
        header(&response, "cache-control"),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_lenient_policy_degrades_bad_ranges_to_full_file() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    for range in ["bytes=10000-10100", "bytes=500-100", "bytes=abc-def", "items=0-10"] {
        let response = get(&app, "/video/lesson.mp4", Some(range)).await;
        assert_eq!(response.status(), 200, "range {range}");
        assert_eq!(header(&response, "content-length"), Some("10000"));
        assert_eq!(body_bytes(response).await, data, "range {range}");
    }
}

#[tokio::test]
async fn test_strict_policy_rejects_out_of_bounds_ranges() {
    let (fixture, app) = test_app(RangePolicy::Strict).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=10000-10100")).await;
    assert_eq!(response.status(), 416);
    assert_eq!(header(&response, "content-range"), Some("bytes */10000"));
    assert!(body_bytes(response).await.is_empty());

    let response = get(&app, "/video/lesson.mp4", Some("bytes=500-100")).await;
    assert_eq!(response.status(), 416);

    // Syntactically invalid headers are ignored rather than refused
    let response = get(&app, "/video/lesson.mp4", Some("bytes=abc-def")).await;
    assert_eq!(response.status(), 200);

    let response = get(&app, "/video/lesson.mp4", Some("bytes=0-9")).await;
    assert_eq!(response.status(), 206);
    assert_eq!(body_bytes(response).await, &data[..10]);
}

#[tokio::test]
async fn test_empty_file_is_not_found() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    fixture.add_video("empty.mp4", b"");

    for range in [None, Some("bytes=0-10")] {
        let response = get(&app, "/video/empty.mp4", range).await;
        assert_eq!(response.status(), 404);
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body, "Video file is empty or corrupted");
    }
}

#[tokio::test]
async fn test_missing_and_traversal_names_are_not_found() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    std::fs::write(fixture.path().join("secret.txt"), b"do not serve").unwrap();

    let response = get(&app, "/video/missing.mp4", None).await;
    assert_eq!(response.status(), 404);
    assert_eq!(
        String::from_utf8(body_bytes(response).await).unwrap(),
        "Video not found"
    );

    let response = get(&app, "/video/..%2Fsecret.txt", None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_mime_type_follows_extension() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    fixture.add_video("lesson.webm", b"webm-bytes");
    fixture.add_video("lesson.unknownext", b"raw-bytes");

    let response = get(&app, "/video/lesson.webm", None).await;
    assert_eq!(header(&response, "content-type"), Some("video/webm"));

    let response = get(&app, "/video/lesson.unknownext", None).await;
    assert_eq!(header(&response, "content-type"), Some("video/mp4"));
}

#[tokio::test]
async fn test_concurrent_disjoint_ranges() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    let data = patterned_bytes(FILE_SIZE);
    fixture.add_video("lesson.mp4", &data);

    let windows: Vec<(usize, usize)> = (0..10).map(|i| (i * 1000, i * 1000 + 999)).collect();
    let requests = windows.iter().map(|&(start, end)| {
        let app = app.clone();
        async move {
            let range = format!("bytes={start}-{end}");
            let response = get(&app, "/video/lesson.mp4", Some(&range)).await;
            assert_eq!(response.status(), 206);
            (start, end, body_bytes(response).await)
        }
    });

    let results = futures::future::join_all(requests).await;

    assert_eq!(results.len(), 10);
    for (start, end, body) in results {
        assert_eq!(body, &data[start..=end], "window {start}-{end}");
    }
}
