//! Integration tests for the JSON API

use eduskill_core::delivery::RangePolicy;

use super::support::{body_json, get, send, test_app};

#[tokio::test]
async fn test_health_endpoint() {
    let (_fixture, app) = test_app(RangePolicy::Lenient).await;

    let json = body_json(get(&app, "/api/test", None).await).await;

    assert_eq!(json["message"], "Video server is running");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_videos_with_urls() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;
    fixture.add_video("b.mp4", b"bbbb");
    fixture.add_video("a.mp4", b"aaaa");

    let response = get(&app, "/api/videos", None).await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;

    let videos = json["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["filename"], "a.mp4");
    assert_eq!(videos[0]["url"], "http://localhost:5001/video/a.mp4");
    assert_eq!(
        videos[0]["directUrl"],
        "http://localhost:5001/uploads/videos/a.mp4"
    );
}

#[tokio::test]
async fn test_upload_then_stream_test_video() {
    let (_fixture, app) = test_app(RangePolicy::Lenient).await;

    let response = send(&app, "POST", "/api/upload-test-video").await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["fileSize"], 40);
    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("test-video-"));
    assert!(filename.ends_with(".mp4"));

    let response = get(&app, &format!("/video/{filename}"), Some("bytes=4-7")).await;
    assert_eq!(response.status(), 206);
    let body = super::support::body_bytes(response).await;
    assert_eq!(body, b"ftyp");
}

#[tokio::test]
async fn test_catalog_lookup_view_and_delete() {
    let (_fixture, app) = test_app(RangePolicy::Lenient).await;

    let uploaded = body_json(send(&app, "POST", "/api/upload-test-video").await).await;
    let id = uploaded["id"].as_str().unwrap().to_string();
    let filename = uploaded["filename"].as_str().unwrap().to_string();

    let catalog = body_json(get(&app, "/api/catalog", None).await).await;
    assert_eq!(catalog["count"], 1);

    let response = get(&app, &format!("/api/videos/{id}"), None).await;
    assert_eq!(response.status(), 200);
    let details = body_json(response).await;
    assert_eq!(details["video"]["fileName"], filename.as_str());
    assert_eq!(details["video"]["candidates"].as_array().unwrap().len(), 5);
    assert_eq!(
        details["video"]["downloadUrl"],
        format!("http://localhost:5001/video/{filename}")
    );

    let viewed = body_json(send(&app, "POST", &format!("/api/videos/{id}/view")).await).await;
    assert_eq!(viewed["views"], 1);
    let viewed = body_json(send(&app, "POST", &format!("/api/videos/{id}/view")).await).await;
    assert_eq!(viewed["views"], 2);

    let response = send(&app, "DELETE", &format!("/api/videos/{id}")).await;
    assert_eq!(response.status(), 200);

    let response = get(&app, &format!("/api/videos/{id}"), None).await;
    assert_eq!(response.status(), 404);
    let response = get(&app, &format!("/video/{filename}"), None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unknown_video_id() {
    let (_fixture, app) = test_app(RangePolicy::Lenient).await;
    let id = "00000000-0000-0000-0000-000000000000";

    let response = get(&app, &format!("/api/videos/{id}"), None).await;
    assert_eq!(response.status(), 404);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Video not found");

    let response = send(&app, "POST", &format!("/api/videos/{id}/view")).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_catalogued_empty_file_is_not_found() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;

    let uploaded = body_json(send(&app, "POST", "/api/upload-test-video").await).await;
    let id = uploaded["id"].as_str().unwrap();
    let filename = uploaded["filename"].as_str().unwrap();
    fixture.add_video(filename, b"");

    let response = get(&app, &format!("/api/videos/{id}"), None).await;
    assert_eq!(response.status(), 404);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Video file is empty or corrupted");
}

#[tokio::test]
async fn test_failed_file_removal_keeps_record() {
    let (fixture, app) = test_app(RangePolicy::Lenient).await;

    let uploaded = body_json(send(&app, "POST", "/api/upload-test-video").await).await;
    let id = uploaded["id"].as_str().unwrap();
    let filename = uploaded["filename"].as_str().unwrap();

    // A non-empty directory in place of the file makes removal fail
    let stored = fixture.root().videos_dir().join(filename);
    std::fs::remove_file(&stored).unwrap();
    std::fs::create_dir(&stored).unwrap();
    std::fs::write(stored.join("chunk"), b"x").unwrap();

    let response = send(&app, "DELETE", &format!("/api/videos/{id}")).await;
    assert_eq!(response.status(), 500);

    let catalog = body_json(get(&app, "/api/catalog", None).await).await;
    assert_eq!(catalog["count"], 1);
    assert_eq!(catalog["videos"][0]["id"], id);
    assert!(stored.exists());
}
