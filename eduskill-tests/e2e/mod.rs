//! End-to-end tests for EduSkill
//!
//! Starts the media server on a real socket and plays a stored video the
//! way a browser player does: try each candidate URL in order until one
//! loads, then seek with range requests.

use std::net::SocketAddr;

use eduskill_core::config::EduskillConfig;
use eduskill_core::playback::PlaybackEndpoints;
use eduskill_core::test_fixtures::{TestMediaRoot, patterned_bytes};
use eduskill_web::{AppState, serve_on};
use tokio::net::TcpListener;
use url::Url;

/// Address nothing listens on, used as an unreachable primary host.
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn start_server(config: &EduskillConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::from_config(config).await.unwrap();

    tokio::spawn(async move {
        serve_on(listener, state).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_player_falls_back_to_backup_host() {
    let fixture = TestMediaRoot::new();
    let data = patterned_bytes(50_000);
    fixture.add_video("lecture.mp4", &data);

    let config = EduskillConfig::for_testing(fixture.path());
    let server = start_server(&config).await;
    let dead = closed_addr().await;

    let endpoints = PlaybackEndpoints::new(
        Url::parse(&format!("http://{dead}")).unwrap(),
        Url::parse(&format!("http://{server}")).unwrap(),
    );
    let mut session = endpoints.open_session("videos/lecture.mp4").unwrap();
    let client = reqwest::Client::new();

    let mut failures = 0;
    let loaded = loop {
        let url = session.current().unwrap().clone();
        match client.get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => break url,
            _ => {
                failures += 1;
                session.fail().unwrap();
            }
        }
    };

    // Every primary candidate fails, the backup streaming endpoint loads
    assert_eq!(failures, 3);
    assert_eq!(loaded.as_str(), format!("http://{server}/video/lecture.mp4"));

    let response = client
        .get(loaded)
        .header("range", "bytes=40000-40999")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 206);
    assert_eq!(
        response.headers()["content-range"],
        "bytes 40000-40999/50000"
    );
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..], &data[40000..41000]);
}

#[tokio::test]
async fn test_full_download_over_socket() {
    let fixture = TestMediaRoot::new();
    let data = patterned_bytes(300_000);
    fixture.add_video("long.mp4", &data);

    let config = EduskillConfig::for_testing(fixture.path());
    let server = start_server(&config).await;

    let response = reqwest::get(format!("http://{server}/video/long.mp4"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.content_length(), Some(300_000));
    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), data.len());
    assert!(body[..] == data[..]);
}

#[tokio::test]
async fn test_all_candidates_unreachable_exhausts_session() {
    let dead = closed_addr().await;
    let endpoints = PlaybackEndpoints::new(
        Url::parse(&format!("http://{dead}")).unwrap(),
        Url::parse(&format!("http://{dead}")).unwrap(),
    );
    let mut session = endpoints.open_session("videos/missing.mp4").unwrap();
    let client = reqwest::Client::new();

    while let Some(url) = session.current().cloned() {
        assert!(client.get(url).send().await.is_err());
        if session.fail().is_err() {
            break;
        }
    }

    assert!(session.is_exhausted());
    assert_eq!(
        session.download_url().as_str(),
        format!("http://{dead}/video/missing.mp4")
    );
}
