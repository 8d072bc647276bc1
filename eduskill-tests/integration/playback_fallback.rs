//! Integration tests for playback candidate ordering and fallback

use eduskill_core::playback::{
    FallbackStep, PlaybackEndpoints, PlaybackError, SessionState, on_playback_error,
};
use proptest::prelude::*;
use url::Url;

fn endpoints() -> PlaybackEndpoints {
    PlaybackEndpoints::new(
        Url::parse("http://h1").unwrap(),
        Url::parse("http://h2").unwrap(),
    )
}

#[test]
fn test_candidate_order_for_stored_file() {
    let candidates = endpoints().build_candidates("videos/abc.mp4").unwrap();

    assert_eq!(
        candidates.to_strings(),
        vec![
            "http://h1/video/abc.mp4",
            "http://h1/uploads/videos/abc.mp4",
            "http://h1/videos/abc.mp4",
            "http://h2/video/abc.mp4",
            "http://h2/uploads/videos/abc.mp4",
        ]
    );
}

#[test]
fn test_fallback_from_second_and_last() {
    let candidates = endpoints().build_candidates("videos/abc.mp4").unwrap();

    assert_eq!(
        on_playback_error("http://h1/uploads/videos/abc.mp4", &candidates),
        FallbackStep::Next(Url::parse("http://h1/videos/abc.mp4").unwrap())
    );
    assert_eq!(
        on_playback_error("http://h2/uploads/videos/abc.mp4", &candidates),
        FallbackStep::Exhausted
    );
}

#[test]
fn test_filenames_are_percent_encoded() {
    let candidates = endpoints()
        .build_candidates("videos/week 1 intro.mp4")
        .unwrap();

    assert_eq!(
        candidates.first().as_str(),
        "http://h1/video/week%201%20intro.mp4"
    );
}

#[test]
fn test_retry_after_exhaustion_restarts_at_first() {
    let mut session = endpoints().open_session("videos/abc.mp4").unwrap();

    let mut tried = vec![session.current().unwrap().clone()];
    while let Ok(next) = session.fail() {
        tried.push(next.clone());
    }
    assert_eq!(tried.len(), 5);
    assert_eq!(
        session.fail().unwrap_err(),
        PlaybackError::Exhausted { attempted: 5 }
    );

    let restarted = session.retry().clone();
    assert_eq!(restarted, tried[0]);
    assert_eq!(session.state(), SessionState::Trying(0));
}

proptest! {
    #[test]
    fn prop_fallback_walks_candidates_in_order(name in "[a-z0-9_-]{1,16}\\.mp4") {
        let reference = format!("videos/{name}");
        let candidates = endpoints().build_candidates(&reference).unwrap();
        prop_assert_eq!(candidates.len(), 5);

        for index in 0..candidates.len() - 1 {
            let current = candidates.get(index).unwrap().as_str();
            let expected = candidates.get(index + 1).unwrap().clone();
            prop_assert_eq!(on_playback_error(current, &candidates), FallbackStep::Next(expected));
        }

        let last = candidates.get(candidates.len() - 1).unwrap().as_str();
        prop_assert_eq!(on_playback_error(last, &candidates), FallbackStep::Exhausted);
    }
}
