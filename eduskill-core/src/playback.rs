//! Client playback fallback
//!
//! A player loading a video tries an ordered list of equivalent URLs. When
//! the media element reports an error the controller names the next URL to
//! try; once the list runs out the player shows a terminal error with a
//! manual retry and a direct download link. Deciding the next candidate never
//! touches the network.

use url::Url;

use crate::config::PlaybackConfig;

/// Path prefix of the streaming endpoint.
pub const STREAM_ENDPOINT: &str = "video";

/// Path prefix of the static-file endpoint for videos.
pub const STATIC_ENDPOINT: &str = "uploads/videos";

/// Errors from candidate construction and playback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Stored reference was empty
    #[error("Video has no file reference")]
    EmptyReference,

    /// A candidate URL could not be formed
    #[error("Invalid candidate URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Every candidate failed to play
    #[error("Playback failed after trying {attempted} sources")]
    Exhausted {
        /// Number of candidates tried
        attempted: usize,
    },
}

/// Result of a playback error on the current source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackStep {
    /// Swap the player source to this URL and reload
    Next(Url),
    /// No candidate left
    Exhausted,
}

/// Ordered, non-empty list of URLs for the same media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    urls: Vec<Url>,
}

impl CandidateList {
    /// Wrap an ordered list of URLs.
    ///
    /// Returns `None` for an empty list.
    pub fn new(urls: Vec<Url>) -> Option<Self> {
        if urls.is_empty() {
            None
        } else {
            Some(Self { urls })
        }
    }

    /// Preferred candidate
    pub fn first(&self) -> &Url {
        &self.urls[0]
    }

    /// Candidate at `index`
    pub fn get(&self, index: usize) -> Option<&Url> {
        self.urls.get(index)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false; the list holds at least one URL
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Candidates in preference order
    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.urls.iter()
    }

    /// Index of `url` in the list
    pub fn position(&self, url: &Url) -> Option<usize> {
        self.urls.iter().position(|candidate| candidate == url)
    }

    /// Candidates as strings, for JSON responses
    pub fn to_strings(&self) -> Vec<String> {
        self.urls.iter().map(Url::to_string).collect()
    }
}

/// Choose what to play after `current_url` failed.
///
/// # Examples
/// ```
/// use eduskill_core::playback::{FallbackStep, PlaybackEndpoints, on_playback_error};
/// let endpoints = PlaybackEndpoints::new(
///     "http://h1".parse().unwrap(),
///     "http://h2".parse().unwrap(),
/// );
/// let candidates = endpoints.build_candidates("videos/abc.mp4").unwrap();
/// let step = on_playback_error("http://h1/video/abc.mp4", &candidates);
/// assert_eq!(
///     step,
///     FallbackStep::Next("http://h1/uploads/videos/abc.mp4".parse().unwrap())
/// );
/// ```
pub fn on_playback_error(current_url: &str, candidates: &CandidateList) -> FallbackStep {
    let Ok(current) = Url::parse(current_url) else {
        return FallbackStep::Exhausted;
    };

    match candidates.position(&current) {
        Some(index) => match candidates.get(index + 1) {
            Some(next) => FallbackStep::Next(next.clone()),
            None => FallbackStep::Exhausted,
        },
        None => FallbackStep::Exhausted,
    }
}

/// Primary and backup hosts the player can load media from.
#[derive(Debug, Clone)]
pub struct PlaybackEndpoints {
    primary: Url,
    backup: Url,
}

impl PlaybackEndpoints {
    /// Create endpoints from host base URLs
    pub fn new(primary: Url, backup: Url) -> Self {
        Self {
            primary: with_trailing_slash(primary),
            backup: with_trailing_slash(backup),
        }
    }

    /// Create endpoints from configuration
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.primary_host.clone(), config.backup_host.clone())
    }

    /// Build the ordered candidate list for a stored file reference.
    ///
    /// Absolute `http(s)` references are used as-is with no fallback.
    /// Relative references yield, in order: streaming endpoint, static
    /// endpoint and literal path on the primary host, then streaming and
    /// static endpoints on the backup host.
    ///
    /// # Errors
    /// - `PlaybackError::EmptyReference` - Reference is empty
    /// - `PlaybackError::InvalidUrl` - A candidate could not be joined onto a host
    pub fn build_candidates(&self, file_reference: &str) -> Result<CandidateList, PlaybackError> {
        if let Some(absolute) = parse_absolute(file_reference) {
            return Ok(CandidateList { urls: vec![absolute] });
        }

        let filename = extract_filename(file_reference)?;
        let encoded = urlencoding::encode(filename);
        let literal = encode_path(file_reference.trim_start_matches('/'));

        let urls = vec![
            self.primary.join(&format!("{STREAM_ENDPOINT}/{encoded}"))?,
            self.primary.join(&format!("{STATIC_ENDPOINT}/{encoded}"))?,
            self.primary.join(&literal)?,
            self.backup.join(&format!("{STREAM_ENDPOINT}/{encoded}"))?,
            self.backup.join(&format!("{STATIC_ENDPOINT}/{encoded}"))?,
        ];

        Ok(CandidateList { urls })
    }

    /// Link offered for direct download once playback is exhausted.
    ///
    /// # Errors
    /// - `PlaybackError::EmptyReference` - Reference is empty
    /// - `PlaybackError::InvalidUrl` - URL could not be joined onto the primary host
    pub fn direct_download_url(&self, file_reference: &str) -> Result<Url, PlaybackError> {
        if let Some(absolute) = parse_absolute(file_reference) {
            return Ok(absolute);
        }

        let filename = extract_filename(file_reference)?;
        let encoded = urlencoding::encode(filename);
        Ok(self.primary.join(&format!("{STREAM_ENDPOINT}/{encoded}"))?)
    }

    /// Start a playback session for a stored file reference.
    ///
    /// # Errors
    /// - `PlaybackError::EmptyReference` - Reference is empty
    /// - `PlaybackError::InvalidUrl` - A candidate could not be formed
    pub fn open_session(&self, file_reference: &str) -> Result<PlaybackSession, PlaybackError> {
        let candidates = self.build_candidates(file_reference)?;
        let download_url = self.direct_download_url(file_reference)?;
        Ok(PlaybackSession::new(candidates, download_url))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_absolute(reference: &str) -> Option<Url> {
    Url::parse(reference)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Percent-encode each segment so a reference always joins as a relative path.
fn encode_path(reference: &str) -> String {
    reference
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn extract_filename(reference: &str) -> Result<&str, PlaybackError> {
    let filename = reference.rsplit('/').next().unwrap_or_default();
    if filename.is_empty() {
        return Err(PlaybackError::EmptyReference);
    }
    Ok(filename)
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Playing or loading the candidate at this index
    Trying(usize),
    /// Every candidate failed; show the error panel
    Exhausted,
}

/// Per-load fallback state for one player.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    candidates: CandidateList,
    download_url: Url,
    state: SessionState,
}

impl PlaybackSession {
    /// Start at the first candidate
    pub fn new(candidates: CandidateList, download_url: Url) -> Self {
        Self {
            candidates,
            download_url,
            state: SessionState::Trying(0),
        }
    }

    /// Source the player should be loading, or `None` once exhausted
    pub fn current(&self) -> Option<&Url> {
        match self.state {
            SessionState::Trying(index) => self.candidates.get(index),
            SessionState::Exhausted => None,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the error panel should be shown
    pub fn is_exhausted(&self) -> bool {
        self.state == SessionState::Exhausted
    }

    /// Candidate list for this load
    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Direct download link for the error panel
    pub fn download_url(&self) -> &Url {
        &self.download_url
    }

    /// Record a media error on the current source and move to the next one.
    ///
    /// # Errors
    /// - `PlaybackError::Exhausted` - No candidate left; the session stays exhausted until [`retry`](Self::retry)
    pub fn fail(&mut self) -> Result<&Url, PlaybackError> {
        let exhausted = PlaybackError::Exhausted {
            attempted: self.candidates.len(),
        };

        let SessionState::Trying(index) = self.state else {
            return Err(exhausted);
        };

        match self.candidates.get(index + 1) {
            Some(next) => {
                tracing::info!(
                    "Trying next URL ({}/{}): {}",
                    index + 2,
                    self.candidates.len(),
                    next
                );
                self.state = SessionState::Trying(index + 1);
                Ok(next)
            }
            None => {
                tracing::warn!("All {} playback sources failed", self.candidates.len());
                self.state = SessionState::Exhausted;
                Err(exhausted)
            }
        }
    }

    /// Restart from the first candidate after a manual retry.
    pub fn retry(&mut self) -> &Url {
        self.state = SessionState::Trying(0);
        self.candidates.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> PlaybackEndpoints {
        PlaybackEndpoints::new(
            Url::parse("http://h1").unwrap(),
            Url::parse("http://h2").unwrap(),
        )
    }

    #[test]
    fn test_candidates_for_relative_reference() {
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
    fn test_candidates_for_leading_slash_and_bare_name() {
        let candidates = endpoints().build_candidates("/videos/abc.mp4").unwrap();
        assert_eq!(candidates.get(2).unwrap().as_str(), "http://h1/videos/abc.mp4");

        let candidates = endpoints().build_candidates("abc.mp4").unwrap();
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates.get(2).unwrap().as_str(), "http://h1/abc.mp4");
    }

    #[test]
    fn test_colon_in_filename_stays_on_primary_host() {
        let candidates = endpoints().build_candidates("lesson:1.mp4").unwrap();

        assert_eq!(
            candidates.to_strings(),
            vec![
                "http://h1/video/lesson%3A1.mp4",
                "http://h1/uploads/videos/lesson%3A1.mp4",
                "http://h1/lesson%3A1.mp4",
                "http://h2/video/lesson%3A1.mp4",
                "http://h2/uploads/videos/lesson%3A1.mp4",
            ]
        );

        let candidates = endpoints().build_candidates("videos/lesson:1.mp4").unwrap();
        assert_eq!(
            candidates.get(2).unwrap().as_str(),
            "http://h1/videos/lesson%3A1.mp4"
        );
    }

    #[test]
    fn test_candidates_for_absolute_url() {
        let candidates = endpoints()
            .build_candidates("https://cdn.example/videos/abc.mp4")
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates.first().as_str(),
            "https://cdn.example/videos/abc.mp4"
        );
    }

    #[test]
    fn test_hosts_with_base_path() {
        let endpoints = PlaybackEndpoints::new(
            Url::parse("http://h1/media").unwrap(),
            Url::parse("http://h2:5002/").unwrap(),
        );
        let candidates = endpoints.build_candidates("videos/abc.mp4").unwrap();
        assert_eq!(candidates.first().as_str(), "http://h1/media/video/abc.mp4");
        assert_eq!(
            candidates.get(3).unwrap().as_str(),
            "http://h2:5002/video/abc.mp4"
        );
    }

    #[test]
    fn test_empty_reference_rejected() {
        assert_eq!(
            endpoints().build_candidates("").unwrap_err(),
            PlaybackError::EmptyReference
        );
        assert_eq!(
            endpoints().build_candidates("videos/").unwrap_err(),
            PlaybackError::EmptyReference
        );
    }

    #[test]
    fn test_on_playback_error_advances() {
        let candidates = endpoints().build_candidates("videos/abc.mp4").unwrap();

        let step = on_playback_error("http://h1/uploads/videos/abc.mp4", &candidates);
        assert_eq!(
            step,
            FallbackStep::Next(Url::parse("http://h1/videos/abc.mp4").unwrap())
        );

        let step = on_playback_error("http://h2/uploads/videos/abc.mp4", &candidates);
        assert_eq!(step, FallbackStep::Exhausted);

        let step = on_playback_error("http://elsewhere/abc.mp4", &candidates);
        assert_eq!(step, FallbackStep::Exhausted);

        let step = on_playback_error("not a url", &candidates);
        assert_eq!(step, FallbackStep::Exhausted);
    }

    #[test]
    fn test_session_walks_candidates_then_exhausts() {
        let mut session = endpoints().open_session("videos/abc.mp4").unwrap();
        assert_eq!(session.state(), SessionState::Trying(0));
        assert_eq!(session.current().unwrap().as_str(), "http://h1/video/abc.mp4");

        for expected in 1..5 {
            let next = session.fail().unwrap().clone();
            assert_eq!(&next, session.candidates().get(expected).unwrap());
        }

        let err = session.fail().unwrap_err();
        assert_eq!(err, PlaybackError::Exhausted { attempted: 5 });
        assert!(session.is_exhausted());
        assert!(session.current().is_none());
        // Stays exhausted until retried
        assert!(session.fail().is_err());
        assert_eq!(session.download_url().as_str(), "http://h1/video/abc.mp4");
    }

    #[test]
    fn test_session_retry_restarts() {
        let mut session = endpoints().open_session("videos/abc.mp4").unwrap();
        while session.fail().is_ok() {}
        assert!(session.is_exhausted());

        let first = session.retry().clone();
        assert_eq!(first.as_str(), "http://h1/video/abc.mp4");
        assert_eq!(session.state(), SessionState::Trying(0));
    }

    #[test]
    fn test_session_with_shared_host_still_exhausts() {
        let endpoints = PlaybackEndpoints::new(
            Url::parse("http://h1").unwrap(),
            Url::parse("http://h1").unwrap(),
        );
        let mut session = endpoints.open_session("videos/abc.mp4").unwrap();

        let mut advanced = 0;
        while session.fail().is_ok() {
            advanced += 1;
        }
        assert_eq!(advanced, 4);
        assert!(session.current().is_none());
    }

    #[test]
    fn test_absolute_reference_session_has_no_fallback() {
        let mut session = endpoints()
            .open_session("http://cdn.example/abc.mp4")
            .unwrap();
        assert_eq!(session.download_url().as_str(), "http://cdn.example/abc.mp4");
        assert_eq!(
            session.fail().unwrap_err(),
            PlaybackError::Exhausted { attempted: 1 }
        );
    }
}
