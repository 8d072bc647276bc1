//! Centralized configuration for EduSkill.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;
use url::Url;

use crate::delivery::RangePolicy;

/// Central configuration for all EduSkill components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct EduskillConfig {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub playback: PlaybackConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the media server binds to
    pub host: IpAddr,
    /// Port the media server binds to
    pub port: u16,
}

impl ServerConfig {
    /// Socket address assembled from host and port.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5001,
        }
    }
}

/// Media storage and delivery configuration.
///
/// Controls where uploaded files live and how range requests are
/// interpreted when they are malformed.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory holding the `videos/` and `thumbnails/` subdirectories
    pub media_root: PathBuf,
    /// Decision point for malformed or out-of-bounds ranges
    pub range_policy: RangePolicy,
    /// Read buffer size for streamed response bodies
    pub stream_buffer_size: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("uploads"),
            range_policy: RangePolicy::Lenient,
            stream_buffer_size: 65536, // 64 KiB
        }
    }
}

/// Hosts used to build playback candidate URLs.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Host tried first for every endpoint
    pub primary_host: Url,
    /// Host tried after every primary endpoint failed
    pub backup_host: Url,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            primary_host: local_host_url(5001),
            backup_host: local_host_url(5002),
        }
    }
}

fn local_host_url(port: u16) -> Url {
    let mut url = Url::parse("http://localhost/").expect("static URL literal is valid");
    // http URLs always accept a port
    let _ = url.set_port(Some(port));
    url
}

impl EduskillConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparsable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("EDUSKILL_HOST") {
            match host.parse::<IpAddr>() {
                Ok(addr) => config.server.host = addr,
                Err(_) => warn!("Ignoring invalid EDUSKILL_HOST: {host}"),
            }
        }

        if let Ok(port) = std::env::var("EDUSKILL_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid EDUSKILL_PORT: {port}"),
            }
        }

        if let Ok(root) = std::env::var("EDUSKILL_MEDIA_ROOT") {
            config.media.media_root = PathBuf::from(root);
        }

        if let Ok(strict) = std::env::var("EDUSKILL_STRICT_RANGES") {
            match strict.parse::<bool>() {
                Ok(true) => config.media.range_policy = RangePolicy::Strict,
                Ok(false) => config.media.range_policy = RangePolicy::Lenient,
                Err(_) => warn!("Ignoring invalid EDUSKILL_STRICT_RANGES: {strict}"),
            }
        }

        if let Ok(primary) = std::env::var("EDUSKILL_PRIMARY_HOST") {
            match Url::parse(&primary) {
                Ok(url) => config.playback.primary_host = url,
                Err(_) => warn!("Ignoring invalid EDUSKILL_PRIMARY_HOST: {primary}"),
            }
        }

        if let Ok(backup) = std::env::var("EDUSKILL_BACKUP_HOST") {
            match Url::parse(&backup) {
                Ok(url) => config.playback.backup_host = url,
                Err(_) => warn!("Ignoring invalid EDUSKILL_BACKUP_HOST: {backup}"),
            }
        }

        config
    }

    /// Creates a configuration rooted at a scratch directory for tests.
    pub fn for_testing(media_root: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                port: 0,
                ..Default::default()
            },
            media: MediaConfig {
                media_root: media_root.into(),
                stream_buffer_size: 4096,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
