//! CLI command implementations

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Subcommand;
use eduskill_core::config::EduskillConfig;
use eduskill_core::{MediaRoot, PlaybackEndpoints, RangePolicy, Result};
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the media server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding videos/ and thumbnails/
        #[arg(long)]
        media_root: Option<PathBuf>,
        /// Answer out-of-bounds ranges with 416 instead of the full file
        #[arg(long)]
        strict_ranges: bool,
    },
    /// Print the URLs a player would try for a stored file, in order
    Candidates {
        /// Stored filename, `videos/<name>` path, or absolute URL
        reference: String,
    },
    /// List stored video files
    List {
        /// Directory holding videos/ and thumbnails/
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve {
            host,
            port,
            media_root,
            strict_ranges,
        } => serve(host, port, media_root, strict_ranges).await,
        Commands::Candidates { reference } => show_candidates(&reference),
        Commands::List { media_root } => list_videos(media_root).await,
    }
}

/// Start the media server with command-line overrides on top of the
/// environment configuration.
///
/// # Errors
/// - `EduskillError::Io` - Media root setup or bind failed
pub async fn serve(
    host: Option<IpAddr>,
    port: Option<u16>,
    media_root: Option<PathBuf>,
    strict_ranges: bool,
) -> Result<()> {
    let mut config = EduskillConfig::from_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(root) = media_root {
        config.media.media_root = root;
    }
    if strict_ranges {
        config.media.range_policy = RangePolicy::Strict;
    }

    info!("Starting media server on {}", config.server.bind_addr());
    eduskill_web::run_server(config).await?;
    Ok(())
}

/// Print the ordered playback candidates and the download link.
///
/// # Errors
/// - `EduskillError::Playback` - Empty reference or unusable host URL
pub fn show_candidates(reference: &str) -> Result<()> {
    let config = EduskillConfig::from_env();
    let endpoints = PlaybackEndpoints::from_config(&config.playback);

    let candidates = endpoints.build_candidates(reference)?;
    println!("Playback candidates for {reference}");
    println!("{:-<60}", "");
    for (index, url) in candidates.iter().enumerate() {
        println!("{:>2}. {url}", index + 1);
    }

    let download = endpoints.direct_download_url(reference)?;
    println!("\nDirect download: {download}");
    Ok(())
}

/// List the files stored under the media root.
///
/// # Errors
/// - `EduskillError::Io` - Videos directory could not be read
pub async fn list_videos(media_root: Option<PathBuf>) -> Result<()> {
    let mut config = EduskillConfig::from_env();
    if let Some(root) = media_root {
        config.media.media_root = root;
    }

    let root = MediaRoot::new(&config.media.media_root);
    let files = root.list_video_files().await?;

    println!("Stored videos in {}", root.videos_dir().display());
    println!("{:-<60}", "");
    if files.is_empty() {
        println!("No videos stored yet.");
        println!("Use 'eduskill serve' and POST /api/upload-test-video to add one.");
    } else {
        for filename in &files {
            println!("{filename}");
        }
        println!("\n{} video(s)", files.len());
    }
    Ok(())
}
