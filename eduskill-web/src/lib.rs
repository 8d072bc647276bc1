//! EduSkill Web - Media server and JSON API
//!
//! Streams stored lesson videos with byte-range support, serves the same
//! files statically under `/uploads`, and exposes catalog endpoints the
//! platform frontend uses to pick playback URLs.

#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod handlers;
pub mod server;
pub mod static_files;

// Re-export main types
pub use server::{AppState, build_router, run_server, serve_on};
