//! Integration tests for EduSkill
//!
//! These tests drive the assembled router in-process and check the HTTP
//! contract the player relies on: range responses, the static alternate,
//! the JSON API, and the candidate order used for fallback.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/range_delivery.rs"]
mod range_delivery;

#[path = "integration/static_alternate.rs"]
mod static_alternate;

#[path = "integration/api.rs"]
mod api;

#[path = "integration/playback_fallback.rs"]
mod playback_fallback;
