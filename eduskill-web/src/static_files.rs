//! Static serving of the media root under `/uploads`
//!
//! The alternate playback endpoint. Files are served by `ServeDir`, which
//! handles ranges itself; this module only adds the no-caching headers and
//! pins the MP4 content type.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use eduskill_core::MediaRoot;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::handlers::range::apply_no_cache_headers;

/// Path prefix the media root is mounted under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Router serving every file below the media root at [`UPLOADS_PREFIX`].
pub fn uploads_router<S>(root: &MediaRoot) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let service = ServiceBuilder::new()
        .layer(middleware::from_fn(static_media_headers))
        .service(ServeDir::new(root.path()));

    Router::new().nest_service(UPLOADS_PREFIX, service)
}

async fn static_media_headers(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    debug!("Serving file: {path}");

    let is_mp4 = path.to_ascii_lowercase().ends_with(".mp4");
    let mut response = next.run(request).await;

    apply_no_cache_headers(response.headers_mut());
    if is_mp4 && response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    }

    response
}
