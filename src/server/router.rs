use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::middleware;
use axum::routing::post;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::log_request;
use crate::server::AppState;
use crate::transfer::{download_file, preflight, upload_file, upload_method_not_allowed};

pub const UPLOAD_PATH: &str = "/upload";

/// Build the axum router: `/upload` for uploads, every other path is a
/// download.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            UPLOAD_PATH,
            post(upload_file)
                .options(preflight)
                .fallback(upload_method_not_allowed),
        )
        .fallback(download_file)
        // Upload size is enforced while streaming, not by the extractor
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(log_request))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(state)
}
