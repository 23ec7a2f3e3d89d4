//! Administrative endpoints.
//!
//! Served on the main listener under the `/.` prefix, which the request
//! logger excludes from the statistics.
//!
//! - `GET /.stats`  → sliding-window statistics snapshot
//! - `GET /.status` → gateway version and per-service status probes

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::{get_stats, get_status};
use crate::http::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/.stats", get(get_stats))
        .route("/.status", get(get_status))
}
