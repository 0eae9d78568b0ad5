//! HTTP surface of the relay
//!
//! A single route: the platform posts release events to `/`.

pub mod webhook;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing};

use crate::SharedState;

pub use webhook::handle_release_hook;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::post(handle_release_hook))
        // Every body must reach authentication; size is not a rejection reason
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
