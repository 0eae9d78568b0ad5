//! Webhook handler for platform release events

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, error, info};

use crate::SharedState;
use crate::auth::authenticate;
use crate::endpoint;
use crate::error::Result;
use crate::payload::PayloadTransformer;
use crate::webhook::InboundEvent;

/// Handles the release webhook POST request.
///
/// Answers 204 whenever nothing upstream rejected the request, whether or not
/// a hook was forwarded. Authentication failures short-circuit before the
/// body is even parsed.
pub async fn handle_release_hook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    authenticate(&state.config, &headers, &body)?;

    // An unparsable body becomes an empty event and is filtered out below
    let event = InboundEvent::parse(&body);
    if !event.is_release_finished() {
        info!(
            action = ?event.action(),
            status = ?event.status(),
            current = ?event.is_current(),
            "Not a finished release; ignoring event"
        );
        return Ok(StatusCode::NO_CONTENT);
    }

    let Some(template) = state.config.http_endpoint.as_deref() else {
        debug!("HTTP_ENDPOINT not configured; nothing to forward");
        return Ok(StatusCode::NO_CONTENT);
    };

    let payload = PayloadTransformer::from_config(&state.config).transform(&event);
    let url = endpoint::resolve(template, &payload);

    info!(
        app = ?payload.app,
        head = ?payload.head,
        "Release finished; forwarding deploy hook"
    );
    if let Err(e) = state.dispatcher.dispatch(&url, &payload).await {
        error!(app = ?payload.app, error = %e, "Deploy hook dispatch failed");
        return Err(e.into());
    }

    Ok(StatusCode::NO_CONTENT)
}
