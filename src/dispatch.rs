//! Outbound deploy hook call

use axum::http::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::BodyEncoding;
use crate::error::{DispatchError, RelayError, Result};
use crate::payload::LegacyPayload;

/// Statuses the downstream receiver may answer with on success.
const ACCEPTED_STATUSES: [StatusCode; 2] = [StatusCode::OK, StatusCode::NO_CONTENT];

/// Posts a [`LegacyPayload`] to the resolved endpoint, once, with no retry.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    client: reqwest::Client,
    encoding: BodyEncoding,
}

impl HookDispatcher {
    pub fn new(encoding: BodyEncoding, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("release_hook_relay/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, encoding })
    }

    pub async fn dispatch(
        &self,
        url: &str,
        payload: &LegacyPayload,
    ) -> std::result::Result<(), DispatchError> {
        let request = self.client.post(url);
        // reqwest sets the matching Content-Type for both encodings
        let request = match self.encoding {
            BodyEncoding::Form => request.form(&payload.form_pairs()),
            BodyEncoding::Json => request.json(payload),
        };

        debug!(encoding = ?self.encoding, "Sending deploy hook");
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Deploy hook request failed");
            DispatchError::Transport(e)
        })?;

        let status = response.status();
        if ACCEPTED_STATUSES.contains(&status) {
            info!(%status, "Deploy hook delivered");
            Ok(())
        } else {
            warn!(%status, "Deploy hook rejected by receiver");
            Err(DispatchError::UnexpectedStatus(status))
        }
    }
}
