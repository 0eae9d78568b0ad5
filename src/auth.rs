//! Request authentication: static shared secret and HMAC body signature

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::RelayConfig;
use crate::error::{RelayError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Heroku-Webhook-Hmac-SHA256";

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compare the `Authorization` header with the configured shared secret.
/// A missing header counts as a mismatch.
pub fn verify_authorization(expected: &str, headers: &HeaderMap) -> Result<()> {
    let supplied = headers.get(AUTHORIZATION).map(|v| v.as_bytes());
    match supplied {
        Some(supplied) if constant_time_eq(supplied, expected.as_bytes()) => Ok(()),
        Some(_) => {
            warn!("Authorization header does not match");
            Err(RelayError::Unauthorized)
        }
        None => {
            warn!("Authorization header missing");
            Err(RelayError::Unauthorized)
        }
    }
}

/// Base64 HMAC-SHA256 digest of `body` keyed with `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayError::ConfigError(format!("Invalid WEBHOOK_SECRET: {}", e)))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Check the signature header against the HMAC of the exact raw body.
pub fn verify_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let Some(supplied) = headers.get(SIGNATURE_HEADER) else {
        warn!(header = SIGNATURE_HEADER, "Webhook signature header missing");
        return Err(RelayError::InvalidSignature);
    };

    let calculated = compute_signature(secret, body)?;
    if constant_time_eq(calculated.as_bytes(), supplied.as_bytes()) {
        Ok(())
    } else {
        warn!("Webhook signature verification failed");
        Err(RelayError::InvalidSignature)
    }
}

/// Run whichever checks are configured, shared secret first.
pub fn authenticate(config: &RelayConfig, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    if let Some(expected) = &config.authorization {
        verify_authorization(expected, headers)?;
    }
    if let Some(secret) = &config.webhook_secret {
        verify_signature(secret, headers, body)?;
    }
    Ok(())
}
