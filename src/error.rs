use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of the single outbound hook call
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Hook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Hook endpoint answered with unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Custom error type for release_hook_relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Authorization header mismatch")]
    Unauthorized,

    #[error("Webhook signature missing or invalid")]
    InvalidSignature,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::FORBIDDEN,
            RelayError::InvalidSignature => StatusCode::BAD_REQUEST,
            RelayError::Dispatch(_) | RelayError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Callers only ever see the status; details stay in the logs.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_their_status() {
        assert_eq!(RelayError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            RelayError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        let dispatch = RelayError::from(DispatchError::UnexpectedStatus(StatusCode::BAD_GATEWAY));
        assert_eq!(dispatch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn response_body_is_empty() {
        let response = RelayError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
