pub use axum::http::StatusCode;

use axum::Json;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// -------------------------
// Response envelopes
// -------------------------

/// Success envelope returned by every generated REST route: `{"data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Failure body returned alongside the status picked by [`ResolverError::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -------------------------
// Resolver errors
// -------------------------

/// Error produced by a field resolver.
///
/// A resolver either fails with a plain domain error, which is reported as
/// `500 Internal Server Error`, or attaches the exact HTTP status the
/// caller should see (for example `404` when a looked-up record is missing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("{message}")]
    Domain { message: String },
    #[error("{message}")]
    DomainWithStatus { status: StatusCode, message: String },
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::DomainWithStatus {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    /// Status to report to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DomainWithStatus { status, .. } => *status,
        }
    }

    /// Whether a status was attached explicitly by the resolver.
    pub fn has_explicit_status(&self) -> bool {
        matches!(self, Self::DomainWithStatus { .. })
    }

    /// The wrapped message, without any status information.
    pub fn message(&self) -> &str {
        match self {
            Self::Domain { message } | Self::DomainWithStatus { message, .. } => message,
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody::new(self.message())
    }
}

impl IntoResponse for ResolverError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.to_error_body()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn plain_domain_error_defaults_to_internal_server_error() {
        let err = ResolverError::new("no plan found with ID '9'");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.has_explicit_status());
        assert_eq!(err.message(), "no plan found with ID '9'");
    }

    #[test]
    fn explicit_status_is_kept() {
        let err = ResolverError::not_found("no person found with ID '7'");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.has_explicit_status());
        assert_eq!(err.to_string(), "no person found with ID '7'");

        let teapot = ResolverError::with_status(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(teapot.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn error_into_response_sets_status_and_message_body() {
        let resp = ResolverError::bad_request("bad id").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_json(resp).await, json!({"message": "bad id"}));
    }

    #[tokio::test]
    async fn success_envelope_wraps_data() {
        let resp = ApiResponse::new(json!([{"id": "1"}])).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"data": [{"id": "1"}]}));
    }

    #[test]
    fn envelope_round_trips() {
        let value = json!({"id": "2", "person": "1", "account": "1", "type": "admin"});
        let encoded = serde_json::to_string(&ApiResponse::new(value.clone())).unwrap();
        let decoded: ApiResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.into_data(), value);
    }
}
