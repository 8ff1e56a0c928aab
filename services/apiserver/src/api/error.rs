//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error construction so every failure mode of the
//! enumeration endpoint has one status, one stable `code`, and one message.
//!
//! # Key invariants and assumptions
//! - Error bodies are rendered in the same codec as the request.
//! - Status codes must align with the error category:
//!   `malformed_request`, `validation_error`, `invalid_criterion` are 400;
//!   `retrieval_failed` is 500.
//!
//! # Security considerations
//! - Rejected criteria are never echoed back; they are logged at debug level.
//! - Source failures are logged server-side and replaced by a generic message.
use crate::api::codec::Codec;
use crate::api::types::ErrorResponse;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use grantscope_rbac::{RbacError, SourceError};

pub const MALFORMED_REQUEST_MESSAGE: &str = "could not parse request";
pub const INVALID_CRITERION_MESSAGE: &str = "invalid regular expression or subject name";
pub const RETRIEVAL_FAILED_MESSAGE: &str = "could not retrieve role bindings";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Caller-supplied request id, if present and printable.
///
/// Empty, non-ASCII, or over-long values are ignored.
pub fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use apiserver::api::codec::Codec;
/// use apiserver::api::error::api_validation_error;
///
/// let err = api_validation_error(Codec::Json, "missing namespace in request");
/// assert_eq!(err.body.code, "validation_error");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
    pub codec: Codec,
}

impl ApiError {
    fn new(codec: Codec, status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                request_id: None,
            },
            codec,
        }
    }

    /// Echo the caller's request id in the error body.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.body.request_id = request_id;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.codec.render(self.status, &self.body)
    }
}

/// Build a 400 for a body that does not decode in its declared format.
pub fn api_malformed_request(codec: Codec) -> ApiError {
    ApiError::new(
        codec,
        StatusCode::BAD_REQUEST,
        "malformed_request",
        MALFORMED_REQUEST_MESSAGE,
    )
}

/// Build a 400 for a decoded request missing a required field.
pub fn api_validation_error(codec: Codec, message: &str) -> ApiError {
    ApiError::new(codec, StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Build a 400 for a criterion that is neither a subject name nor a valid
/// regular expression.
pub fn api_invalid_criterion(codec: Codec) -> ApiError {
    ApiError::new(
        codec,
        StatusCode::BAD_REQUEST,
        "invalid_criterion",
        INVALID_CRITERION_MESSAGE,
    )
}

/// Build a 500 from a source failure.
///
/// # What it does
/// Logs the source error and returns a generic retrieval error.
pub fn api_retrieval_failed(codec: Codec, err: &SourceError) -> ApiError {
    tracing::error!(error = %err, "role binding retrieval failed");
    ApiError::new(
        codec,
        StatusCode::INTERNAL_SERVER_ERROR,
        "retrieval_failed",
        RETRIEVAL_FAILED_MESSAGE,
    )
}

/// Map an enumeration error onto its HTTP shape.
pub fn api_rbac_error(codec: Codec, err: RbacError) -> ApiError {
    match err {
        RbacError::InvalidCriterion(criterion) => {
            tracing::debug!(%criterion, "rejected subject criterion");
            api_invalid_criterion(codec)
        }
        RbacError::RetrievalFailed(source) => api_retrieval_failed(codec, &source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let malformed = api_malformed_request(Codec::Json);
        assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
        assert_eq!(malformed.body.code, "malformed_request");
        assert_eq!(malformed.body.message, "could not parse request");

        let validation = api_validation_error(Codec::Yaml, "missing namespace in request");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
        assert_eq!(validation.codec, Codec::Yaml);

        let invalid = api_invalid_criterion(Codec::Json);
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body.code, "invalid_criterion");
    }

    #[test]
    fn rbac_errors_map_to_status_without_echoing_input() {
        let invalid = api_rbac_error(
            Codec::Json,
            RbacError::InvalidCriterion("<script>[[".to_string()),
        );
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert!(!invalid.body.message.contains("<script>"));

        let retrieval = api_rbac_error(
            Codec::Json,
            RbacError::RetrievalFailed(SourceError::Rejected {
                status: 403,
                message: "secret upstream detail".to_string(),
            }),
        );
        assert_eq!(retrieval.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(retrieval.body.code, "retrieval_failed");
        assert_eq!(retrieval.body.message, "could not retrieve role bindings");
    }

    #[test]
    fn request_id_is_read_from_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id_from_headers(&headers), None);

        headers.insert(REQUEST_ID_HEADER, " req-42 ".parse().expect("header"));
        assert_eq!(request_id_from_headers(&headers).as_deref(), Some("req-42"));

        headers.insert(REQUEST_ID_HEADER, "".parse().expect("header"));
        assert_eq!(request_id_from_headers(&headers), None);

        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, long.parse().expect("header"));
        assert_eq!(request_id_from_headers(&headers), None);

        let err = api_malformed_request(Codec::Json).with_request_id(Some("req-1".into()));
        assert_eq!(err.body.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn error_renders_in_request_codec() {
        let response = api_validation_error(Codec::Yaml, "missing subject names in request")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: ErrorResponse = serde_yaml::from_slice(&bytes).expect("yaml");
        assert_eq!(body.message, "missing subject names in request");
    }
}
