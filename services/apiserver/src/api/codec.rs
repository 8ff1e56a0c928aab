//! Content negotiation for request bodies and responses.
//!
//! # Purpose
//! Picks JSON or YAML from the request's `content-type` and uses that codec
//! for decoding the request and encoding the response, including errors.
//!
//! # Key invariants
//! - Any content type containing `yaml` (case-insensitive) selects YAML.
//! - Everything else, including a missing or non-UTF-8 header, selects JSON.
//! - An empty or whitespace-only body never decodes, whatever the codec.
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty body")]
    Empty,
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Codec {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let is_yaml = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("yaml"));
        if is_yaml { Self::Yaml } else { Self::Json }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
        }
    }

    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, CodecError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(CodecError::Empty);
        }
        match self {
            Self::Json => Ok(serde_json::from_slice(body)?),
            Self::Yaml => Ok(serde_yaml::from_slice(body)?),
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Json => Ok(serde_json::to_vec(value)?),
            Self::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
        }
    }

    /// Encode `value` into a response with a matching `content-type`.
    ///
    /// An encoding failure is logged and becomes an empty 500.
    pub fn render<T: Serialize>(self, status: StatusCode, value: &T) -> Response {
        match self.encode(value) {
            Ok(body) => (
                status,
                [(CONTENT_TYPE, HeaderValue::from_static(self.content_type()))],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode response body");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// A successful response rendered in the request's codec.
#[derive(Debug)]
pub struct Negotiated<T> {
    pub codec: Codec,
    pub status: StatusCode,
    pub value: T,
}

impl<T> Negotiated<T> {
    pub fn ok(codec: Codec, value: T) -> Self {
        Self {
            codec,
            status: StatusCode::OK,
            value,
        }
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        self.codec.render(self.status, &self.value)
    }
}
