//! Error types for the Mailman request builder.
//!
//! # Design
//! Construction-time failures are split by where they arise: `ConfigError`
//! while building `Options`, `PathError` while rendering a path template.
//! Both fold into `ApiError`, which also carries the response-side variants
//! used by the `parse_*` functions. Nothing here is retried; the core either
//! produces a complete request description or fails outright.

use thiserror::Error;

use crate::http::HttpMethod;

/// The endpoint configuration could not be turned into a usable base URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("options must contain an API endpoint URL string")]
    MissingEndpoint,

    #[error("invalid endpoint URL {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("malformed options: {0}")]
    MalformedOptions(String),
}

/// A path template could not be rendered from the current path values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment value did not match the validator registered for it.
    #[error("value {value:?} is not valid for path segment `{segment}`")]
    InvalidSegment { segment: String, value: String },

    /// A required (non-optional) placeholder had no value.
    #[error("required path segment `{segment}` has no value")]
    MissingSegment { segment: String },

    #[error("malformed path template {template:?}: {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// A sub-resource segment was set while the segment it hangs off was not.
    #[error("path segment `{segment}` requires `{parent}` to be set")]
    DetachedSubResource { segment: String, parent: String },
}

/// Errors returned by request building and response parsing.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Path(#[from] PathError),

    /// The requested HTTP method is outside the builder's legal method set.
    #[error("method {method} is not supported here (allowed: {})", join_methods(.allowed))]
    UnsupportedMethod {
        method: HttpMethod,
        allowed: Vec<HttpMethod>,
    },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 401; the credential pair was missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The server returned a status the parser did not expect.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}

fn join_methods(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_method_lists_allowed_methods() {
        let err = ApiError::UnsupportedMethod {
            method: HttpMethod::Delete,
            allowed: vec![HttpMethod::Head, HttpMethod::Get],
        };
        assert_eq!(
            err.to_string(),
            "method DELETE is not supported here (allowed: HEAD, GET)"
        );
    }

    #[test]
    fn path_errors_convert_into_api_error() {
        let err: ApiError = PathError::MissingSegment {
            segment: "listId".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Path(PathError::MissingSegment { .. })));
        assert_eq!(err.to_string(), "required path segment `listId` has no value");
    }
}
