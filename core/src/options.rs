//! Endpoint and credential configuration.
//!
//! # Design
//! `Options` is validated once, when it is built, and is immutable after
//! that. Every resource builder receives its own copy. The stock Mailman
//! credentials are an explicit `Credentials::default()` value rather than a
//! global, so two clients never share hidden configuration.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

use crate::error::ConfigError;

pub const DEFAULT_USERNAME: &str = "restadmin";
pub const DEFAULT_PASSWORD: &str = "restpass";

/// Basic-auth credential pair passed through to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for an `authorization` header.
    pub fn basic_auth_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

/// Raw, unvalidated options as a host might deserialize them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptions {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    endpoint: String,
    credentials: Option<Credentials>,
}

impl Options {
    /// Validate `endpoint` and attach the default credentials.
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            credentials: Some(Credentials::default()),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Send requests without an `authorization` header.
    pub fn without_credentials(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Endpoint with exactly one trailing `/`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Parse options from JSON, filling missing credentials from
    /// `defaults` field by field.
    pub fn from_json(json: &str, defaults: &Credentials) -> Result<Self, ConfigError> {
        let raw: RawOptions =
            serde_json::from_str(json).map_err(|e| ConfigError::MalformedOptions(e.to_string()))?;
        Self::from_raw(raw, defaults)
    }

    pub fn from_raw(raw: RawOptions, defaults: &Credentials) -> Result<Self, ConfigError> {
        let endpoint = raw.endpoint.ok_or(ConfigError::MissingEndpoint)?;
        let credentials = Credentials {
            username: raw.username.unwrap_or_else(|| defaults.username.clone()),
            password: raw.password.unwrap_or_else(|| defaults.password.clone()),
        };
        Ok(Self::new(&endpoint)?.with_credentials(credentials))
    }
}

/// Check `endpoint` and give it exactly one trailing slash.
///
/// Absolute endpoints must be hierarchical URLs (`http://host/3.1`).
/// Relative ones (`/3.1`, `api/3.1`) are kept relative.
fn normalize_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingEndpoint);
    }
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        endpoint: trimmed.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }
    match Url::parse(trimmed) {
        Ok(url) if url.cannot_be_a_base() => {
            return Err(invalid("not a hierarchical URL (missing `//` after the scheme?)"));
        }
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(invalid(&e.to_string())),
    }
    Ok(format!("{}/", trimmed.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_exactly_one_trailing_slash() {
        for input in [
            "http://localhost:8001/3.1",
            "http://localhost:8001/3.1/",
            "http://localhost:8001/3.1//",
        ] {
            let options = Options::new(input).unwrap();
            assert_eq!(options.endpoint(), "http://localhost:8001/3.1/", "{input}");
        }
    }

    #[test]
    fn empty_endpoint_is_missing() {
        assert_eq!(Options::new("  ").unwrap_err(), ConfigError::MissingEndpoint);
    }

    #[test]
    fn relative_endpoints_are_accepted() {
        assert_eq!(Options::new("/3.1").unwrap().endpoint(), "/3.1/");
        assert_eq!(Options::new("api/3.1//").unwrap().endpoint(), "api/3.1/");
    }

    #[test]
    fn scheme_without_authority_is_rejected() {
        let err = Options::new("localhost:8001/3.1").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { ref endpoint, .. } if endpoint == "localhost:8001/3.1"));
        assert!(Options::new("mailto:admin@example.com").is_err());
    }

    #[test]
    fn endpoint_with_whitespace_is_rejected() {
        let err = Options::new("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn broken_absolute_endpoint_is_rejected() {
        assert!(matches!(
            Options::new("http://").unwrap_err(),
            ConfigError::InvalidEndpoint { .. }
        ));
    }

    #[test]
    fn default_credentials_are_attached() {
        let options = Options::new("http://localhost:8001/3.1").unwrap();
        assert_eq!(options.credentials(), Some(&Credentials::default()));
    }

    #[test]
    fn basic_auth_header_encodes_pair() {
        let creds = Credentials::new("restadmin", "restpass");
        assert_eq!(creds.basic_auth_header(), "Basic cmVzdGFkbWluOnJlc3RwYXNz");
    }

    #[test]
    fn from_json_merges_defaults_per_field() {
        let options = Options::from_json(
            r#"{"endpoint":"http://localhost:8001/3.1","username":"alice"}"#,
            &Credentials::default(),
        )
        .unwrap();
        let creds = options.credentials().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, DEFAULT_PASSWORD);
    }

    #[test]
    fn raw_options_are_the_deserializable_form() {
        let raw: RawOptions =
            serde_json::from_str(r#"{"endpoint":"/3.1","password":"hunter2"}"#).unwrap();
        let options = Options::from_raw(raw, &Credentials::default()).unwrap();
        assert_eq!(options.endpoint(), "/3.1/");
        assert_eq!(
            options.credentials(),
            Some(&Credentials::new(DEFAULT_USERNAME, "hunter2"))
        );
    }

    #[test]
    fn from_json_without_endpoint_fails() {
        let err = Options::from_json(r#"{"username":"alice"}"#, &Credentials::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);
    }
}
