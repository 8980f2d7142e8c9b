//! Client entry point: starts resource builders and parses responses.
//!
//! # Design
//! `MailmanClient` holds only validated `Options` and carries no mutable
//! state between calls. `lists()` hands out a fresh builder with its own
//! copy of the options; the `parse_*` methods consume the `HttpResponse`
//! the host produced after executing a built request.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ConfigError};
use crate::http::HttpResponse;
use crate::lists::ListsRequest;
use crate::options::Options;
use crate::types::{MailingList, Member, Page};

#[derive(Debug, Clone)]
pub struct MailmanClient {
    options: Options,
}

impl MailmanClient {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Client for `endpoint` with the default credentials.
    pub fn site(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(Options::new(endpoint)?))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Start a request against `lists`.
    pub fn lists(&self) -> ListsRequest {
        ListsRequest::new(self.options.clone())
    }

    pub fn parse_lists(&self, response: HttpResponse) -> Result<Page<MailingList>, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<MailingList, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_roster(&self, response: HttpResponse) -> Result<Page<Member>, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_member(&self, response: HttpResponse) -> Result<Member, ApiError> {
        parse_json(&response, 200)
    }

    /// Parse a `POST` response; returns the `location` of the new resource
    /// when the server sent one.
    pub fn parse_created(&self, response: HttpResponse) -> Result<Option<String>, ApiError> {
        check_status(&response, 201)?;
        Ok(response.header("location").map(str::to_string))
    }

    /// Parse a `PUT`/`DELETE` response.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_head(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 200)
    }
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        s if s == expected => Ok(()),
        404 => Err(ApiError::NotFound),
        401 => Err(ApiError::Unauthorized),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::resource::Resource;

    fn client() -> MailmanClient {
        MailmanClient::site("http://localhost:8001/3.1").unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn site_requires_endpoint() {
        assert!(matches!(
            MailmanClient::site("").unwrap_err(),
            ConfigError::MissingEndpoint
        ));
    }

    #[test]
    fn lists_starts_from_a_fresh_builder() {
        let client = client();
        let mut first = client.lists();
        first.list_id("id1").members(None);
        let second = client.lists();
        assert_eq!(second.path().unwrap(), "lists");
        assert_eq!(second.options(), client.options());
    }

    #[test]
    fn build_list_lists_request() {
        let req = client().lists().get().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.uri, "http://localhost:8001/3.1/lists");
    }

    #[test]
    fn parse_lists_success() {
        let body = r#"{
            "start": 0, "total_size": 1,
            "entries": [{
                "list_id": "ant.example.com", "fqdn_listname": "ant@example.com",
                "list_name": "ant", "mail_host": "example.com", "member_count": 2
            }]
        }"#;
        let page = client().parse_lists(response(200, body)).unwrap();
        assert_eq!(page.total_size, 1);
        assert_eq!(page.entries[0].list_id, "ant.example.com");
        assert_eq!(page.entries[0].member_count, 2);
    }

    #[test]
    fn parse_list_not_found() {
        let err = client().parse_list(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_roster_unauthorized() {
        let err = client().parse_roster(response(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn parse_member_bad_json() {
        let err = client().parse_member(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_created_returns_location() {
        let resp = HttpResponse {
            status: 201,
            headers: vec![(
                "Location".to_string(),
                "http://localhost:8001/3.1/lists/ant.example.com".to_string(),
            )],
            body: String::new(),
        };
        let location = client().parse_created(resp).unwrap();
        assert_eq!(
            location.as_deref(),
            Some("http://localhost:8001/3.1/lists/ant.example.com")
        );
    }

    #[test]
    fn parse_empty_wrong_status() {
        let err = client().parse_empty(response(500, "boom")).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_head_success() {
        assert!(client().parse_head(response(200, "")).is_ok());
    }
}
