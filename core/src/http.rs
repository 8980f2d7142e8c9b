//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and parses `HttpResponse` values without
//! ever touching the network. The caller (host) executes the actual I/O,
//! including any retry or timeout policy.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

use std::fmt;

/// HTTP method for a request.
///
/// The declaration order is the order methods are listed in legal method
/// sets and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Head,
    Get,
    Put,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by a resource builder's `build` method. `uri` is absolute: the
/// normalized endpoint, the rendered path and the canonical query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the caller after executing an `HttpRequest`, then passed
/// to one of the `parse_*` functions.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_order_head_first() {
        let mut methods = vec![HttpMethod::Delete, HttpMethod::Get, HttpMethod::Head];
        methods.sort();
        assert_eq!(methods, vec![HttpMethod::Head, HttpMethod::Get, HttpMethod::Delete]);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 201,
            headers: vec![("Location".to_string(), "http://x/lists/a".to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("location"), Some("http://x/lists/a"));
        assert_eq!(response.header("etag"), None);
    }
}
