//! Behavior shared by every resource builder.
//!
//! # Design
//! A concrete builder owns a `RequestParts` (options, template, validators,
//! path values, query) and implements `Resource` to say which methods are
//! legal for its current path values. Everything else comes from the trait's
//! provided methods: the chainable query mutators, path and URI rendering,
//! and `build`, which refuses a method outside the legal set before any
//! request leaves the core.
//!
//! Mutators take `&mut self`, so one builder cannot be changed from two
//! places at once. Rendering takes `&self`, never mutates, and can be
//! repeated or run from several threads against the same state.

use serde::Serialize;

use crate::error::{ApiError, PathError};
use crate::http::{HttpMethod, HttpRequest};
use crate::options::Options;
use crate::query::{ParamValue, Query};
use crate::template::{PathTemplate, PathValues, SegmentValidators};

/// Accumulated state of one request under construction.
#[derive(Debug, Clone)]
pub struct RequestParts {
    options: Options,
    template: &'static PathTemplate,
    validators: &'static SegmentValidators,
    path: PathValues,
    query: Query,
}

impl RequestParts {
    pub fn new(
        options: Options,
        template: &'static PathTemplate,
        validators: &'static SegmentValidators,
    ) -> Self {
        Self {
            options,
            template,
            validators,
            path: template.empty_values(),
            query: Query::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn template(&self) -> &PathTemplate {
        self.template
    }

    pub fn path_values(&self) -> &PathValues {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn segment(&self, name: &str) -> Option<&str> {
        self.path.get(name).and_then(|v| v.as_deref())
    }

    /// Set or clear a path segment. Empty strings count as unset.
    pub fn set_segment(&mut self, name: &str, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        self.path.insert(name.to_string(), value);
    }

    pub fn render_path(&self) -> Result<String, PathError> {
        self.template.render(&self.path, self.validators)
    }
}

/// A resource builder: path state, query state and a legal method set.
pub trait Resource {
    fn parts(&self) -> &RequestParts;

    fn parts_mut(&mut self) -> &mut RequestParts;

    /// Methods permitted for the current path values.
    fn legal_methods(&self) -> &'static [HttpMethod];

    /// Cross-segment checks run before the template is rendered.
    fn check_path(&self) -> Result<(), PathError> {
        Ok(())
    }

    fn allows(&self, method: HttpMethod) -> bool {
        self.legal_methods().contains(&method)
    }

    /// Replace a query parameter.
    fn param(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self
    where
        Self: Sized,
    {
        self.parts_mut().query_mut().set_param(key, value, false);
        self
    }

    /// Merge a value into a query parameter, see [`Query::set_param`].
    fn merge_param(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self
    where
        Self: Sized,
    {
        self.parts_mut().query_mut().set_param(key, value, true);
        self
    }

    fn params<I, K, V>(&mut self, pairs: I, merge: bool) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.parts_mut().query_mut().set_params(pairs, merge);
        self
    }

    fn filter(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self
    where
        Self: Sized,
    {
        self.parts_mut().query_mut().set_filter(key, value);
        self
    }

    fn filters<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.parts_mut().query_mut().set_filters(pairs);
        self
    }

    /// Rendered path relative to the endpoint, without the query.
    fn path(&self) -> Result<String, ApiError> {
        self.check_path()?;
        Ok(self.parts().render_path()?)
    }

    /// Absolute URI: endpoint, path and canonical query string.
    fn uri(&self) -> Result<String, ApiError> {
        let parts = self.parts();
        let path = self.path()?;
        Ok(format!(
            "{}{}{}",
            parts.options().endpoint(),
            path,
            parts.query().render()
        ))
    }

    /// Describe a request for `method`, failing if the method is not legal
    /// in the current state.
    fn build(&self, method: HttpMethod, body: Option<String>) -> Result<HttpRequest, ApiError> {
        if !self.allows(method) {
            tracing::warn!(%method, allowed = ?self.legal_methods(), "method refused");
            return Err(ApiError::UnsupportedMethod {
                method,
                allowed: self.legal_methods().to_vec(),
            });
        }
        let uri = self.uri()?;

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(credentials) = self.parts().options().credentials() {
            headers.push(("authorization".to_string(), credentials.basic_auth_header()));
        }
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        tracing::debug!(%method, %uri, "built request");
        Ok(HttpRequest {
            method,
            uri,
            headers,
            body,
        })
    }

    fn head(&self) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Head, None)
    }

    fn get(&self) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Get, None)
    }

    fn delete(&self) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Delete, None)
    }

    fn post<T: Serialize>(&self, body: &T) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Post, Some(to_json(body)?))
    }

    fn put<T: Serialize>(&self, body: &T) -> Result<HttpRequest, ApiError> {
        self.build(HttpMethod::Put, Some(to_json(body)?))
    }
}

fn to_json<T: Serialize>(body: &T) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))
}
