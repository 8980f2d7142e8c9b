//! Request builder for the Mailman 3 REST API.
//!
//! # Overview
//! Callers chain mutators on a resource builder to pick a resource, a
//! roster and query parameters, then ask it for an `HttpRequest`. The core
//! never touches the network (host-does-IO pattern): the caller executes the
//! request and hands the `HttpResponse` back to a `parse_*` method.
//!
//! ```
//! use mailman_core::{HttpMethod, MailmanClient, Resource};
//!
//! let client = MailmanClient::site("http://localhost:8001/3.1").unwrap();
//! let mut lists = client.lists();
//! lists.list_id("ant.example.com").members(None).param("count", 10);
//!
//! let req = lists.get().unwrap();
//! assert_eq!(req.method, HttpMethod::Get);
//! assert_eq!(
//!     req.uri,
//!     "http://localhost:8001/3.1/lists/ant.example.com/roster/member?count=10"
//! );
//! assert!(lists.delete().is_err());
//! ```
//!
//! # Design
//! - `template` expands path templates with optional groups and validates
//!   segment values.
//! - `query` accumulates parameters and filters and renders the canonical
//!   query string.
//! - `resource` composes both behind the `Resource` trait; `lists` is the
//!   concrete builder and derives its legal method set from its path values.
//! - `client` is the factory and response parser.

pub mod client;
pub mod error;
pub mod http;
pub mod lists;
pub mod options;
pub mod query;
pub mod resource;
pub mod template;
pub mod types;

pub use client::MailmanClient;
pub use error::{ApiError, ConfigError, PathError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use lists::{ListsRequest, ListsState, Role};
pub use options::{Credentials, Options};
pub use query::{ParamValue, Query, Scalar};
pub use resource::{RequestParts, Resource};
pub use template::{PathTemplate, PathValues, SegmentValidators};
pub use types::{CreateList, MailingList, Member, Page, UpdateList};
