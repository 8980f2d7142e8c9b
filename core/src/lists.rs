//! Builder for the `/lists` endpoint.
//!
//! ```text
//! lists                                  collection   HEAD GET POST
//! lists/{listId}                         item         HEAD GET PUT POST DELETE
//! lists/{listId}/roster/{role}           sub-resource HEAD GET
//! lists/{listId}/roster/{role}/{email}   sub-resource HEAD GET
//! ```
//!
//! The legal method set is derived from the path values each time it is
//! asked for. Once a roster role is selected the builder stays read-only:
//! setting the list id again does not leave the sub-resource state. Start a
//! new builder from the client to target the list itself.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PathError;
use crate::http::HttpMethod;
use crate::options::Options;
use crate::query::Query;
use crate::resource::{RequestParts, Resource};
use crate::template::{PathTemplate, PathValues, SegmentValidators};

pub const LISTS_TEMPLATE: &str = "lists(/:listId)(/roster/:action)(/:actionId)";

pub const LIST_ID: &str = "listId";
pub const ACTION: &str = "action";
pub const ACTION_ID: &str = "actionId";

static TEMPLATE: Lazy<PathTemplate> =
    Lazy::new(|| PathTemplate::parse(LISTS_TEMPLATE).expect("lists template is well-formed"));

static ACTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(moderator|owner|member)").unwrap());

// Roster entries are addressed by a plain `local@domain.tld` email.
static ACTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_]+@[a-zA-Z_]+?\.[a-zA-Z]{2,3}$").unwrap());

static VALIDATORS: Lazy<SegmentValidators> = Lazy::new(|| {
    let mut validators = BTreeMap::new();
    validators.insert(ACTION, &*ACTION_PATTERN);
    validators.insert(ACTION_ID, &*ACTION_ID_PATTERN);
    validators
});

const COLLECTION_METHODS: &[HttpMethod] = &[HttpMethod::Head, HttpMethod::Get, HttpMethod::Post];
const ITEM_METHODS: &[HttpMethod] = &[
    HttpMethod::Head,
    HttpMethod::Get,
    HttpMethod::Put,
    HttpMethod::Post,
    HttpMethod::Delete,
];
const SUB_RESOURCE_METHODS: &[HttpMethod] = &[HttpMethod::Head, HttpMethod::Get];

/// Roster a sub-resource request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Member,
    Owner,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Owner => "owner",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a `ListsRequest` currently points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListsState {
    Collection,
    Item,
    SubResource,
}

impl ListsState {
    pub fn legal_methods(&self) -> &'static [HttpMethod] {
        match self {
            ListsState::Collection => COLLECTION_METHODS,
            ListsState::Item => ITEM_METHODS,
            ListsState::SubResource => SUB_RESOURCE_METHODS,
        }
    }
}

/// Chainable builder for `/lists` requests.
///
/// A builder serves one request at a time. Mutators need `&mut self`, so
/// sharing one builder between concurrent callers has to go through the
/// caller's own synchronization; clone it instead when two requests
/// diverge.
#[derive(Debug, Clone)]
pub struct ListsRequest {
    parts: RequestParts,
}

impl ListsRequest {
    pub fn new(options: Options) -> Self {
        Self {
            parts: RequestParts::new(options, &TEMPLATE, &VALIDATORS),
        }
    }

    /// Target one list by id (e.g. `ann.example.com`). An empty id clears it.
    pub fn list_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.parts.set_segment(LIST_ID, Some(id.into()));
        self
    }

    /// Select a roster, optionally narrowed to one address. This moves the
    /// builder into the read-only sub-resource state for good.
    pub fn role(&mut self, role: Role, address: Option<&str>) -> &mut Self {
        self.parts.set_segment(ACTION, Some(role.as_str().to_string()));
        self.parts.set_segment(ACTION_ID, address.map(str::to_string));
        self
    }

    pub fn members(&mut self, address: Option<&str>) -> &mut Self {
        self.role(Role::Member, address)
    }

    pub fn owners(&mut self, address: Option<&str>) -> &mut Self {
        self.role(Role::Owner, address)
    }

    pub fn moderators(&mut self, address: Option<&str>) -> &mut Self {
        self.role(Role::Moderator, address)
    }

    pub fn state(&self) -> ListsState {
        if self.parts.segment(ACTION).is_some() {
            ListsState::SubResource
        } else if self.parts.segment(LIST_ID).is_some() {
            ListsState::Item
        } else {
            ListsState::Collection
        }
    }

    pub fn options(&self) -> &Options {
        self.parts.options()
    }

    pub fn path_values(&self) -> &PathValues {
        self.parts.path_values()
    }

    pub fn query(&self) -> &Query {
        self.parts.query()
    }

    pub fn template(&self) -> &str {
        self.parts.template().as_str()
    }

    pub fn validators() -> &'static SegmentValidators {
        &VALIDATORS
    }
}

impl Resource for ListsRequest {
    fn parts(&self) -> &RequestParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }

    fn legal_methods(&self) -> &'static [HttpMethod] {
        self.state().legal_methods()
    }

    fn check_path(&self) -> Result<(), PathError> {
        if self.parts.segment(ACTION).is_some() && self.parts.segment(LIST_ID).is_none() {
            return Err(PathError::DetachedSubResource {
                segment: ACTION.to_string(),
                parent: LIST_ID.to_string(),
            });
        }
        Ok(())
    }
}
