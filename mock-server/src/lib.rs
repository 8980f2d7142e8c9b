//! In-memory stand-in for the subset of the Mailman 3 REST API the client
//! targets. Everything is mounted under `/3.1` and guarded by basic auth.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_ROOT: &str = "/3.1";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct List {
    pub list_id: String,
    pub fqdn_listname: String,
    pub list_name: String,
    pub mail_host: String,
    pub display_name: String,
    pub description: String,
    pub member_count: u32,
    pub volume: u32,
    pub self_link: String,
    pub http_etag: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    pub list_id: String,
    pub role: String,
    pub member_id: String,
    pub delivery_mode: String,
    pub display_name: String,
    pub self_link: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub start: usize,
    pub total_size: usize,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<T>,
    pub http_etag: String,
}

#[derive(Deserialize)]
pub struct CreateList {
    pub fqdn_listname: String,
}

#[derive(Deserialize)]
pub struct UpdateList {
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
struct StoredList {
    list_name: String,
    mail_host: String,
    display_name: String,
    description: String,
}

#[derive(Clone, Debug)]
struct StoredMember {
    list_id: String,
    email: String,
    role: String,
    display_name: String,
}

#[derive(Debug, Default)]
pub struct Db {
    lists: BTreeMap<String, StoredList>,
    members: Vec<StoredMember>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a list from its posting address; returns its list id.
    pub fn add_list(&mut self, fqdn_listname: &str) -> Option<String> {
        let (name, host) = fqdn_listname.split_once('@')?;
        if name.is_empty() || host.is_empty() {
            return None;
        }
        let list_id = format!("{name}.{host}");
        if self.lists.contains_key(&list_id) {
            return None;
        }
        self.lists.insert(
            list_id.clone(),
            StoredList {
                list_name: name.to_string(),
                mail_host: host.to_string(),
                display_name: capitalize(name),
                description: String::new(),
            },
        );
        Some(list_id)
    }

    pub fn add_member(&mut self, list_id: &str, email: &str, role: &str, display_name: &str) {
        self.members.push(StoredMember {
            list_id: list_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            display_name: display_name.to_string(),
        });
    }

    /// A small fixture: two lists with a few members, owners and moderators.
    pub fn seeded() -> Self {
        let mut db = Self::new();
        for fqdn in ["ant@example.com", "bee@example.com"] {
            db.add_list(fqdn);
        }
        db.add_member("ant.example.com", "anne@example.com", "member", "Anne");
        db.add_member("ant.example.com", "bart@example.com", "member", "Bart");
        db.add_member("ant.example.com", "cris@example.com", "owner", "Cris");
        db.add_member("ant.example.com", "dave@example.com", "moderator", "Dave");
        db.add_member("bee.example.com", "anne@example.com", "member", "Anne");
        db
    }

    fn member_count(&self, list_id: &str) -> u32 {
        self.members
            .iter()
            .filter(|m| m.list_id == list_id && m.role == "member")
            .count() as u32
    }

    fn render_list(&self, base: &str, list_id: &str, stored: &StoredList) -> List {
        List {
            list_id: list_id.to_string(),
            fqdn_listname: format!("{}@{}", stored.list_name, stored.mail_host),
            list_name: stored.list_name.clone(),
            mail_host: stored.mail_host.clone(),
            display_name: stored.display_name.clone(),
            description: stored.description.clone(),
            member_count: self.member_count(list_id),
            volume: 1,
            self_link: format!("{base}/lists/{list_id}"),
            http_etag: format!("\"{list_id}\""),
        }
    }

    fn render_member(&self, base: &str, index: usize, stored: &StoredMember) -> Member {
        let member_id = format!("{:032x}", index + 1);
        Member {
            email: stored.email.clone(),
            list_id: stored.list_id.clone(),
            role: stored.role.clone(),
            member_id: member_id.clone(),
            delivery_mode: "regular".to_string(),
            display_name: stored.display_name.clone(),
            self_link: format!("{base}/members/{member_id}"),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
    authorization: String,
}

impl AppState {
    pub fn new(db: Db, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        Self {
            db: Arc::new(RwLock::new(db)),
            authorization: format!("Basic {token}"),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Db::new(), "restadmin", "restpass")
    }
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    let api = Router::new()
        .route("/lists", get(list_lists).post(create_list))
        .route(
            "/lists/{list_id}",
            get(get_list).put(update_list).delete(delete_list),
        )
        .route("/lists/{list_id}/roster/{role}", get(get_roster))
        .route("/lists/{list_id}/roster/{role}/{email}", get(get_roster_member))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .nest(API_ROOT, api)
        .layer(middleware::from_fn(log_requests))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    tracing::info!(%method, %uri, status = response.status().as_u16(), "handled request");
    response
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.authorization);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

/// Base URL for `self_link`s, taken from the `host` header.
fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{API_ROOT}")
}

/// Slice one page out of `items` using Mailman's 1-based `count`/`page`.
fn paginate<T>(items: Vec<T>, query: &BTreeMap<String, String>) -> (usize, Vec<T>) {
    let count = query.get("count").and_then(|c| c.parse::<usize>().ok());
    let page = query
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    match count {
        Some(count) if count > 0 => {
            let start = (page - 1) * count;
            (start, items.into_iter().skip(start).take(count).collect())
        }
        _ => (0, items),
    }
}

async fn list_lists(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Json<Page<List>> {
    let base = base_url(&headers);
    let db = state.db.read().await;
    let mail_host = query.get("filter[mail_host]");
    let lists: Vec<List> = db
        .lists
        .iter()
        .filter(|(_, l)| mail_host.is_none_or(|host| &l.mail_host == host))
        .map(|(id, l)| db.render_list(&base, id, l))
        .collect();
    let total_size = lists.len();
    let (start, entries) = paginate(lists, &query);
    Json(Page {
        start,
        total_size,
        entries,
        http_etag: format!("\"lists-{total_size}\""),
    })
}

async fn create_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateList>,
) -> Response {
    let mut db = state.db.write().await;
    match db.add_list(&input.fqdn_listname) {
        Some(list_id) => {
            let location = format!("{}/lists/{list_id}", base_url(&headers));
            (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "invalid or duplicate fqdn_listname").into_response(),
    }
}

async fn get_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<String>,
) -> Result<Json<List>, StatusCode> {
    let db = state.db.read().await;
    let stored = db.lists.get(&list_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(db.render_list(&base_url(&headers), &list_id, stored)))
}

async fn update_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(input): Json<UpdateList>,
) -> StatusCode {
    let mut db = state.db.write().await;
    let Some(stored) = db.lists.get_mut(&list_id) else {
        return StatusCode::NOT_FOUND;
    };
    if let Some(display_name) = input.display_name {
        stored.display_name = display_name;
    }
    if let Some(description) = input.description {
        stored.description = description;
    }
    StatusCode::NO_CONTENT
}

async fn delete_list(State(state): State<AppState>, Path(list_id): Path<String>) -> StatusCode {
    let mut db = state.db.write().await;
    if db.lists.remove(&list_id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    db.members.retain(|m| m.list_id != list_id);
    StatusCode::NO_CONTENT
}

fn is_role(role: &str) -> bool {
    matches!(role, "member" | "owner" | "moderator")
}

async fn get_roster(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((list_id, role)): Path<(String, String)>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Json<Page<Member>>, StatusCode> {
    let db = state.db.read().await;
    if !db.lists.contains_key(&list_id) || !is_role(&role) {
        return Err(StatusCode::NOT_FOUND);
    }
    let base = base_url(&headers);
    let members: Vec<Member> = db
        .members
        .iter()
        .enumerate()
        .filter(|(_, m)| m.list_id == list_id && m.role == role)
        .map(|(i, m)| db.render_member(&base, i, m))
        .collect();
    let total_size = members.len();
    let (start, entries) = paginate(members, &query);
    Ok(Json(Page {
        start,
        total_size,
        entries,
        http_etag: format!("\"{list_id}-{role}-{total_size}\""),
    }))
}

async fn get_roster_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((list_id, role, email)): Path<(String, String, String)>,
) -> Result<Json<Member>, StatusCode> {
    let db = state.db.read().await;
    if !is_role(&role) {
        return Err(StatusCode::NOT_FOUND);
    }
    db.members
        .iter()
        .enumerate()
        .find(|(_, m)| m.list_id == list_id && m.role == role && m.email == email)
        .map(|(i, m)| Json(db.render_member(&base_url(&headers), i, m)))
        .ok_or(StatusCode::NOT_FOUND)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_list_derives_list_id() {
        let mut db = Db::new();
        assert_eq!(db.add_list("ant@example.com").as_deref(), Some("ant.example.com"));
        let stored = &db.lists["ant.example.com"];
        assert_eq!(stored.list_name, "ant");
        assert_eq!(stored.mail_host, "example.com");
        assert_eq!(stored.display_name, "Ant");
    }

    #[test]
    fn add_list_rejects_duplicates_and_bad_addresses() {
        let mut db = Db::new();
        assert!(db.add_list("ant@example.com").is_some());
        assert!(db.add_list("ant@example.com").is_none());
        assert!(db.add_list("no-at-sign").is_none());
        assert!(db.add_list("@example.com").is_none());
    }

    #[test]
    fn member_count_only_counts_members() {
        let db = Db::seeded();
        assert_eq!(db.member_count("ant.example.com"), 2);
        assert_eq!(db.member_count("bee.example.com"), 1);
    }

    #[test]
    fn paginate_is_one_based() {
        let mut query = BTreeMap::new();
        query.insert("count".to_string(), "2".to_string());
        query.insert("page".to_string(), "2".to_string());
        let (start, page) = paginate(vec![1, 2, 3, 4, 5], &query);
        assert_eq!(start, 2);
        assert_eq!(page, vec![3, 4]);
    }

    #[test]
    fn paginate_without_count_returns_everything() {
        let (start, page) = paginate(vec![1, 2, 3], &BTreeMap::new());
        assert_eq!(start, 0);
        assert_eq!(page, vec![1, 2, 3]);
    }

    #[test]
    fn empty_page_omits_entries() {
        let page: Page<Member> = Page {
            start: 0,
            total_size: 0,
            entries: Vec::new(),
            http_etag: "\"x\"".to_string(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("entries").is_none());
    }

    #[test]
    fn page_without_entries_deserializes_empty() {
        let page: Page<List> =
            serde_json::from_str(r#"{"start":0,"total_size":0,"http_etag":"\"x\""}"#).unwrap();
        assert!(page.entries.is_empty());
        let page: Page<Member> =
            serde_json::from_str(r#"{"start":0,"total_size":0,"http_etag":"\"x\""}"#).unwrap();
        assert_eq!(page.total_size, 0);
    }
}
