//! Domain DTOs for the Mailman REST API.
//!
//! # Design
//! Only the fields the client reads are modeled; unknown fields are
//! ignored on deserialization. Mailman leaves `entries` out of an empty
//! collection, so `Page::entries` defaults to an empty vec.

use serde::{Deserialize, Serialize};

/// One mailing list as returned by `GET lists` or `GET lists/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailingList {
    pub list_id: String,
    pub fqdn_listname: String,
    pub list_name: String,
    pub mail_host: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub volume: u32,
    #[serde(default)]
    pub self_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_etag: Option<String>,
}

/// One roster entry under `lists/{id}/roster/{role}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub email: String,
    pub list_id: String,
    pub role: String,
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub delivery_mode: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub self_link: String,
}

/// A collection response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,
    pub total_size: usize,
    #[serde(default)]
    pub start: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_etag: Option<String>,
}

impl Page<MailingList> {
    /// Keep only the lists with the highest `member_count`; `total_size`
    /// is rewritten to the number kept. Ties are all kept, in order.
    pub fn max_members(mut self) -> Self {
        let max = self.entries.iter().map(|l| l.member_count).max();
        if let Some(max) = max {
            self.entries.retain(|l| l.member_count == max);
        }
        self.total_size = self.entries.len();
        self
    }
}

/// Request payload for `POST lists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateList {
    pub fqdn_listname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
}

/// Request payload for `PUT lists/{id}`; omitted fields are left as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(name: &str, member_count: u32) -> MailingList {
        MailingList {
            list_id: format!("{name}.example.com"),
            fqdn_listname: format!("{name}@example.com"),
            list_name: name.to_string(),
            mail_host: "example.com".to_string(),
            display_name: name.to_string(),
            description: String::new(),
            member_count,
            volume: 1,
            self_link: String::new(),
            http_etag: None,
        }
    }

    #[test]
    fn max_members_keeps_all_ties() {
        let page = Page {
            entries: vec![list("a", 3), list("b", 7), list("c", 7), list("d", 0)],
            total_size: 4,
            start: 0,
            http_etag: None,
        };
        let page = page.max_members();
        let names: Vec<_> = page.entries.iter().map(|l| l.list_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(page.total_size, 2);
    }

    #[test]
    fn max_members_on_empty_page() {
        let page: Page<MailingList> = Page {
            entries: Vec::new(),
            total_size: 0,
            start: 0,
            http_etag: None,
        };
        let page = page.max_members();
        assert!(page.entries.is_empty());
        assert_eq!(page.total_size, 0);
    }

    #[test]
    fn page_without_entries_deserializes_empty() {
        let page: Page<Member> =
            serde_json::from_str(r#"{"start":0,"total_size":0,"http_etag":"\"abc\""}"#).unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.http_etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn update_list_skips_unset_fields() {
        let body = serde_json::to_value(UpdateList {
            description: Some("Talk".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"description": "Talk"}));
    }
}
