//! Principal Entity
//!
//! A user identity as reported by the directory service. One principal is one
//! matrix row; its `groups.items` is the membership view the matrix edits.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display labels longer than this are shortened.
const LABEL_MAX_CHARS: usize = 25;
const LABEL_KEEP_CHARS: usize = 22;

/// Reference to a group a principal has joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupRef {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GroupRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Membership listing embedded in a principal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrincipalGroups {
    #[serde(default)]
    pub items: Vec<GroupRef>,
}

/// Principal entity - one matrix row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Login id (unique)
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,

    #[serde(default)]
    pub groups: PrincipalGroups,

    /// Global roles, read-only here
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fullname: None,
            groups: PrincipalGroups::default(),
            roles: vec![],
        }
    }

    pub fn with_fullname(mut self, fullname: impl Into<String>) -> Self {
        self.fullname = Some(fullname.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_group(mut self, group: GroupRef) -> Self {
        self.join(group);
        self
    }

    /// `fullname` if it is present and non-empty
    fn name(&self) -> Option<&str> {
        self.fullname.as_deref().filter(|name| !name.is_empty())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.groups.items.iter().any(|g| g.id == group_id)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.items.iter().map(|g| g.id.as_str())
    }

    /// Add a membership. Returns false if it already existed.
    pub fn join(&mut self, group: GroupRef) -> bool {
        if self.is_member_of(&group.id) {
            return false;
        }
        self.groups.items.push(group);
        true
    }

    /// Drop a membership. Returns false if there was none.
    pub fn leave(&mut self, group_id: &str) -> bool {
        let before = self.groups.items.len();
        self.groups.items.retain(|g| g.id != group_id);
        self.groups.items.len() != before
    }

    /// Row ordering key: name tokens reversed ("Ada Lovelace" -> "Lovelace Ada"),
    /// or the id when there is no name.
    pub fn sort_label(&self) -> String {
        match self.name() {
            Some(name) => name.split(' ').rev().collect::<Vec<_>>().join(" "),
            None => self.id.clone(),
        }
    }

    /// Row heading, shortened to 22 characters plus an ellipsis past 25.
    pub fn display_label(&self) -> String {
        match self.name() {
            Some(name) if name.chars().count() > LABEL_MAX_CHARS => {
                let kept: String = name.chars().take(LABEL_KEEP_CHARS).collect();
                format!("{}...", kept)
            }
            Some(name) => name.to_string(),
            None => self.id.clone(),
        }
    }

    /// Hover text: full name followed by the id.
    pub fn hover_title(&self) -> String {
        match self.name() {
            Some(name) => format!("{} {}", name, self.id),
            None => self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_label_reverses_name_tokens() {
        let p = Principal::new("ada").with_fullname("Ada King Lovelace");
        assert_eq!(p.sort_label(), "Lovelace King Ada");

        assert_eq!(Principal::new("bob").sort_label(), "bob");
        assert_eq!(Principal::new("eve").with_fullname("").sort_label(), "eve");
    }

    #[test]
    fn test_display_label_truncation() {
        let short = Principal::new("a").with_fullname("Grace Hopper");
        assert_eq!(short.display_label(), "Grace Hopper");

        let exact = Principal::new("b").with_fullname("x".repeat(25));
        assert_eq!(exact.display_label(), "x".repeat(25));

        let long = Principal::new("c").with_fullname("Maximilian Alexander von Humboldt");
        assert_eq!(long.display_label(), "Maximilian Alexander v...");

        assert_eq!(Principal::new("d").display_label(), "d");
    }

    #[test]
    fn test_hover_title() {
        let p = Principal::new("grace").with_fullname("Grace Hopper");
        assert_eq!(p.hover_title(), "Grace Hopper grace");
        assert_eq!(Principal::new("grace").hover_title(), "grace");
    }

    #[test]
    fn test_join_and_leave() {
        let mut p = Principal::new("alice");
        assert!(p.join(GroupRef::new("editors")));
        assert!(!p.join(GroupRef::new("editors")));
        assert!(p.is_member_of("editors"));
        assert!(p.leave("editors"));
        assert!(!p.leave("editors"));
        assert!(p.groups.items.is_empty());
    }

    #[test]
    fn test_deserialize_directory_payload() {
        let json = r#"{
            "@id": "http://localhost:8080/Plone/@users/alice",
            "id": "alice",
            "fullname": "Alice Liddell",
            "email": "alice@example.org",
            "roles": ["Member"],
            "groups": {"items": [{"id": "editors", "title": "Editors"}], "items_total": 1}
        }"#;
        let p: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, "alice");
        assert!(p.is_member_of("editors"));
        assert!(p.has_role("Member"));

        let bare: Principal = serde_json::from_str(r#"{"id": "bob"}"#).unwrap();
        assert!(bare.groups.items.is_empty());
        assert!(bare.roles.is_empty());
    }
}
