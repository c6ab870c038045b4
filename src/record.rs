use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scraped tracker identity, as written to the aggregate JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub profile_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Set by the avatar download phase, never by the parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_filename: Option<String>,
    #[serde(default)]
    pub details: BTreeMap<DetailKey, String>,
    #[serde(default)]
    pub sections: BTreeMap<String, Section>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile_url: profile_url.into(),
            ..Default::default()
        }
    }
}

/// Normalized keys lifted out of definition blocks into `details`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKey {
    Username,
    FullName,
    Email,
    Groups,
    LoginCount,
    LastLogin,
}

impl DetailKey {
    pub const ALL: [DetailKey; 6] = [
        DetailKey::Username,
        DetailKey::FullName,
        DetailKey::Email,
        DetailKey::Groups,
        DetailKey::LoginCount,
        DetailKey::LastLogin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetailKey::Username => "username",
            DetailKey::FullName => "full_name",
            DetailKey::Email => "email",
            DetailKey::Groups => "groups",
            DetailKey::LoginCount => "login_count",
            DetailKey::LastLogin => "last_login",
        }
    }

    /// Match a definition term ("Login Count", "full name", "EMAIL") to a key.
    /// Only the spaced, human form is recognized; `full_name` is not a label.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().replace('_', " ") == lower)
    }
}

/// Content of one named section. Serialized untagged, so the JSON shape
/// alone tells the kinds apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section {
    /// Term/description pairs from a definition list.
    Fields(BTreeMap<String, String>),
    /// Rows of cell text from a table.
    Table(Vec<Vec<String>>),
    /// Trimmed text of a classed sub-panel.
    Text(String),
}

// ── Tests ──
