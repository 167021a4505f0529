use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Triage state of a bookmark.
///
/// `Unset` is stored as an empty string and is treated exactly like
/// `ReadLater` by every triage rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "read-later")]
    ReadLater,
    #[serde(rename = "working")]
    Working,
    #[serde(rename = "share")]
    Share,
    #[serde(rename = "archived")]
    Archived,
    #[serde(rename = "irrelevant")]
    Irrelevant,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Unset,
        Action::ReadLater,
        Action::Working,
        Action::Share,
        Action::Archived,
        Action::Irrelevant,
    ];

    /// Label as stored in the `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Unset => "",
            Action::ReadLater => "read-later",
            Action::Working => "working",
            Action::Share => "share",
            Action::Archived => "archived",
            Action::Irrelevant => "irrelevant",
        }
    }

    /// True for the states that still await a triage decision.
    pub fn needs_triage(&self) -> bool {
        matches!(self, Action::Unset | Action::ReadLater)
    }

    /// True for the states that feed reference collections.
    pub fn is_reference(&self) -> bool {
        matches!(self, Action::Unset | Action::ReadLater | Action::Share)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "unset" => Ok(Action::Unset),
            "read-later" => Ok(Action::ReadLater),
            "working" => Ok(Action::Working),
            "share" => Ok(Action::Share),
            "archived" => Ok(Action::Archived),
            "irrelevant" => Ok(Action::Irrelevant),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// A stored link row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub action: Action,
    pub topic: Option<String>,
    pub share_to: Option<String>,
    pub project_id: Option<i64>,
    pub tags: BTreeSet<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub timestamp: String,
}

/// Fields accepted when capturing a new link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub topic: Option<String>,
    pub tags: BTreeSet<String>,
    pub custom_properties: BTreeMap<String, String>,
    /// Explicit creation time, used by imports. `None` stamps the current time.
    pub timestamp: Option<String>,
}

/// Complete writable state of a bookmark, sent on full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRecord {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub action: Action,
    pub topic: Option<String>,
    pub share_to: Option<String>,
    pub project_id: Option<i64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
}

impl From<&Bookmark> for BookmarkRecord {
    fn from(b: &Bookmark) -> Self {
        Self {
            url: b.url.clone(),
            title: b.title.clone(),
            description: b.description.clone(),
            content: b.content.clone(),
            action: b.action,
            topic: b.topic.clone(),
            share_to: b.share_to.clone(),
            project_id: b.project_id,
            tags: b.tags.clone(),
            custom_properties: b.custom_properties.clone(),
        }
    }
}

/// Metadata-only change set. Outer `None` leaves a column untouched,
/// `Some(None)` clears it. Content keys are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub topic: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub share_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<BTreeMap<String, String>>,
}

impl PartialUpdate {
    pub fn is_empty(&self) -> bool {
        self.action.is_none()
            && self.topic.is_none()
            && self.share_to.is_none()
            && self.project_id.is_none()
            && self.tags.is_none()
            && self.custom_properties.is_none()
    }
}

/// A requested edit to one bookmark, as issued by a client.
///
/// Every field distinguishes "not mentioned" (`None`) from "set to empty"
/// (`Some(None)` or an empty string), because clearing a content field still
/// counts as a content change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDelta {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub topic: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub share_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<BTreeMap<String, String>>,
}

impl BookmarkDelta {
    /// Names of the content fields present in this delta.
    pub fn content_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.title.is_some() {
            keys.push("title");
        }
        if self.url.is_some() {
            keys.push("url");
        }
        if self.description.is_some() {
            keys.push("description");
        }
        keys
    }

    pub fn touches_content(&self) -> bool {
        self.title.is_some() || self.url.is_some() || self.description.is_some()
    }

    /// The metadata half of the delta, carried verbatim.
    pub fn metadata(&self) -> PartialUpdate {
        PartialUpdate {
            action: self.action,
            topic: self.topic.clone(),
            share_to: self.share_to.clone(),
            project_id: self.project_id,
            tags: self.tags.clone(),
            custom_properties: self.custom_properties.clone(),
        }
    }

    /// Merges this delta over `base`, producing the complete record to send.
    pub fn merge_over(&self, base: &BookmarkRecord) -> BookmarkRecord {
        let mut merged = base.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone().unwrap_or_default();
        }
        if let Some(url) = &self.url {
            merged.url = url.clone().unwrap_or_default();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(action) = self.action {
            merged.action = action;
        }
        if let Some(topic) = &self.topic {
            merged.topic = topic.clone();
        }
        if let Some(share_to) = &self.share_to {
            merged.share_to = share_to.clone();
        }
        if let Some(project_id) = self.project_id {
            merged.project_id = project_id;
        }
        if let Some(tags) = &self.tags {
            merged.tags = tags.clone();
        }
        if let Some(props) = &self.custom_properties {
            merged.custom_properties = props.clone();
        }
        merged
    }
}

/// Bookmark enriched with display-only derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkView {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub domain: String,
    pub age: String,
    pub suggested_action: Action,
}

/// One page of the triage queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriagePage {
    pub entries: Vec<BookmarkView>,
    pub total: i64,
}

/// Decay band of an active project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Stale,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProject {
    pub topic: String,
    pub link_count: i64,
    pub last_updated: String,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCollection {
    pub topic: String,
    pub link_count: i64,
    pub last_accessed: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: i64,
    pub needs_triage: i64,
    pub active_projects: i64,
    pub shared: i64,
    pub archived: i64,
}

/// Keeps an explicit `null` distinct from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
