use serde::{Deserialize, Serialize};

/// Top-level linkflow settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkflowSettings {
    pub database: DatabaseSettings,
    pub projects: ProjectPolicy,
    pub triage: TriageSettings,
    pub log_level: String,
}

impl Default for LinkflowSettings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            projects: ProjectPolicy::default(),
            triage: TriageSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Where the link table lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Empty means `linkflow.db` in the data directory.
    pub path: String,
}

/// Age thresholds, in days, that drive active-project status.
///
/// A project is `active` while its newest link is younger than
/// `stale_after_days`, `stale` until `inactive_after_days`, and `inactive`
/// afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectPolicy {
    pub stale_after_days: i64,
    pub inactive_after_days: i64,
}

impl ProjectPolicy {
    pub const DEFAULT_STALE_AFTER_DAYS: i64 = 14;
    pub const DEFAULT_INACTIVE_AFTER_DAYS: i64 = 60;
}

impl Default for ProjectPolicy {
    fn default() -> Self {
        Self {
            stale_after_days: Self::DEFAULT_STALE_AFTER_DAYS,
            inactive_after_days: Self::DEFAULT_INACTIVE_AFTER_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TriageSettings {
    /// Page size used by the RPC layer when a caller omits `limit`.
    pub default_page_size: i64,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
        }
    }
}
