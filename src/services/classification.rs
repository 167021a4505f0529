// =============================================================================
// Link Classification
// =============================================================================
//
// Pure helpers that enrich a stored link for display:
// - domain: host part of the URL
// - age: coarse "3 hours ago" style string
// - suggested action: keyword heuristic over domain/title/description
//
// None of these ever fail. They degrade to "" / "unknown" / read-later so a
// malformed historical row cannot break a whole page.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use url::Url;

use crate::types::bookmark::Action;

/// Sentinel returned by [`compute_age`] for timestamps it cannot read.
pub const UNKNOWN_AGE: &str = "unknown";

/// Which family of keywords matched a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Documentation,
    Tutorial,
    News,
    None,
}

impl Signal {
    /// The action suggested for links carrying this signal.
    pub fn suggested_action(&self) -> Action {
        match self {
            Signal::Documentation => Action::Working,
            Signal::Tutorial => Action::Share,
            Signal::News | Signal::None => Action::ReadLater,
        }
    }
}

const DOCUMENTATION_DOMAINS: &[&str] = &[
    "docs.",
    "developer.",
    "readthedocs",
    "docs.rs",
    "developer.mozilla.org",
    "devdocs.io",
];
const DOCUMENTATION_WORDS: &[&str] = &[
    "documentation",
    "docs",
    "reference",
    "api",
    "manual",
    "specification",
    "rfc",
];

const TUTORIAL_DOMAINS: &[&str] = &["freecodecamp", "udemy", "coursera", "egghead", "exercism"];
const TUTORIAL_WORDS: &[&str] = &[
    "tutorial",
    "tutorials",
    "guide",
    "how to",
    "how-to",
    "learn",
    "learning",
    "course",
    "walkthrough",
    "getting started",
];

const NEWS_DOMAINS: &[&str] = &[
    "news.",
    "medium.com",
    "substack.com",
    "dev.to",
    "techcrunch.com",
    "theverge.com",
];
const NEWS_WORDS: &[&str] = &["news", "blog", "announcing", "release notes", "newsletter", "weekly"];

/// Extracts the host of `url`, lower-cased. Returns `""` when the URL cannot
/// be parsed or has no host.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Parses a stored timestamp. Accepts RFC 3339 and SQLite's
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC).
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let raw = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Canonical storage form of a timestamp.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable age of `timestamp` relative to the current time.
pub fn compute_age(timestamp: &str) -> String {
    compute_age_at(timestamp, Utc::now())
}

/// Human-readable age of `timestamp` relative to `now`.
///
/// Under an hour (or in the future) is `"now"`, then hours below a day, days
/// below a week, and weeks beyond.
pub fn compute_age_at(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(timestamp) else {
        return UNKNOWN_AGE.to_string();
    };
    let elapsed = now.signed_duration_since(then);

    if elapsed.num_hours() < 1 {
        "now".to_string()
    } else if elapsed.num_hours() < 24 {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed.num_days() < 7 {
        plural(elapsed.num_days(), "day")
    } else {
        plural(elapsed.num_weeks(), "week")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Determines which keyword family a link belongs to.
///
/// Checked in priority order: documentation, tutorial, news. First match wins.
pub fn classify_signal(domain: &str, title: &str, description: &str) -> Signal {
    let domain = domain.to_lowercase();
    let text = format!("{} {}", title, description).to_lowercase();

    let matches = |domains: &[&str], words: &[&str]| {
        domains.iter().any(|d| domain.contains(d)) || words.iter().any(|w| contains_word(&text, w))
    };

    if matches(DOCUMENTATION_DOMAINS, DOCUMENTATION_WORDS) {
        Signal::Documentation
    } else if matches(TUTORIAL_DOMAINS, TUTORIAL_WORDS) {
        Signal::Tutorial
    } else if matches(NEWS_DOMAINS, NEWS_WORDS) {
        Signal::News
    } else {
        Signal::None
    }
}

/// Suggests an action for an untriaged link. Advisory only.
pub fn suggest_action(domain: &str, title: &str, description: &str) -> Action {
    classify_signal(domain, title, description).suggested_action()
}

/// Whole-word (or whole-phrase) containment, so "api" does not fire on "rapid".
fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
