//! Lifecycle & aggregation engine for linkflow.
//!
//! Turns the raw link table into the views a client works with: the triage
//! queue, topic-derived active projects and reference collections, and the
//! global counters. Every call is a fresh query against the store; nothing is
//! cached here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::dispatcher::DefaultGuard;
use tracing::{debug, info, warn, Dispatch};

use crate::managers::link_store::{LinkFilter, LinkStoreTrait, TopicStamp};
use crate::services::classification::{
    compute_age_at, extract_domain, format_timestamp, parse_timestamp, suggest_action,
    UNKNOWN_AGE,
};
use crate::types::bookmark::{
    Action, ActiveProject, Bookmark, BookmarkRecord, BookmarkView, NewBookmark, PartialUpdate,
    ProjectStatus, ReferenceCollection, SummaryStats, TriagePage,
};
use crate::types::errors::LinkError;
use crate::types::settings::ProjectPolicy;

/// Source of "now" for age and status derivation.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Derives the decay band of a project from its newest link.
///
/// Unreadable timestamps count as `Inactive`; future ones as `Active`.
pub fn derive_status(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &ProjectPolicy,
) -> ProjectStatus {
    let Some(last) = last_updated else {
        return ProjectStatus::Inactive;
    };
    let age_days = now.signed_duration_since(last).num_days();
    if age_days < policy.stale_after_days {
        ProjectStatus::Active
    } else if age_days < policy.inactive_after_days {
        ProjectStatus::Stale
    } else {
        ProjectStatus::Inactive
    }
}

/// Running aggregate for one topic.
#[derive(Debug, Default)]
struct TopicGroup {
    link_count: i64,
    newest: Option<DateTime<Utc>>,
}

impl TopicGroup {
    fn last_seen(&self) -> String {
        self.newest
            .map(format_timestamp)
            .unwrap_or_else(|| UNKNOWN_AGE.to_string())
    }
}

/// Groups topic stamps, tolerating timestamps that do not parse.
fn group_by_topic(stamps: Vec<TopicStamp>) -> Vec<(String, TopicGroup)> {
    let mut groups: HashMap<String, TopicGroup> = HashMap::new();
    for stamp in stamps {
        let group = groups.entry(stamp.topic).or_default();
        group.link_count += 1;
        match parse_timestamp(&stamp.timestamp) {
            Some(ts) => {
                if group.newest.map_or(true, |newest| ts > newest) {
                    group.newest = Some(ts);
                }
            }
            None => warn!(timestamp = %stamp.timestamp, "unparseable link timestamp"),
        }
    }
    groups.into_iter().collect()
}

/// Read/write surface over a [`LinkStoreTrait`] implementation.
pub struct LifecycleEngine<'s, S: LinkStoreTrait + ?Sized> {
    store: &'s S,
    policy: ProjectPolicy,
    dispatch: Dispatch,
    clock: Clock,
}

impl<'s, S: LinkStoreTrait + ?Sized> LifecycleEngine<'s, S> {
    /// Creates an engine over `store`.
    ///
    /// `dispatch` receives every event the engine emits; pass
    /// `Dispatch::none()` to silence it.
    pub fn new(store: &'s S, policy: ProjectPolicy, dispatch: Dispatch) -> Self {
        Self {
            store,
            policy,
            dispatch,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, e.g. with a fixed instant in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &ProjectPolicy {
        &self.policy
    }

    /// Routes events to the injected dispatcher until the guard drops.
    fn scoped(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Adds domain, age and suggested action to a stored row.
    pub fn enrich(&self, bookmark: Bookmark) -> BookmarkView {
        let domain = extract_domain(&bookmark.url);
        let age = compute_age_at(&bookmark.timestamp, self.now());
        let suggested_action = suggest_action(
            &domain,
            &bookmark.title,
            bookmark.description.as_deref().unwrap_or(""),
        );
        BookmarkView {
            bookmark,
            domain,
            age,
            suggested_action,
        }
    }

    fn check_page(limit: i64, offset: i64) -> Result<(), LinkError> {
        if limit <= 0 {
            return Err(LinkError::Validation(format!(
                "limit must be positive, got {}",
                limit
            )));
        }
        if offset < 0 {
            return Err(LinkError::Validation(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }
        Ok(())
    }

    fn check_content(url: &str, title: &str) -> Result<(), LinkError> {
        if url.trim().is_empty() {
            return Err(LinkError::Validation("url is required".to_string()));
        }
        if title.trim().is_empty() {
            return Err(LinkError::Validation("title is required".to_string()));
        }
        Ok(())
    }

    /// Untriaged links, newest first, with the total independent of the page.
    pub fn get_triage_queue(&self, limit: i64, offset: i64) -> Result<TriagePage, LinkError> {
        let _log = self.scoped();
        Self::check_page(limit, offset)?;
        let total = self.store.count(LinkFilter::NeedsTriage)?;
        let rows = self.store.select(LinkFilter::NeedsTriage, limit, offset)?;
        let entries: Vec<BookmarkView> = rows.into_iter().map(|b| self.enrich(b)).collect();
        debug!(limit, offset, total, returned = entries.len(), "triage queue fetched");
        Ok(TriagePage { entries, total })
    }

    /// One entry per topic among `working` links, most recently touched first.
    pub fn get_active_projects(&self) -> Result<Vec<ActiveProject>, LinkError> {
        let _log = self.scoped();
        let stamps = self.store.topic_stamps(LinkFilter::Action(Action::Working))?;
        let now = self.now();
        let mut groups = group_by_topic(stamps);
        groups.sort_by(|(ta, a), (tb, b)| b.newest.cmp(&a.newest).then_with(|| ta.cmp(tb)));

        let projects: Vec<ActiveProject> = groups
            .into_iter()
            .map(|(topic, group)| ActiveProject {
                status: derive_status(group.newest, now, &self.policy),
                last_updated: group.last_seen(),
                link_count: group.link_count,
                topic,
            })
            .collect();
        debug!(count = projects.len(), "active projects derived");
        Ok(projects)
    }

    /// One entry per topic among read-later, share and untriaged links.
    ///
    /// Largest collections first; ties go to the most recent.
    pub fn get_reference_collections(&self) -> Result<Vec<ReferenceCollection>, LinkError> {
        let _log = self.scoped();
        let stamps = self.store.topic_stamps(LinkFilter::Reference)?;
        let mut groups = group_by_topic(stamps);
        groups.sort_by(|(ta, a), (tb, b)| {
            b.link_count
                .cmp(&a.link_count)
                .then_with(|| b.newest.cmp(&a.newest))
                .then_with(|| ta.cmp(tb))
        });

        let collections: Vec<ReferenceCollection> = groups
            .into_iter()
            .map(|(topic, group)| ReferenceCollection {
                last_accessed: group.last_seen(),
                link_count: group.link_count,
                topic,
            })
            .collect();
        debug!(count = collections.len(), "reference collections derived");
        Ok(collections)
    }

    pub fn get_summary_stats(&self) -> Result<SummaryStats, LinkError> {
        let _log = self.scoped();
        let stats = self.store.summary_counts()?;
        debug!(?stats, "summary stats computed");
        Ok(stats)
    }

    /// Links in one action state, newest first.
    ///
    /// `Unset` and `ReadLater` both return the full untriaged set.
    pub fn get_bookmarks_by_action(
        &self,
        action: Action,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookmarkView>, LinkError> {
        let _log = self.scoped();
        Self::check_page(limit, offset)?;
        let rows = self.store.select(LinkFilter::Action(action), limit, offset)?;
        debug!(action = %action, returned = rows.len(), "bookmarks by action fetched");
        Ok(rows.into_iter().map(|b| self.enrich(b)).collect())
    }

    pub fn get_bookmark_by_id(&self, id: i64) -> Result<BookmarkView, LinkError> {
        let _log = self.scoped();
        let bookmark = self.store.select_by_id(id)?;
        Ok(self.enrich(bookmark))
    }

    /// Captures a new link. The action starts empty (awaiting triage).
    pub fn create_bookmark(&self, new: NewBookmark) -> Result<BookmarkView, LinkError> {
        let _log = self.scoped();
        Self::check_content(&new.url, &new.title)?;
        let timestamp = match new.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw).ok_or_else(|| {
                LinkError::Validation(format!("invalid timestamp '{}'", raw))
            })?,
            None => self.now(),
        };

        let id = self.store.insert(&new, &format_timestamp(timestamp))?;
        info!(id, url = %new.url, "bookmark created");
        let stored = self.store.select_by_id(id)?;
        Ok(self.enrich(stored))
    }

    /// Applies a metadata-only change and returns the stored representation.
    pub fn update_partial(
        &self,
        id: i64,
        patch: &PartialUpdate,
    ) -> Result<BookmarkView, LinkError> {
        let _log = self.scoped();
        let updated = self.store.update_partial(id, patch)?;
        info!(id, empty = patch.is_empty(), "bookmark metadata updated");
        Ok(self.enrich(updated))
    }

    /// Replaces all content and metadata of a bookmark.
    pub fn replace_full(
        &self,
        id: i64,
        record: &BookmarkRecord,
    ) -> Result<BookmarkView, LinkError> {
        let _log = self.scoped();
        Self::check_content(&record.url, &record.title)?;
        let updated = self.store.replace_full(id, record)?;
        info!(id, "bookmark replaced");
        Ok(self.enrich(updated))
    }

    pub fn delete_bookmark(&self, id: i64) -> Result<(), LinkError> {
        let _log = self.scoped();
        self.store.delete(id)?;
        info!(id, "bookmark deleted");
        Ok(())
    }
}
