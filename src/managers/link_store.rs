//! Link Store for linkflow.
//!
//! Implements `LinkStoreTrait`: atomic single-row writes and predicate
//! selects over the `links` table, backed by SQLite via `rusqlite`.

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::types::bookmark::{
    Action, Bookmark, BookmarkRecord, NewBookmark, PartialUpdate, SummaryStats,
};
use crate::types::errors::LinkError;

/// Rows still awaiting a triage decision. NULL and '' count as unset.
pub const TRIAGE_PREDICATE: &str = "COALESCE(action, '') IN ('', 'read-later')";

/// Rows that feed reference collections.
pub const REFERENCE_PREDICATE: &str = "COALESCE(action, '') IN ('', 'read-later', 'share')";

/// Rows whose topic can name a project or collection.
pub const HAS_TOPIC_PREDICATE: &str = "TRIM(COALESCE(topic, '')) <> ''";

const COLUMNS: &str = "id, url, title, description, content, action, topic, share_to, \
                       project_id, tags, custom_properties, timestamp";

/// Row predicate understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFilter {
    All,
    NeedsTriage,
    Reference,
    /// Exact action match. `Unset` and `ReadLater` widen to `NeedsTriage`.
    Action(Action),
}

impl LinkFilter {
    /// SQL condition plus its bound parameters.
    fn to_sql(self) -> (String, Vec<Value>) {
        match self {
            LinkFilter::All => ("1 = 1".to_string(), Vec::new()),
            LinkFilter::NeedsTriage => (TRIAGE_PREDICATE.to_string(), Vec::new()),
            LinkFilter::Action(action) if action.needs_triage() => {
                (TRIAGE_PREDICATE.to_string(), Vec::new())
            }
            LinkFilter::Reference => (REFERENCE_PREDICATE.to_string(), Vec::new()),
            LinkFilter::Action(action) => (
                "action = ?".to_string(),
                vec![Value::Text(action.as_str().to_string())],
            ),
        }
    }
}

/// Newest first by the instant a timestamp denotes, so `YYYY-MM-DD HH:MM:SS`
/// and offset forms sort with canonical rows. Unparseable stamps go last.
const NEWEST_FIRST: &str = "ORDER BY julianday(timestamp) DESC, timestamp DESC, id DESC";

/// Blank or whitespace-only topics are stored as NULL.
fn stored_topic(topic: Option<&str>) -> Option<&str> {
    topic.filter(|t| !t.trim().is_empty())
}

/// Topic and raw timestamp of one row, the projection aggregation works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicStamp {
    pub topic: String,
    pub timestamp: String,
}

/// Capability contract of the link table.
pub trait LinkStoreTrait {
    fn insert(&self, new: &NewBookmark, timestamp: &str) -> Result<i64, LinkError>;
    fn update_partial(&self, id: i64, patch: &PartialUpdate) -> Result<Bookmark, LinkError>;
    fn replace_full(&self, id: i64, record: &BookmarkRecord) -> Result<Bookmark, LinkError>;
    /// Matching rows, newest first.
    fn select(&self, filter: LinkFilter, limit: i64, offset: i64) -> Result<Vec<Bookmark>, LinkError>;
    fn count(&self, filter: LinkFilter) -> Result<i64, LinkError>;
    fn select_by_id(&self, id: i64) -> Result<Bookmark, LinkError>;
    /// Topic/timestamp pairs of matching rows that carry a non-empty topic.
    fn topic_stamps(&self, filter: LinkFilter) -> Result<Vec<TopicStamp>, LinkError>;
    /// All global counters in one conditional-aggregation pass.
    fn summary_counts(&self) -> Result<SummaryStats, LinkError>;
    fn delete(&self, id: i64) -> Result<(), LinkError>;
}

/// Link store backed by a SQLite connection.
pub struct LinkStore<'a> {
    conn: &'a Connection,
}

impl<'a> LinkStore<'a> {
    /// Creates a new `LinkStore` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reads a single `Bookmark` row into a struct.
    ///
    /// Malformed JSON in `tags` or `custom_properties` degrades to empty
    /// collections; an unknown action label is a conversion error.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let action: Option<String> = row.get(5)?;
        let action = action
            .as_deref()
            .unwrap_or("")
            .parse::<Action>()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
            })?;
        let tags: String = row.get(9)?;
        let custom_properties: String = row.get(10)?;

        Ok(Bookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            content: row.get(4)?,
            action,
            topic: row.get(6)?,
            share_to: row.get(7)?,
            project_id: row.get(8)?,
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            custom_properties: serde_json::from_str(&custom_properties).unwrap_or_default(),
            timestamp: row.get(11)?,
        })
    }
}

impl<'a> LinkStoreTrait for LinkStore<'a> {
    /// Inserts a new row with an empty action. Returns the assigned ID.
    fn insert(&self, new: &NewBookmark, timestamp: &str) -> Result<i64, LinkError> {
        let tags = serde_json::to_string(&new.tags)?;
        let props = serde_json::to_string(&new.custom_properties)?;

        self.conn.execute(
            "INSERT INTO links (url, title, description, content, action, topic, tags, custom_properties, timestamp) \
             VALUES (?1, ?2, ?3, ?4, '', ?5, ?6, ?7, ?8)",
            params![
                new.url,
                new.title,
                new.description,
                new.content,
                stored_topic(new.topic.as_deref()),
                tags,
                props,
                timestamp
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Updates only the supplied metadata columns, then returns the stored row.
    ///
    /// An empty patch writes nothing but still resolves (or reports not-found).
    fn update_partial(&self, id: i64, patch: &PartialUpdate) -> Result<Bookmark, LinkError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(action) = patch.action {
            sets.push("action = ?");
            values.push(Value::Text(action.as_str().to_string()));
        }
        if let Some(topic) = &patch.topic {
            sets.push("topic = ?");
            values.push(
                stored_topic(topic.as_deref()).map_or(Value::Null, |t| Value::Text(t.to_string())),
            );
        }
        if let Some(share_to) = &patch.share_to {
            sets.push("share_to = ?");
            values.push(share_to.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(project_id) = patch.project_id {
            sets.push("project_id = ?");
            values.push(project_id.map_or(Value::Null, Value::Integer));
        }
        if let Some(tags) = &patch.tags {
            sets.push("tags = ?");
            values.push(Value::Text(serde_json::to_string(tags)?));
        }
        if let Some(props) = &patch.custom_properties {
            sets.push("custom_properties = ?");
            values.push(Value::Text(serde_json::to_string(props)?));
        }

        if sets.is_empty() {
            return self.select_by_id(id);
        }

        let tx = self.conn.unchecked_transaction()?;
        let sql = format!("UPDATE links SET {} WHERE id = ?", sets.join(", "));
        values.push(Value::Integer(id));
        let affected = tx.execute(&sql, params_from_iter(values.iter()))?;
        if affected == 0 {
            return Err(LinkError::NotFound(id));
        }
        let updated = tx.query_row(
            &format!("SELECT {} FROM links WHERE id = ?1", COLUMNS),
            params![id],
            Self::row_to_bookmark,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    /// Overwrites every content and metadata column of one row.
    fn replace_full(&self, id: i64, record: &BookmarkRecord) -> Result<Bookmark, LinkError> {
        let tags = serde_json::to_string(&record.tags)?;
        let props = serde_json::to_string(&record.custom_properties)?;

        let tx = self.conn.unchecked_transaction()?;
        let affected = tx.execute(
            "UPDATE links SET url = ?1, title = ?2, description = ?3, content = ?4, action = ?5, \
             topic = ?6, share_to = ?7, project_id = ?8, tags = ?9, custom_properties = ?10 \
             WHERE id = ?11",
            params![
                record.url,
                record.title,
                record.description,
                record.content,
                record.action.as_str(),
                stored_topic(record.topic.as_deref()),
                record.share_to,
                record.project_id,
                tags,
                props,
                id
            ],
        )?;
        if affected == 0 {
            return Err(LinkError::NotFound(id));
        }
        let updated = tx.query_row(
            &format!("SELECT {} FROM links WHERE id = ?1", COLUMNS),
            params![id],
            Self::row_to_bookmark,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    fn select(&self, filter: LinkFilter, limit: i64, offset: i64) -> Result<Vec<Bookmark>, LinkError> {
        let (condition, mut values) = filter.to_sql();
        let sql = format!(
            "SELECT {} FROM links WHERE {} {} LIMIT ? OFFSET ?",
            COLUMNS, condition, NEWEST_FIRST
        );
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn count(&self, filter: LinkFilter) -> Result<i64, LinkError> {
        let (condition, values) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM links WHERE {}", condition);
        let total: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(total)
    }

    fn select_by_id(&self, id: i64) -> Result<Bookmark, LinkError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM links WHERE id = ?1", COLUMNS),
                params![id],
                Self::row_to_bookmark,
            )
            .optional()?
            .ok_or(LinkError::NotFound(id))
    }

    fn topic_stamps(&self, filter: LinkFilter) -> Result<Vec<TopicStamp>, LinkError> {
        let (condition, values) = filter.to_sql();
        let sql = format!(
            "SELECT topic, timestamp FROM links WHERE {} AND {}",
            condition, HAS_TOPIC_PREDICATE
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(TopicStamp {
                topic: row.get(0)?,
                timestamp: row.get(1)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn summary_counts(&self) -> Result<SummaryStats, LinkError> {
        let sql = format!(
            "SELECT COUNT(*), \
                    COALESCE(SUM(CASE WHEN {triage} THEN 1 ELSE 0 END), 0), \
                    COUNT(DISTINCT CASE WHEN action = 'working' AND {topic} THEN topic END), \
                    COALESCE(SUM(CASE WHEN action = 'share' THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN action = 'archived' THEN 1 ELSE 0 END), 0) \
             FROM links",
            triage = TRIAGE_PREDICATE,
            topic = HAS_TOPIC_PREDICATE
        );
        let stats = self.conn.query_row(&sql, [], |row| {
            Ok(SummaryStats {
                total: row.get(0)?,
                needs_triage: row.get(1)?,
                active_projects: row.get(2)?,
                shared: row.get(3)?,
                archived: row.get(4)?,
            })
        })?;
        Ok(stats)
    }

    fn delete(&self, id: i64) -> Result<(), LinkError> {
        let affected = self
            .conn
            .execute("DELETE FROM links WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(LinkError::NotFound(id));
        }
        Ok(())
    }
}
