//! Unit tests for the LinkStore public API.
//!
//! These exercise the `LinkStoreTrait` capability contract (insert, partial
//! and full updates, predicate selects, counters) against an in-memory
//! SQLite database.

use std::collections::{BTreeMap, BTreeSet};

use linkflow::database::Database;
use linkflow::managers::link_store::{LinkFilter, LinkStore, LinkStoreTrait};
use linkflow::types::bookmark::{Action, BookmarkRecord, NewBookmark, PartialUpdate, SummaryStats};
use linkflow::types::errors::LinkError;

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn new_link(url: &str, title: &str) -> NewBookmark {
    NewBookmark {
        url: url.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

fn set_action(store: &LinkStore, id: i64, action: Action) {
    let patch = PartialUpdate {
        action: Some(action),
        ..Default::default()
    };
    store.update_partial(id, &patch).unwrap();
}

#[test]
fn test_insert_then_select_by_id() {
    let db = setup();
    let store = LinkStore::new(db.connection());

    let mut new = new_link("https://example.com/a", "A");
    new.tags = BTreeSet::from(["rust".to_string(), "db".to_string()]);
    new.custom_properties = BTreeMap::from([("source".to_string(), "rss".to_string())]);
    let id = store.insert(&new, "2024-01-01T00:00:00Z").unwrap();

    let stored = store.select_by_id(id).unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.url, "https://example.com/a");
    assert_eq!(stored.action, Action::Unset);
    assert_eq!(stored.timestamp, "2024-01-01T00:00:00Z");
    assert_eq!(stored.tags.len(), 2);
    assert_eq!(stored.custom_properties["source"], "rss");
    assert_eq!(stored.project_id, None);
}

#[test]
fn test_select_by_id_missing_is_not_found() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    assert!(matches!(store.select_by_id(999_999), Err(LinkError::NotFound(999_999))));
}

#[test]
fn test_update_partial_touches_only_supplied_columns() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut new = new_link("https://example.com/a", "A");
    new.topic = Some("rust".to_string());
    new.description = Some("keep me".to_string());
    let id = store.insert(&new, "2024-01-01T00:00:00Z").unwrap();

    let patch = PartialUpdate {
        action: Some(Action::Share),
        share_to: Some(Some("team".to_string())),
        ..Default::default()
    };
    let updated = store.update_partial(id, &patch).unwrap();

    assert_eq!(updated.action, Action::Share);
    assert_eq!(updated.share_to.as_deref(), Some("team"));
    assert_eq!(updated.topic.as_deref(), Some("rust"));
    assert_eq!(updated.description.as_deref(), Some("keep me"));
    assert_eq!(updated.timestamp, "2024-01-01T00:00:00Z");
}

#[test]
fn test_update_partial_can_clear_nullable_columns() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut new = new_link("https://example.com/a", "A");
    new.topic = Some("rust".to_string());
    let id = store.insert(&new, "2024-01-01T00:00:00Z").unwrap();

    let patch = PartialUpdate {
        topic: Some(None),
        project_id: Some(Some(3)),
        ..Default::default()
    };
    let updated = store.update_partial(id, &patch).unwrap();
    assert_eq!(updated.topic, None);
    assert_eq!(updated.project_id, Some(3));
}

#[test]
fn test_update_partial_empty_patch_resolves_unchanged() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let id = store
        .insert(&new_link("https://example.com/a", "A"), "2024-01-01T00:00:00Z")
        .unwrap();

    let before = store.select_by_id(id).unwrap();
    let after = store.update_partial(id, &PartialUpdate::default()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_update_partial_missing_row_is_not_found() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let patch = PartialUpdate {
        action: Some(Action::Archived),
        ..Default::default()
    };
    assert!(matches!(store.update_partial(42, &patch), Err(LinkError::NotFound(42))));
    assert!(matches!(
        store.update_partial(42, &PartialUpdate::default()),
        Err(LinkError::NotFound(42))
    ));
}

#[test]
fn test_replace_full_overwrites_everything_but_identity_and_timestamp() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut new = new_link("https://old.example/a", "Old");
    new.description = Some("old description".to_string());
    new.content = Some("body".to_string());
    new.tags = BTreeSet::from(["old".to_string()]);
    let id = store.insert(&new, "2024-01-01T00:00:00Z").unwrap();

    let record = BookmarkRecord {
        url: "https://new.example/b".to_string(),
        title: "New".to_string(),
        description: None,
        content: Some("body".to_string()),
        action: Action::Working,
        topic: Some("parsers".to_string()),
        share_to: None,
        project_id: None,
        tags: BTreeSet::new(),
        custom_properties: BTreeMap::new(),
    };
    let updated = store.replace_full(id, &record).unwrap();

    assert_eq!(updated.id, id);
    assert_eq!(updated.timestamp, "2024-01-01T00:00:00Z");
    assert_eq!(updated.url, "https://new.example/b");
    assert_eq!(updated.description, None);
    assert_eq!(updated.action, Action::Working);
    assert!(updated.tags.is_empty());
}

#[test]
fn test_replace_full_missing_row_is_not_found() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let record = BookmarkRecord::from(&{
        let id = store
            .insert(&new_link("https://example.com", "E"), "2024-01-01T00:00:00Z")
            .unwrap();
        store.select_by_id(id).unwrap()
    });
    assert!(matches!(store.replace_full(777, &record), Err(LinkError::NotFound(777))));
}

#[test]
fn test_needs_triage_filter_treats_null_empty_and_read_later_alike() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let a = store.insert(&new_link("https://a.dev", "A"), "2024-01-01T00:00:00Z").unwrap();
    let b = store.insert(&new_link("https://b.dev", "B"), "2024-01-02T00:00:00Z").unwrap();
    let c = store.insert(&new_link("https://c.dev", "C"), "2024-01-03T00:00:00Z").unwrap();
    let _d = store.insert(&new_link("https://d.dev", "D"), "2024-01-04T00:00:00Z").unwrap();
    db.connection()
        .execute("UPDATE links SET action = NULL WHERE id = ?1", [a])
        .unwrap();
    set_action(&store, b, Action::ReadLater);
    set_action(&store, c, Action::Working);

    assert_eq!(store.count(LinkFilter::NeedsTriage).unwrap(), 3);
    assert_eq!(store.count(LinkFilter::Action(Action::Unset)).unwrap(), 3);
    assert_eq!(store.count(LinkFilter::Action(Action::ReadLater)).unwrap(), 3);
    assert_eq!(store.count(LinkFilter::Action(Action::Working)).unwrap(), 1);
    assert_eq!(store.count(LinkFilter::All).unwrap(), 4);
}

#[test]
fn test_select_orders_and_pages() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    for day in 1..=5 {
        store
            .insert(
                &new_link(&format!("https://{}.dev", day), &format!("T{}", day)),
                &format!("2024-01-0{}T00:00:00Z", day),
            )
            .unwrap();
    }

    let first = store.select(LinkFilter::All, 2, 0).unwrap();
    let titles: Vec<&str> = first.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["T5", "T4"]);

    let second = store.select(LinkFilter::All, 2, 1).unwrap();
    let titles: Vec<&str> = second.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["T4", "T3"]);
}

#[test]
fn test_select_orders_by_instant_across_timestamp_formats() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    store.insert(&new_link("https://early.dev", "early"), "2024-03-01T01:00:00Z").unwrap();
    store.insert(&new_link("https://offset.dev", "offset"), "2024-03-01T20:00:00-05:00").unwrap();
    db.connection()
        .execute(
            "INSERT INTO links (url, title, action, timestamp) VALUES (?1, ?2, '', ?3)",
            ["https://legacy.dev", "late legacy", "2024-03-01 23:00:00"],
        )
        .unwrap();
    store.insert(&new_link("https://bad.dev", "garbage"), "not a date").unwrap();

    let rows = store.select(LinkFilter::NeedsTriage, 10, 0).unwrap();
    let titles: Vec<&str> = rows.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["offset", "late legacy", "early", "garbage"]);
}

#[test]
fn test_blank_topic_is_stored_as_null_on_every_write() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut blank = new_link("https://a.dev", "A");
    blank.topic = Some("   ".to_string());
    let id = store.insert(&blank, "2024-01-01T00:00:00Z").unwrap();
    assert_eq!(store.select_by_id(id).unwrap().topic, None);

    store
        .update_partial(
            id,
            &PartialUpdate {
                topic: Some(Some("x".to_string())),
                ..Default::default()
            },
        )
        .unwrap();
    let patch = PartialUpdate {
        action: Some(Action::Working),
        topic: Some(Some("  ".to_string())),
        ..Default::default()
    };
    assert_eq!(store.update_partial(id, &patch).unwrap().topic, None);

    let mut record = BookmarkRecord::from(&store.select_by_id(id).unwrap());
    record.topic = Some("\t".to_string());
    assert_eq!(store.replace_full(id, &record).unwrap().topic, None);

    assert!(store.topic_stamps(LinkFilter::Action(Action::Working)).unwrap().is_empty());
    assert_eq!(store.summary_counts().unwrap().active_projects, 0);
}

#[test]
fn test_whitespace_topic_written_directly_is_not_a_topic() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let id = store.insert(&new_link("https://a.dev", "A"), "2024-01-01T00:00:00Z").unwrap();
    db.connection()
        .execute("UPDATE links SET action = 'working', topic = '  ' WHERE id = ?1", [id])
        .unwrap();

    assert!(store.topic_stamps(LinkFilter::Action(Action::Working)).unwrap().is_empty());
    assert_eq!(store.summary_counts().unwrap().active_projects, 0);
}

#[test]
fn test_topic_stamps_skip_empty_topics() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut with_topic = new_link("https://a.dev", "A");
    with_topic.topic = Some("x".to_string());
    let mut blank_topic = new_link("https://b.dev", "B");
    blank_topic.topic = Some(String::new());
    store.insert(&with_topic, "2024-01-01T00:00:00Z").unwrap();
    store.insert(&blank_topic, "2024-01-01T00:00:00Z").unwrap();
    store.insert(&new_link("https://c.dev", "C"), "2024-01-01T00:00:00Z").unwrap();

    let stamps = store.topic_stamps(LinkFilter::Reference).unwrap();
    assert_eq!(stamps.len(), 1);
    assert_eq!(stamps[0].topic, "x");
}

#[test]
fn test_summary_counts() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let mut ids = Vec::new();
    for (i, topic) in ["x", "x", "y", "", "z", "z"].iter().enumerate() {
        let mut new = new_link(&format!("https://{}.dev", i), "L");
        new.topic = Some(topic.to_string());
        ids.push(store.insert(&new, "2024-01-01T00:00:00Z").unwrap());
    }
    set_action(&store, ids[0], Action::Working);
    set_action(&store, ids[1], Action::Working);
    set_action(&store, ids[2], Action::Working);
    set_action(&store, ids[3], Action::Working);
    set_action(&store, ids[4], Action::Share);
    set_action(&store, ids[5], Action::Archived);

    let stats = store.summary_counts().unwrap();
    assert_eq!(stats.total, 6);
    assert_eq!(stats.needs_triage, 0);
    // "x" and "y"; the empty topic does not form a project.
    assert_eq!(stats.active_projects, 2);
    assert_eq!(stats.shared, 1);
    assert_eq!(stats.archived, 1);
}

#[test]
fn test_summary_counts_on_empty_table() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let stats = store.summary_counts().unwrap();
    assert_eq!(stats, SummaryStats::default());
}

#[test]
fn test_malformed_json_columns_degrade_to_empty() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let id = store.insert(&new_link("https://a.dev", "A"), "2024-01-01T00:00:00Z").unwrap();
    db.connection()
        .execute(
            "UPDATE links SET tags = 'not json', custom_properties = '[1,2]' WHERE id = ?1",
            [id],
        )
        .unwrap();

    let stored = store.select_by_id(id).unwrap();
    assert!(stored.tags.is_empty());
    assert!(stored.custom_properties.is_empty());
}

#[test]
fn test_unknown_action_label_is_a_store_error() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let id = store.insert(&new_link("https://a.dev", "A"), "2024-01-01T00:00:00Z").unwrap();
    db.connection()
        .execute("UPDATE links SET action = 'someday' WHERE id = ?1", [id])
        .unwrap();

    let err = store.select_by_id(id).unwrap_err();
    assert!(matches!(err, LinkError::Store(_)));
    assert_eq!(err.code(), "OPERATION_FAILED");
}

#[test]
fn test_delete() {
    let db = setup();
    let store = LinkStore::new(db.connection());
    let id = store.insert(&new_link("https://a.dev", "A"), "2024-01-01T00:00:00Z").unwrap();

    store.delete(id).unwrap();
    assert!(matches!(store.select_by_id(id), Err(LinkError::NotFound(_))));
    assert!(matches!(store.delete(id), Err(LinkError::NotFound(_))));
}
