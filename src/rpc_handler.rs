//! RPC method handler for the linkflow JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested on its own. The
//! `handle_method` function maps JSON params onto lifecycle-engine calls and
//! the results back onto JSON; it holds no rules of its own.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::App;
use crate::types::bookmark::{Action, BookmarkRecord, NewBookmark, PartialUpdate};
use crate::types::errors::LinkError;

/// Reads a bookmark ID from `params`. Accepts a JSON integer or a numeric string.
pub fn param_id(params: &Value) -> Result<i64, LinkError> {
    match params.get("id") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| LinkError::Validation(format!("malformed id: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| LinkError::Validation(format!("malformed id: '{}'", s))),
        Some(other) => Err(LinkError::Validation(format!("malformed id: {}", other))),
        None => Err(LinkError::Validation("missing id".to_string())),
    }
}

/// Reads an optional integer parameter, falling back to `default`.
fn param_i64(params: &Value, key: &str, default: i64) -> Result<i64, LinkError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| LinkError::Validation(format!("{} must be an integer", key))),
    }
}

/// Decodes `value` into `T`, reporting shape errors as validation failures.
fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, LinkError> {
    serde_json::from_value(value)
        .map_err(|e| LinkError::Validation(format!("invalid {}: {}", what, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, LinkError> {
    Ok(serde_json::to_value(value)?)
}

/// Dispatch a JSON-RPC method call to the lifecycle engine.
///
/// Returns `Ok(Value)` on success or the `LinkError` the call produced.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, LinkError> {
    let a = app
        .lock()
        .map_err(|e| LinkError::Internal(format!("app state poisoned: {}", e)))?;

    match method {
        // ─── Capture ───
        "bookmark.create" => {
            let new: NewBookmark = decode(params.clone(), "bookmark")?;
            let view = a.with_engine(|engine| engine.create_bookmark(new))?;
            to_json(&view)
        }

        // ─── Triage ───
        "triage.queue" => {
            let limit = param_i64(params, "limit", a.settings().triage.default_page_size)?;
            let offset = param_i64(params, "offset", 0)?;
            let page = a.with_engine(|engine| engine.get_triage_queue(limit, offset))?;
            to_json(&page)
        }

        // ─── Derived views ───
        "projects.active" => {
            let projects = a.with_engine(|engine| engine.get_active_projects())?;
            to_json(&projects)
        }
        "collections.reference" => {
            let collections = a.with_engine(|engine| engine.get_reference_collections())?;
            to_json(&collections)
        }
        "stats.summary" => {
            let stats = a.with_engine(|engine| engine.get_summary_stats())?;
            to_json(&stats)
        }

        // ─── Lookups ───
        "bookmark.get" => {
            let id = param_id(params)?;
            let view = a.with_engine(|engine| engine.get_bookmark_by_id(id))?;
            to_json(&view)
        }
        "bookmark.by_action" => {
            let label = params
                .get("action")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LinkError::Validation("missing action".to_string()))?;
            let action: Action = label.parse().map_err(LinkError::Validation)?;
            let limit = param_i64(params, "limit", a.settings().triage.default_page_size)?;
            let offset = param_i64(params, "offset", 0)?;
            let views =
                a.with_engine(|engine| engine.get_bookmarks_by_action(action, limit, offset))?;
            to_json(&views)
        }

        // ─── Writes ───
        "bookmark.update" => {
            let id = param_id(params)?;
            let patch: PartialUpdate = match params.get("changes") {
                Some(changes) => decode(changes.clone(), "changes")?,
                None => PartialUpdate::default(),
            };
            let view = a.with_engine(|engine| engine.update_partial(id, &patch))?;
            to_json(&view)
        }
        "bookmark.replace" => {
            let id = param_id(params)?;
            let record: BookmarkRecord = decode(
                params
                    .get("record")
                    .cloned()
                    .ok_or_else(|| LinkError::Validation("missing record".to_string()))?,
                "record",
            )?;
            let view = a.with_engine(|engine| engine.replace_full(id, &record))?;
            to_json(&view)
        }
        "bookmark.delete" => {
            let id = param_id(params)?;
            a.with_engine(|engine| engine.delete_bookmark(id))?;
            Ok(json!({"ok": true}))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(LinkError::Validation(format!("unknown method: {}", method))),
    }
}
