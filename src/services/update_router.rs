//! Client-side update routing.
//!
//! Decides, per edit, whether a bookmark change goes out as a full-record
//! replacement (any content field touched) or as a minimal metadata patch,
//! and keeps a local cache that only ever takes the server's answer.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::managers::link_store::LinkStoreTrait;
use crate::rpc_handler::handle_method;
use crate::services::lifecycle_engine::LifecycleEngine;
use crate::types::bookmark::{BookmarkDelta, BookmarkRecord, BookmarkView, PartialUpdate};
use crate::types::errors::RouterError;

/// Which write operation an edit needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    FullReplace,
    PartialUpdate,
}

/// Classifies a delta. Full replacement iff it names `title`, `url` or
/// `description`, whatever the value (clearing included).
pub fn route(delta: &BookmarkDelta) -> UpdateKind {
    if delta.touches_content() {
        UpdateKind::FullReplace
    } else {
        UpdateKind::PartialUpdate
    }
}

/// RPC params for a metadata patch.
pub fn partial_request(id: i64, patch: &PartialUpdate) -> Value {
    json!({ "id": id, "changes": patch })
}

/// RPC params for a full replacement.
pub fn replace_request(id: i64, record: &BookmarkRecord) -> Value {
    json!({ "id": id, "record": record })
}

/// A routed edit, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePlan {
    Replace { id: i64, record: BookmarkRecord },
    Patch { id: i64, patch: PartialUpdate },
}

impl UpdatePlan {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdatePlan::Replace { .. } => UpdateKind::FullReplace,
            UpdatePlan::Patch { .. } => UpdateKind::PartialUpdate,
        }
    }

    /// RPC method name and params this plan sends.
    pub fn rpc_request(&self) -> (&'static str, Value) {
        match self {
            UpdatePlan::Replace { id, record } => ("bookmark.replace", replace_request(*id, record)),
            UpdatePlan::Patch { id, patch } => ("bookmark.update", partial_request(*id, patch)),
        }
    }
}

/// The two write operations a router can issue.
pub trait BookmarkTransport {
    fn update_partial(&mut self, id: i64, patch: &PartialUpdate) -> Result<BookmarkView, RouterError>;
    fn replace_full(&mut self, id: i64, record: &BookmarkRecord) -> Result<BookmarkView, RouterError>;
}

impl<'s, S: LinkStoreTrait + ?Sized> BookmarkTransport for LifecycleEngine<'s, S> {
    fn update_partial(&mut self, id: i64, patch: &PartialUpdate) -> Result<BookmarkView, RouterError> {
        Ok(LifecycleEngine::update_partial(self, id, patch)?)
    }

    fn replace_full(&mut self, id: i64, record: &BookmarkRecord) -> Result<BookmarkView, RouterError> {
        Ok(LifecycleEngine::replace_full(self, id, record)?)
    }
}

/// Transport that goes through the JSON-RPC dispatcher, exactly as a remote
/// client would.
pub struct RpcTransport<'a> {
    app: &'a Mutex<App>,
}

impl<'a> RpcTransport<'a> {
    pub fn new(app: &'a Mutex<App>) -> Self {
        Self { app }
    }

    fn call(&self, method: &str, params: &Value) -> Result<BookmarkView, RouterError> {
        let reply = handle_method(self.app, method, params)?;
        serde_json::from_value(reply).map_err(|e| RouterError::MalformedResponse(e.to_string()))
    }
}

impl<'a> BookmarkTransport for RpcTransport<'a> {
    fn update_partial(&mut self, id: i64, patch: &PartialUpdate) -> Result<BookmarkView, RouterError> {
        self.call("bookmark.update", &partial_request(id, patch))
    }

    fn replace_full(&mut self, id: i64, record: &BookmarkRecord) -> Result<BookmarkView, RouterError> {
        self.call("bookmark.replace", &replace_request(id, record))
    }
}

/// Routes edits for bookmarks the client already holds.
pub struct UpdateRouter<T: BookmarkTransport> {
    transport: T,
    cache: HashMap<i64, BookmarkView>,
}

impl<T: BookmarkTransport> UpdateRouter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: HashMap::new(),
        }
    }

    /// Stores a server-provided view in the local cache.
    pub fn remember(&mut self, view: BookmarkView) {
        self.cache.insert(view.bookmark.id, view);
    }

    pub fn forget(&mut self, id: i64) -> Option<BookmarkView> {
        self.cache.remove(&id)
    }

    pub fn cached(&self, id: i64) -> Option<&BookmarkView> {
        self.cache.get(&id)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Decides how `delta` would be sent without sending it.
    ///
    /// Fails with `UnknownBookmark` when `id` is not cached.
    pub fn plan(&self, id: i64, delta: &BookmarkDelta) -> Result<UpdatePlan, RouterError> {
        let current = self.cache.get(&id).ok_or(RouterError::UnknownBookmark(id))?;

        Ok(match route(delta) {
            UpdateKind::FullReplace => UpdatePlan::Replace {
                id,
                record: delta.merge_over(&BookmarkRecord::from(&current.bookmark)),
            },
            UpdateKind::PartialUpdate => UpdatePlan::Patch {
                id,
                patch: delta.metadata(),
            },
        })
    }

    /// Routes and sends `delta`, then refreshes the cache from the reply.
    ///
    /// On failure the cached copy is left as it was.
    pub fn apply(&mut self, id: i64, delta: &BookmarkDelta) -> Result<BookmarkView, RouterError> {
        let plan = self.plan(id, delta)?;
        debug!(id, kind = ?plan.kind(), content = ?delta.content_keys(), "routing bookmark update");

        let updated = match &plan {
            UpdatePlan::Replace { record, .. } => self.transport.replace_full(id, record)?,
            UpdatePlan::Patch { patch, .. } => self.transport.update_partial(id, patch)?,
        };

        self.cache.insert(id, updated.clone());
        Ok(updated)
    }
}
