//! App Core for linkflow.
//!
//! Central struct holding the database, settings and the logger handed to the
//! engine, so request handlers never reach for process-wide state.

use tracing::Dispatch;

use crate::database::connection::Database;
use crate::managers::link_store::LinkStore;
use crate::services::lifecycle_engine::LifecycleEngine;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::AppError;
use crate::types::settings::LinkflowSettings;

/// Central application struct.
///
/// `LinkStore` and `LifecycleEngine` borrow the connection, so they are built
/// per request through [`App::with_engine`].
pub struct App {
    pub db: Database,
    pub settings_engine: SettingsEngine,
    dispatch: Dispatch,
}

impl App {
    /// Opens the database at `db_path` and loads settings from `config_path`
    /// (or the default location). Events go to the current default subscriber.
    pub fn new(db_path: &str, config_path: Option<String>) -> Result<Self, AppError> {
        let mut settings_engine = SettingsEngine::new(config_path);
        settings_engine.load()?;
        let db = Database::open(db_path)?;
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        Ok(Self::from_parts(db, settings_engine, dispatch))
    }

    /// Assembles an app from already-constructed parts.
    pub fn from_parts(db: Database, settings_engine: SettingsEngine, dispatch: Dispatch) -> Self {
        Self {
            db,
            settings_engine,
            dispatch,
        }
    }

    /// In-memory database, default settings and a silent logger.
    pub fn in_memory() -> Result<Self, AppError> {
        let db = Database::open_in_memory()?;
        let settings_engine =
            SettingsEngine::with_settings(String::new(), LinkflowSettings::default());
        Ok(Self::from_parts(db, settings_engine, Dispatch::none()))
    }

    pub fn settings(&self) -> &LinkflowSettings {
        self.settings_engine.get_settings()
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with an engine over this app's database and project policy.
    pub fn with_engine<T>(&self, f: impl FnOnce(&LifecycleEngine<'_, LinkStore<'_>>) -> T) -> T {
        let store = LinkStore::new(self.db.connection());
        let engine = LifecycleEngine::new(&store, self.settings().projects, self.dispatch.clone());
        f(&engine)
    }
}
