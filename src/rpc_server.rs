//! Linkflow RPC Server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.create", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":{"code":"...","message":"..."}}
//!
//! Logs go to stderr so they never interleave with responses.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::{error, info, warn, Dispatch};
use tracing_subscriber::EnvFilter;

use linkflow::app::App;
use linkflow::database::connection::Database;
use linkflow::rpc_handler::handle_method;
use linkflow::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkflow::types::errors::LinkError;

/// Resolves the database file: `LINKFLOW_DATA_DIR`, then the configured
/// path, then `<data dir>/linkflow/linkflow.db`.
fn resolve_db_path(configured: &str) -> Result<PathBuf, io::Error> {
    let path = if let Ok(dir) = std::env::var("LINKFLOW_DATA_DIR") {
        PathBuf::from(dir).join("linkflow.db")
    } else if !configured.is_empty() {
        PathBuf::from(configured)
    } else {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkflow")
            .join("linkflow.db")
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

fn error_response(id: Value, err: &LinkError) -> Value {
    json!({
        "id": id,
        "error": { "code": err.code(), "message": err.public_message() },
    })
}

fn emit(out: &mut impl Write, response: &Value) -> io::Result<()> {
    writeln!(out, "{}", response)?;
    out.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut settings_engine = SettingsEngine::new(std::env::var("LINKFLOW_CONFIG").ok());
    settings_engine.load()?;

    let filter = std::env::var("LINKFLOW_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&settings_engine.get_settings().log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let db_path = resolve_db_path(&settings_engine.get_settings().database.path)?;
    let db = Database::open(&db_path)?;
    info!(path = %db_path.display(), "database opened");

    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    let app = Mutex::new(App::from_parts(db, settings_engine, dispatch));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(
        &mut out,
        &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}),
    )?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                let err = LinkError::Validation(format!("parse error: {}", e));
                emit(&mut out, &error_response(Value::Null, &err))?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => {
                if err.code() == "OPERATION_FAILED" {
                    error!(method, error = %err, "request failed");
                }
                error_response(id, &err)
            }
        };
        emit(&mut out, &response)?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
