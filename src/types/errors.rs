use thiserror::Error;

// === LinkError ===

/// Errors surfaced by the link store and the lifecycle engine.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Required content is missing or an argument is malformed.
    #[error("Validation error: {0}")]
    Validation(String),
    /// No bookmark row has the given ID.
    #[error("Bookmark not found: {0}")]
    NotFound(i64),
    /// The underlying SQLite operation failed.
    #[error("Link store error: {0}")]
    Store(#[from] rusqlite::Error),
    /// A stored JSON column (tags, custom properties) could not be encoded or decoded.
    #[error("Link store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// Shared state became unusable, e.g. a poisoned lock.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LinkError {
    /// Stable, machine-checkable outcome code.
    ///
    /// Everything that is neither a validation nor a not-found condition
    /// collapses to `OPERATION_FAILED`.
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::Validation(_) => "VALIDATION_ERROR",
            LinkError::NotFound(_) => "NOT_FOUND",
            LinkError::Store(_) | LinkError::Encoding(_) | LinkError::Internal(_) => {
                "OPERATION_FAILED"
            },
        }
    }

    /// Message safe to show an end user. Store causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            LinkError::Validation(_) | LinkError::NotFound(_) => self.to_string(),
            LinkError::Store(_) | LinkError::Encoding(_) | LinkError::Internal(_) => {
                "Operation failed".to_string()
            },
        }
    }
}

// === RouterError ===

/// Errors raised by the client-side update router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The bookmark is not in the router's local cache; nothing was sent.
    #[error("Unknown bookmark: {0} is not in the local cache")]
    UnknownBookmark(i64),
    /// The remote side rejected or failed the write.
    #[error("Update failed: {0}")]
    Remote(#[from] LinkError),
    /// The remote reply could not be decoded into a bookmark.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

// === SettingsError ===

/// Errors related to loading and saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or parse settings JSON.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The dot-notation key does not exist.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The value does not fit the setting's type.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
