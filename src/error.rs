/// Errors that abandon processing of the current commit or query.
#[derive(Debug, thiserror::Error)]
pub enum ContribError {
    #[error("required dependency not available: {name}")]
    MissingDependency { name: String },

    #[error("line count for {path}@{revision} in commit {commit} could not be retrieved: {reason}")]
    LookupFailure {
        commit: String,
        path: String,
        revision: String,
        reason: String,
    },

    #[error("configuration option {key} is invalid: {value}")]
    InvalidConfiguration { key: String, value: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("settings error: {0}")]
    Settings(String),
}

/// Failures of the external line-count metric.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineCountError {
    #[error("no line count recorded for {path}@{revision}")]
    NotFound { path: String, revision: String },

    #[error("line count metric failed: {0}")]
    Failed(String),
}
