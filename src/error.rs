//! Error taxonomy for snapshot operations

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Bad selection argument: a named variable is missing from the scope
    /// or a wildcard pattern matched nothing.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    /// Malformed overwrite-policy string (CLI / config surface).
    #[error("Invalid overwrite policy {0:?}, must be \"prompt\", \"yes\" or \"no\"")]
    InvalidPolicy(String),
    /// Snapshot file does not exist.
    #[error("Snapshot not found: {0:?}")]
    NotFound(PathBuf),
    /// Snapshot file exists but cannot be read.
    #[error("Cannot read snapshot {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Codec failed to serialize the assembled snapshot.
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
    /// Codec failed to deserialize the stored bytes. Always propagated.
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
    /// Scope rejected a single binding. Collected per item, never fatal.
    #[error("Could not bind variable {name}: {reason}")]
    Bind { name: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
