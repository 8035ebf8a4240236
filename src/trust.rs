//! Trust-warning throttle
//!
//! Restoring serialized data from an untrusted file deserves a warning,
//! but not on every load. A timestamp marker shared across all sessions
//! on the host throttles the prompt to once per rolling window.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Rolling window during which the warning is not repeated.
pub const WARN_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Marker file name inside the host temp directory. Only its
/// modification time is meaningful.
const MARKER_FILENAME: &str = "varsnap-warned";

/// When (if ever) was the user last warned, and record a fresh warning.
pub trait WarnThrottle {
    fn last_warned_at(&self) -> Option<SystemTime>;
    fn mark_warned_now(&mut self) -> io::Result<()>;
}

/// Whether a warning recorded at `last` has aged out of [`WARN_WINDOW`].
///
/// A clock that moved backwards makes the age unmeasurable; warn again
/// rather than stay silent.
pub fn is_stale(last: Option<SystemTime>) -> bool {
    match last {
        Some(at) => match at.elapsed() {
            Ok(age) => age > WARN_WINDOW,
            Err(_) => true,
        },
        None => true,
    }
}

/// File-backed throttle at a fixed well-known path in the temp dir,
/// shared by every session on the host.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(MARKER_FILENAME),
        }
    }

    /// Throttle backed by an explicit path (tests point this at a
    /// scratch directory).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for FileMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl WarnThrottle for FileMarker {
    fn last_warned_at(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn mark_warned_now(&mut self) -> io::Result<()> {
        // Rewriting the (empty) file touches its mtime
        fs::write(&self.path, b"")
    }
}

/// In-memory throttle for tests and embedders that do not want the
/// shared marker file.
#[derive(Debug, Clone, Default)]
pub struct MemoryMarker {
    warned_at: Option<SystemTime>,
}

impl MemoryMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A marker that already carries a timestamp.
    pub fn warned_at(at: SystemTime) -> Self {
        Self { warned_at: Some(at) }
    }
}

impl WarnThrottle for MemoryMarker {
    fn last_warned_at(&self) -> Option<SystemTime> {
        self.warned_at
    }

    fn mark_warned_now(&mut self) -> io::Result<()> {
        self.warned_at = Some(SystemTime::now());
        Ok(())
    }
}
