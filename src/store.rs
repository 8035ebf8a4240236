//! Capture/restore engine for session variables
//!
//! `VarStore` orchestrates selection, eligibility filtering, codec calls
//! with per-item failure isolation, overwrite-conflict resolution during
//! restore, and the once-per-window trust warning. Serialization, the
//! console and the warning throttle are injected so tests can substitute
//! doubles for all three.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;

use crate::codec::{Codec, JsonCodec};
use crate::error::SnapshotError;
use crate::filter::is_eligible;
use crate::prompt::{confirm, Answer, Console, DefaultAnswer, StdinConsole};
use crate::scope::{ScopeAccessor, Snapshot, VarValue};
use crate::trust::{is_stale, FileMarker, WarnThrottle};

/// Extension appended to snapshot paths that carry none.
pub const SNAPSHOT_EXTENSION: &str = "vars";

/// File stem used when the CLI is given no path.
pub const DEFAULT_STEM: &str = "saved_vars";

/// Which bindings a save call captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every eligible binding.
    All,
    /// Exactly these names; a missing name fails the whole save.
    Names(Vec<String>),
    /// Case-sensitive glob pattern (`*` and `?`); zero matches fails.
    Pattern(String),
}

/// How to resolve an existing file (save) or an existing binding (load).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    Prompt,
    Yes,
    No,
}

impl FromStr for OverwritePolicy {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" => Ok(OverwritePolicy::Prompt),
            "yes" => Ok(OverwritePolicy::Yes),
            "no" => Ok(OverwritePolicy::No),
            other => Err(SnapshotError::InvalidPolicy(other.to_string())),
        }
    }
}

/// Outcome of a save call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Names written to the snapshot file.
    pub saved: Vec<String>,
    /// Eligible names whose values the codec could not encode.
    pub unserializable: Vec<String>,
}

/// Outcome of a load call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names bound into the scope (fresh and overwritten).
    pub bound: Vec<String>,
    /// Conflicting names the user or policy declined to overwrite.
    pub skipped: Vec<String>,
    /// Names the scope refused to bind. Each failure is logged and the
    /// rest of the restore continues.
    pub failed: Vec<String>,
}

/// Append the snapshot extension when the caller gave a bare path.
pub fn resolve_snapshot_path(path: &Path) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension(SNAPSHOT_EXTENSION)
    } else {
        path.to_path_buf()
    }
}

/// Eligible variable names in the scope, in scope order.
pub fn eligible_names(scope: &dyn ScopeAccessor) -> Vec<String> {
    scope
        .read()
        .iter()
        .filter(|(name, value)| is_eligible(name, value))
        .map(|(name, _)| name.clone())
        .collect()
}

fn pattern_regex(pattern: &str) -> Result<Regex, SnapshotError> {
    let mut source = String::with_capacity(pattern.len() + 4);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            ch => source.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
        .map_err(|e| SnapshotError::InvalidSelection(format!("bad pattern {pattern:?}: {e}")))
}

/// The capture/restore engine.
pub struct VarStore<C: Codec, K: Console, W: WarnThrottle> {
    codec: C,
    console: K,
    trust: W,
}

impl VarStore<JsonCodec, StdinConsole, FileMarker> {
    /// JSON codec, real stdin and the shared temp-dir warning marker.
    pub fn standard() -> Self {
        Self::new(JsonCodec, StdinConsole::new(), FileMarker::new())
    }
}

impl<C: Codec, K: Console, W: WarnThrottle> VarStore<C, K, W> {
    pub fn new(codec: C, console: K, trust: W) -> Self {
        Self {
            codec,
            console,
            trust,
        }
    }

    /// Capture the selected bindings of `scope` into a snapshot file.
    ///
    /// Ineligible bindings are dropped silently; eligible bindings the
    /// codec cannot encode are collected into the report instead of
    /// aborting. Saving nothing is a logged no-op. An existing target
    /// file is resolved via `overwrite`.
    pub fn save(
        &mut self,
        scope: &dyn ScopeAccessor,
        path: impl AsRef<Path>,
        selection: Selection,
        overwrite: OverwritePolicy,
    ) -> Result<SaveReport, SnapshotError> {
        let path = resolve_snapshot_path(path.as_ref());
        let bindings = scope.read();

        let selected: BTreeMap<String, VarValue> = match selection {
            Selection::All => bindings,
            Selection::Names(names) => {
                if names.is_empty() {
                    return Err(SnapshotError::InvalidSelection(
                        "explicit name list must not be empty".to_string(),
                    ));
                }
                let mut picked = BTreeMap::new();
                for name in names {
                    match bindings.get(&name) {
                        Some(value) => {
                            picked.insert(name, value.clone());
                        }
                        None => {
                            return Err(SnapshotError::InvalidSelection(format!(
                                "{name:?} is not a variable in the current scope"
                            )));
                        }
                    }
                }
                picked
            }
            Selection::Pattern(pattern) => {
                let re = pattern_regex(&pattern)?;
                let picked: BTreeMap<String, VarValue> = bindings
                    .into_iter()
                    .filter(|(name, _)| re.is_match(name))
                    .collect();
                if picked.is_empty() {
                    return Err(SnapshotError::InvalidSelection(format!(
                        "pattern {pattern:?} matched no variables"
                    )));
                }
                picked
            }
        };

        let mut snapshot = Snapshot::default();
        let mut report = SaveReport::default();
        for (name, value) in &selected {
            if !is_eligible(name, value) {
                tracing::debug!(name = %name, kind = value.kind(), "Dropping ineligible binding");
                continue;
            }
            if !self.codec.can_encode(value) {
                report.unserializable.push(name.clone());
                continue;
            }
            match value.as_data() {
                Some(data) => {
                    snapshot.entries.insert(name.clone(), data.clone());
                }
                // Codec claimed it could encode a non-data value; treat
                // as a per-item failure rather than trusting it
                None => report.unserializable.push(name.clone()),
            }
        }

        if snapshot.is_empty() {
            tracing::warn!(path = %path.display(), "Found no variables to save");
            if !report.unserializable.is_empty() {
                tracing::warn!(names = ?report.unserializable, "Could not serialize");
            }
            return Ok(report);
        }

        if path.exists() {
            let proceed = match overwrite {
                OverwritePolicy::Yes => true,
                OverwritePolicy::No => false,
                OverwritePolicy::Prompt => confirm(
                    &mut self.console,
                    &format!("File {} already exists, overwrite it?", path.display()),
                    DefaultAnswer::Yes,
                    None,
                    false,
                )
                .accepted(),
            };
            if !proceed {
                tracing::info!(path = %path.display(), "Save cancelled");
                if !report.unserializable.is_empty() {
                    tracing::warn!(names = ?report.unserializable, "Could not serialize");
                }
                // Nothing was written, but the encode pre-check results
                // still belong in the report
                return Ok(report);
            }
        }

        let bytes = match self.codec.encode(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to encode snapshot");
                return Err(e);
            }
        };
        fs::write(&path, bytes)?;

        report.saved = snapshot.names();
        tracing::info!(path = %path.display(), saved = ?report.saved, "Saved variables");
        if !report.unserializable.is_empty() {
            tracing::warn!(names = ?report.unserializable, "Could not serialize");
        }
        Ok(report)
    }

    /// Restore bindings from a snapshot file into `scope`.
    ///
    /// A missing or unreadable file and a decode failure are propagated;
    /// everything past decoding is per-item. Conflicting names go
    /// through `overwrite`, with an `always` answer suppressing further
    /// prompts for the rest of this call. With `warn` set, an untrusted-
    /// data warning is shown at most once per rolling window; declining
    /// it cancels the load before any binding is touched.
    pub fn load(
        &mut self,
        scope: &mut dyn ScopeAccessor,
        path: impl AsRef<Path>,
        overwrite: OverwritePolicy,
        warn: bool,
    ) -> Result<LoadReport, SnapshotError> {
        let path = resolve_snapshot_path(path.as_ref());
        if !path.exists() {
            return Err(SnapshotError::NotFound(path));
        }
        // Readability is a hard error resolved before the user is
        // bothered with the trust prompt
        let bytes = fs::read(&path).map_err(|source| SnapshotError::Unreadable {
            path: path.clone(),
            source,
        })?;

        if warn && is_stale(self.trust.last_warned_at()) {
            let question = format!(
                "Restoring \"{}\" applies untrusted serialized data to your session.\n\
                 This warning is shown once per 24h and can be suppressed with warn=false.\n\
                 Do you trust \"{}\"?",
                path.display(),
                path.display()
            );
            if confirm(&mut self.console, &question, DefaultAnswer::No, None, false) != Answer::Yes
            {
                tracing::info!(path = %path.display(), "Load cancelled");
                return Ok(LoadReport::default());
            }
            if let Err(e) = self.trust.mark_warned_now() {
                tracing::warn!(error = %e, "Could not update trust-warning marker");
            }
        }

        let snapshot = match self.codec.decode(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to decode snapshot");
                return Err(e);
            }
        };
        tracing::info!(path = %path.display(), names = ?snapshot.names(), "Loaded snapshot");

        let existing = scope.read();
        let mut report = LoadReport::default();
        let mut always = false;
        for (name, data) in snapshot.entries {
            let value = VarValue::Data(data);
            if !is_eligible(&name, &value) {
                tracing::warn!(name = %name, "Skipping ineligible name from snapshot");
                continue;
            }
            let apply = if !existing.contains_key(&name) {
                true
            } else {
                match overwrite {
                    OverwritePolicy::Yes => true,
                    OverwritePolicy::No => false,
                    OverwritePolicy::Prompt => {
                        always
                            || match confirm(
                                &mut self.console,
                                &format!("Overwrite existing variable \"{name}\"?"),
                                DefaultAnswer::Yes,
                                None,
                                true,
                            ) {
                                Answer::Always => {
                                    always = true;
                                    true
                                }
                                Answer::Yes => true,
                                Answer::No => false,
                            }
                    }
                }
            };
            if !apply {
                report.skipped.push(name);
                continue;
            }
            match scope.write(&name, value) {
                Ok(()) => report.bound.push(name),
                Err(e) => {
                    tracing::error!(name = %name, error = %e, "Could not bind variable");
                    report.failed.push(name);
                }
            }
        }

        if !report.bound.is_empty() {
            tracing::info!(names = ?report.bound, "Bound variables");
        }
        if !report.skipped.is_empty() {
            tracing::info!(names = ?report.skipped, "Did not overwrite existing variables");
        }
        Ok(report)
    }

    /// Names stored in a snapshot file, without binding anything.
    pub fn peek(&self, path: impl AsRef<Path>) -> Result<Vec<String>, SnapshotError> {
        let path = resolve_snapshot_path(path.as_ref());
        if !path.exists() {
            return Err(SnapshotError::NotFound(path));
        }
        let bytes = fs::read(&path).map_err(|source| SnapshotError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Ok(self.codec.decode(&bytes)?.names())
    }
}
