pub mod codec;
pub mod error;
pub mod filter;
pub mod prompt;
pub mod scope;
pub mod store;
pub mod trust;

pub use codec::{Codec, JsonCodec};
pub use error::SnapshotError;
pub use filter::is_eligible;
pub use prompt::{confirm, Answer, Console, DefaultAnswer, ScriptedConsole, StdinConsole};
pub use scope::{Scope, ScopeAccessor, Snapshot, VarValue};
pub use store::{
    eligible_names, resolve_snapshot_path, LoadReport, OverwritePolicy, SaveReport, Selection,
    VarStore, DEFAULT_STEM, SNAPSHOT_EXTENSION,
};
pub use trust::{FileMarker, MemoryMarker, WarnThrottle, WARN_WINDOW};
