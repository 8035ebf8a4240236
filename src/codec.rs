//! Snapshot byte codec
//!
//! The engine never touches serialization directly; it goes through this
//! trait so tests can inject faulty codecs and alternative formats can
//! slot in later.

use crate::error::SnapshotError;
use crate::scope::{Snapshot, VarValue};

/// Serializes snapshots to bytes and back.
pub trait Codec {
    /// Serialize the whole snapshot.
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError>;

    /// Deserialize stored bytes into a name→value mapping.
    fn decode(&self, bytes: &[u8]) -> Result<Snapshot, SnapshotError>;

    /// Cheap per-item pre-check: can this value make it into a snapshot?
    fn can_encode(&self, value: &VarValue) -> bool;
}

/// JSON codec. Pretty-printed so snapshot files stay diffable.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec_pretty(snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        serde_json::from_slice(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    fn can_encode(&self, value: &VarValue) -> bool {
        value.as_data().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let mut snapshot = Snapshot::default();
        snapshot.entries.insert("a".to_string(), json!(1));
        snapshot.entries.insert("b".to_string(), json!({"k": [1, 2]}));

        let codec = JsonCodec;
        let bytes = codec.encode(&snapshot).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_decode_rejects_non_mapping() {
        let codec = JsonCodec;
        assert!(matches!(
            codec.decode(b"[1, 2, 3]"),
            Err(SnapshotError::Decode(_))
        ));
        assert!(matches!(
            codec.decode(b"not json at all"),
            Err(SnapshotError::Decode(_))
        ));
    }

    #[test]
    fn test_can_encode_only_data() {
        let codec = JsonCodec;
        assert!(codec.can_encode(&VarValue::Data(json!(null))));
        assert!(!codec.can_encode(&VarValue::Opaque("open file".to_string())));
        assert!(!codec.can_encode(&VarValue::Callable("f()".to_string())));
    }
}
