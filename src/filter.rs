//! Eligibility filter for session variables
//!
//! Decides whether a binding should ever be persisted or restored.
//! Total and deterministic: a pure predicate with no side effects.

use crate::scope::VarValue;

/// Names reserved by the hosting session and never persisted: input and
/// output history, the scratch-temp name, and the test-harness injection
/// name.
const RESERVED_NAMES: &[&str] = &["In", "Out", "tmp", "monkeypatch"];

/// Prefix marking a binding as private to the hosting session.
const PRIVATE_PREFIX: char = '_';

/// Whether a binding may be saved or restored.
///
/// Reserved and private-prefixed names are excluded, as are callables,
/// module handles and logger handles. `Opaque` values pass the filter;
/// they are weeded out later by the codec's encode check.
pub fn is_eligible(name: &str, value: &VarValue) -> bool {
    if name.starts_with(PRIVATE_PREFIX) || RESERVED_NAMES.contains(&name) {
        return false;
    }
    !matches!(
        value,
        VarValue::Callable(_) | VarValue::Module(_) | VarValue::Logger(_)
    )
}
