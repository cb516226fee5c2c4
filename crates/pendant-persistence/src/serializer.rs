//! Container <-> JSON text.
//!
//! Files are UTF-8, two-space indented JSON. Reading is tolerant: unknown
//! fields are ignored and missing fields take their defaults. Malformed or
//! empty text is reported as absent so callers can fall back to defaults.

use crate::error::{PersistenceError, Result};
use crate::types::Container;

/// Serialize a container to canonical, indented JSON.
pub fn serialize_container<C: Container>(container: &C) -> Result<String> {
    serde_json::to_string_pretty(container).map_err(|source| PersistenceError::Serialization {
        domain: C::DOMAIN,
        operation: "serialize",
        source,
    })
}

/// Parse JSON text into a normalized container.
///
/// Returns `Ok(None)` for empty or whitespace-only text, and a
/// [`PersistenceError::Serialization`] for malformed text.
pub fn parse_container<C: Container>(text: &str) -> Result<Option<C>> {
    // Tolerate a UTF-8 BOM written by other editors.
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Ok(None);
    }

    let mut container: C =
        serde_json::from_str(text).map_err(|source| PersistenceError::Serialization {
            domain: C::DOMAIN,
            operation: "parse",
            source,
        })?;
    container.normalize();
    Ok(Some(container))
}

/// Parse JSON text, treating malformed input as absent.
pub fn deserialize_container<C: Container>(text: &str) -> Option<C> {
    match parse_container(text) {
        Ok(container) => container,
        Err(e) => {
            tracing::error!(domain = %C::DOMAIN, error = %e, "Discarding malformed data");
            None
        }
    }
}
