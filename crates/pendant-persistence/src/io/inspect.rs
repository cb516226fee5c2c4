//! Read-only inspection of the domain files.

use std::path::PathBuf;

use super::store::TextStore;
use crate::layout::{DataLayout, Domain};
use crate::serializer::parse_container;
use crate::types::{Container, MovementData, SetupData, SystemData, TeachingData};

/// Health of one domain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    /// Parsed successfully.
    Valid { records: usize },
    /// File exists but is empty.
    Empty,
    Missing,
    /// File exists but could not be parsed.
    Corrupt { reason: String },
    /// File could not be read.
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatus {
    pub domain: Domain,
    pub path: PathBuf,
    pub bytes: Option<u64>,
    pub state: FileState,
}

/// Inspect the file for `domain` without modifying anything.
pub fn inspect_domain(store: &dyn TextStore, layout: &DataLayout, domain: Domain) -> DomainStatus {
    let path = layout.file_path(domain);
    let bytes = std::fs::metadata(&path).ok().map(|m| m.len());

    let state = match store.read_text(&path) {
        Ok(text) => match domain {
            Domain::Movement => classify::<MovementData>(&text),
            Domain::Teaching => classify::<TeachingData>(&text),
            Domain::Setup => classify::<SetupData>(&text),
            Domain::System => classify::<SystemData>(&text),
        },
        Err(e) if e.is_not_found() => FileState::Missing,
        Err(e) => FileState::Unreadable {
            reason: e.user_message(),
        },
    };

    DomainStatus {
        domain,
        path,
        bytes,
        state,
    }
}

fn classify<C: Container>(text: &str) -> FileState {
    match parse_container::<C>(text) {
        Ok(Some(container)) => FileState::Valid {
            records: container.record_count(),
        },
        Ok(None) => FileState::Empty,
        Err(e) => FileState::Corrupt {
            reason: std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_else(|| e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DurableFileStore;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_states() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = DurableFileStore::default();
        std::fs::write(layout.file_path(Domain::Teaching), "{ broken").unwrap();
        std::fs::write(layout.file_path(Domain::Setup), "").unwrap();
        std::fs::write(layout.file_path(Domain::System), "{}").unwrap();

        assert_eq!(
            inspect_domain(&store, &layout, Domain::Movement).state,
            FileState::Missing
        );
        assert!(matches!(
            inspect_domain(&store, &layout, Domain::Teaching).state,
            FileState::Corrupt { .. }
        ));
        assert_eq!(
            inspect_domain(&store, &layout, Domain::Setup).state,
            FileState::Empty
        );

        let system = inspect_domain(&store, &layout, Domain::System);
        assert_eq!(system.state, FileState::Valid { records: 1 });
        assert_eq!(system.bytes, Some(2));
    }
}
