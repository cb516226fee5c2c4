//! Content fingerprints used to skip redundant writes.

use std::path::Path;

use sha2::{Digest, Sha256};

use super::store::TextStore;

/// SHA-256 of rendered file text, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self(hex::encode(Sha256::digest(text.as_bytes())))
    }

    /// Fingerprint of a file's current contents, if it can be read.
    pub fn of_file(store: &dyn TextStore, path: &Path) -> Option<Self> {
        store.read_text(path).ok().map(|text| Self::of(&text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
