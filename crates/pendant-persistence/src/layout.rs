//! Persisted domains and their on-disk layout.
//!
//! ```text
//! <AppData>/TeachingPendantData/
//!   MovementData.json
//!   TeachingData.json
//!   SetupData.json
//!   SystemData.json
//!   Backup/<yyyyMMdd_HHmmss>/*.json
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Folder created under the per-user application data directory.
pub const APP_DIR_NAME: &str = "TeachingPendantData";

/// Name of the folder holding timestamped backups.
pub const BACKUP_DIR_NAME: &str = "Backup";

/// One independently persisted category of operator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Movement,
    Teaching,
    Setup,
    System,
}

impl Domain {
    /// All domains, in load/save order.
    pub const ALL: [Domain; 4] = [
        Domain::Movement,
        Domain::Teaching,
        Domain::Setup,
        Domain::System,
    ];

    /// File name inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Movement => "MovementData.json",
            Self::Teaching => "TeachingData.json",
            Self::Setup => "SetupData.json",
            Self::System => "SystemData.json",
        }
    }

    /// Get display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Movement => "movement",
            Self::Teaching => "teaching",
            Self::Setup => "setup",
            Self::System => "system",
        }
    }

    /// Stable slot used for per-domain arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Movement => 0,
            Self::Teaching => 1,
            Self::Setup => 2,
            Self::System => 3,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown domain '{s}' (expected movement, teaching, setup or system)"))
    }
}

/// Resolved paths of the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Use `root` as the data directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<AppData>/TeachingPendantData`, or a relative folder when the
    /// platform has no per-user data directory.
    pub fn default_root() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSON file for `domain`.
    pub fn file_path(&self, domain: Domain) -> PathBuf {
        self.root.join(domain.file_name())
    }

    pub fn backup_root(&self) -> PathBuf {
        self.root.join(BACKUP_DIR_NAME)
    }

    /// Path of the backup folder called `name`.
    pub fn backup_dir(&self, name: &str) -> PathBuf {
        self.backup_root().join(name)
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.file_path(Domain::Teaching),
            PathBuf::from("/data/TeachingData.json")
        );
        assert_eq!(
            layout.backup_dir("20240101_120000"),
            PathBuf::from("/data/Backup/20240101_120000")
        );
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("Teaching".parse::<Domain>(), Ok(Domain::Teaching));
        assert_eq!(" system ".parse::<Domain>(), Ok(Domain::System));
        assert!("recipes".parse::<Domain>().is_err());
    }

    #[test]
    fn test_indices_are_distinct() {
        let mut seen = [false; 4];
        for domain in Domain::ALL {
            assert!(!seen[domain.index()]);
            seen[domain.index()] = true;
        }
    }
}
