//! Timestamped backups of the domain files.
//!
//! Backups live in `Backup/<yyyyMMdd_HHmmss>/` under the data directory and
//! hold a copy of every domain file that existed at the time.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use super::store::TextStore;
use crate::error::{PersistenceError, Result};
use crate::layout::{DataLayout, Domain};

const NAME_FORMAT: &str = "%Y%m%d_%H%M%S";
const NAME_LEN: usize = 15;

/// A backup folder found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub created: NaiveDateTime,
    pub path: PathBuf,
    /// Domains with a file in this backup.
    pub domains: Vec<Domain>,
}

/// Folder name for a backup taken at `at`.
pub fn backup_name(at: NaiveDateTime) -> String {
    at.format(NAME_FORMAT).to_string()
}

fn parse_backup_name(name: &str) -> Option<NaiveDateTime> {
    let mut components = Path::new(name).components();
    let single = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !name.contains(['/', '\\']);
    if !single {
        return None;
    }

    let stamp = name.get(..NAME_LEN)?;
    NaiveDateTime::parse_from_str(stamp, NAME_FORMAT).ok()
}

/// Copy the current domain files into a new backup folder.
///
/// Returns the folder created. Best effort: missing domain files are
/// skipped, and a file that cannot be copied is logged and skipped while the
/// others are still copied. A backup with no files at all is still created
/// so the attempt is visible.
pub fn create_backup(store: &dyn TextStore, layout: &DataLayout) -> Result<PathBuf> {
    let base = backup_name(Local::now().naive_local());
    let mut name = base.clone();
    let mut suffix = 1;
    while layout.backup_dir(&name).exists() {
        suffix += 1;
        name = format!("{base}_{suffix}");
    }

    let dir = layout.backup_dir(&name);
    fs::create_dir_all(&dir).map_err(|e| PersistenceError::from_io("create directory", &dir, e))?;

    let mut copied = 0;
    let mut skipped = 0;
    for domain in Domain::ALL {
        let source = layout.file_path(domain);
        if !store.exists(&source) {
            continue;
        }
        let copy = store
            .read_text(&source)
            .and_then(|text| store.write_text(&dir.join(domain.file_name()), &text));
        match copy {
            Ok(()) => copied += 1,
            Err(e) => {
                skipped += 1;
                tracing::warn!(backup = %name, domain = %domain, error = %e, "File left out of backup");
            }
        }
    }

    tracing::info!(backup = %name, files = copied, skipped, "Created backup");
    Ok(dir)
}

/// All backups, newest first.
pub fn list_backups(layout: &DataLayout) -> Vec<BackupInfo> {
    let Ok(entries) = fs::read_dir(layout.backup_root()) else {
        return Vec::new();
    };

    let mut backups: Vec<BackupInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let created = parse_backup_name(&name)?;
            let path = entry.path();
            let domains = Domain::ALL
                .into_iter()
                .filter(|d| path.join(d.file_name()).is_file())
                .collect();
            Some(BackupInfo {
                name,
                created,
                path,
                domains,
            })
        })
        .collect();

    backups.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
    backups
}

/// Delete the oldest backups beyond `keep`. `keep == 0` keeps everything.
///
/// Returns the number of folders removed.
pub fn prune_backups(layout: &DataLayout, keep: usize) -> usize {
    if keep == 0 {
        return 0;
    }

    let mut removed = 0;
    for backup in list_backups(layout).into_iter().skip(keep) {
        match fs::remove_dir_all(&backup.path) {
            Ok(()) => {
                tracing::debug!(backup = %backup.name, "Pruned old backup");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(backup = %backup.name, error = %e, "Failed to prune backup");
            }
        }
    }
    removed
}

/// Read every domain file stored in the backup called `name`.
pub fn read_backup(
    store: &dyn TextStore,
    layout: &DataLayout,
    name: &str,
) -> Result<Vec<(Domain, String)>> {
    let dir = layout.backup_dir(name);
    if parse_backup_name(name).is_none() || !dir.is_dir() {
        return Err(PersistenceError::BackupNotFound {
            name: name.to_string(),
        });
    }

    let mut files = Vec::new();
    for domain in Domain::ALL {
        let path = dir.join(domain.file_name());
        match store.read_text(&path) {
            Ok(text) => files.push((domain, text)),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DurableFileStore;
    use chrono::NaiveDate;
    use std::io;
    use std::path::Path;
    use tempfile::tempdir;

    /// Real files, except that one path is held by another program.
    struct LockedFileStore {
        inner: DurableFileStore,
        locked: PathBuf,
    }

    impl TextStore for LockedFileStore {
        fn read_text(&self, path: &Path) -> Result<String> {
            if path == self.locked {
                return Err(PersistenceError::TransientIo {
                    operation: "read",
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::ResourceBusy),
                });
            }
            self.inner.read_text(path)
        }

        fn write_text(&self, path: &Path, text: &str) -> Result<()> {
            self.inner.write_text(path, text)
        }
    }

    fn make_backup_dir(layout: &DataLayout, name: &str) {
        fs::create_dir_all(layout.backup_dir(name)).unwrap();
    }

    #[test]
    fn test_backup_name_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(backup_name(at), "20240309_070501");
        assert_eq!(parse_backup_name("20240309_070501_2"), Some(at));
        assert_eq!(parse_backup_name("notes"), None);
    }

    #[test]
    fn test_create_backup_copies_existing_files() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = DurableFileStore::default();
        fs::write(layout.file_path(Domain::Teaching), "{\"Groups\":{}}").unwrap();

        let backup = create_backup(&store, &layout).unwrap();

        assert_eq!(
            fs::read_to_string(backup.join("TeachingData.json")).unwrap(),
            "{\"Groups\":{}}"
        );
        assert!(!backup.join("SystemData.json").exists());

        let listed = list_backups(&layout);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].domains, vec![Domain::Teaching]);
    }

    #[test]
    fn test_locked_file_does_not_abort_backup() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        for domain in Domain::ALL {
            fs::write(layout.file_path(domain), "{}").unwrap();
        }
        let store = LockedFileStore {
            inner: DurableFileStore::default(),
            locked: layout.file_path(Domain::Setup),
        };

        let backup = create_backup(&store, &layout).unwrap();

        assert!(backup.join("SystemData.json").is_file());
        let listed = list_backups(&layout);
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[0].domains,
            vec![Domain::Movement, Domain::Teaching, Domain::System]
        );
    }

    #[test]
    fn test_same_second_backups_get_suffix() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = DurableFileStore::default();

        let first = create_backup(&store, &layout).unwrap();
        let second = create_backup(&store, &layout).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_list_is_newest_first_and_ignores_foreign_folders() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        make_backup_dir(&layout, "20240101_000000");
        make_backup_dir(&layout, "20240301_000000");
        make_backup_dir(&layout, "20240201_000000");
        make_backup_dir(&layout, "scratch");

        let names: Vec<_> = list_backups(&layout).into_iter().map(|b| b.name).collect();
        assert_eq!(
            names,
            vec!["20240301_000000", "20240201_000000", "20240101_000000"]
        );
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        for day in 1..=5 {
            make_backup_dir(&layout, &format!("2024010{day}_000000"));
        }

        assert_eq!(prune_backups(&layout, 2), 3);
        let names: Vec<_> = list_backups(&layout).into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["20240105_000000", "20240104_000000"]);
        assert_eq!(prune_backups(&layout, 0), 0);
    }

    #[test]
    fn test_read_unknown_backup() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let err = read_backup(&DurableFileStore::default(), &layout, "20991231_235959").unwrap_err();
        assert!(matches!(err, PersistenceError::BackupNotFound { .. }));
    }

    #[test]
    fn test_backup_name_cannot_leave_backup_folder() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        make_backup_dir(&layout, "20240101_120000");
        fs::write(layout.file_path(Domain::System), "{}").unwrap();
        let store = DurableFileStore::default();

        for name in ["20240101_120000/../..", "20240101_120000\\..", "../20240101_120000"] {
            let err = read_backup(&store, &layout, name).unwrap_err();
            assert!(
                matches!(err, PersistenceError::BackupNotFound { .. }),
                "{name}: {err}"
            );
        }
        assert!(read_backup(&store, &layout, "20240101_120000").unwrap().is_empty());
    }
}
