//! In-memory `TextStore` with fault injection for unit tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{PersistenceError, Result};
use crate::io::TextStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
    unreadable: Mutex<HashSet<PathBuf>>,
    writes: AtomicUsize,
    failing_writes: AtomicU32,
    active: AtomicUsize,
    max_active: AtomicUsize,
    write_delay_ms: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &Path, text: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), text.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Most writes ever observed running at the same time.
    pub fn max_concurrent_writes(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Fail the next `count` writes with exhausted retries.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make reads of `path` fail as if another program held the file.
    pub fn lock_for_reading(&self, path: &Path) {
        self.unreadable.lock().unwrap().insert(path.to_path_buf());
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u32, Ordering::SeqCst);
    }
}

impl TextStore for MemoryStore {
    fn read_text(&self, path: &Path) -> Result<String> {
        if self.unreadable.lock().unwrap().contains(path) {
            return Err(PersistenceError::TransientIo {
                operation: "read",
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::ResourceBusy),
            });
        }
        self.get(path).ok_or_else(|| PersistenceError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(u64::from(delay)));
        }

        let fail = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        self.active.fetch_sub(1, Ordering::SeqCst);

        if fail {
            return Err(PersistenceError::WriteFailed {
                path: path.to_path_buf(),
                attempts: 4,
                source: io::Error::from(io::ErrorKind::ResourceBusy),
            });
        }

        self.put(path, text);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}
