//! Orchestration of the four domains.
//!
//! The manager is owned by the UI thread. It holds the domain mirrors, hands
//! deep-copied snapshots to the auto-save lanes after every mutation, and
//! drives the bulk load/save at startup and shutdown.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::autosave::{AutoSaveCoordinator, FlushOutcome, PendingFlush};
use crate::config::PersistenceConfig;
use crate::convert::{FromSnapshot, PersistentModule, ToSnapshot};
use crate::error::{PersistenceError, Result};
use crate::io::{
    self, BackupInfo, DomainStatus, DurableFileStore, TextStore, inspect_domain,
};
use crate::layout::{DataLayout, Domain};
use crate::mirror::{DomainMirror, DomainMirrors, MirrorSlot, SelectionEditor};
use crate::notify::{LogNotifier, Notifier, PersistenceEvent};
use crate::types::{Container, GroupedContainer, Snapshot, keep_selection};

/// How one domain came out of [`PersistenceManager::load_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Parsed from its file.
    Loaded,
    /// No file (or an empty one); defaults are in use.
    Defaulted,
    /// The file could not be parsed; defaults are in use.
    Corrupt { reason: String },
    /// The file could not be read; defaults are in use.
    Failed { reason: String },
}

impl LoadStatus {
    /// Whether the domain's data came from its own file.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => f.write_str("loaded"),
            Self::Defaulted => f.write_str("defaults"),
            Self::Corrupt { reason } => write!(f, "corrupt ({reason})"),
            Self::Failed { reason } => write!(f, "unreadable ({reason})"),
        }
    }
}

/// Per-domain result of a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub domains: Vec<(Domain, LoadStatus)>,
}

impl LoadReport {
    pub fn status(&self, domain: Domain) -> Option<&LoadStatus> {
        self.domains
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, status)| status)
    }

    /// Whether every domain loaded without problems (missing files count as fine).
    pub fn is_clean(&self) -> bool {
        self.domains.iter().all(|(_, status)| {
            matches!(status, LoadStatus::Loaded | LoadStatus::Defaulted)
        })
    }
}

/// Per-domain result of a bulk save.
#[derive(Debug)]
pub struct SaveReport {
    pub results: Vec<(Domain, Result<FlushOutcome>)>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (Domain, &PersistenceError)> {
        self.results
            .iter()
            .filter_map(|(domain, result)| result.as_ref().err().map(|e| (*domain, e)))
    }

    /// Human-readable summary of every failure, `None` when all succeeded.
    pub fn failure_reason(&self) -> Option<String> {
        let reasons: Vec<String> = self
            .failures()
            .map(|(domain, e)| format!("{}: {}", domain.label(), e.user_message()))
            .collect();
        (!reasons.is_empty()).then(|| reasons.join("; "))
    }
}

/// Owner of the domain mirrors and their persistence.
pub struct PersistenceManager {
    config: PersistenceConfig,
    layout: DataLayout,
    store: Arc<dyn TextStore>,
    mirrors: DomainMirrors,
    coordinator: AutoSaveCoordinator,
    notifier: Arc<dyn Notifier>,
    /// Domains whose file could not be read; they are not bulk-saved until
    /// something mutates them, so defaults never replace data on disk.
    held: [AtomicBool; 4],
}

impl PersistenceManager {
    /// Manager backed by real files, logging its notifications.
    pub fn new(config: PersistenceConfig, handle: &Handle) -> Self {
        let store = Arc::new(DurableFileStore::new(config.retry.clone()));
        Self::with_store(config, store, Arc::new(LogNotifier), handle)
    }

    /// Manager with explicit collaborators.
    pub fn with_store(
        config: PersistenceConfig,
        store: Arc<dyn TextStore>,
        notifier: Arc<dyn Notifier>,
        handle: &Handle,
    ) -> Self {
        let layout = config.layout();
        let coordinator =
            AutoSaveCoordinator::new(Arc::clone(&store), &layout, config.autosave.clone(), handle);

        tracing::debug!(root = %layout.root().display(), "Persistence manager created");
        Self {
            config,
            layout,
            store,
            mirrors: DomainMirrors::default(),
            coordinator,
            notifier,
            held: Default::default(),
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn mirrors(&self) -> &DomainMirrors {
        &self.mirrors
    }

    /// Current state of one domain.
    pub fn get<C: MirrorSlot>(&self) -> &C {
        self.mirrors.get::<C>().get()
    }

    /// Load all four domains concurrently.
    ///
    /// Each domain is independent: a missing, corrupt or unreadable file
    /// leaves that domain on defaults and does not affect the others.
    pub async fn load_all(&mut self) -> LoadReport {
        let handles: Vec<_> = Domain::ALL
            .into_iter()
            .map(|domain| {
                let store = Arc::clone(&self.store);
                let path = self.layout.file_path(domain);
                (
                    domain,
                    tokio::task::spawn_blocking(move || load_domain(&*store, domain, &path)),
                )
            })
            .collect();

        let mut domains = Vec::with_capacity(handles.len());
        let mut corrupt = false;
        for (domain, handle) in handles {
            let (status, snapshot) = match handle.await {
                Ok(loaded) => loaded,
                Err(e) => (
                    LoadStatus::Failed {
                        reason: e.to_string(),
                    },
                    None,
                ),
            };

            corrupt |= matches!(status, LoadStatus::Corrupt { .. });
            let held = matches!(status, LoadStatus::Failed { .. });
            if held {
                tracing::warn!(domain = %domain, "Holding saves until the domain is edited");
            }
            self.held[domain.index()].store(held, Ordering::Release);
            self.mirrors
                .restore(snapshot.unwrap_or_else(|| Snapshot::default_for(domain)));
            if let Err(e) = self.coordinator.reset(domain) {
                tracing::warn!(domain = %domain, error = %e, "Could not reset auto-save lane");
            }
            domains.push((domain, status));
        }

        // Keep a copy of unreadable data before it gets overwritten.
        if corrupt {
            self.create_backup();
        }

        let report = LoadReport { domains };
        tracing::info!(clean = report.is_clean(), "Loaded persisted data");
        report
    }

    /// Write all four domains now and wait for every write.
    ///
    /// Failures are reported per domain and through the notifier; they never
    /// stop the other domains from being saved. A domain whose file could not
    /// be read at load time is skipped until it is edited.
    pub async fn save_all(&self) -> SaveReport {
        let (movement, teaching, setup, system) = tokio::join!(
            self.flush_unless_held(Domain::Movement),
            self.flush_unless_held(Domain::Teaching),
            self.flush_unless_held(Domain::Setup),
            self.flush_unless_held(Domain::System),
        );

        let report = SaveReport {
            results: vec![
                (Domain::Movement, movement),
                (Domain::Teaching, teaching),
                (Domain::Setup, setup),
                (Domain::System, system),
            ],
        };
        self.notify(&report);
        report
    }

    /// Synchronous bulk save for teardown paths outside the async runtime.
    ///
    /// All four requests are queued before waiting, so the domains are
    /// written concurrently.
    pub fn save_all_blocking(&self) -> SaveReport {
        let pending: Vec<_> = Domain::ALL
            .into_iter()
            .map(|domain| {
                let request = (!self.is_held(domain))
                    .then(|| self.coordinator.queue_flush(self.mirrors.snapshot(domain)));
                (domain, request)
            })
            .collect();

        let results = pending
            .into_iter()
            .map(|(domain, request)| {
                let result = match request {
                    Some(request) => request.and_then(PendingFlush::wait),
                    None => Ok(FlushOutcome::Nothing),
                };
                (domain, result)
            })
            .collect();

        let report = SaveReport { results };
        self.notify(&report);
        report
    }

    /// Schedule a debounced save of `domain`'s current state.
    pub fn auto_save(&self, domain: Domain) -> Result<()> {
        self.held[domain.index()].store(false, Ordering::Release);
        self.coordinator
            .notify_mutation(self.mirrors.snapshot(domain))
            .inspect_err(|e| {
                tracing::warn!(domain = %domain, error = %e, "Auto-save request dropped");
            })
    }

    /// Mutate one domain and schedule its save.
    ///
    /// The selection of a grouped domain survives the edit, even if `f`
    /// replaces the whole container; use [`Self::select`] to move it.
    pub fn edit<C: MirrorSlot, R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        let result = self
            .mirrors
            .get_mut::<C>()
            .edit(|data| keep_selection(data, f));
        let _ = self.auto_save(C::DOMAIN);
        result
    }

    /// Editor on the current selection of a grouped domain.
    pub fn editor<C: MirrorSlot + GroupedContainer>(&self) -> SelectionEditor<C> {
        SelectionEditor::open(self.mirrors.get::<C>())
    }

    /// Commit an editor's working copy, saving if anything changed.
    pub fn commit_edit<C: MirrorSlot + GroupedContainer>(
        &mut self,
        editor: &mut SelectionEditor<C>,
    ) -> bool {
        let changed = editor.commit_edit(self.mirrors.get_mut::<C>());
        if changed {
            let _ = self.auto_save(C::DOMAIN);
        }
        changed
    }

    /// Commit the editor, then move the selection to `group/item`.
    pub fn select<C: MirrorSlot + GroupedContainer>(
        &mut self,
        editor: &mut SelectionEditor<C>,
        group: &str,
        item: &str,
    ) {
        editor.select(self.mirrors.get_mut::<C>(), group, item);
        let _ = self.auto_save(C::DOMAIN);
    }

    /// Commit the editor and write its domain before the editor goes away.
    ///
    /// Used when an edit surface is torn down. The domain is written even if
    /// the working copy was unchanged, so anything still pending is flushed
    /// too; an untouched domain whose file was unreadable at load is skipped.
    pub async fn close_editor<C: MirrorSlot + GroupedContainer>(
        &mut self,
        mut editor: SelectionEditor<C>,
    ) -> Result<FlushOutcome> {
        self.commit_edit(&mut editor);
        self.flush_unless_held(C::DOMAIN).await
    }

    /// Populate a UI module from its mirror.
    pub fn restore_into<M>(&self, module: &mut M)
    where
        M: PersistentModule,
        M::Data: MirrorSlot,
    {
        module.load_from_persistent_data(self.mirrors.get::<M::Data>().to_snapshot());
    }

    /// Take a UI module's state into its mirror and schedule a save.
    ///
    /// The module's state replaces the whole container, selection included.
    /// Commit or close every [`SelectionEditor`] on the domain first; an
    /// editor left open still points at its old record.
    pub fn capture_from<M>(&mut self, module: &M)
    where
        M: PersistentModule,
        M::Data: MirrorSlot,
    {
        let mirror: &mut DomainMirror<M::Data> = self.mirrors.get_mut();
        mirror.restore_from_snapshot(module.get_persistent_data());
        let _ = self.auto_save(<M::Data as Container>::DOMAIN);
    }

    /// Force the pending state of one domain to disk.
    pub async fn force_flush(&self, domain: Domain) -> Result<FlushOutcome> {
        self.coordinator
            .force_flush(self.mirrors.snapshot(domain))
            .await
    }

    /// Blocking form of [`Self::force_flush`].
    pub fn force_flush_blocking(&self, domain: Domain) -> Result<FlushOutcome> {
        self.coordinator
            .force_flush_blocking(self.mirrors.snapshot(domain))
    }

    /// Copy the domain files into a new timestamped backup folder.
    ///
    /// Best effort: failures are logged and yield `None`. Old backups beyond
    /// the configured limit are pruned afterwards.
    pub fn create_backup(&self) -> Option<PathBuf> {
        match io::create_backup(&*self.store, &self.layout) {
            Ok(dir) => {
                let removed = io::prune_backups(&self.layout, self.config.backup.max_backups);
                if removed > 0 {
                    tracing::debug!(removed, "Pruned old backups");
                }
                Some(dir)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backup failed");
                None
            }
        }
    }

    pub fn list_backups(&self) -> Vec<BackupInfo> {
        io::list_backups(&self.layout)
    }

    /// Replace the mirrors with the contents of backup `name` and save them.
    ///
    /// Domains missing or unreadable in the backup keep their current state.
    pub async fn restore_backup(&mut self, name: &str) -> Result<SaveReport> {
        let files = io::read_backup(&*self.store, &self.layout, name)?;

        for (domain, text) in files {
            match Snapshot::parse(domain, &text) {
                Ok(Some(snapshot)) => {
                    tracing::debug!(
                        domain = %domain,
                        bytes = text.len(),
                        "Restoring from backup"
                    );
                    self.mirrors.restore(snapshot);
                    self.held[domain.index()].store(false, Ordering::Release);
                }
                Ok(None) => {
                    tracing::warn!(domain = %domain, backup = name, "Backup file is empty, skipped");
                }
                Err(e) => {
                    tracing::warn!(domain = %domain, backup = name, error = %e, "Backup file is corrupt, skipped");
                }
            }
        }

        tracing::info!(backup = name, "Restored backup");
        Ok(self.save_all().await)
    }

    /// Read-only health of every domain file.
    pub fn status(&self) -> Vec<DomainStatus> {
        Domain::ALL
            .into_iter()
            .map(|domain| inspect_domain(&*self.store, &self.layout, domain))
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.coordinator.subscribe()
    }

    /// Save everything, optionally back up, then stop the auto-save lanes.
    pub async fn shutdown(&mut self) -> SaveReport {
        let report = self.save_all().await;
        if self.config.backup.backup_on_shutdown {
            self.create_backup();
        }
        self.coordinator.shutdown().await;
        tracing::info!("Persistence stopped");
        report
    }

    /// Whether `domain` is skipped by bulk saves because its file was unreadable.
    pub fn is_held(&self, domain: Domain) -> bool {
        self.held[domain.index()].load(Ordering::Acquire)
    }

    async fn flush_unless_held(&self, domain: Domain) -> Result<FlushOutcome> {
        if self.is_held(domain) {
            tracing::debug!(domain = %domain, "Skipping save of unreadable domain");
            return Ok(FlushOutcome::Nothing);
        }
        self.force_flush(domain).await
    }

    fn notify(&self, report: &SaveReport) {
        match report.failure_reason() {
            None => self.notifier.save_succeeded(),
            Some(reason) => self.notifier.save_failed(&reason),
        }
    }
}

fn load_domain(
    store: &dyn TextStore,
    domain: Domain,
    path: &std::path::Path,
) -> (LoadStatus, Option<Snapshot>) {
    let text = match store.read_text(path) {
        Ok(text) => text,
        Err(e) if e.is_not_found() => {
            tracing::info!(domain = %domain, "No saved data, using defaults");
            return (LoadStatus::Defaulted, None);
        }
        Err(e) => {
            tracing::error!(domain = %domain, error = %e, "Failed to read data, using defaults");
            return (
                LoadStatus::Failed {
                    reason: e.user_message(),
                },
                None,
            );
        }
    };

    match Snapshot::parse(domain, &text) {
        Ok(Some(snapshot)) => {
            tracing::debug!(domain = %domain, bytes = text.len(), "Loaded");
            (LoadStatus::Loaded, Some(snapshot))
        }
        Ok(None) => {
            tracing::info!(domain = %domain, "Saved data is empty, using defaults");
            (LoadStatus::Defaulted, None)
        }
        Err(e) => {
            let reason = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_else(|| e.to_string());
            tracing::error!(domain = %domain, error = %reason, "Saved data is corrupt, using defaults");
            (LoadStatus::Corrupt { reason }, None)
        }
    }
}
