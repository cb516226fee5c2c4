//! Debounced, single-flight saving per domain.
//!
//! Each domain gets one background lane: a tokio task that owns the pending
//! snapshot, the debounce timer and the fingerprint of the last write. All
//! requests for a domain go through its lane queue, so writes to one file are
//! serialized while different domains proceed concurrently.
//!
//! ```text
//! Idle --mutation--> PendingFlush --timer / force--> Flushing --ok--> Idle
//!                        ^   |                           |
//!                        +---+ mutation (re-arm)         +--err--> PendingFlush (disarmed)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{AutoSaveConfig, FlushTracker};
use crate::error::{PersistenceError, Result};
use crate::io::{Fingerprint, TextStore};
use crate::layout::{DataLayout, Domain};
use crate::notify::PersistenceEvent;
use crate::types::Snapshot;

const EVENT_CAPACITY: usize = 64;

/// Result of a flush that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The file was written.
    Written,
    /// The file already held identical text; no write was made.
    Unchanged,
    /// Nothing was pending.
    Nothing,
}

enum LaneCommand {
    Mutated(Snapshot),
    Flush {
        snapshot: Option<Snapshot>,
        reply: oneshot::Sender<Result<FlushOutcome>>,
    },
    Reset,
    Shutdown,
}

type InFlight = [AtomicBool; 4];

/// Proof that a flush for one domain is in progress.
///
/// At most one token per domain exists at a time; it is released on drop.
struct FlushToken {
    flags: Arc<InFlight>,
    domain: Domain,
}

impl FlushToken {
    fn acquire(flags: &Arc<InFlight>, domain: Domain) -> Option<Self> {
        flags[domain.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flags: Arc::clone(flags),
                domain,
            })
    }
}

impl Drop for FlushToken {
    fn drop(&mut self) {
        self.flags[self.domain.index()].store(false, Ordering::Release);
    }
}

/// A forced flush queued on a lane.
#[must_use = "the flush result is only observed through `wait`"]
pub struct PendingFlush {
    domain: Domain,
    rx: oneshot::Receiver<Result<FlushOutcome>>,
}

impl PendingFlush {
    /// Block until the lane has written (or failed to write) the snapshot.
    ///
    /// Must not be called from inside an async context.
    pub fn wait(self) -> Result<FlushOutcome> {
        let domain = self.domain;
        self.rx
            .blocking_recv()
            .map_err(|_| PersistenceError::CoordinatorStopped { domain })?
    }
}

struct LaneHandle {
    tx: mpsc::UnboundedSender<LaneCommand>,
    task: Option<JoinHandle<()>>,
}

/// Owns the four auto-save lanes.
pub struct AutoSaveCoordinator {
    lanes: Vec<LaneHandle>,
    in_flight: Arc<InFlight>,
    events: broadcast::Sender<PersistenceEvent>,
}

impl AutoSaveCoordinator {
    /// Spawn one lane per domain on `handle`.
    pub fn new(
        store: Arc<dyn TextStore>,
        layout: &DataLayout,
        config: AutoSaveConfig,
        handle: &Handle,
    ) -> Self {
        let in_flight: Arc<InFlight> = Arc::new(Default::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let lanes = Domain::ALL
            .iter()
            .map(|&domain| {
                let (tx, rx) = mpsc::unbounded_channel();
                let lane = Lane {
                    domain,
                    path: layout.file_path(domain),
                    store: Arc::clone(&store),
                    config: config.clone(),
                    tracker: FlushTracker::new(),
                    pending: None,
                    last_written: None,
                    in_flight: Arc::clone(&in_flight),
                    events: events.clone(),
                };
                LaneHandle {
                    tx,
                    task: Some(handle.spawn(lane.run(rx))),
                }
            })
            .collect();

        Self {
            lanes,
            in_flight,
            events,
        }
    }

    /// Queue a snapshot taken right after a mutation and (re)arm the debounce.
    pub fn notify_mutation(&self, snapshot: Snapshot) -> Result<()> {
        let domain = snapshot.domain();
        self.send(domain, LaneCommand::Mutated(snapshot))
    }

    /// Drop anything pending for `domain` and forget the last write.
    ///
    /// Used after the mirror was reloaded from disk.
    pub fn reset(&self, domain: Domain) -> Result<()> {
        self.send(domain, LaneCommand::Reset)
    }

    /// Write `snapshot` now, bypassing the debounce.
    ///
    /// Waits behind any flush already in flight for the same domain.
    pub async fn force_flush(&self, snapshot: Snapshot) -> Result<FlushOutcome> {
        let domain = snapshot.domain();
        self.request_flush(domain, Some(snapshot))?
            .await
            .map_err(|_| PersistenceError::CoordinatorStopped { domain })?
    }

    /// Write whatever is pending for `domain` now.
    pub async fn flush_domain(&self, domain: Domain) -> Result<FlushOutcome> {
        self.request_flush(domain, None)?
            .await
            .map_err(|_| PersistenceError::CoordinatorStopped { domain })?
    }

    /// Blocking form of [`Self::force_flush`] for teardown paths.
    ///
    /// Must not be called from inside an async context.
    pub fn force_flush_blocking(&self, snapshot: Snapshot) -> Result<FlushOutcome> {
        self.queue_flush(snapshot)?.wait()
    }

    /// Queue a forced flush of `snapshot` without waiting for it.
    pub fn queue_flush(&self, snapshot: Snapshot) -> Result<PendingFlush> {
        let domain = snapshot.domain();
        let rx = self.request_flush(domain, Some(snapshot))?;
        Ok(PendingFlush { domain, rx })
    }

    /// Whether a write for `domain` is running right now.
    pub fn is_flushing(&self, domain: Domain) -> bool {
        self.in_flight[domain.index()].load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    /// Flush everything pending and stop the lanes.
    pub async fn shutdown(&mut self) {
        for lane in &self.lanes {
            let _ = lane.tx.send(LaneCommand::Shutdown);
        }
        for lane in &mut self.lanes {
            if let Some(task) = lane.task.take()
                && let Err(e) = task.await
            {
                tracing::error!(error = %e, "Auto-save lane ended abnormally");
            }
        }
    }

    fn request_flush(
        &self,
        domain: Domain,
        snapshot: Option<Snapshot>,
    ) -> Result<oneshot::Receiver<Result<FlushOutcome>>> {
        let (reply, rx) = oneshot::channel();
        self.send(domain, LaneCommand::Flush { snapshot, reply })?;
        Ok(rx)
    }

    fn send(&self, domain: Domain, command: LaneCommand) -> Result<()> {
        self.lanes[domain.index()]
            .tx
            .send(command)
            .map_err(|_| PersistenceError::CoordinatorStopped { domain })
    }
}

struct Lane {
    domain: Domain,
    path: PathBuf,
    store: Arc<dyn TextStore>,
    config: AutoSaveConfig,
    tracker: FlushTracker,
    pending: Option<Snapshot>,
    last_written: Option<Fingerprint>,
    in_flight: Arc<InFlight>,
    events: broadcast::Sender<PersistenceEvent>,
}

impl Lane {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LaneCommand>) {
        loop {
            let command = match self.tracker.deadline(&self.config) {
                Some(at) => {
                    tokio::select! {
                        command = rx.recv() => command,
                        () = tokio::time::sleep_until(at.into()) => {
                            tracing::debug!(domain = %self.domain, "Debounce elapsed");
                            let _ = self.flush().await;
                            continue;
                        }
                    }
                }
                None => rx.recv().await,
            };

            match command {
                Some(LaneCommand::Mutated(snapshot)) => {
                    tracing::trace!(domain = %self.domain, "Mutation queued");
                    self.pending = Some(snapshot);
                    self.tracker.mark_dirty();
                }
                Some(LaneCommand::Flush { snapshot, reply }) => {
                    if let Some(snapshot) = snapshot {
                        self.pending = Some(snapshot);
                        self.tracker.mark_dirty();
                    }
                    let _ = reply.send(self.flush().await);
                }
                Some(LaneCommand::Reset) => {
                    self.pending = None;
                    self.last_written = None;
                    self.tracker.clear();
                }
                Some(LaneCommand::Shutdown) | None => {
                    let _ = self.flush().await;
                    tracing::debug!(domain = %self.domain, "Auto-save lane stopped");
                    break;
                }
            }
        }
    }

    async fn flush(&mut self) -> Result<FlushOutcome> {
        let Some(snapshot) = self.pending.clone() else {
            return Ok(FlushOutcome::Nothing);
        };
        let Some(token) = FlushToken::acquire(&self.in_flight, self.domain) else {
            tracing::warn!(domain = %self.domain, "Flush already in flight");
            return Ok(FlushOutcome::Nothing);
        };

        self.tracker.start_save();
        let result = self.write(&snapshot).await;
        drop(token);

        match result {
            Ok((outcome, fingerprint)) => {
                self.pending = None;
                self.last_written = Some(fingerprint);
                self.tracker.save_complete();

                let event = if outcome == FlushOutcome::Written {
                    tracing::info!(domain = %self.domain, path = %self.path.display(), "Saved");
                    PersistenceEvent::Saved {
                        domain: self.domain,
                        path: self.path.clone(),
                    }
                } else {
                    tracing::debug!(domain = %self.domain, "Content unchanged, write skipped");
                    PersistenceEvent::Unchanged {
                        domain: self.domain,
                    }
                };
                let _ = self.events.send(event);
                Ok(outcome)
            }
            Err(e) => {
                self.tracker.save_failed();
                tracing::error!(
                    domain = %self.domain,
                    path = %self.path.display(),
                    error = %e,
                    "Save failed, keeping changes pending"
                );
                let _ = self.events.send(PersistenceEvent::SaveFailed {
                    domain: self.domain,
                    reason: e.user_message(),
                });
                Err(e)
            }
        }
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(FlushOutcome, Fingerprint)> {
        let text = snapshot.to_json()?;
        let fingerprint = Fingerprint::of(&text);
        if self.last_written.as_ref() == Some(&fingerprint) {
            return Ok((FlushOutcome::Unchanged, fingerprint));
        }

        // Until the first write, compare against what is already on disk.
        let check_disk = self.last_written.is_none();
        let expected = fingerprint.clone();
        let store = Arc::clone(&self.store);
        let path = self.path.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            if check_disk && Fingerprint::of_file(&*store, &path).as_ref() == Some(&expected) {
                return Ok(FlushOutcome::Unchanged);
            }
            store.write_text(&path, &text).map(|()| FlushOutcome::Written)
        })
        .await
        .map_err(|e| PersistenceError::Io {
            operation: "write",
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })??;

        Ok((outcome, fingerprint))
    }
}
