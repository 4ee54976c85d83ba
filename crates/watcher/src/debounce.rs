//! Per-path debouncing logic
//!
//! Collapses bursts of create/modify notifications for a path into a single
//! settle event, delivered once the path has been quiet for the configured
//! period. Deletions skip the quiet period.
//!
//! Each path cycles Idle -> Pending -> Idle. The pending table is a sharded
//! concurrent map keyed by path, so replacing one path's timer never blocks
//! another path.
//!
//! Cancellation is best-effort: a timer that has already claimed its entry
//! when a newer event arrives still delivers, and the newer event starts a
//! fresh cycle. The last settle event observed wins.

use crate::content_type::ContentTypeResolver;
use crate::{EventKind, RawEvent, SettleEvent};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Receives settle events
///
/// Called on a blocking worker thread; implementations may perform file I/O.
pub trait SettleHandler: Send + Sync {
    fn on_settle(&self, event: SettleEvent);
}

impl<F> SettleHandler for F
where
    F: Fn(SettleEvent) + Send + Sync,
{
    fn on_settle(&self, event: SettleEvent) {
        self(event)
    }
}

/// Scheduled settle for one path
struct PendingTimer {
    generation: u64,
    fire_at: Instant,
    handle: JoinHandle<()>,
}

struct Inner {
    quiet_period: Duration,
    pending: DashMap<PathBuf, PendingTimer>,
    next_generation: AtomicU64,
    stopped: AtomicBool,
    resolver: Arc<dyn ContentTypeResolver>,
    handler: Arc<dyn SettleHandler>,
    runtime: Handle,
}

/// Debounce coalescer
///
/// Cheap to clone; clones share the same pending table.
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<Inner>,
}

impl Coalescer {
    /// Create a coalescer whose timers run on `runtime`
    pub fn new(
        quiet_period: Duration,
        resolver: Arc<dyn ContentTypeResolver>,
        handler: Arc<dyn SettleHandler>,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                quiet_period,
                pending: DashMap::new(),
                next_generation: AtomicU64::new(0),
                stopped: AtomicBool::new(false),
                resolver,
                handler,
                runtime,
            }),
        }
    }

    /// Feed a raw event
    ///
    /// Never blocks on file I/O; safe to call from any thread.
    pub fn submit(&self, event: RawEvent) {
        if self.is_stopped() {
            return;
        }

        if event.is_directory {
            debug!("Ignoring directory event for {}", event.path.display());
            return;
        }

        match event.kind {
            EventKind::Deleted => {
                if let Some((_, timer)) = self.inner.pending.remove(&event.path) {
                    timer.handle.abort();
                    debug!(
                        "Cancelled pending timer #{} for deleted {}",
                        timer.generation,
                        event.path.display()
                    );
                }
                self.deliver_deleted(event.path);
            }
            EventKind::Created | EventKind::Modified => self.schedule(event.path, event.kind),
        }
    }

    /// Cancel every pending timer and refuse further events
    ///
    /// A handler call already in progress is allowed to finish; nothing new
    /// is delivered once this returns.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.pending.retain(|_, timer| {
            timer.handle.abort();
            false
        });
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Number of paths currently waiting out their quiet period
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// When the pending timer for `path` is due, if any
    pub fn pending_deadline(&self, path: &std::path::Path) -> Option<Instant> {
        self.inner.pending.get(path).map(|timer| timer.fire_at)
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Replace the pending timer for `path` with a fresh one
    fn schedule(&self, path: PathBuf, kind: EventKind) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let fire_at = Instant::now() + self.inner.quiet_period;

        // The entry guard holds this path's shard lock across cancel + replace
        match self.inner.pending.entry(path.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get().handle.abort();
                let handle = self.spawn_timer(path, kind, generation, fire_at);
                slot.insert(PendingTimer {
                    generation,
                    fire_at,
                    handle,
                });
            }
            Entry::Vacant(slot) => {
                let handle = self.spawn_timer(path, kind, generation, fire_at);
                slot.insert(PendingTimer {
                    generation,
                    fire_at,
                    handle,
                });
            }
        }
    }

    fn spawn_timer(
        &self,
        path: PathBuf,
        kind: EventKind,
        generation: u64,
        fire_at: Instant,
    ) -> JoinHandle<()> {
        let coalescer = self.clone();
        self.inner.runtime.spawn(async move {
            tokio::time::sleep_until(fire_at).await;
            coalescer.fire(path, kind, generation).await;
        })
    }

    /// Timer expiry: claim the entry if still current, then settle off-thread
    async fn fire(self, path: PathBuf, kind: EventKind, generation: u64) {
        let claimed = self
            .inner
            .pending
            .remove_if(&path, |_, timer| timer.generation == generation)
            .is_some();

        if !claimed || self.is_stopped() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        if let Err(err) = tokio::task::spawn_blocking(move || inner.settle(path, kind)).await {
            if err.is_panic() {
                tracing::error!("Settle handler panicked: {}", err);
            }
        }
    }

    fn deliver_deleted(&self, path: PathBuf) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn_blocking(move || {
            if inner.stopped.load(Ordering::SeqCst) {
                return;
            }
            inner.handler.on_settle(SettleEvent {
                path,
                kind: EventKind::Deleted,
                content_type: None,
            });
        });
    }
}

impl Inner {
    /// Runs on a blocking thread
    fn settle(&self, path: PathBuf, kind: EventKind) {
        if !path.exists() {
            debug!("Dropping settle for vanished {}", path.display());
            return;
        }

        let content_type = match self.resolver.resolve(&path) {
            Ok(content_type) => content_type,
            Err(err) => {
                debug!("Dropping settle for {}: {}", path.display(), err);
                return;
            }
        };

        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        self.handler.on_settle(SettleEvent {
            path,
            kind,
            content_type: Some(content_type),
        });
    }
}
