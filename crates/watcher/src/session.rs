//! Watch session: notify watcher -> ignore filter -> coalescer
//!
//! The notify callback runs on notify's own thread and only forwards into an
//! unbounded channel. A dispatch task drains the channel, translates events
//! and feeds the coalescer. Settle work happens on blocking workers, so the
//! delivery path never waits on rule actions.

use crate::config::WatchConfig;
use crate::content_type::{ContentTypeResolver, GuessingResolver};
use crate::debounce::{Coalescer, SettleHandler};
use crate::ignore::IgnoreFilter;
use crate::{EventKind, RawEvent};
use anyhow::{Context, Result};
use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long a translated rename half waits for its combined event
const RENAME_PAIR_WINDOW: Duration = Duration::from_secs(2);

/// A running watch over one or more directory trees
///
/// Dropping the session stops it.
pub struct WatchSession {
    roots: Vec<PathBuf>,
    coalescer: Coalescer,
    /// Keep alive: dropping the watcher releases the OS watch handles
    watcher: Mutex<Option<RecommendedWatcher>>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl WatchSession {
    /// Start watching `roots` recursively with the default content-type resolver
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        roots: &[PathBuf],
        config: &WatchConfig,
        handler: Arc<dyn SettleHandler>,
    ) -> Result<Self> {
        Self::start_with_resolver(roots, config, handler, Arc::new(GuessingResolver))
    }

    pub fn start_with_resolver(
        roots: &[PathBuf],
        config: &WatchConfig,
        handler: Arc<dyn SettleHandler>,
        resolver: Arc<dyn ContentTypeResolver>,
    ) -> Result<Self> {
        config.validate()?;

        if roots.is_empty() {
            anyhow::bail!("No directories to watch");
        }

        let runtime =
            Handle::try_current().context("Watch session must be started inside a tokio runtime")?;

        let roots = roots
            .iter()
            .map(|root| canonical_root(root))
            .collect::<Result<Vec<_>>>()?;

        let filter = IgnoreFilter::new(&roots, config)?;
        debug!(
            "Compiled {} ignore pattern(s) for {} root(s)",
            config.ignore.len(),
            filter.pattern_roots()
        );
        let coalescer = Coalescer::new(config.quiet_period(), resolver, handler, runtime.clone());

        let (tx, rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the session is stopping
            let _ = tx.send(res);
        })
        .context("Failed to create file system watcher")?;

        for root in &roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", root.display()))?;
            info!("Watching for file changes in '{}' ...", root.display());
        }

        let dispatch = runtime.spawn(dispatch_loop(rx, filter, coalescer.clone()));

        Ok(Self {
            roots,
            coalescer,
            watcher: Mutex::new(Some(watcher)),
            dispatch: Mutex::new(Some(dispatch)),
        })
    }

    /// Canonicalized watched roots
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    /// Stop watching
    ///
    /// Cancels all pending timers, releases the OS watcher and ends the
    /// dispatch task. Idempotent.
    pub fn stop(&self) {
        let watcher = self.watcher.lock().take();
        let dispatch = self.dispatch.lock().take();

        if watcher.is_none() && dispatch.is_none() {
            return;
        }

        info!("Stopping watcher...");
        self.coalescer.shutdown();
        drop(watcher);
        if let Some(dispatch) = dispatch {
            dispatch.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.watcher.lock().is_some()
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = root
        .canonicalize()
        .with_context(|| format!("Cannot watch {}", root.display()))?;

    if !canonical.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    Ok(canonical)
}

async fn dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    filter: IgnoreFilter,
    coalescer: Coalescer,
) {
    let mut renames = RenameHalves::default();

    while let Some(result) = rx.recv().await {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                warn!("Watcher error: {}", err);
                continue;
            }
        };

        for raw in translate(&event, &mut renames) {
            if filter.is_ignored(&raw.path) {
                debug!("Ignoring {} event for {}", raw.kind, raw.path.display());
                continue;
            }
            coalescer.submit(raw);
        }
    }
}

/// Rename halves already turned into raw events
///
/// inotify reports one rename as `From`, `To` and a combined `Both`. The
/// combined event only contributes the halves that were not seen on their
/// own, so a rename yields one deletion and one creation.
#[derive(Default)]
struct RenameHalves {
    seen: HashMap<(PathBuf, EventKind), Instant>,
}

impl RenameHalves {
    fn record(&mut self, raw: &RawEvent) {
        let now = Instant::now();
        self.seen.retain(|_, at| now.duration_since(*at) < RENAME_PAIR_WINDOW);
        self.seen.insert((raw.path.clone(), raw.kind), now);
    }

    /// True (and forgotten) when `raw` was recorded within the window
    fn take(&mut self, raw: &RawEvent) -> bool {
        self.seen
            .remove(&(raw.path.clone(), raw.kind))
            .is_some_and(|at| at.elapsed() < RENAME_PAIR_WINDOW)
    }
}

/// Map a notify event to raw events
///
/// Renames become a deletion of the old path and a creation of the new one.
/// Access and unclassified events are dropped.
fn translate(event: &Event, renames: &mut RenameHalves) -> Vec<RawEvent> {
    let created = |path: &PathBuf, folder: bool| RawEvent {
        path: path.clone(),
        kind: EventKind::Created,
        is_directory: folder || path.is_dir(),
    };
    let deleted = |path: &PathBuf, folder: bool| RawEvent {
        path: path.clone(),
        kind: EventKind::Deleted,
        is_directory: folder,
    };
    let modified = |path: &PathBuf| RawEvent {
        path: path.clone(),
        kind: EventKind::Modified,
        is_directory: path.is_dir(),
    };

    match &event.kind {
        notify::EventKind::Create(kind) => event
            .paths
            .iter()
            .map(|p| created(p, *kind == CreateKind::Folder))
            .collect(),
        notify::EventKind::Remove(kind) => event
            .paths
            .iter()
            .map(|p| deleted(p, *kind == RemoveKind::Folder))
            .collect(),
        notify::EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From | RenameMode::To => {
                let raw: Vec<RawEvent> = event
                    .paths
                    .iter()
                    .map(|p| {
                        if *mode == RenameMode::From {
                            deleted(p, false)
                        } else {
                            created(p, false)
                        }
                    })
                    .collect();
                for half in &raw {
                    renames.record(half);
                }
                raw
            }
            RenameMode::Both => event
                .paths
                .first()
                .map(|from| deleted(from, false))
                .into_iter()
                .chain(event.paths.get(1).map(|to| created(to, false)))
                .filter(|half| !renames.take(half))
                .collect(),
            _ => event
                .paths
                .iter()
                .map(|p| if p.exists() { modified(p) } else { deleted(p, false) })
                .collect(),
        },
        notify::EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => vec![],
        notify::EventKind::Modify(_) => event.paths.iter().map(modified).collect(),
        notify::EventKind::Access(_) | notify::EventKind::Any | notify::EventKind::Other => {
            vec![]
        }
    }
}
