use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;

/// Path components ignored by default when watching.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".git", "node_modules", "target"];

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Events per debounce window above which the batch collapses into a root reload.
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Filesystem watcher over the root and the folders loaded in the tree.
///
/// Each folder gets its own non-recursive watch, so only what the tree has
/// listed is registered with the OS.
pub struct FsWatcher {
    /// Whether the watcher is currently forwarding events.
    active: Arc<AtomicBool>,
    root: PathBuf,
    ignore_patterns: Vec<String>,
    /// Folders with a registered watch.
    watched: HashSet<PathBuf>,
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Watch `root` (non-recursively).
    ///
    /// Paths with a component below `root` matching `ignore_patterns` are
    /// dropped. A batch larger than `flood_threshold` is sent as a single
    /// `root` change.
    pub fn new(
        root: &Path,
        debounce_duration: Duration,
        ignore_patterns: Vec<String>,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();
        let root_path = root.to_path_buf();
        let patterns = ignore_patterns.clone();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_clone.load(Ordering::Relaxed) {
                    return;
                }

                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !is_ignored_below(p, &root_path, &patterns))
                            .collect();

                        if let Some(paths) = collapse_flood(paths, flood_threshold, &root_path) {
                            let _ = event_tx.send(Event::FsChange(paths));
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "watcher error");
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::NonRecursive)?;
        tracing::info!(root = %root.display(), "watching for changes");

        Ok(Self {
            active,
            root: root.to_path_buf(),
            ignore_patterns,
            watched: HashSet::from([root.to_path_buf()]),
            debouncer,
        })
    }

    /// Make the registered watches match `wanted`: new folders are added,
    /// folders no longer loaded are dropped. The root stays watched.
    pub fn sync_watches(&mut self, wanted: &HashSet<PathBuf>) {
        let stale: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| **p != self.root && !wanted.contains(*p))
            .cloned()
            .collect();
        for path in stale {
            // The folder may already be gone, which removes the watch anyway.
            if let Err(e) = self.debouncer.watcher().unwatch(&path) {
                tracing::debug!(path = %path.display(), error = %e, "unwatch failed");
            }
            self.watched.remove(&path);
        }

        let added: Vec<PathBuf> = wanted
            .iter()
            .filter(|p| !self.watched.contains(*p))
            .filter(|p| !is_ignored_below(p, &self.root, &self.ignore_patterns))
            .cloned()
            .collect();
        for path in added {
            match self
                .debouncer
                .watcher()
                .watch(&path, notify::RecursiveMode::NonRecursive)
            {
                Ok(()) => tracing::debug!(path = %path.display(), "watch added"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "watch failed"),
            }
            // Recorded even on failure so a broken folder is not retried every event.
            self.watched.insert(path);
        }
    }

    /// Folders currently registered.
    pub fn watched_dirs(&self) -> &HashSet<PathBuf> {
        &self.watched
    }

    /// Pause event forwarding (the OS watches stay registered).
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Resume event forwarding.
    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Ignore patterns apply to the part of `path` below `root`, so a root that
/// itself lives under e.g. `target/` is still watched.
fn is_ignored_below(path: &Path, root: &Path, patterns: &[String]) -> bool {
    path.strip_prefix(root)
        .is_ok_and(|rel| should_ignore(rel, patterns))
}

/// A path is ignored if any of its components equals a pattern exactly.
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            patterns.iter().any(|p| name == p.as_str())
        }
        _ => false,
    })
}

/// Apply flood protection to a debounced batch. `None` when nothing is left.
fn collapse_flood(paths: Vec<PathBuf>, threshold: usize, root: &Path) -> Option<Vec<PathBuf>> {
    if paths.is_empty() {
        None
    } else if paths.len() > threshold {
        tracing::debug!(count = paths.len(), "event flood, reloading root");
        Some(vec![root.to_path_buf()])
    } else {
        Some(paths)
    }
}

/// Directories whose listing and size are affected by changes to `paths`.
///
/// A change to an entry affects its parent folder; a change to `root` itself
/// affects `root`. Results are deduplicated, parents before children.
pub fn affected_dirs(paths: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = paths
        .iter()
        .filter_map(|p| {
            if p == root {
                Some(root.to_path_buf())
            } else {
                p.parent()
                    .filter(|parent| parent.starts_with(root))
                    .map(Path::to_path_buf)
            }
        })
        .collect();
    dirs.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    dirs.dedup();
    dirs
}
