//! `preview watch`: keep a context in sync with a directory.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → apply_changes → PreviewContext
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use super::common::{is_loadable, load_project, project_path, resolve_root};
use crate::config::{PreviewConfig, WatchConfig};
use crate::logger::{status_error, status_success, status_warning};
use crate::preview::PreviewContext;
use crate::utils::{plural_count, time};

/// What happened to a file within one debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Timing and deduplication only; knows nothing about the engine.
pub struct Debouncer {
    window: Duration,
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Fold a notify event into the pending batch.
    pub fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // mtime/chmod noise
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if !is_temp_file(path) {
                self.add(path.clone(), kind);
            }
        }
    }

    /// Record one change:
    /// - Removed + Created/Modified → the new event (file restored)
    /// - Modified + Removed → Removed
    /// - Created + Removed → dropped (never seen by the engine)
    /// - otherwise the first event wins
    pub fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        match self.changes.get(&path).copied() {
            None => {
                crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                self.changes.insert(path, kind);
            }
            Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                self.changes.insert(path, ChangeKind::Removed);
            }
            Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                self.changes.remove(&path);
            }
            Some(_) => return,
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the batch once the window has passed since the last event.
    pub fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    pub fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window && !self.changes.is_empty())
    }

    /// How long the caller may block before the batch could be ready.
    pub fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(last) => self
                .window
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
            None => Duration::from_secs(3600),
        }
    }

    pub fn pending(&self) -> usize {
        self.changes.len()
    }
}

/// Editor artifacts and hidden files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Outcome of one applied batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: usize,
}

/// Feed a debounced batch into the context.
///
/// Created and modified files go through `update_file` so the build queue
/// sees them; removals through `delete_file`.
pub fn apply_changes(
    ctx: &PreviewContext,
    root: &Path,
    watch: &WatchConfig,
    changes: FxHashMap<PathBuf, ChangeKind>,
) -> BatchSummary {
    let mut changes: Vec<_> = changes.into_iter().collect();
    changes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = BatchSummary::default();
    for (path, kind) in changes {
        let relevant = path.strip_prefix(root).is_ok_and(|rel| !watch.is_ignored(rel));
        let Some(key) = project_path(root, &path).filter(|_| relevant) else {
            summary.skipped += 1;
            continue;
        };

        match kind {
            ChangeKind::Removed => {
                if ctx.delete_file(&key) {
                    summary.removed.push(key);
                } else {
                    summary.skipped += 1;
                }
            }
            ChangeKind::Created | ChangeKind::Modified if path.is_file() && is_loadable(&path) => {
                match update_from_disk(ctx, &key, &path) {
                    Ok(()) => summary.applied.push(key),
                    Err(err) => {
                        log!("watch"; "{:#}", err);
                        summary.skipped += 1;
                    }
                }
            }
            _ => summary.skipped += 1,
        }
    }
    summary
}

fn update_from_disk(ctx: &PreviewContext, key: &str, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ctx.update_file(key, &content)
        .with_context(|| format!("failed to update {key}"))?;
    Ok(())
}

/// Print one status block for a batch, counting errors raised since `since`.
fn report_batch(ctx: &PreviewContext, summary: &BatchSummary, since: u64) {
    let errors = ctx.unresolved_errors();
    let touched: Vec<&String> = summary.applied.iter().chain(&summary.removed).collect();
    if touched.is_empty() {
        return;
    }

    let relevant: Vec<_> = errors
        .iter()
        .filter(|e| e.timestamp >= since)
        .filter(|e| e.error.path.as_ref().is_some_and(|p| touched.contains(&p)))
        .collect();

    if relevant.is_empty() {
        let names: Vec<&str> = touched.iter().map(|s| s.as_str()).collect();
        status_success(&format!("updated {}", names.join(", ")));
        return;
    }

    let detail: Vec<String> = relevant
        .iter()
        .map(|e| {
            format!(
                "{}:{} {}",
                e.error.path.as_deref().unwrap_or("-"),
                e.error.line.unwrap_or(1),
                e.error.message
            )
        })
        .collect();
    status_error(&plural_count(relevant.len(), "error"), &detail.join("\n"));
}

/// Load the project, then apply changes until Ctrl+C.
pub fn run_watch(config: PreviewConfig, dir: Option<&Path>) -> Result<()> {
    let root = resolve_root(dir, &config)?;
    let window = Duration::from_millis(config.watch.debounce_ms);
    let ctx = PreviewContext::new(config);

    // watcher first so nothing changed during the initial load is lost
    let (event_tx, event_rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = event_tx.send(res);
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;

    let loaded = load_project(&ctx, &root);
    log!("watch"; "watching {} ({})", root.display(), plural_count(loaded, "file"));
    let unresolved = ctx.unresolved_errors().len();
    if unresolved > 0 {
        status_warning(&format!("{} on load", plural_count(unresolved, "error")));
    }

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    event_loop(&ctx, &root, &event_rx, &shutdown_rx, Debouncer::new(window));

    log!("watch"; "shutting down");
    ctx.teardown();
    Ok(())
}

fn event_loop(
    ctx: &PreviewContext,
    root: &Path,
    events: &Receiver<notify::Result<notify::Event>>,
    shutdown: &Receiver<()>,
    mut debouncer: Debouncer,
) {
    loop {
        channel::select! {
            recv(shutdown) -> _ => break,
            recv(events) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(err)) => log!("watch"; "notify error: {}", err),
                Err(_) => break,
            },
            default(debouncer.sleep_duration()) => {}
        }

        if let Some(changes) = debouncer.take_if_ready() {
            let started = time::now_millis();
            let summary = apply_changes(ctx, root, &ctx.config().watch, changes);
            crate::debug!(
                "watch";
                "batch: {} applied, {} removed, {} skipped",
                summary.applied.len(),
                summary.removed.len(),
                summary.skipped
            );
            report_batch(ctx, &summary, started);
        }
    }
}
