//! Preview Context
//!
//! The single construction and wiring point. Owned by the host and passed by
//! reference; there is no global instance.
//!
//! # Routes
//!
//! | Event                | Handler                                           |
//! |----------------------|---------------------------------------------------|
//! | `FileCreated`        | `CodeBuffer::update_file`                         |
//! | `FileUpdated`        | `CodeBuffer::update_file`, `BuildQueue::live_update` |
//! | `FileDeleted`        | `ReloadScheduler::discard_state`, `CodeBuffer::remove` |
//! | `ContentChanged`     | `ReloadScheduler::process_change`                 |
//! | `RuntimeError`       | `ErrorTriage::handle(.., Runtime)`                |
//! | `DiagnosticsPresent` | `ErrorTriage::handle` per diagnostic              |
//!
//! Routes hold weak references so the bus never keeps components alive.

mod surface;

pub use surface::PreviewSurface;

use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::buffer::{CodeBuffer, Diagnostic};
use crate::build::{BuildQueue, ConsoleLevel, RuntimeError, TaskSink};
use crate::bus::{Event, EventBus, Subscription, Topic};
use crate::config::PreviewConfig;
use crate::core::Result;
use crate::deps::{DependencyTracker, ImportScanner, RegexImportScanner};
use crate::monitor::{DiagnosticsLayer, EnvironmentProbe, HealthReport, NullProbe};
use crate::reload::{BusApplier, NoopPreserver, ReloadApplier, ReloadScheduler, StatePreserver};
use crate::store::{FileRecord, FileStore};
use crate::triage::{ErrorCategory, ErrorRecord, ErrorTriage, TrackedError};
use crate::utils::time;

/// Replaceable collaborators. `None` picks the default.
#[derive(Default)]
pub struct PreviewParts {
    pub bus: Option<EventBus>,
    pub probe: Option<Arc<dyn EnvironmentProbe>>,
    pub preserver: Option<Arc<dyn StatePreserver>>,
    pub applier: Option<Arc<dyn ReloadApplier>>,
    pub scanner: Option<Box<dyn ImportScanner>>,
}

pub struct PreviewContext {
    config: PreviewConfig,
    bus: EventBus,
    deps: Arc<DependencyTracker>,
    store: Arc<FileStore>,
    buffer: Arc<CodeBuffer>,
    scheduler: Arc<ReloadScheduler>,
    queue: Arc<BuildQueue>,
    triage: Arc<ErrorTriage>,
    monitor: Arc<DiagnosticsLayer>,
    surface: ArcSwapOption<PreviewSurface>,
    routes: Mutex<Vec<Subscription>>,
}

impl PreviewContext {
    pub fn new(config: PreviewConfig) -> Self {
        Self::with_parts(config, PreviewParts::default())
    }

    pub fn with_parts(config: PreviewConfig, parts: PreviewParts) -> Self {
        let bus = parts.bus.unwrap_or_default();
        let scanner = parts.scanner.unwrap_or_else(|| Box::new(RegexImportScanner));
        let applier = parts
            .applier
            .unwrap_or_else(|| Arc::new(BusApplier::new(bus.clone())));
        let preserver = parts.preserver.unwrap_or_else(|| Arc::new(NoopPreserver));
        let probe = parts.probe.unwrap_or_else(|| Arc::new(NullProbe));

        let deps = Arc::new(DependencyTracker::with_scanner(scanner));
        let store = Arc::new(FileStore::new(bus.clone(), Arc::clone(&deps)));
        let buffer = Arc::new(CodeBuffer::new(bus.clone()));
        let scheduler = Arc::new(ReloadScheduler::with_parts(
            bus.clone(),
            applier,
            preserver,
            &config.queue,
        ));
        let queue = Arc::new(BuildQueue::new(
            bus.clone(),
            Arc::clone(&scheduler) as Arc<dyn TaskSink>,
            &config.queue,
        ));
        let triage = Arc::new(ErrorTriage::new(bus.clone(), &config.triage));
        let monitor = Arc::new(DiagnosticsLayer::new(bus.clone(), probe, &config.monitor));
        monitor.attach_store(Arc::clone(&store));

        let context = Self {
            config,
            bus,
            deps,
            store,
            buffer,
            scheduler,
            queue,
            triage,
            monitor,
            surface: ArcSwapOption::empty(),
            routes: Mutex::new(Vec::new()),
        };
        context.wire();

        if context.config.monitor.autostart {
            context.monitor.start_monitoring();
        }
        crate::debug!("preview"; "context ready");
        context
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    pub fn create_file(&self, path: &str, content: &str) -> Result<FileRecord> {
        self.store.create(path, content)
    }

    pub fn update_file(&self, path: &str, content: &str) -> Result<FileRecord> {
        self.store.update(path, content)
    }

    pub fn delete_file(&self, path: &str) -> bool {
        self.store.delete(path)
    }

    /// Make a stored file the active buffer. `None` if it doesn't exist.
    pub fn set_active_file(&self, path: &str) -> Option<Vec<Diagnostic>> {
        let content = self.store.content(path)?;
        Some(self.buffer.set_active(path, &content))
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        self.store.content(path)
    }

    pub fn all_files(&self) -> Vec<FileRecord> {
        self.store.all_files()
    }

    // -------------------------------------------------------------------------
    // Surface
    // -------------------------------------------------------------------------

    pub fn set_surface(&self, surface: PreviewSurface) {
        crate::debug!("preview"; "surface set: {}", surface.name());
        self.surface.store(Some(Arc::new(surface)));
    }

    pub fn surface(&self) -> Option<Arc<PreviewSurface>> {
        self.surface.load_full()
    }

    pub fn clear_surface(&self) -> Option<Arc<PreviewSurface>> {
        self.surface.swap(None)
    }

    // -------------------------------------------------------------------------
    // Errors & diagnostics
    // -------------------------------------------------------------------------

    /// Entry point for errors raised by the running preview.
    pub fn report_runtime_error(&self, error: RuntimeError) -> RuntimeError {
        self.queue.handle_runtime_error(error)
    }

    pub fn report_console(&self, level: ConsoleLevel, args: &[&str], source: Option<&str>) {
        self.queue.capture_console_log(level, args, source);
    }

    pub fn unresolved_errors(&self) -> Vec<ErrorRecord> {
        self.triage.unresolved()
    }

    pub fn clear_errors(&self) {
        self.triage.clear();
    }

    pub fn run_health_check(&self) -> HealthReport {
        self.monitor.run_health_check()
    }

    /// Monitor export plus engine state: files, errors, queue counters.
    pub fn export_debug_data(&self) -> Value {
        let mut export = self.monitor.export_debug_data();

        let files: Vec<Value> = self
            .store
            .all_files()
            .into_iter()
            .map(|f| {
                json!({
                    "path": f.path,
                    "kind": f.kind,
                    "fingerprint": f.fingerprint,
                    "last_modified": f.last_modified,
                    "dependencies": f.dependencies,
                    "dependents": self.deps.dependents(&f.path),
                })
            })
            .collect();

        if let Value::Object(map) = &mut export {
            map.insert("files".into(), Value::Array(files));
            map.insert("errors".into(), json!(self.triage.history(None)));
            map.insert(
                "engine".into(),
                json!({
                    "bus": self.bus.stats(),
                    "queue": self.queue.stats(),
                    "pending": self.queue.pending(),
                    "reload": self.scheduler.stats(),
                    "active_file": self.buffer.active_path(),
                    "surface": self.surface().map(|s| s.name().to_string()),
                    "exported_at": time::now_millis(),
                }),
            );
        }
        export
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, handler)
    }

    /// Stop monitoring and clear every component. Routes stay wired.
    pub fn teardown(&self) {
        self.monitor.stop_monitoring();
        self.queue.clear();
        self.scheduler.clear();
        self.store.clear();
        self.buffer.clear();
        self.triage.clear();
        self.monitor.clear();
        self.surface.store(None);
        crate::debug!("preview"; "torn down");
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn deps(&self) -> &DependencyTracker {
        &self.deps
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn buffer(&self) -> &CodeBuffer {
        &self.buffer
    }

    pub fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    pub fn scheduler(&self) -> &ReloadScheduler {
        &self.scheduler
    }

    pub fn triage(&self) -> &ErrorTriage {
        &self.triage
    }

    pub fn monitor(&self) -> &DiagnosticsLayer {
        &self.monitor
    }

    // -------------------------------------------------------------------------
    // Wiring
    // -------------------------------------------------------------------------

    fn wire(&self) {
        let mut routes = self.routes.lock();

        let buffer = Arc::downgrade(&self.buffer);
        routes.push(self.route(Topic::FileCreated, buffer, |buffer, event| {
            if let Event::FileCreated { path, content, .. } = event {
                buffer.update_file(path, content);
            }
        }));

        let targets = (Arc::downgrade(&self.buffer), Arc::downgrade(&self.queue));
        routes.push(self.bus.subscribe(Topic::FileUpdated, move |event| {
            let Event::FileUpdated { path, content, .. } = event else {
                return;
            };
            if let Some(buffer) = targets.0.upgrade() {
                buffer.update_file(path, content);
            }
            if let Some(queue) = targets.1.upgrade() {
                queue.live_update(path, content);
            }
        }));

        let targets = (Arc::downgrade(&self.scheduler), Arc::downgrade(&self.buffer));
        routes.push(self.bus.subscribe(Topic::FileDeleted, move |event| {
            let Event::FileDeleted { path } = event else {
                return;
            };
            if let Some(scheduler) = targets.0.upgrade() {
                scheduler.discard_state(path);
            }
            if let Some(buffer) = targets.1.upgrade() {
                buffer.remove(path);
            }
        }));

        let scheduler = Arc::downgrade(&self.scheduler);
        routes.push(self.route(Topic::ContentChanged, scheduler, |scheduler, event| {
            if let Event::ContentChanged { path, content } = event {
                scheduler.process_change(path, content);
            }
        }));

        let triage = Arc::downgrade(&self.triage);
        routes.push(self.route(Topic::RuntimeError, triage, |triage, event| {
            if let Event::RuntimeError(error) = event {
                triage.handle(TrackedError::from(error.clone()), Some(ErrorCategory::Runtime));
            }
        }));

        let triage = Arc::downgrade(&self.triage);
        routes.push(self.route(Topic::DiagnosticsPresent, triage, |triage, event| {
            if let Event::DiagnosticsPresent { path, diagnostics } = event {
                for diagnostic in diagnostics {
                    triage.handle(TrackedError::from_diagnostic(path, diagnostic), None);
                }
            }
        }));
    }

    /// Subscribe `f` with a weakly-held target; a dropped target is a no-op.
    fn route<T, F>(&self, topic: Topic, target: Weak<T>, f: F) -> Subscription
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, move |event| {
            if let Some(target) = target.upgrade() {
                f(&target, event);
            }
        })
    }
}

impl Drop for PreviewContext {
    fn drop(&mut self) {
        for route in self.routes.get_mut().drain(..) {
            route.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests;
