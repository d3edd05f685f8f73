//! Diagnostics Layer
//!
//! Passive, best-effort observability of the host environment.
//!
//! ```text
//! EnvironmentProbe ──ProbeSink──► bounded logs ──► debug:* events
//! bus (hot-reload, console) ──tap──┘
//!
//! verify_file_loading / check_file_paths / run_health_check
//!     └─ probe.document() snapshot ──► report ──► debug:* event
//! ```
//!
//! Nothing in here may panic into the caller: every probe call is guarded,
//! and observations arriving while monitoring is off are dropped.

mod entry;
mod html;
mod log;
mod probe;
mod report;

pub use entry::{
    DomMutation, FrameMessage, HostError, HostErrorKind, HotReloadEntry, MutationKind,
    NetworkEntry, NetworkStatus, StylesheetFailure,
};
pub use html::HtmlDocumentProbe;
pub use log::BoundedLog;
pub use probe::{EnvironmentProbe, FakeProbe, NullProbe};
pub use report::{
    DocumentSnapshot, FileLoadingReport, FilePathReport, HealthCheck, HealthReport, ResourceRef,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};

use crate::build::ConsoleEntry;
use crate::bus::{Event, EventBus, Subscription, Topic};
use crate::config::MonitorConfig;
use crate::store::FileStore;
use crate::utils::{panic::guard, path::normalize_specifier, time};

// =============================================================================
// Logs
// =============================================================================

/// Every debug log, one per observation kind.
#[derive(Debug, Clone, Serialize)]
pub struct DebugLogs {
    pub errors: BoundedLog<HostError>,
    pub stylesheets: BoundedLog<StylesheetFailure>,
    pub network: BoundedLog<NetworkEntry>,
    pub dom: BoundedLog<DomMutation>,
    pub messages: BoundedLog<FrameMessage>,
    pub hot_reload: BoundedLog<HotReloadEntry>,
    pub console: BoundedLog<ConsoleEntry>,
}

impl DebugLogs {
    fn new(capacity: usize) -> Self {
        Self {
            errors: BoundedLog::new(capacity),
            stylesheets: BoundedLog::new(capacity),
            network: BoundedLog::new(capacity),
            dom: BoundedLog::new(capacity),
            messages: BoundedLog::new(capacity),
            hot_reload: BoundedLog::new(capacity),
            console: BoundedLog::new(capacity),
        }
    }

    fn clear(&mut self) {
        self.errors.clear();
        self.stylesheets.clear();
        self.network.clear();
        self.dom.clear();
        self.messages.clear();
        self.hot_reload.clear();
        self.console.clear();
    }
}

struct Shared {
    bus: EventBus,
    monitoring: AtomicBool,
    logs: Mutex<DebugLogs>,
}

impl Shared {
    /// Append under the lock, publish after releasing it.
    fn record(&self, push: impl FnOnce(&mut DebugLogs), event: Event) -> bool {
        if !self.monitoring.load(Ordering::Acquire) {
            return false;
        }
        push(&mut *self.logs.lock());
        self.bus.publish(event);
        true
    }
}

// =============================================================================
// ProbeSink
// =============================================================================

/// Where probes deliver observations. Cheap to clone; inert once the layer
/// is dropped or while monitoring is off.
#[derive(Clone)]
pub struct ProbeSink {
    shared: Weak<Shared>,
}

impl ProbeSink {
    pub fn error(&self, error: HostError) -> bool {
        let event = Event::DebugError(error.clone());
        self.with(move |s| s.record(move |l| l.errors.push(error), event))
    }

    pub fn stylesheet(&self, failure: StylesheetFailure) -> bool {
        let event = Event::DebugStylesheet(failure.clone());
        self.with(move |s| s.record(move |l| l.stylesheets.push(failure), event))
    }

    pub fn network(&self, entry: NetworkEntry) -> bool {
        let event = Event::DebugNetwork(entry.clone());
        self.with(move |s| s.record(move |l| l.network.push(entry), event))
    }

    pub fn mutation(&self, mutation: DomMutation) -> bool {
        let event = Event::DebugDomMutation(mutation.clone());
        self.with(move |s| s.record(move |l| l.dom.push(mutation), event))
    }

    pub fn message(&self, message: FrameMessage) -> bool {
        let event = Event::DebugMessage(message.clone());
        self.with(move |s| s.record(move |l| l.messages.push(message), event))
    }

    fn with(&self, f: impl FnOnce(&Shared) -> bool) -> bool {
        self.shared.upgrade().is_some_and(|shared| f(&shared))
    }
}

// =============================================================================
// DiagnosticsLayer
// =============================================================================

pub struct DiagnosticsLayer {
    shared: Arc<Shared>,
    probe: Arc<dyn EnvironmentProbe>,
    store: ArcSwapOption<FileStore>,
    taps: Mutex<Vec<Subscription>>,
}

impl DiagnosticsLayer {
    pub fn new(bus: EventBus, probe: Arc<dyn EnvironmentProbe>, config: &MonitorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                bus,
                monitoring: AtomicBool::new(false),
                logs: Mutex::new(DebugLogs::new(config.log_capacity)),
            }),
            probe,
            store: ArcSwapOption::empty(),
            taps: Mutex::new(Vec::new()),
        }
    }

    /// File store used by [`check_file_paths`](Self::check_file_paths).
    pub fn attach_store(&self, store: Arc<FileStore>) {
        self.store.store(Some(store));
    }

    /// Install observers. Returns false if already monitoring.
    pub fn start_monitoring(&self) -> bool {
        if self.shared.monitoring.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.install_taps();
        let sink = ProbeSink {
            shared: Arc::downgrade(&self.shared),
        };
        match guard(|| self.probe.install(sink)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => crate::log!("monitor"; "probe `{}` install failed: {:#}", self.probe.name(), err),
            Err(panic) => crate::log!("monitor"; "probe `{}` install panicked: {}", self.probe.name(), panic),
        }

        crate::debug!("monitor"; "monitoring started ({})", self.probe.name());
        true
    }

    /// Disconnect the DOM watcher. Returns false if not monitoring.
    pub fn stop_monitoring(&self) -> bool {
        if !self.shared.monitoring.swap(false, Ordering::AcqRel) {
            return false;
        }

        if let Err(panic) = guard(|| self.probe.disconnect_dom_watcher()) {
            crate::log!("monitor"; "probe disconnect panicked: {}", panic);
        }
        crate::debug!("monitor"; "monitoring stopped");
        true
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared.monitoring.load(Ordering::Acquire)
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    /// Which referenced scripts and stylesheets loaded.
    pub fn verify_file_loading(&self) -> FileLoadingReport {
        let report = self.file_loading(&self.document());
        self.shared.bus.publish(Event::DebugFileLoading(report.clone()));
        report
    }

    /// Which local references in the document have no stored file.
    pub fn check_file_paths(&self) -> FilePathReport {
        let report = self.file_paths(&self.document());
        self.shared.bus.publish(Event::DebugFilePaths(report.clone()));
        report
    }

    pub fn run_health_check(&self) -> HealthReport {
        let report = self.health(&self.document());
        self.shared.bus.publish(Event::DebugHealth(report.clone()));
        report
    }

    /// Snapshot of every log.
    pub fn logs(&self) -> DebugLogs {
        self.shared.logs.lock().clone()
    }

    /// One JSON document with every log and fresh snapshots.
    pub fn export_debug_data(&self) -> Value {
        let document = self.document();
        let logs = self.logs();

        json!({
            "generated_at": time::now_millis(),
            "probe": self.probe.name(),
            "monitoring": self.is_monitoring(),
            "document": document,
            "file_loading": self.file_loading(&document),
            "file_paths": self.file_paths(&document),
            "health": self.health(&document),
            "logs": logs,
        })
    }

    /// Empty every log; monitoring state is unchanged.
    pub fn clear(&self) {
        self.shared.logs.lock().clear();
    }

    // -------------------------------------------------------------------------
    // Private
    // -------------------------------------------------------------------------

    fn document(&self) -> DocumentSnapshot {
        guard(|| self.probe.document()).unwrap_or_else(|panic| {
            crate::log!("monitor"; "probe `{}` snapshot panicked: {}", self.probe.name(), panic);
            DocumentSnapshot::default()
        })
    }

    /// Bus taps are installed once and stay; the monitoring flag gates them.
    fn install_taps(&self) {
        let mut taps = self.taps.lock();
        if !taps.is_empty() {
            return;
        }

        let bus = &self.shared.bus;
        for topic in [Topic::HotReloadSuccess, Topic::HotReloadError] {
            let shared = Arc::downgrade(&self.shared);
            taps.push(bus.subscribe(topic, move |event| {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                let entry = match event {
                    Event::HotReloadSuccess { path, change_type } => HotReloadEntry {
                        path: path.clone(),
                        success: true,
                        change_type: Some(*change_type),
                        error: None,
                        timestamp: time::now_millis(),
                    },
                    Event::HotReloadError { path, error } => HotReloadEntry {
                        path: path.clone(),
                        success: false,
                        change_type: None,
                        error: Some(error.clone()),
                        timestamp: time::now_millis(),
                    },
                    _ => return,
                };
                let event = Event::DebugHotReload(entry.clone());
                shared.record(move |l| l.hot_reload.push(entry), event);
            }));
        }

        let shared = Arc::downgrade(&self.shared);
        taps.push(bus.subscribe(Topic::ConsoleLog, move |event| {
            if let (Some(shared), Event::ConsoleLog(entry)) = (shared.upgrade(), event)
                && shared.monitoring.load(Ordering::Acquire)
            {
                shared.logs.lock().console.push(entry.clone());
            }
        }));
    }

    fn file_loading(&self, document: &DocumentSnapshot) -> FileLoadingReport {
        let mut failed: Vec<String> = document
            .scripts
            .iter()
            .chain(&document.stylesheets)
            .filter(|r| !r.loaded)
            .map(|r| r.url.clone())
            .collect();
        for failure in self.shared.logs.lock().stylesheets.iter() {
            if !failed.contains(&failure.href) {
                failed.push(failure.href.clone());
            }
        }

        FileLoadingReport {
            document_ready: document.ready,
            scripts: document.scripts.clone(),
            stylesheets: document.stylesheets.clone(),
            failed,
            timestamp: time::now_millis(),
        }
    }

    fn file_paths(&self, document: &DocumentSnapshot) -> FilePathReport {
        let store = self.store.load_full();
        let mut referenced = Vec::new();
        let mut missing = Vec::new();
        let mut external = 0;

        for url in document.references() {
            if is_external(url) {
                external += 1;
                continue;
            }
            let path = local_path(url);
            if referenced.contains(&path) {
                continue;
            }
            if let Some(store) = &store
                && !store.exists(&path)
            {
                missing.push(path.clone());
            }
            referenced.push(path);
        }

        FilePathReport {
            referenced,
            missing,
            external,
            store_attached: store.is_some(),
            timestamp: time::now_millis(),
        }
    }

    fn health(&self, document: &DocumentSnapshot) -> HealthReport {
        let monitoring = self.is_monitoring();
        let logs = self.shared.logs.lock();

        let failed_requests = logs
            .network
            .iter()
            .filter(|e| e.status == NetworkStatus::Failed)
            .count();
        let last_reload_failed = logs.hot_reload.last().is_some_and(|e| !e.success);
        let unloaded = document
            .scripts
            .iter()
            .chain(&document.stylesheets)
            .filter(|r| !r.loaded)
            .count()
            + logs.stylesheets.len();

        let checks = vec![
            check("monitoring", monitoring, if monitoring { "active" } else { "stopped" }),
            check(
                "document",
                document.ready,
                if document.ready { "ready" } else { "unavailable" },
            ),
            check(
                "body",
                document.has_body,
                if document.has_body { "present" } else { "missing" },
            ),
            check("resources", unloaded == 0, format!("{unloaded} failed")),
            check("errors", logs.errors.is_empty(), format!("{} recorded", logs.errors.len())),
            check("network", failed_requests == 0, format!("{failed_requests} failed")),
            check(
                "hot_reload",
                !last_reload_failed,
                if last_reload_failed { "last reload failed" } else { "ok" },
            ),
        ];
        drop(logs);

        HealthReport {
            healthy: checks.iter().all(|c| c.ok),
            monitoring,
            probe: self.probe.name(),
            checks,
            timestamp: time::now_millis(),
        }
    }
}

impl Drop for DiagnosticsLayer {
    fn drop(&mut self) {
        for tap in self.taps.get_mut().drain(..) {
            tap.unsubscribe();
        }
    }
}

fn check(name: &'static str, ok: bool, detail: impl Into<String>) -> HealthCheck {
    HealthCheck {
        name,
        ok,
        detail: detail.into(),
    }
}

fn is_external(url: &str) -> bool {
    url.starts_with("//") || url.contains("://") || url.starts_with("data:") || url.starts_with("blob:")
}

/// `./a.css?v=1#x` → `/a.css`
fn local_path(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let url = &url[..end];
    let url = url.strip_prefix("./").unwrap_or(url);
    normalize_specifier(url)
}
