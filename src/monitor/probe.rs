//! Environment probes.
//!
//! A probe is the binding between the diagnostics layer and whatever hosts
//! the preview: it installs the observers that feed a [`ProbeSink`] and
//! answers document snapshots on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::ProbeSink;
use super::entry::{DomMutation, FrameMessage, HostError, NetworkEntry, StylesheetFailure};
use super::report::DocumentSnapshot;

pub trait EnvironmentProbe: Send + Sync {
    /// Short name for reports.
    fn name(&self) -> &'static str;

    /// Install observers. Called on every start; must tolerate repeats.
    fn install(&self, sink: ProbeSink) -> anyhow::Result<()>;

    /// Stop DOM mutation observation. Other observers stay installed and
    /// are silenced by the sink's monitoring flag.
    fn disconnect_dom_watcher(&self);

    fn document(&self) -> DocumentSnapshot;
}

// =============================================================================
// NullProbe
// =============================================================================

/// No host at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl EnvironmentProbe for NullProbe {
    fn name(&self) -> &'static str {
        "null"
    }

    fn install(&self, _sink: ProbeSink) -> anyhow::Result<()> {
        Ok(())
    }

    fn disconnect_dom_watcher(&self) {}

    fn document(&self) -> DocumentSnapshot {
        DocumentSnapshot::default()
    }
}

// =============================================================================
// FakeProbe
// =============================================================================

/// Headless, scriptable probe.
///
/// Tests push observations through the `emit_*` methods exactly as a real
/// host binding would.
#[derive(Default)]
pub struct FakeProbe {
    sink: Mutex<Option<ProbeSink>>,
    document: Mutex<DocumentSnapshot>,
    dom_connected: AtomicBool,
    installs: AtomicUsize,
    broken: AtomicBool,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_document(&self, document: DocumentSnapshot) {
        *self.document.lock() = document;
    }

    /// Make every probe call panic.
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::Relaxed);
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::Relaxed)
    }

    pub fn dom_connected(&self) -> bool {
        self.dom_connected.load(Ordering::Relaxed)
    }

    pub fn emit_error(&self, error: HostError) -> bool {
        self.sink().is_some_and(|s| s.error(error))
    }

    pub fn emit_stylesheet_failure(&self, failure: StylesheetFailure) -> bool {
        self.sink().is_some_and(|s| s.stylesheet(failure))
    }

    pub fn emit_network(&self, entry: NetworkEntry) -> bool {
        self.sink().is_some_and(|s| s.network(entry))
    }

    /// Dropped while the DOM watcher is disconnected.
    pub fn emit_mutation(&self, mutation: DomMutation) -> bool {
        self.dom_connected() && self.sink().is_some_and(|s| s.mutation(mutation))
    }

    pub fn emit_message(&self, message: FrameMessage) -> bool {
        self.sink().is_some_and(|s| s.message(message))
    }

    fn sink(&self) -> Option<ProbeSink> {
        self.sink.lock().clone()
    }

    fn check(&self) {
        if self.broken.load(Ordering::Relaxed) {
            panic!("probe is broken");
        }
    }
}

impl EnvironmentProbe for FakeProbe {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn install(&self, sink: ProbeSink) -> anyhow::Result<()> {
        self.check();
        *self.sink.lock() = Some(sink);
        self.dom_connected.store(true, Ordering::Relaxed);
        self.installs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn disconnect_dom_watcher(&self) {
        self.dom_connected.store(false, Ordering::Relaxed);
    }

    fn document(&self) -> DocumentSnapshot {
        self.check();
        self.document.lock().clone()
    }
}
