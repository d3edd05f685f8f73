//! Dependency tracking between project files.
//!
//! Two layers:
//! - `graph`: pure forward/reverse data structure
//! - `scan`: pluggable import extraction ([`ImportScanner`])
//!
//! [`DependencyTracker`] glues them together behind a lock so the file store
//! and the facade can share one instance.

mod graph;
mod scan;

pub use graph::DependencyGraph;
pub use scan::{ImportScanner, RegexImportScanner};

use parking_lot::RwLock;

/// Import graph over project paths.
pub struct DependencyTracker {
    graph: RwLock<DependencyGraph>,
    scanner: Box<dyn ImportScanner>,
}

impl DependencyTracker {
    /// Tracker using the default regex scanner.
    pub fn new() -> Self {
        Self::with_scanner(Box::new(RegexImportScanner))
    }

    pub fn with_scanner(scanner: Box<dyn ImportScanner>) -> Self {
        Self {
            graph: RwLock::new(DependencyGraph::new()),
            scanner,
        }
    }

    /// Scan `content` and store the result as the forward edges of `path`.
    ///
    /// Returns the dependency list in first-seen order. A file importing
    /// itself gets no edge, so the returned list and the stored edges agree.
    pub fn analyze(&self, content: &str, path: &str) -> Vec<String> {
        let mut deps = self.scanner.scan(content);
        deps.retain(|dep| dep != path);
        self.graph.write().record(path, &deps);
        crate::debug!("deps"; "{} -> {:?}", path, deps);
        deps
    }

    /// Scan without touching the graph.
    pub fn scan(&self, content: &str) -> Vec<String> {
        self.scanner.scan(content)
    }

    /// Files `path` imports (copy).
    pub fn dependencies(&self, path: &str) -> Vec<String> {
        self.graph.read().uses(path).cloned().unwrap_or_default()
    }

    /// Files importing `path` (copy, sorted).
    pub fn dependents(&self, path: &str) -> Vec<String> {
        self.graph
            .read()
            .used_by(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `path` has a forward entry.
    pub fn is_tracked(&self, path: &str) -> bool {
        self.graph.read().has_forward(path)
    }

    /// Retract `path` as an importer.
    pub fn remove_dependencies(&self, path: &str) {
        if let Some(old) = self.graph.write().remove(path) {
            crate::debug!("deps"; "removed {} ({} edges)", path, old.len());
        }
    }

    /// Run `f` against the graph under a read lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&DependencyGraph) -> R) -> R {
        f(&self.graph.read())
    }

    pub fn clear(&self) {
        self.graph.write().clear();
    }
}

impl Default for DependencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
