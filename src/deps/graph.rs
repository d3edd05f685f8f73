//! Bidirectional dependency graph.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

/// Forward/reverse import graph keyed by project path.
///
/// # Invariants
/// - `reverse` is the transpose of `forward` after every public call
/// - Old forward edges are retracted before new ones are added
/// - Self-references are excluded
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Forward: file → its imports, first-seen order
    forward: FxHashMap<String, Vec<String>>,
    /// Reverse: import target → files that import it
    reverse: FxHashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the forward edges of `path`.
    pub fn record(&mut self, path: &str, deps: &[String]) {
        self.remove(path);

        for dep in deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(path.to_string());
        }

        self.forward.insert(path.to_string(), deps.to_vec());
    }

    /// Drop the forward entry of `path` and its back-references.
    ///
    /// The reverse entry keyed by `path` is kept: the files listed there still
    /// import it, and their own re-scan retracts it.
    pub fn remove(&mut self, path: &str) -> Option<Vec<String>> {
        let old_deps = self.forward.remove(path)?;

        for dep in &old_deps {
            if let Some(dependents) = self.reverse.get_mut(dep) {
                dependents.remove(path);
                if dependents.is_empty() {
                    self.reverse.remove(dep);
                }
            }
        }
        Some(old_deps)
    }

    #[inline]
    pub fn uses(&self, path: &str) -> Option<&Vec<String>> {
        self.forward.get(path)
    }

    #[inline]
    pub fn used_by(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.reverse.get(path)
    }

    #[inline]
    pub fn has_forward(&self, path: &str) -> bool {
        self.forward.contains_key(path)
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// (forward entries, reverse entries)
    pub fn counts(&self) -> (usize, usize) {
        (self.forward.len(), self.reverse.len())
    }

    /// Iterate all forward edges as (from, to).
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .flat_map(|(from, deps)| deps.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// Iterate all reverse edges as (target, importer).
    pub fn reverse_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.reverse
            .iter()
            .flat_map(|(to, froms)| froms.iter().map(move |from| (to.as_str(), from.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.used_by("/any.ts").is_none());
        assert_eq!(graph.counts(), (0, 0));
    }

    #[test]
    fn update_replaces_old_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.record("/a.ts", &deps(&["./old"]));
        graph.record("/a.ts", &deps(&["./new"]));

        assert!(graph.used_by("./old").is_none());
        assert!(graph.used_by("./new").unwrap().contains("/a.ts"));
    }

    #[test]
    fn self_reference_stays_symmetric() {
        let mut graph = DependencyGraph::new();
        graph.record("/a.ts", &deps(&["/a.ts", "/b.ts"]));

        assert_eq!(graph.uses("/a.ts").unwrap(), &deps(&["/a.ts", "/b.ts"]));
        assert!(graph.used_by("/a.ts").unwrap().contains("/a.ts"));

        graph.remove("/a.ts");
        assert!(graph.used_by("/a.ts").is_none());
    }

    #[test]
    fn shared_dependency() {
        let mut graph = DependencyGraph::new();
        graph.record("/a.ts", &deps(&["/shared.ts"]));
        graph.record("/b.ts", &deps(&["/shared.ts"]));

        let users = graph.used_by("/shared.ts").unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn remove_keeps_reverse_entry_of_removed_path() {
        let mut graph = DependencyGraph::new();
        graph.record("/a.ts", &deps(&["/b.ts"]));
        graph.record("/b.ts", &deps(&["/c.ts"]));

        assert_eq!(graph.remove("/b.ts"), Some(deps(&["/c.ts"])));
        assert!(graph.used_by("/c.ts").is_none());
        // /a.ts still imports /b.ts
        assert!(graph.used_by("/b.ts").unwrap().contains("/a.ts"));
        assert!(graph.remove("/b.ts").is_none());
    }

    #[test]
    fn edges_are_transposed() {
        let mut graph = DependencyGraph::new();
        graph.record("/a.ts", &deps(&["/b.ts", "/c.ts"]));
        graph.record("/b.ts", &deps(&["/c.ts"]));

        let mut forward: Vec<_> = graph.edges().collect();
        let mut reverse: Vec<_> = graph.reverse_edges().map(|(to, from)| (from, to)).collect();
        forward.sort();
        reverse.sort();
        assert_eq!(forward, reverse);
    }
}
