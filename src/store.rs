//! File Store
//!
//! Authoritative path → content map; the system of record for which files
//! exist. Every mutation re-scans dependencies and publishes events:
//!
//! | Operation | Events                                                     |
//! |-----------|------------------------------------------------------------|
//! | `create`  | `FileTreeChanged`, `FileCreated`                           |
//! | `update`  | `FileTreeChanged`, `FileUpdated`, `DependentUpdated` × n   |
//! | `delete`  | `FileTreeChanged`, `FileDeleted`                           |
//!
//! Reads return copies. Nothing here blocks on I/O.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::bus::{Event, EventBus, FileAction};
use crate::core::{FileKind, PreviewError, Result};
use crate::deps::DependencyTracker;
use crate::utils::{hash, path, time};

/// One stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub last_modified: u64,
    /// Forward edges from the latest scan, first-seen order
    pub dependencies: Vec<String>,
    pub kind: FileKind,
    /// Short content hash
    pub fingerprint: String,
}

/// Path → record map plus the shared dependency tracker.
pub struct FileStore {
    bus: EventBus,
    deps: Arc<DependencyTracker>,
    files: RwLock<FxHashMap<String, FileRecord>>,
}

impl FileStore {
    pub fn new(bus: EventBus, deps: Arc<DependencyTracker>) -> Self {
        Self {
            bus,
            deps,
            files: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create (or overwrite) a file.
    pub fn create(&self, path: &str, content: &str) -> Result<FileRecord> {
        let record = self.store(path, content)?;

        self.bus.publish(Event::FileTreeChanged {
            action: FileAction::Created,
            path: record.path.clone(),
        });
        self.bus.publish(Event::FileCreated {
            path: record.path.clone(),
            content: record.content.clone(),
            kind: record.kind,
        });
        Ok(record)
    }

    /// Replace a file's content.
    ///
    /// When the file already existed, every dependent gets its edges
    /// refreshed from its own stored content.
    pub fn update(&self, path: &str, content: &str) -> Result<FileRecord> {
        let existed = self.exists(path);
        let record = self.store(path, content)?;

        self.bus.publish(Event::FileTreeChanged {
            action: FileAction::Updated,
            path: record.path.clone(),
        });
        self.bus.publish(Event::FileUpdated {
            path: record.path.clone(),
            content: record.content.clone(),
            kind: record.kind,
            dependencies: record.dependencies.clone(),
        });

        if existed {
            self.refresh_dependents(path);
        }
        Ok(record)
    }

    /// Remove a file and its outgoing edges. Dependents are left untouched.
    ///
    /// Returns false if the file did not exist.
    pub fn delete(&self, path: &str) -> bool {
        let removed = self.files.write().remove(path);
        if removed.is_none() {
            return false;
        }
        self.deps.remove_dependencies(path);

        crate::debug!("store"; "deleted {}", path);
        self.bus.publish(Event::FileTreeChanged {
            action: FileAction::Deleted,
            path: path.to_string(),
        });
        self.bus.publish(Event::FileDeleted {
            path: path.to_string(),
        });
        true
    }

    pub fn get(&self, path: &str) -> Option<FileRecord> {
        self.files.read().get(path).cloned()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.read().get(path).map(|r| r.content.clone())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    /// All records, sorted by path.
    pub fn all_files(&self) -> Vec<FileRecord> {
        let mut files: Vec<_> = self.files.read().values().cloned().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// All paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// Drop every record and the whole graph.
    pub fn clear(&self) {
        self.files.write().clear();
        self.deps.clear();
    }

    // -------------------------------------------------------------------------
    // Private
    // -------------------------------------------------------------------------

    fn store(&self, path: &str, content: &str) -> Result<FileRecord> {
        if !path::is_valid(path) {
            return Err(PreviewError::InvalidPath(path.to_string()));
        }

        let dependencies = self.deps.analyze(content, path);
        let record = FileRecord {
            path: path.to_string(),
            content: content.to_string(),
            last_modified: time::now_millis(),
            dependencies,
            kind: FileKind::from_path(path),
            fingerprint: hash::fingerprint(content),
        };

        self.files.write().insert(path.to_string(), record.clone());
        crate::debug!("store"; "stored {} ({}, {} deps)", path, record.kind.name(), record.dependencies.len());
        Ok(record)
    }

    fn refresh_dependents(&self, path: &str) {
        for dependent in self.deps.dependents(path) {
            let Some(content) = self.content(&dependent) else {
                continue;
            };

            let dependencies = self.deps.analyze(&content, &dependent);
            if let Some(record) = self.files.write().get_mut(&dependent) {
                record.dependencies = dependencies;
            }

            self.bus.publish(Event::DependentUpdated {
                path: dependent,
                dependency: path.to_string(),
            });
        }
    }
}
