//! Pull snapshots: file loading, file paths, health.

use serde::Serialize;

/// A script or stylesheet referenced by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub url: String,
    pub loaded: bool,
}

impl ResourceRef {
    pub fn loaded(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            loaded: true,
        }
    }

    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            loaded: false,
        }
    }
}

/// What a probe can see of the host document right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    /// False when there is no document or it could not be read
    pub ready: bool,
    pub title: Option<String>,
    pub has_head: bool,
    pub has_body: bool,
    pub element_count: usize,
    pub scripts: Vec<ResourceRef>,
    pub stylesheets: Vec<ResourceRef>,
    pub images: Vec<String>,
}

impl DocumentSnapshot {
    /// Every locally-referenced URL, scripts then stylesheets then images.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .chain(&self.stylesheets)
            .map(|r| r.url.as_str())
            .chain(self.images.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLoadingReport {
    pub document_ready: bool,
    pub scripts: Vec<ResourceRef>,
    pub stylesheets: Vec<ResourceRef>,
    /// Resources not loaded plus stylesheet failures recorded while monitoring
    pub failed: Vec<String>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePathReport {
    /// Local references found in the document, normalized
    pub referenced: Vec<String>,
    /// References with no matching file in the store
    pub missing: Vec<String>,
    /// External references (`http:`, `data:`, ...) that were skipped
    pub external: usize,
    /// Whether a file store was available to check against
    pub store_attached: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub monitoring: bool,
    pub probe: &'static str,
    pub checks: Vec<HealthCheck>,
    pub timestamp: u64,
}

impl HealthReport {
    pub fn failing(&self) -> impl Iterator<Item = &HealthCheck> {
        self.checks.iter().filter(|c| !c.ok)
    }
}
