//! Probe over a static HTML document.
//!
//! Used by the CLI, where the "host page" is the project's entry HTML file.
//! Observations still arrive through the sink; snapshots are computed by
//! parsing the current document text with `tl`.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;

use super::ProbeSink;
use super::entry::{DomMutation, MutationKind};
use super::probe::EnvironmentProbe;
use super::report::{DocumentSnapshot, ResourceRef};
use crate::utils::time;

#[derive(Default)]
pub struct HtmlDocumentProbe {
    html: RwLock<String>,
    sink: Mutex<Option<ProbeSink>>,
    dom_connected: AtomicBool,
    /// URLs the host reported as failed
    failed: Mutex<FxHashSet<String>>,
}

impl HtmlDocumentProbe {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: RwLock::new(html.into()),
            ..Self::default()
        }
    }

    /// Replace the document; reported as a body mutation while connected.
    pub fn set_html(&self, html: impl Into<String>) {
        let html = html.into();
        let before = element_count(&self.html.read());
        let after = element_count(&html);
        *self.html.write() = html;

        if !self.dom_connected.load(Ordering::Relaxed) {
            return;
        }
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink.mutation(DomMutation {
                target: "body".to_string(),
                kind: MutationKind::ChildList,
                added: after.saturating_sub(before),
                removed: before.saturating_sub(after),
                timestamp: time::now_millis(),
            });
        }
    }

    /// Mark a referenced resource as failed to load.
    pub fn mark_failed(&self, url: impl Into<String>) {
        self.failed.lock().insert(url.into());
    }
}

impl EnvironmentProbe for HtmlDocumentProbe {
    fn name(&self) -> &'static str {
        "html"
    }

    fn install(&self, sink: ProbeSink) -> anyhow::Result<()> {
        *self.sink.lock() = Some(sink);
        self.dom_connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn disconnect_dom_watcher(&self) {
        self.dom_connected.store(false, Ordering::Relaxed);
    }

    fn document(&self) -> DocumentSnapshot {
        let html = self.html.read();
        let failed = self.failed.lock();
        parse_document(&html, |url| !failed.contains(url))
    }
}

/// Collect document facts from `html`.
fn parse_document(html: &str, is_loaded: impl Fn(&str) -> bool) -> DocumentSnapshot {
    if html.trim().is_empty() {
        return DocumentSnapshot::default();
    }
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return DocumentSnapshot::default();
    };

    let parser = dom.parser();
    let resource = |url: String| {
        if is_loaded(&url) {
            ResourceRef::loaded(url)
        } else {
            ResourceRef::failed(url)
        }
    };

    let mut snapshot = DocumentSnapshot {
        ready: true,
        ..DocumentSnapshot::default()
    };

    for node in dom.nodes() {
        let tl::Node::Tag(tag) = node else {
            continue;
        };
        snapshot.element_count += 1;

        match tag.name().as_utf8_str().to_lowercase().as_str() {
            "head" => snapshot.has_head = true,
            "body" => snapshot.has_body = true,
            "title" => {
                let text = tag.inner_text(parser).trim().to_string();
                if !text.is_empty() {
                    snapshot.title = Some(text);
                }
            }
            "script" => {
                if let Some(src) = attribute(tag, "src") {
                    snapshot.scripts.push(resource(src));
                }
            }
            "link" => {
                let is_stylesheet = attribute(tag, "rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
                if is_stylesheet && let Some(href) = attribute(tag, "href") {
                    snapshot.stylesheets.push(resource(href));
                }
            }
            "img" => {
                if let Some(src) = attribute(tag, "src") {
                    snapshot.images.push(src);
                }
            }
            _ => {}
        }
    }

    snapshot
}

fn attribute(tag: &tl::HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .iter()
        .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.map(|v| v.to_string()))
        .filter(|v| !v.is_empty())
}

fn element_count(html: &str) -> usize {
    tl::parse(html, tl::ParserOptions::default())
        .map(|dom| {
            dom.nodes()
                .iter()
                .filter(|n| matches!(n, tl::Node::Tag(_)))
                .count()
        })
        .unwrap_or(0)
}
