//! End-to-end scenarios through the context.

use super::*;
use crate::monitor::{DocumentSnapshot, FakeProbe, HostError, HostErrorKind, ResourceRef};
use crate::reload::{ChangeType, MemoryPreserver, ReloadTask};
use crate::triage::ErrorCategory;
use serde_json::json;

fn context() -> PreviewContext {
    crate::logger::set_quiet(true);
    PreviewContext::new(PreviewConfig::default())
}

fn record(ctx: &PreviewContext, topics: &[Topic]) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for &topic in topics {
        let sink = Arc::clone(&events);
        ctx.subscribe(topic, move |e| sink.lock().push(e.clone()));
    }
    events
}

const COMPONENT: &str = "export default function Card() {\n  return <div className=\"card\"/>;\n}\n";

#[test]
fn update_flows_through_queue_and_reload() {
    let ctx = context();
    ctx.create_file("/src/components/Card.tsx", COMPONENT).unwrap();
    let events = record(
        &ctx,
        &[Topic::PreviewUpdate, Topic::ApplyComponent, Topic::HotReloadSuccess],
    );

    ctx.update_file("/src/components/Card.tsx", COMPONENT).unwrap();

    let events = events.lock();
    let preview = events
        .iter()
        .find_map(|e| match e {
            Event::PreviewUpdate { path, priority } => Some((path.clone(), priority.value())),
            _ => None,
        })
        .unwrap();
    assert_eq!(preview, ("/src/components/Card.tsx".to_string(), 60));

    let successes: Vec<ChangeType> = events
        .iter()
        .filter_map(|e| match e {
            Event::HotReloadSuccess { change_type, .. } => Some(*change_type),
            _ => None,
        })
        .collect();
    // once via the buffer's content route, once via the build queue
    assert_eq!(successes, vec![ChangeType::Component, ChangeType::Component]);
    assert!(events.iter().any(|e| e.topic() == Topic::ApplyComponent));
    assert!(ctx.queue().is_empty());
}

#[test]
fn broken_file_is_triaged() {
    let ctx = context();
    let diagnose = record(&ctx, &[Topic::Diagnose]);

    ctx.create_file("/src/main.ts", "function main() {\nimport broken\n")
        .unwrap();

    let unresolved = ctx.unresolved_errors();
    assert_eq!(unresolved.len(), 2);
    // most recent first: the import line, then the brace imbalance
    assert_eq!(unresolved[0].category, ErrorCategory::Import);
    assert_eq!(unresolved[0].error.line, Some(2));
    assert_eq!(unresolved[1].category, ErrorCategory::Syntax);
    assert_eq!(unresolved[1].error.path.as_deref(), Some("/src/main.ts"));
    assert_eq!(diagnose.lock().len(), 2);

    ctx.clear_errors();
    assert!(ctx.unresolved_errors().is_empty());
}

#[test]
fn runtime_errors_are_categorized_as_runtime() {
    let ctx = context();
    let reported = ctx.report_runtime_error(
        RuntimeError::new("Uncaught Cannot find module './x'")
            .with_source("/src/main.ts")
            .with_position(4, 2),
    );
    assert_eq!(reported.message, "Cannot find module './x'");

    let errors = ctx.unresolved_errors();
    assert_eq!(errors.len(), 1);
    // explicit category beats the "module" keyword
    assert_eq!(errors[0].category, ErrorCategory::Runtime);
    assert_eq!(errors[0].error.line, Some(4));
}

#[test]
fn failing_applier_reports_hot_reload_error() {
    struct Rejecting;
    impl ReloadApplier for Rejecting {
        fn apply(&self, task: &ReloadTask) -> anyhow::Result<()> {
            anyhow::bail!("cannot apply {}", task.change_type)
        }
    }

    crate::logger::set_quiet(true);
    let ctx = PreviewContext::with_parts(
        PreviewConfig::default(),
        PreviewParts {
            applier: Some(Arc::new(Rejecting)),
            ..PreviewParts::default()
        },
    );
    let errors = record(&ctx, &[Topic::HotReloadError]);

    ctx.create_file("/styles/site.css", "body {}").unwrap();
    match &errors.lock()[0] {
        Event::HotReloadError { path, error } => {
            assert_eq!(path, "/styles/site.css");
            assert_eq!(error, "cannot apply style");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn component_state_survives_update() {
    crate::logger::set_quiet(true);
    let preserver = Arc::new(MemoryPreserver::new());
    let ctx = PreviewContext::with_parts(
        PreviewConfig::default(),
        PreviewParts {
            preserver: Some(Arc::clone(&preserver) as Arc<dyn StatePreserver>),
            ..PreviewParts::default()
        },
    );
    let wiper = Arc::clone(&preserver);
    ctx.subscribe(Topic::ApplyComponent, move |e| {
        if let Event::ApplyChange(task) = e {
            wiper.forget(&task.path);
        }
    });

    ctx.create_file("/src/Card.tsx", COMPONENT).unwrap();
    preserver.set("/src/Card.tsx", json!({ "expanded": true }));
    ctx.update_file("/src/Card.tsx", COMPONENT).unwrap();

    assert_eq!(preserver.get("/src/Card.tsx"), Some(json!({ "expanded": true })));
}

#[test]
fn delete_discards_buffer_and_edges() {
    let ctx = context();
    ctx.create_file("/a.ts", "import u from '/util.ts';").unwrap();
    ctx.set_active_file("/a.ts").unwrap();

    assert!(ctx.delete_file("/a.ts"));
    assert!(ctx.file_content("/a.ts").is_none());
    assert!(ctx.buffer().content("/a.ts").is_none());
    assert!(ctx.buffer().active_path().is_none());
    assert!(ctx.deps().dependents("/util.ts").is_empty());
    assert!(ctx.set_active_file("/a.ts").is_none());
}

#[test]
fn surface_handle_round_trip() {
    let ctx = context();
    assert!(ctx.surface().is_none());

    ctx.set_surface(PreviewSurface::new("iframe#preview", 42_u32));
    let surface = ctx.surface().unwrap();
    assert_eq!(surface.name(), "iframe#preview");
    assert_eq!(surface.downcast_ref::<u32>(), Some(&42));

    assert!(ctx.clear_surface().is_some());
    assert!(ctx.surface().is_none());
}

#[test]
fn export_includes_engine_state() {
    crate::logger::set_quiet(true);
    let probe = Arc::new(FakeProbe::new());
    probe.set_document(DocumentSnapshot {
        ready: true,
        has_head: true,
        has_body: true,
        scripts: vec![ResourceRef::loaded("/src/main.ts")],
        ..DocumentSnapshot::default()
    });
    let ctx = PreviewContext::with_parts(
        PreviewConfig::default(),
        PreviewParts {
            probe: Some(Arc::clone(&probe) as Arc<dyn EnvironmentProbe>),
            ..PreviewParts::default()
        },
    );
    ctx.create_file("/src/main.ts", "import a from './a';").unwrap();
    probe.emit_error(HostError::new(HostErrorKind::Error, "oops"));

    let export = ctx.export_debug_data();
    assert_eq!(export["files"][0]["path"], "/src/main.ts");
    assert_eq!(export["files"][0]["dependencies"][0], "./a");
    assert_eq!(export["files"][0]["fingerprint"].as_str().unwrap().len(), 16);
    assert_eq!(export["logs"]["errors"][0]["message"], "oops");
    assert_eq!(export["file_paths"]["missing"].as_array().unwrap().len(), 0);
    assert!(export["engine"]["bus"]["published"].as_u64().unwrap() > 0);
    assert!(ctx.monitor().is_monitoring());
}

#[test]
fn teardown_clears_everything() {
    let ctx = context();
    ctx.create_file("/a.ts", "{").unwrap();
    ctx.set_surface(PreviewSurface::new("s", ()));

    ctx.teardown();
    assert!(ctx.all_files().is_empty());
    assert!(ctx.unresolved_errors().is_empty());
    assert!(ctx.buffer().content("/a.ts").is_none());
    assert!(ctx.surface().is_none());
    assert!(!ctx.monitor().is_monitoring());

    // still usable afterwards
    ctx.create_file("/b.ts", "").unwrap();
    assert_eq!(ctx.all_files().len(), 1);
}

#[test]
fn dropping_context_unwires_shared_bus() {
    crate::logger::set_quiet(true);
    let bus = EventBus::new();
    let ctx = PreviewContext::with_parts(
        PreviewConfig::default(),
        PreviewParts {
            bus: Some(bus.clone()),
            ..PreviewParts::default()
        },
    );
    assert!(bus.subscriber_count(Topic::FileUpdated) > 0);

    drop(ctx);
    assert_eq!(bus.subscriber_count(Topic::FileUpdated), 0);
    assert_eq!(bus.subscriber_count(Topic::HotReloadSuccess), 0);
}
