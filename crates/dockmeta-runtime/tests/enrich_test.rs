//! End-to-end tests for the enrichment pipeline against a scripted runtime.
//!
//! Covers:
//! 1. Store reuse (one inspection per identifier)
//! 2. Missing identifiers and inspection failures (fail-open)
//! 3. Env and label extraction
//! 4. Formatted-field precedence and compile-once semantics
//! 5. Empty-result omission

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dockmeta_common::config::{ExtractionConfig, FormattedField};
use dockmeta_common::error::{DockmetaError, Result};
use dockmeta_common::types::{ContainerId, ContainerRecord, Event};
use dockmeta_runtime::client::RuntimeClient;
use dockmeta_runtime::enricher::{EnrichOutcome, Enricher};
use dockmeta_runtime::metrics::EnrichMetrics;
use dockmeta_runtime::store::MetadataStore;
use serde_json::{Value, json};

/// Runtime that answers from a fixed table and counts calls per id.
#[derive(Default)]
struct ScriptedRuntime {
    containers: HashMap<String, Value>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedRuntime {
    fn with(mut self, id: &str, attributes: Value) -> Self {
        let _ = self.containers.insert(id.to_string(), attributes);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RuntimeClient for ScriptedRuntime {
    fn inspect(&self, id: &ContainerId) -> Result<ContainerRecord> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(id.to_string());
        self.containers
            .get(id.as_str())
            .cloned()
            .map(ContainerRecord::from_attributes)
            .ok_or_else(|| DockmetaError::NotFound {
                kind: "container",
                id: id.to_string(),
            })
    }
}

fn web_container() -> Value {
    json!({
        "Id": "0123456789ab",
        "Name": "/web",
        "Config": {
            "Image": "nginx:1.27",
            "Env": ["FOO=bar", "BAZ=qux", "MALFORMED", "PATH=/usr/bin"],
            "Labels": { "a": "1", "b": "2" }
        }
    })
}

fn event_for(id: &str) -> Event {
    Event::from_value(json!({
        "MESSAGE": "GET / 200",
        "PRIORITY": "6",
        "CONTAINER_ID": id
    }))
    .expect("object")
}

fn setup(
    extraction: ExtractionConfig,
    runtime: ScriptedRuntime,
) -> (Enricher, Arc<ScriptedRuntime>, Arc<MetadataStore>, Arc<EnrichMetrics>) {
    let runtime = Arc::new(runtime);
    let store = Arc::new(MetadataStore::new());
    let metrics = Arc::new(EnrichMetrics::new());
    let enricher = Enricher::new(extraction, runtime.clone(), store.clone())
        .with_observer(metrics.clone());
    (enricher, runtime, store, metrics)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

// ── Store ────────────────────────────────────────────────────────────

#[test]
fn second_event_for_same_container_reuses_the_stored_record() {
    let extraction = ExtractionConfig {
        env: names(&["FOO"]),
        ..ExtractionConfig::default()
    };
    let (enricher, runtime, store, metrics) =
        setup(extraction, ScriptedRuntime::default().with("web", web_container()));

    let mut first = event_for("web");
    let mut second = event_for("web");
    let _ = enricher.enrich(&mut first);
    let _ = enricher.enrich(&mut second);

    assert_eq!(runtime.calls(), 1);
    assert!(store.contains(&ContainerId::new("web")));
    assert_eq!(first.get("docker"), second.get("docker"));
    assert_eq!(metrics.snapshot().store_hits, 1);
}

#[test]
fn each_distinct_container_is_inspected_once() {
    let extraction = ExtractionConfig {
        labels: names(&["a"]),
        ..ExtractionConfig::default()
    };
    let runtime = ScriptedRuntime::default()
        .with("one", web_container())
        .with("two", web_container());
    let (enricher, runtime, store, _) = setup(extraction, runtime);

    for id in ["one", "two", "one", "two", "one"] {
        let _ = enricher.enrich(&mut event_for(id));
    }

    assert_eq!(runtime.calls(), 2);
    assert_eq!(*runtime.seen.lock().unwrap(), vec!["one", "two"]);
    assert_eq!(store.len(), 2);
}

// ── Fail-open ────────────────────────────────────────────────────────

#[test]
fn event_without_identifier_is_returned_unmodified() {
    let (enricher, runtime, _, _) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = Event::from_value(json!({ "MESSAGE": "kernel: eth0 up" })).expect("object");
    let before = event.clone();

    assert_eq!(enricher.enrich(&mut event), EnrichOutcome::NoIdentifier);
    assert_eq!(event, before);
    assert!(!event.contains("docker"));
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn inspection_error_leaves_event_unmodified_and_store_empty() {
    let (enricher, _, store, metrics) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default(),
    );
    let mut event = event_for("vanished");
    let before = event.clone();

    assert_eq!(enricher.enrich(&mut event), EnrichOutcome::InspectFailed);
    assert_eq!(event, before);
    assert!(!store.contains(&ContainerId::new("vanished")));
    assert_eq!(metrics.snapshot().inspection_failures, 1);
}

#[test]
fn failed_inspection_is_attempted_again_for_the_next_event() {
    let (enricher, runtime, _, _) = setup(ExtractionConfig::default(), ScriptedRuntime::default());
    let _ = enricher.enrich(&mut event_for("vanished"));
    let _ = enricher.enrich(&mut event_for("vanished"));
    assert_eq!(runtime.calls(), 2);
}

// ── Extraction ───────────────────────────────────────────────────────

#[test]
fn env_extraction_returns_only_configured_present_names() {
    let (enricher, _, _, _) = setup(
        ExtractionConfig {
            env: names(&["FOO", "MISSING"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    let _ = enricher.enrich(&mut event);
    assert_eq!(event.get("docker"), Some(&json!({ "FOO": "bar" })));
}

#[test]
fn label_extraction_returns_only_configured_present_names() {
    let (enricher, _, _, _) = setup(
        ExtractionConfig {
            labels: names(&["b", "c"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    let _ = enricher.enrich(&mut event);
    assert_eq!(event.get("docker"), Some(&json!({ "b": "2" })));
}

#[test]
fn malformed_env_entry_is_skipped() {
    let (enricher, _, _, _) = setup(
        ExtractionConfig {
            env: names(&["MALFORMED", "BAZ"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    assert_eq!(
        enricher.enrich(&mut event),
        EnrichOutcome::Enriched { fields: 1 }
    );
    assert_eq!(event.get("docker"), Some(&json!({ "BAZ": "qux" })));
}

// ── Formatted fields ────────────────────────────────────────────────

#[test]
fn formatted_field_overwrites_extracted_key() {
    let (enricher, _, _, _) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            labels: names(&["a"]),
            metadata: vec![
                FormattedField::new("FOO", "from-template"),
                FormattedField::new("a", "{{ .Config.Image }}"),
            ],
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    let _ = enricher.enrich(&mut event);
    assert_eq!(
        event.get("docker"),
        Some(&json!({ "FOO": "from-template", "a": "nginx:1.27" }))
    );
}

#[test]
fn template_compiles_once_and_renders_per_event() {
    let runtime = (0..5).fold(ScriptedRuntime::default(), |rt, i| {
        rt.with(&format!("c{i}"), web_container())
    });
    let (enricher, runtime, _, metrics) = setup(
        ExtractionConfig {
            metadata: vec![FormattedField::new("name", "{{ .Name }}")],
            ..ExtractionConfig::default()
        },
        runtime,
    );

    for i in 0..5 {
        let mut event = event_for(&format!("c{i}"));
        let _ = enricher.enrich(&mut event);
        assert_eq!(event.get("docker"), Some(&json!({ "name": "/web" })));
    }

    let snap = metrics.snapshot();
    assert_eq!(runtime.calls(), 5);
    assert_eq!(snap.templates_compiled, 1);
    assert_eq!(snap.templates_rendered, 5);
    assert_eq!(enricher.templates().len(), 1);
}

#[test]
fn broken_template_does_not_block_other_metadata() {
    let (enricher, _, _, metrics) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            metadata: vec![
                FormattedField::new("broken", "{{ .Name"),
                FormattedField::new("missing", "{{ .State.Health }}"),
            ],
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    for _ in 0..3 {
        let mut event = event_for("web");
        let _ = enricher.enrich(&mut event);
        assert_eq!(event.get("docker"), Some(&json!({ "FOO": "bar" })));
    }
    let snap = metrics.snapshot();
    assert_eq!(snap.template_compile_failures, 1);
    assert_eq!(snap.template_render_failures, 3);
    assert!(enricher.templates().is_failed("broken"));
}

// ── Empty results ────────────────────────────────────────────────────

#[test]
fn nothing_extracted_means_no_docker_field() {
    let (enricher, runtime, store, _) = setup(
        ExtractionConfig {
            env: names(&["NOT_SET"]),
            labels: names(&["absent"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    let before = event.clone();

    assert_eq!(enricher.enrich(&mut event), EnrichOutcome::Empty);
    assert_eq!(event, before);
    assert_eq!(runtime.calls(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn other_event_fields_survive_enrichment() {
    let (enricher, _, _, _) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let mut event = event_for("web");
    let _ = enricher.enrich(&mut event);
    assert_eq!(event.len(), 4);
    assert_eq!(event.get_str("MESSAGE"), Some("GET / 200"));
    assert_eq!(event.get_str("PRIORITY"), Some("6"));
    assert_eq!(event.get_str("CONTAINER_ID"), Some("web"));
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn enricher_can_be_shared_across_threads() {
    let (enricher, _, store, metrics) = setup(
        ExtractionConfig {
            env: names(&["FOO"]),
            metadata: vec![FormattedField::new("image", "{{ .Config.Image }}")],
            ..ExtractionConfig::default()
        },
        ScriptedRuntime::default().with("web", web_container()),
    );
    let enricher = Arc::new(enricher);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let enricher = Arc::clone(&enricher);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    let mut event = event_for("web");
                    assert_eq!(
                        enricher.enrich(&mut event),
                        EnrichOutcome::Enriched { fields: 2 }
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    assert_eq!(store.len(), 1);
    assert_eq!(enricher.templates().len(), 1);
    assert_eq!(metrics.snapshot().enriched, 100);
}
