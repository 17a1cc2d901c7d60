//! Enrichment counters.
//!
//! [`EnrichMetrics`] is an [`EnrichObserver`] that counts what happens on
//! the enrichment path; [`MetricsSnapshot`] is a serializable copy.

use std::sync::atomic::{AtomicU64, Ordering};

use dockmeta_common::error::DockmetaError;
use dockmeta_common::types::ContainerId;
use serde::{Deserialize, Serialize};

use crate::enricher::EnrichOutcome;
use crate::observer::EnrichObserver;

/// Point-in-time copy of the enrichment counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Events passed to the enricher.
    pub events: u64,
    /// Events that received a metadata map.
    pub enriched: u64,
    /// Events without a usable container identifier.
    pub no_identifier: u64,
    /// Events whose container could not be inspected.
    pub inspect_failed: u64,
    /// Events whose container produced no metadata.
    pub empty: u64,
    /// Records served from the store.
    pub store_hits: u64,
    /// Successful runtime inspections.
    pub inspections: u64,
    /// Failed runtime inspections.
    pub inspection_failures: u64,
    /// Templates compiled.
    pub templates_compiled: u64,
    /// Templates that failed to compile.
    pub template_compile_failures: u64,
    /// Formatted fields rendered.
    pub templates_rendered: u64,
    /// Formatted fields that failed to render.
    pub template_render_failures: u64,
}

/// Atomic enrichment counters.
#[derive(Debug, Default)]
pub struct EnrichMetrics {
    events: AtomicU64,
    enriched: AtomicU64,
    no_identifier: AtomicU64,
    inspect_failed: AtomicU64,
    empty: AtomicU64,
    store_hits: AtomicU64,
    inspections: AtomicU64,
    inspection_failures: AtomicU64,
    templates_compiled: AtomicU64,
    template_compile_failures: AtomicU64,
    templates_rendered: AtomicU64,
    template_render_failures: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    let _ = counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

impl EnrichMetrics {
    /// Creates a zeroed set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events: read(&self.events),
            enriched: read(&self.enriched),
            no_identifier: read(&self.no_identifier),
            inspect_failed: read(&self.inspect_failed),
            empty: read(&self.empty),
            store_hits: read(&self.store_hits),
            inspections: read(&self.inspections),
            inspection_failures: read(&self.inspection_failures),
            templates_compiled: read(&self.templates_compiled),
            template_compile_failures: read(&self.template_compile_failures),
            templates_rendered: read(&self.templates_rendered),
            template_render_failures: read(&self.template_render_failures),
        }
    }
}

impl EnrichObserver for EnrichMetrics {
    fn store_hit(&self, _id: &ContainerId) {
        bump(&self.store_hits);
    }

    fn inspected(&self, _id: &ContainerId) {
        bump(&self.inspections);
    }

    fn inspect_failed(&self, _id: &ContainerId, _error: &DockmetaError) {
        bump(&self.inspection_failures);
    }

    fn template_compiled(&self, _field: &str) {
        bump(&self.templates_compiled);
    }

    fn template_compile_failed(&self, _field: &str, _error: &DockmetaError) {
        bump(&self.template_compile_failures);
    }

    fn template_rendered(&self, _field: &str) {
        bump(&self.templates_rendered);
    }

    fn template_render_failed(&self, _field: &str, _error: &DockmetaError) {
        bump(&self.template_render_failures);
    }

    fn enrich_finished(&self, outcome: &EnrichOutcome) {
        bump(&self.events);
        match outcome {
            EnrichOutcome::Enriched { .. } => bump(&self.enriched),
            EnrichOutcome::NoIdentifier => bump(&self.no_identifier),
            EnrichOutcome::InspectFailed => bump(&self.inspect_failed),
            EnrichOutcome::Empty => bump(&self.empty),
        }
    }
}
