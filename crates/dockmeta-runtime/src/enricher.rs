//! Enrichment of log events with container metadata.

use std::sync::Arc;

use dockmeta_common::config::ExtractionConfig;
use dockmeta_common::error::Result;
use dockmeta_common::types::{ContainerId, ContainerRecord, Event, MetadataMap};
use serde_json::Value;

use crate::client::RuntimeClient;
use crate::extract;
use crate::observer::{EnrichObserver, NoopObserver};
use crate::render::{self, TemplateCache};
use crate::store::MetadataStore;

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The metadata map was attached with this many fields.
    Enriched {
        /// Number of keys in the attached map.
        fields: usize,
    },
    /// The event had no string identifier field.
    NoIdentifier,
    /// The container could not be inspected.
    InspectFailed,
    /// The container yielded no metadata.
    Empty,
}

/// Attaches container metadata to events.
///
/// Enrichment is best effort: every failure leaves the event as it was
/// and is reported only to the observer and the log.
pub struct Enricher {
    extraction: ExtractionConfig,
    client: Arc<dyn RuntimeClient>,
    store: Arc<MetadataStore>,
    templates: TemplateCache,
    observer: Arc<dyn EnrichObserver>,
}

impl Enricher {
    /// Creates an enricher that resolves records through `store`, falling
    /// back to `client` on a miss.
    #[must_use]
    pub fn new(
        extraction: ExtractionConfig,
        client: Arc<dyn RuntimeClient>,
        store: Arc<MetadataStore>,
    ) -> Self {
        Self {
            extraction,
            client,
            store,
            templates: TemplateCache::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EnrichObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Enriches `event` in place.
    ///
    /// Reads the identifier field, resolves the container record, and sets
    /// the target field to the derived metadata when there is any. No
    /// other field is touched.
    pub fn enrich(&self, event: &mut Event) -> EnrichOutcome {
        let outcome = self.enrich_inner(event);
        self.observer.enrich_finished(&outcome);
        outcome
    }

    fn enrich_inner(&self, event: &mut Event) -> EnrichOutcome {
        let Some(id) = event
            .get_str(self.extraction.container_id_field())
            .filter(|id| !id.is_empty())
            .map(ContainerId::new)
        else {
            return EnrichOutcome::NoIdentifier;
        };

        let Ok(record) = self.resolve(&id) else {
            return EnrichOutcome::InspectFailed;
        };

        let metadata = self.derive(&record);
        if metadata.is_empty() {
            tracing::trace!(id = %id, "container yielded no metadata");
            return EnrichOutcome::Empty;
        }

        let fields = metadata.len();
        let _ = event.insert(self.extraction.target_field(), metadata_value(metadata));
        EnrichOutcome::Enriched { fields }
    }

    /// Returns the record for `id`, inspecting and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the runtime client's error when the container cannot be
    /// inspected; nothing is stored in that case.
    pub fn resolve(&self, id: &ContainerId) -> Result<Arc<ContainerRecord>> {
        if let Some(record) = self.store.lookup(id) {
            self.observer.store_hit(id);
            return Ok(record);
        }

        match self.client.inspect(id) {
            Ok(record) => {
                tracing::debug!(id = %id, "container inspected; caching record");
                self.observer.inspected(id);
                Ok(self.store.insert(id.clone(), record))
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "container inspection failed; event left unenriched");
                self.observer.inspect_failed(id, &e);
                Err(e)
            }
        }
    }

    /// Derives the metadata map for `record`.
    ///
    /// Env values, then labels, then formatted fields; a later step
    /// overwrites keys set by an earlier one.
    #[must_use]
    pub fn derive(&self, record: &ContainerRecord) -> MetadataMap {
        let mut metadata = extract::extract_env(record, &self.extraction.env);
        metadata.extend(extract::extract_labels(record, &self.extraction.labels));
        metadata.extend(render::render_formatted(
            &self.templates,
            &self.extraction.metadata,
            record,
            self.observer.as_ref(),
        ));
        metadata
    }

    /// Resolves `id` and derives its metadata without touching an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be inspected.
    pub fn metadata_for(&self, id: &ContainerId) -> Result<MetadataMap> {
        let record = self.resolve(id)?;
        Ok(self.derive(&record))
    }

    /// The record store backing this enricher.
    #[must_use]
    pub const fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    /// The compiled template cache.
    #[must_use]
    pub const fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// The extraction settings.
    #[must_use]
    pub const fn extraction(&self) -> &ExtractionConfig {
        &self.extraction
    }
}

fn metadata_value(metadata: MetadataMap) -> Value {
    Value::Object(
        metadata
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}
