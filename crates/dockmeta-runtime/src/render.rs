//! Templated metadata fields.
//!
//! Templates are compiled on first use and cached per field name for the
//! process lifetime. A template that fails to compile is remembered as
//! failed and never retried; a render failure only drops the field for
//! the current event.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock};

use dockmeta_common::config::FormattedField;
use dockmeta_common::types::{ContainerRecord, MetadataMap};
use dockmeta_template::Template;

use crate::observer::EnrichObserver;

#[derive(Debug, Clone)]
enum Slot {
    Compiled(Arc<Template>),
    Failed,
}

impl Slot {
    fn template(&self) -> Option<Arc<Template>> {
        match self {
            Self::Compiled(template) => Some(Arc::clone(template)),
            Self::Failed => None,
        }
    }
}

/// Write-once cache of compiled templates.
///
/// Slots are keyed by field name and then by template source, so two
/// definitions that share a field name never share a template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: RwLock<HashMap<String, HashMap<String, Slot>>>,
}

impl TemplateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled template for `field`, compiling it on first use.
    ///
    /// Returns `None` if the template failed to compile, now or earlier.
    pub fn get_or_compile(
        &self,
        field: &FormattedField,
        observer: &dyn EnrichObserver,
    ) -> Option<Arc<Template>> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field.field)
            .and_then(|by_format| by_format.get(&field.format))
        {
            return slot.template();
        }

        let compiled = Template::compile(field.field.as_str(), &field.format);
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots
            .entry(field.field.clone())
            .or_default()
            .entry(field.format.clone())
        {
            // Another thread compiled it while we were.
            Entry::Occupied(slot) => slot.get().template(),
            Entry::Vacant(vacant) => {
                let slot = match compiled {
                    Ok(template) => {
                        tracing::debug!(field = %field.field, "metadata template compiled");
                        observer.template_compiled(&field.field);
                        Slot::Compiled(Arc::new(template))
                    }
                    Err(e) => {
                        tracing::warn!(
                            field = %field.field,
                            error = %e,
                            "metadata template does not compile; field disabled"
                        );
                        observer.template_compile_failed(&field.field, &e);
                        Slot::Failed
                    }
                };
                vacant.insert(slot).template()
            }
        }
    }

    /// Returns whether any definition of `field` has a cached slot.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(field)
    }

    /// Returns whether a definition of `field` is cached as a compile failure.
    #[must_use]
    pub fn is_failed(&self, field: &str) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .is_some_and(|by_format| by_format.values().any(|slot| matches!(slot, Slot::Failed)))
    }

    /// Number of cached slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// Returns whether nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every cached template and failure.
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Renders every formatted field against `record`.
///
/// Fields whose template is unavailable or fails to render are omitted.
/// When two definitions share a field name, the later one that renders
/// wins.
pub fn render_formatted(
    cache: &TemplateCache,
    fields: &[FormattedField],
    record: &ContainerRecord,
    observer: &dyn EnrichObserver,
) -> MetadataMap {
    let mut out = MetadataMap::new();
    for field in fields {
        let Some(template) = cache.get_or_compile(field, observer) else {
            continue;
        };
        match template.render(record.attributes()) {
            Ok(text) => {
                observer.template_rendered(&field.field);
                let _ = out.insert(field.field.clone(), text);
            }
            Err(e) => {
                tracing::debug!(field = %field.field, error = %e, "metadata template failed to render");
                observer.template_render_failed(&field.field, &e);
            }
        }
    }
    out
}
