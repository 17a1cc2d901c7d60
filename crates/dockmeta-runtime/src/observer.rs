//! Hook for observing enrichment without changing its outcome.
//!
//! Every failure in the enrichment path is swallowed so log delivery is
//! never blocked; observers are how operators still see them.

use dockmeta_common::error::DockmetaError;
use dockmeta_common::types::ContainerId;

use crate::enricher::EnrichOutcome;

/// Receives notifications from the enricher.
///
/// All methods default to doing nothing. Implementations must be cheap:
/// they run inline on the event path.
pub trait EnrichObserver: Send + Sync {
    /// A record was served from the store.
    fn store_hit(&self, _id: &ContainerId) {}

    /// The runtime was asked about a container and answered.
    fn inspected(&self, _id: &ContainerId) {}

    /// The runtime could not provide a record.
    fn inspect_failed(&self, _id: &ContainerId, _error: &DockmetaError) {}

    /// A formatted field's template compiled.
    fn template_compiled(&self, _field: &str) {}

    /// A formatted field's template did not compile; the field is disabled.
    fn template_compile_failed(&self, _field: &str, _error: &DockmetaError) {}

    /// A formatted field rendered.
    fn template_rendered(&self, _field: &str) {}

    /// A formatted field failed to render for one event.
    fn template_render_failed(&self, _field: &str, _error: &DockmetaError) {}

    /// An event finished going through the enricher.
    fn enrich_finished(&self, _outcome: &EnrichOutcome) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EnrichObserver for NoopObserver {}
