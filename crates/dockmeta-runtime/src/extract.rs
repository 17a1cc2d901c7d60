//! Env and label extraction from container records.

use dockmeta_common::types::{ContainerRecord, MetadataMap};

/// Collects the configured environment variables from `record`.
///
/// Entries are split on the first `=`; entries without one are skipped.
/// When the runtime reports the same variable twice the later entry wins.
#[must_use]
pub fn extract_env(record: &ContainerRecord, names: &[String]) -> MetadataMap {
    let mut out = MetadataMap::new();
    if names.is_empty() {
        return out;
    }
    for entry in record.env() {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        if names.iter().any(|name| name == key) {
            let _ = out.insert(key.to_owned(), value.to_owned());
        }
    }
    out
}

/// Collects the configured labels from `record`.
#[must_use]
pub fn extract_labels(record: &ContainerRecord, names: &[String]) -> MetadataMap {
    names
        .iter()
        .filter_map(|name| {
            record
                .labels()
                .get(name)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect()
}
