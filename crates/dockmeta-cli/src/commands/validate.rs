//! `dockmeta validate` — Check a configuration file.

use std::io::{self, Write};

use dockmeta_common::config::{DockmetaConfig, FormattedField};
use dockmeta_common::error::DockmetaError;
use dockmeta_template::Template;

/// Executes the `validate` command.
///
/// The configuration has already been parsed and validated by the time
/// this runs; what is left is compiling every metadata template.
///
/// # Errors
///
/// Returns an error if any template fails to compile.
pub fn execute(config: &DockmetaConfig) -> anyhow::Result<()> {
    let extraction = &config.docker_metadata.extraction;
    let failures = check_templates(&extraction.metadata);
    for (field, error) in &failures {
        tracing::error!(field = %field, error = %error, "metadata template does not compile");
    }
    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} metadata templates failed to compile",
            failures.len(),
            extraction.metadata.len()
        );
    }

    writeln!(
        io::stdout().lock(),
        "configuration OK: enabled={}, endpoint={}, {} env, {} labels, {} templates",
        config.docker_metadata.enabled,
        config.docker_metadata.connection.endpoint(),
        extraction.env.len(),
        extraction.labels.len(),
        extraction.metadata.len()
    )?;
    Ok(())
}

/// Compiles each template, returning the fields that failed.
fn check_templates(fields: &[FormattedField]) -> Vec<(String, DockmetaError)> {
    fields
        .iter()
        .filter_map(|field| {
            Template::compile(field.field.as_str(), &field.format)
                .err()
                .map(|e| (field.field.clone(), e))
        })
        .collect()
}
