//! Unified error types for the Dockmeta workspace.
//!
//! None of these are fatal to the enrichment path: the enricher reports
//! them to its observer and degrades to "no metadata". They surface as
//! real errors only from configuration loading and the CLI.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DockmetaError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The container runtime rejected or failed an inspection.
    #[error("inspecting container {id} failed: {message}")]
    Inspect {
        /// Container that was being inspected.
        id: String,
        /// Description reported by the runtime client.
        message: String,
    },

    /// An inspection did not complete in time.
    #[error("inspecting container {id} timed out after {timeout:?}")]
    InspectTimeout {
        /// Container that was being inspected.
        id: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// A template source could not be compiled.
    #[error("template {name}: syntax error: {message}")]
    TemplateSyntax {
        /// Name of the template (the formatted field).
        name: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// A compiled template failed while rendering.
    #[error("template {name}: {message}")]
    TemplateExec {
        /// Name of the template (the formatted field).
        name: String,
        /// Description of the execution problem.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A YAML configuration document could not be parsed.
    #[error("yaml error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DockmetaError>;
