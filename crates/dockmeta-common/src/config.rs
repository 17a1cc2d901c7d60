//! Configuration model for Docker metadata enrichment.
//!
//! Loaded once at startup from YAML and treated as read-only afterwards.
//! Compiled templates are cached elsewhere, never written back here.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTAINER_ID_FIELD, DEFAULT_DOCKER_ENDPOINT, DEFAULT_INSPECT_TIMEOUT_SECS,
    DEFAULT_TARGET_FIELD,
};
use crate::error::{DockmetaError, Result};

/// Root of a Dockmeta configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockmetaConfig {
    /// Docker metadata enrichment settings.
    #[serde(default)]
    pub docker_metadata: DockerMetadataConfig,
}

impl DockmetaConfig {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or fails validation.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(input)?;
        config.docker_metadata.normalize();
        config.docker_metadata.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| DockmetaError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Settings for the Docker metadata enrichment step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerMetadataConfig {
    /// Whether enrichment runs at all.
    #[serde(default)]
    pub enabled: bool,
    /// How to reach the container runtime.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// What to extract and where to put it.
    #[serde(flatten)]
    pub extraction: ExtractionConfig,
}

impl DockerMetadataConfig {
    fn normalize(&mut self) {
        dedup_preserving_order(&mut self.extraction.env);
        dedup_preserving_order(&mut self.extraction.labels);
    }

    /// Checks the settings for combinations the enricher cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`DockmetaError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.extraction.validate()
    }
}

/// Connection settings consumed by the runtime client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Runtime endpoint (`unix://`, `tcp://` or `http://`).
    #[serde(default)]
    pub endpoint: String,
    /// Client certificate for TLS.
    #[serde(default)]
    pub cert: Option<PathBuf>,
    /// Client private key for TLS.
    #[serde(default)]
    pub key: Option<PathBuf>,
    /// Certificate authority for TLS.
    #[serde(default)]
    pub ca: Option<PathBuf>,
    /// Upper bound on one inspection, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            cert: None,
            key: None,
            ca: None,
            timeout_secs: DEFAULT_INSPECT_TIMEOUT_SECS,
        }
    }
}

impl ConnectionConfig {
    /// Returns the configured endpoint, or the local Docker socket if empty.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        if self.endpoint.is_empty() {
            DEFAULT_DOCKER_ENDPOINT
        } else {
            &self.endpoint
        }
    }

    /// Returns the inspection timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the TLS material when a certificate is configured.
    #[must_use]
    pub fn tls(&self) -> Option<TlsFiles<'_>> {
        match (&self.cert, &self.key, &self.ca) {
            (Some(cert), Some(key), Some(ca)) => Some(TlsFiles { cert, key, ca }),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(config_err("connection.timeout_secs must be greater than zero"));
        }
        let set = [&self.cert, &self.key, &self.ca]
            .iter()
            .filter(|p| p.is_some())
            .count();
        if set != 0 && set != 3 {
            return Err(config_err(
                "connection.cert, connection.key and connection.ca must be set together",
            ));
        }
        Ok(())
    }
}

/// Paths to the TLS files used to reach the runtime.
#[derive(Debug, Clone, Copy)]
pub struct TlsFiles<'a> {
    /// Client certificate.
    pub cert: &'a Path,
    /// Client private key.
    pub key: &'a Path,
    /// Certificate authority.
    pub ca: &'a Path,
}

/// Extraction settings read by the enricher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Event field holding the container identifier.
    #[serde(default)]
    pub container_id_field: String,
    /// Event field receiving the metadata map.
    #[serde(default = "default_target_field")]
    pub target_field: String,
    /// Environment variable names to surface.
    #[serde(default)]
    pub env: Vec<String>,
    /// Label names to surface.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Templated fields rendered against the inspection document.
    #[serde(default)]
    pub metadata: Vec<FormattedField>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            container_id_field: String::new(),
            target_field: default_target_field(),
            env: Vec::new(),
            labels: Vec::new(),
            metadata: Vec::new(),
        }
    }
}

impl ExtractionConfig {
    /// Returns the identifier field, or `CONTAINER_ID` if empty.
    #[must_use]
    pub fn container_id_field(&self) -> &str {
        if self.container_id_field.is_empty() {
            DEFAULT_CONTAINER_ID_FIELD
        } else {
            &self.container_id_field
        }
    }

    /// Returns the target field, or `docker` if empty.
    #[must_use]
    pub fn target_field(&self) -> &str {
        if self.target_field.is_empty() {
            DEFAULT_TARGET_FIELD
        } else {
            &self.target_field
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.metadata {
            if field.field.is_empty() {
                return Err(config_err("metadata entries require a non-empty field name"));
            }
            if !seen.insert(field.field.as_str()) {
                return Err(config_err(format!(
                    "metadata field {:?} is defined more than once",
                    field.field
                )));
            }
        }
        Ok(())
    }
}

/// A metadata field rendered from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedField {
    /// Key written into the metadata map.
    pub field: String,
    /// Template source, e.g. `{{ .Config.Image }}`.
    pub format: String,
}

impl FormattedField {
    /// Creates a formatted field definition.
    #[must_use]
    pub fn new(field: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            format: format.into(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_INSPECT_TIMEOUT_SECS
}

fn default_target_field() -> String {
    DEFAULT_TARGET_FIELD.to_string()
}

fn dedup_preserving_order(names: &mut Vec<String>) {
    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
}

fn config_err(message: impl Into<String>) -> DockmetaError {
    DockmetaError::Config {
        message: message.into(),
    }
}
