//! Docker Engine API client built on `bollard`.

use std::time::Duration;

use bollard::container::InspectContainerOptions;
use bollard::{API_DEFAULT_VERSION, Docker};
use dockmeta_common::config::ConnectionConfig;
use dockmeta_common::error::{DockmetaError, Result};
use dockmeta_common::types::{ContainerId, ContainerRecord};

use super::RuntimeClient;

/// How an endpoint is reached when no TLS material is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Unix,
    Http,
}

fn transport(endpoint: &str) -> Transport {
    if endpoint.starts_with("unix://") || endpoint.starts_with('/') {
        Transport::Unix
    } else {
        Transport::Http
    }
}

/// Blocking inspection client for a Docker-compatible daemon.
///
/// Owns a single-threaded `tokio` runtime so it can be called from the
/// synchronous enrichment path. Must not be called from inside another
/// async runtime.
pub struct DockerClient {
    docker: Docker,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
}

impl DockerClient {
    /// Connects to the daemon at the configured endpoint.
    ///
    /// Uses TLS when certificate, key and CA are all configured, a Unix
    /// socket for `unix://` endpoints, and plain HTTP otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the async runtime cannot be built or the client
    /// rejects the endpoint or TLS files.
    pub fn connect(connection: &ConnectionConfig) -> Result<Self> {
        let endpoint = connection.endpoint();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DockmetaError::Config {
                message: format!("cannot start runtime for docker client: {e}"),
            })?;
        let _guard = runtime.enter();

        let timeout = connection.timeout_secs;
        let docker = match connection.tls() {
            Some(tls) => Docker::connect_with_ssl(
                endpoint,
                tls.key,
                tls.cert,
                tls.ca,
                timeout,
                API_DEFAULT_VERSION,
            ),
            None => match transport(endpoint) {
                Transport::Unix => Docker::connect_with_unix(endpoint, timeout, API_DEFAULT_VERSION),
                Transport::Http => Docker::connect_with_http(endpoint, timeout, API_DEFAULT_VERSION),
            },
        }
        .map_err(|e| DockmetaError::Config {
            message: format!("cannot connect to docker at {endpoint}: {e}"),
        })?;

        tracing::info!(
            endpoint,
            tls = connection.tls().is_some(),
            timeout_secs = timeout,
            "docker client configured"
        );

        Ok(Self {
            docker,
            runtime,
            timeout: connection.timeout(),
        })
    }
}

impl RuntimeClient for DockerClient {
    fn inspect(&self, id: &ContainerId) -> Result<ContainerRecord> {
        tracing::debug!(id = %id, "inspecting container");
        let inspection = self.runtime.block_on(async {
            tokio::time::timeout(
                self.timeout,
                self.docker
                    .inspect_container(id.as_str(), None::<InspectContainerOptions>),
            )
            .await
        });

        let response = match inspection {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(inspect_error(id, self.timeout, e)),
            Err(_) => {
                return Err(DockmetaError::InspectTimeout {
                    id: id.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let attributes = serde_json::to_value(&response)?;
        Ok(ContainerRecord::from_attributes(attributes))
    }
}

/// Maps a bollard failure; bollard's own request timer reports as a timeout.
fn inspect_error(id: &ContainerId, timeout: Duration, error: bollard::errors::Error) -> DockmetaError {
    match error {
        bollard::errors::Error::RequestTimeoutError => DockmetaError::InspectTimeout {
            id: id.to_string(),
            timeout,
        },
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => DockmetaError::NotFound {
            kind: "container",
            id: id.to_string(),
        },
        other => DockmetaError::Inspect {
            id: id.to_string(),
            message: other.to_string(),
        },
    }
}
