//! Container runtime client abstraction.

pub mod docker;

use std::sync::Arc;

use dockmeta_common::config::ConnectionConfig;
use dockmeta_common::error::Result;
use dockmeta_common::types::{ContainerId, ContainerRecord};

/// Inspects containers on a container runtime.
///
/// Implementors perform the out-of-process call; callers cache the result.
pub trait RuntimeClient: Send + Sync {
    /// Returns the runtime's record for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime is unreachable, does not know the
    /// container, or does not answer in time.
    fn inspect(&self, id: &ContainerId) -> Result<ContainerRecord>;
}

/// Connects to the runtime described by `connection`.
///
/// # Errors
///
/// Returns an error if the endpoint or TLS material cannot be used.
pub fn connect(connection: &ConnectionConfig) -> Result<Arc<dyn RuntimeClient>> {
    Ok(Arc::new(docker::DockerClient::connect(connection)?))
}
