use std::sync::Arc;

use crate::config::ClientConfig;
use crate::container::ContainerInfo;
use crate::docker::RuntimeGateway;
use crate::error::AggregateError;

/// Creates, inspects, lists and removes containers through a
/// [`RuntimeGateway`]. Cheap to clone; clones share the gateway.
#[derive(Clone)]
pub struct DockerClient {
    pub gateway: Arc<dyn RuntimeGateway>,
    pub config: ClientConfig,
}

/// Outcome of a concurrent listing: every container that could be looked up,
/// plus every lookup that failed.
#[derive(Debug, Default)]
pub struct Listing {
    pub containers: Vec<ContainerInfo>,
    pub errors: AggregateError,
}
