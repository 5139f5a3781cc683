use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use super::state::ServiceState;
use crate::client::DockerClient;
use crate::container::{ClientInput, ContainerInfo};
use crate::error::BoxError;

/// What a ping gets to look at.
#[derive(Debug, Clone)]
pub struct PingInput {
    pub name: String,
    pub container: ContainerInfo,
    /// The ping is abandoned once this passes.
    pub deadline: Instant,
}

/// Readiness check run by `Service::run` once the container has started. An
/// error removes the container again.
pub type Ping =
    Box<dyn Fn(PingInput) -> BoxFuture<'static, std::result::Result<(), BoxError>> + Send + Sync>;

/// Runs and manages a single container for one service a test depends on.
pub struct Service {
    /// Used in log output only.
    pub name: String,
    pub input: Option<ClientInput>,
    /// Bounds `run` and `terminate`; the client's default applies when unset.
    pub timeout: Option<Duration>,
    pub ping: Option<Ping>,
    pub client: DockerClient,
    pub(crate) container: Option<ContainerInfo>,
    pub(crate) state: ServiceState,
}
