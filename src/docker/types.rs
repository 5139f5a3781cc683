use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{Config, ListContainersOptions};
use bollard::models::{
    ContainerCreateResponse, ContainerInspectResponse, ContainerSummary, CreateImageInfo,
};
use futures_util::stream::BoxStream;

use crate::error::Result;

pub type PullStream = BoxStream<'static, Result<CreateImageInfo>>;

/// The operations the orchestrator needs from a container runtime.
///
/// Implementations report a missing image on `create` as
/// `Error::ImageNotFound` and a missing container on `inspect`/`remove` as
/// `Error::ContainerNotFound`; the orchestrator relies on both.
#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    async fn create(&self, config: Config<String>) -> Result<ContainerCreateResponse>;

    async fn start(&self, id: &str) -> Result<()>;

    async fn inspect(&self, id: &str) -> Result<ContainerInspectResponse>;

    async fn list(&self, options: ListContainersOptions<String>) -> Result<Vec<ContainerSummary>>;

    async fn remove(&self, id: &str, force: bool) -> Result<()>;

    fn pull(&self, image: &str) -> PullStream;
}

#[derive(Debug, Clone)]
pub struct BollardGateway {
    pub client: Docker,
}
