use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bollard::container::{Config, ListContainersOptions};
use bollard::models::{ContainerCreateResponse, ContainerSummary};
use futures_util::stream::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::types::DockerClient;
use crate::config::ClientConfig;
use crate::container::{ClientInput, ContainerInfo};
use crate::deadline::{deadline_after, within};
use crate::docker::{BollardGateway, RuntimeGateway};
use crate::error::{Error, Result};

impl fmt::Debug for DockerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DockerClient {
    /// Connects to the local Docker daemon with configuration taken from the
    /// environment.
    pub fn new() -> Result<Self> {
        let gateway = BollardGateway::connect()?;
        Ok(Self::with_gateway(Arc::new(gateway), ClientConfig::from_env()))
    }

    pub fn with_gateway(gateway: Arc<dyn RuntimeGateway>, config: ClientConfig) -> Self {
        DockerClient { gateway, config }
    }

    pub fn deadline(&self, timeout: Option<Duration>) -> Instant {
        deadline_after(self.config.timeout_or_default(timeout))
    }

    /// Creates and starts a container, bounded by the input's timeout.
    pub async fn run_container(&self, input: &ClientInput) -> Result<ContainerInfo> {
        self.create_and_start(input, self.deadline(input.timeout))
            .await
    }

    /// Creates a container from `input`, pulling the image whenever the
    /// runtime reports it missing, then starts it and returns its snapshot.
    ///
    /// If anything fails after the container exists, it is removed before the
    /// error is returned.
    pub async fn create_and_start(
        &self,
        input: &ClientInput,
        deadline: Instant,
    ) -> Result<ContainerInfo> {
        if input.image.is_empty() {
            return Err(Error::EmptyImage);
        }

        let ports = input.ports.resolve()?;
        let mut config = input.container_config();
        if !ports.exposed_ports.is_empty() {
            config.exposed_ports = Some(ports.exposed_ports);
        }
        config.host_config = Some(ports.host_config);

        let created = self
            .create_with_pull(&input.image, config, deadline)
            .await?;
        info!(container_id = %created.id, image = %input.image, "container created");
        for warning in &created.warnings {
            warn!(
                container_id = %created.id,
                warning = %warning,
                "runtime warning on create"
            );
        }

        match self.start_and_inspect(&created.id, deadline).await {
            Ok(mut info) => {
                info.warnings = created.warnings;
                info!(container_id = %created.id, "container started");
                Ok(info)
            }
            Err(err) => {
                warn!(
                    container_id = %created.id,
                    error = %err,
                    "container failed to start, removing it"
                );
                self.cleanup_after_failure(&created.id).await;
                Err(err)
            }
        }
    }

    async fn create_with_pull(
        &self,
        image: &str,
        config: Config<String>,
        deadline: Instant,
    ) -> Result<ContainerCreateResponse> {
        loop {
            match within(deadline, self.gateway.create(config.clone())).await {
                Err(Error::ImageNotFound(_)) => {
                    info!(image = %image, "image not present, pulling");
                    within(deadline, self.pull_image(image)).await?;
                }
                result => return result,
            }
        }
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        let mut stream = self.gateway.pull(image);
        while let Some(progress) = stream.next().await {
            if let Some(status) = progress?.status {
                debug!(image = %image, status = %status, "pull progress");
            }
        }
        info!(image = %image, "image pulled");
        Ok(())
    }

    async fn start_and_inspect(&self, id: &str, deadline: Instant) -> Result<ContainerInfo> {
        within(deadline, self.gateway.start(id)).await?;
        self.container_info_within(id, deadline).await
    }

    async fn cleanup_after_failure(&self, id: &str) {
        // The caller's deadline may already be spent.
        if let Err(err) = self.remove(id, self.deadline(None)).await {
            warn!(
                container_id = %id,
                error = %err,
                "failed to remove container after failed start"
            );
        }
    }

    /// Force-removes a container. A container that is already gone counts as
    /// removed.
    pub async fn remove(&self, id: &str, deadline: Instant) -> Result<()> {
        match within(deadline, self.gateway.remove(id, true)).await {
            Ok(()) => {
                info!(container_id = %id, "container removed");
                Ok(())
            }
            Err(Error::ContainerNotFound(_)) => {
                debug!(container_id = %id, "container already removed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn remove_container(&self, id: &str) -> Result<()> {
        self.remove(id, self.deadline(None)).await
    }

    /// Looks a container up by id in any state, running or not.
    pub async fn container_info(&self, id: &str) -> Result<ContainerInfo> {
        self.container_info_within(id, self.deadline(None)).await
    }

    pub(crate) async fn container_info_within(
        &self,
        id: &str,
        deadline: Instant,
    ) -> Result<ContainerInfo> {
        if id.is_empty() {
            return Err(Error::ContainerNotFound(String::new()));
        }

        let options = ListContainersOptions {
            all: true,
            filters: HashMap::from([("id".to_string(), vec![id.to_string()])]),
            ..Default::default()
        };
        let mut candidates: Vec<ContainerSummary> = within(deadline, self.gateway.list(options))
            .await?
            .into_iter()
            .filter(|summary| {
                summary
                    .id
                    .as_deref()
                    .is_some_and(|candidate| candidate.starts_with(id))
            })
            .collect();

        // An exact id wins over any container whose id merely starts with it.
        let exact = candidates
            .iter()
            .position(|summary| summary.id.as_deref() == Some(id));
        let summary = match (exact, candidates.len()) {
            (Some(index), _) => candidates.swap_remove(index),
            (None, 0) => return Err(Error::ContainerNotFound(id.to_string())),
            (None, 1) => candidates.swap_remove(0),
            (None, matches) => {
                return Err(Error::AmbiguousContainerId {
                    id: id.to_string(),
                    matches,
                });
            }
        };

        let full_id = summary.id.clone().unwrap_or_default();
        let inspect = within(deadline, self.gateway.inspect(&full_id)).await?;
        Ok(ContainerInfo::new(summary, inspect, Vec::new()))
    }
}
