use async_trait::async_trait;
use bollard::{
    Docker,
    container::{
        Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
        RemoveContainerOptions, StartContainerOptions,
    },
    errors::Error as DockerError,
    image::CreateImageOptions,
    models::{ContainerCreateResponse, ContainerInspectResponse, ContainerSummary},
};
use futures_util::stream::{StreamExt, TryStreamExt};
use tracing::debug;

use super::types::{BollardGateway, PullStream, RuntimeGateway};
use crate::error::{Error, Result};

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Splits `repo[:tag]` or `repo@digest` into the pieces the pull endpoint
/// expects. An untagged reference pulls `latest` rather than every tag.
pub fn split_image_reference(image: &str) -> (String, String) {
    if image.contains('@') {
        return (image.to_string(), String::new());
    }
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(offset) => {
            let split = name_start + offset;
            (image[..split].to_string(), image[split + 1..].to_string())
        }
        None => (image.to_string(), "latest".to_string()),
    }
}

impl BollardGateway {
    pub fn new(client: Docker) -> Self {
        BollardGateway { client }
    }

    /// Connects using the local defaults (`DOCKER_HOST` or the platform socket).
    pub fn connect() -> Result<Self> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(BollardGateway { client })
    }
}

#[async_trait]
impl RuntimeGateway for BollardGateway {
    async fn create(&self, config: Config<String>) -> Result<ContainerCreateResponse> {
        let image = config.image.clone().unwrap_or_default();
        debug!(image = %image, "creating container");

        self.client
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|err| {
                if is_not_found(&err) {
                    Error::ImageNotFound(image)
                } else {
                    Error::Docker(err)
                }
            })
    }

    async fn start(&self, id: &str) -> Result<()> {
        debug!(container_id = %id, "starting container");
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.client
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|err| {
                if is_not_found(&err) {
                    Error::ContainerNotFound(id.to_string())
                } else {
                    Error::Docker(err)
                }
            })
    }

    async fn list(&self, options: ListContainersOptions<String>) -> Result<Vec<ContainerSummary>> {
        Ok(self.client.list_containers(Some(options)).await?)
    }

    async fn remove(&self, id: &str, force: bool) -> Result<()> {
        debug!(container_id = %id, force, "removing container");
        self.client
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|err| {
                if is_not_found(&err) {
                    Error::ContainerNotFound(id.to_string())
                } else {
                    Error::Docker(err)
                }
            })
    }

    fn pull(&self, image: &str) -> PullStream {
        let (from_image, tag) = split_image_reference(image);
        debug!(image = %from_image, tag = %tag, "pulling image");

        self.client
            .create_image(
                Some(CreateImageOptions {
                    from_image,
                    tag,
                    ..Default::default()
                }),
                None,
                None,
            )
            .map_err(Error::from)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_image_reference() {
        assert_eq!(
            split_image_reference("nginx:mainline-alpine"),
            ("nginx".to_string(), "mainline-alpine".to_string())
        );
        assert_eq!(
            split_image_reference("nginx"),
            ("nginx".to_string(), "latest".to_string())
        );
        assert_eq!(
            split_image_reference("localhost:5000/team/app"),
            ("localhost:5000/team/app".to_string(), "latest".to_string())
        );
        assert_eq!(
            split_image_reference("localhost:5000/team/app:v2"),
            ("localhost:5000/team/app".to_string(), "v2".to_string())
        );
        assert_eq!(
            split_image_reference("alpine@sha256:abcd"),
            ("alpine@sha256:abcd".to_string(), String::new())
        );
    }

    #[test]
    fn test_is_not_found() {
        let err = DockerError::DockerResponseServerError {
            status_code: 404,
            message: "No such image: missing:latest".to_string(),
        };
        assert!(is_not_found(&err));

        let err = DockerError::DockerResponseServerError {
            status_code: 500,
            message: "boom".to_string(),
        };
        assert!(!is_not_found(&err));
    }
}
