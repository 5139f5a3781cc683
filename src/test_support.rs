//! In-memory [`RuntimeGateway`] used by the test suites.
//!
//! It keeps containers in a map, assigns host ports from 49153 upward and
//! understands the `id`, `ancestor`, `label`, `status`, `since` and `before`
//! list filters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{Config, ListContainersOptions};
use bollard::errors::Error as DockerError;
use bollard::models::{
    ContainerConfig, ContainerCreateResponse, ContainerInspectResponse, ContainerState,
    ContainerStateStatusEnum, ContainerSummary, CreateImageInfo, Port, PortTypeEnum,
};
use chrono::{SecondsFormat, Utc};
use futures_util::stream::{self, StreamExt};
use uuid::Uuid;

use crate::container::TIME_NOT_SET;
use crate::docker::{PullStream, RuntimeGateway};
use crate::error::{Error, Result};

const FIRST_HOST_PORT: u16 = 49153;

#[derive(Debug, Clone)]
struct StoredContainer {
    id: String,
    seq: u64,
    image: String,
    labels: HashMap<String, String>,
    env: Vec<String>,
    ports: Vec<Port>,
    running: bool,
    started_at: Option<String>,
}

#[derive(Debug)]
struct Inner {
    local_images: HashSet<String>,
    registry: HashSet<String>,
    containers: BTreeMap<String, StoredContainer>,
    next_seq: u64,
    next_host_port: u16,
    pulls: Vec<String>,
    create_attempts: usize,
    create_warnings: Vec<String>,
    fail_start: bool,
    fail_inspect: HashSet<String>,
    fail_inspect_all: bool,
    fail_remove: bool,
    latency: Option<Duration>,
    inspect_latency: Option<Duration>,
    inspects: usize,
}

impl Default for Inner {
    fn default() -> Self {
        Inner {
            local_images: HashSet::new(),
            registry: HashSet::new(),
            containers: BTreeMap::new(),
            next_seq: 0,
            next_host_port: FIRST_HOST_PORT,
            pulls: Vec::new(),
            create_attempts: 0,
            create_warnings: Vec::new(),
            fail_start: false,
            fail_inspect: HashSet::new(),
            fail_inspect_all: false,
            fail_remove: false,
            latency: None,
            inspect_latency: None,
            inspects: 0,
        }
    }
}

impl Inner {
    fn assign_host_port(&mut self) -> u16 {
        let port = self.next_host_port;
        self.next_host_port = self.next_host_port.wrapping_add(1).max(FIRST_HOST_PORT);
        port
    }
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

fn server_error(status_code: u16, message: impl Into<String>) -> Error {
    Error::Docker(DockerError::DockerResponseServerError {
        status_code,
        message: message.into(),
    })
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_port_key(key: &str) -> Option<(u16, PortTypeEnum)> {
    let (port, proto) = key.split_once('/').unwrap_or((key, "tcp"));
    let typ = match proto {
        "udp" => PortTypeEnum::UDP,
        _ => PortTypeEnum::TCP,
    };
    port.parse().ok().map(|port| (port, typ))
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// An image that can be created from without pulling.
    pub fn with_local_image(self, image: &str) -> Self {
        self.lock().local_images.insert(image.to_string());
        self
    }

    /// An image that is missing locally but can be pulled.
    pub fn with_registry_image(self, image: &str) -> Self {
        self.lock().registry.insert(image.to_string());
        self
    }

    pub fn with_create_warnings(self, warnings: &[&str]) -> Self {
        self.lock().create_warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    /// Every gateway call sleeps this long first.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    pub fn fail_start(&self, fail: bool) {
        self.lock().fail_start = fail;
    }

    pub fn fail_inspect(&self, id: &str) {
        self.lock().fail_inspect.insert(id.to_string());
    }

    pub fn fail_inspect_all(&self, fail: bool) {
        self.lock().fail_inspect_all = fail;
    }

    pub fn fail_remove(&self, fail: bool) {
        self.lock().fail_remove = fail;
    }

    /// Extra delay applied to `inspect` only, on top of any latency.
    pub fn set_inspect_latency(&self, latency: Option<Duration>) {
        self.lock().inspect_latency = latency;
    }

    /// Number of `inspect` calls that ran to completion.
    pub fn inspects(&self) -> usize {
        self.lock().inspects
    }

    /// Marks a container as exited.
    pub fn stop(&self, id: &str) {
        if let Some(container) = self.lock().containers.get_mut(id) {
            container.running = false;
        }
    }

    pub fn pulls(&self) -> Vec<String> {
        self.lock().pulls.clone()
    }

    pub fn create_attempts(&self) -> usize {
        self.lock().create_attempts
    }

    pub fn container_ids(&self) -> Vec<String> {
        self.lock().containers.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().containers.contains_key(id)
    }

    async fn delay(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn summary(container: &StoredContainer) -> ContainerSummary {
        ContainerSummary {
            id: Some(container.id.clone()),
            image: Some(container.image.clone()),
            labels: Some(container.labels.clone()),
            ports: Some(container.ports.clone()),
            status: Some(if container.running {
                "Up Less than a second".to_string()
            } else {
                "Exited (0) Less than a second ago".to_string()
            }),
            ..Default::default()
        }
    }

    fn matches(
        container: &StoredContainer,
        seqs: &HashMap<String, u64>,
        filters: &HashMap<String, Vec<String>>,
    ) -> bool {
        filters.iter().all(|(name, values)| {
            values.iter().all(|value| match name.as_str() {
                "id" => container.id.starts_with(value.as_str()),
                "ancestor" => container.image == *value,
                "label" => match value.split_once('=') {
                    Some((key, expected)) => {
                        container.labels.get(key).map(String::as_str) == Some(expected)
                    }
                    None => container.labels.contains_key(value.as_str()),
                },
                "status" => match value.as_str() {
                    "running" => container.running,
                    "exited" => !container.running && container.started_at.is_some(),
                    "created" => !container.running && container.started_at.is_none(),
                    _ => false,
                },
                "since" => seqs.get(value).is_some_and(|seq| container.seq > *seq),
                "before" => seqs.get(value).is_some_and(|seq| container.seq < *seq),
                _ => true,
            })
        })
    }
}

#[async_trait]
impl RuntimeGateway for MemoryGateway {
    async fn create(&self, config: Config<String>) -> Result<ContainerCreateResponse> {
        self.delay().await;
        let mut inner = self.lock();
        inner.create_attempts += 1;

        let image = config.image.unwrap_or_default();
        if !inner.local_images.contains(&image) {
            return Err(Error::ImageNotFound(image));
        }

        let host_config = config.host_config.unwrap_or_default();
        let bindings = host_config.port_bindings.unwrap_or_default();
        let publish_all = host_config.publish_all_ports.unwrap_or(false);

        let mut keys: Vec<String> = config
            .exposed_ports
            .unwrap_or_default()
            .into_keys()
            .chain(bindings.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();

        let mut ports = Vec::new();
        for key in keys {
            let Some((private_port, typ)) = parse_port_key(&key) else {
                return Err(server_error(400, format!("invalid port spec: {}", key)));
            };
            match bindings.get(&key).cloned().flatten() {
                Some(requested) => {
                    for binding in requested {
                        let public_port = match binding.host_port.as_deref() {
                            Some(port) if !port.is_empty() => port.parse().map_err(|_| {
                                server_error(400, format!("invalid host port: {}", port))
                            })?,
                            _ => inner.assign_host_port(),
                        };
                        ports.push(Port {
                            ip: binding.host_ip.clone(),
                            private_port,
                            public_port: Some(public_port),
                            typ: Some(typ),
                        });
                    }
                }
                None if publish_all => {
                    let public_port = inner.assign_host_port();
                    ports.push(Port {
                        ip: Some("0.0.0.0".to_string()),
                        private_port,
                        public_port: Some(public_port),
                        typ: Some(typ),
                    });
                }
                None => ports.push(Port {
                    ip: None,
                    private_port,
                    public_port: None,
                    typ: Some(typ),
                }),
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.containers.insert(
            id.clone(),
            StoredContainer {
                id: id.clone(),
                seq,
                image,
                labels: config.labels.unwrap_or_default(),
                env: config.env.unwrap_or_default(),
                ports,
                running: false,
                started_at: None,
            },
        );

        Ok(ContainerCreateResponse {
            id,
            warnings: inner.create_warnings.clone(),
        })
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.delay().await;
        let mut inner = self.lock();
        if inner.fail_start {
            return Err(server_error(500, "cannot start container"));
        }
        let container = inner
            .containers
            .get_mut(id)
            .ok_or_else(|| server_error(404, format!("No such container: {}", id)))?;
        container.running = true;
        container.started_at = Some(now_rfc3339());
        Ok(())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspectResponse> {
        self.delay().await;
        let inspect_latency = self.lock().inspect_latency;
        if let Some(latency) = inspect_latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.lock();
        inner.inspects += 1;
        if inner.fail_inspect_all || inner.fail_inspect.contains(id) {
            return Err(server_error(500, format!("inspect failed for {}", id)));
        }
        let container = inner
            .containers
            .get(id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

        let status = match (container.running, &container.started_at) {
            (true, _) => ContainerStateStatusEnum::RUNNING,
            (false, Some(_)) => ContainerStateStatusEnum::EXITED,
            (false, None) => ContainerStateStatusEnum::CREATED,
        };
        let finished_at = if !container.running && container.started_at.is_some() {
            now_rfc3339()
        } else {
            TIME_NOT_SET.to_string()
        };

        Ok(ContainerInspectResponse {
            id: Some(container.id.clone()),
            config: Some(ContainerConfig {
                image: Some(container.image.clone()),
                labels: Some(container.labels.clone()),
                env: Some(container.env.clone()),
                ..Default::default()
            }),
            state: Some(ContainerState {
                status: Some(status),
                running: Some(container.running),
                started_at: Some(
                    container
                        .started_at
                        .clone()
                        .unwrap_or_else(|| TIME_NOT_SET.to_string()),
                ),
                finished_at: Some(finished_at),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    async fn list(&self, options: ListContainersOptions<String>) -> Result<Vec<ContainerSummary>> {
        self.delay().await;
        let inner = self.lock();
        let seqs: HashMap<String, u64> = inner
            .containers
            .values()
            .map(|container| (container.id.clone(), container.seq))
            .collect();

        let mut matching: Vec<&StoredContainer> = inner
            .containers
            .values()
            .filter(|container| options.all || container.running)
            .filter(|container| Self::matches(container, &seqs, &options.filters))
            .collect();
        matching.sort_by_key(|container| std::cmp::Reverse(container.seq));

        Ok(matching.into_iter().map(Self::summary).collect())
    }

    async fn remove(&self, id: &str, force: bool) -> Result<()> {
        self.delay().await;
        let mut inner = self.lock();
        if inner.fail_remove {
            return Err(server_error(500, format!("cannot remove container {}", id)));
        }
        match inner.containers.get(id) {
            None => Err(Error::ContainerNotFound(id.to_string())),
            Some(container) if container.running && !force => Err(server_error(
                409,
                format!("cannot remove running container {}", id),
            )),
            Some(_) => {
                inner.containers.remove(id);
                Ok(())
            }
        }
    }

    fn pull(&self, image: &str) -> PullStream {
        let mut inner = self.lock();
        inner.pulls.push(image.to_string());

        if inner.registry.contains(image) {
            inner.local_images.insert(image.to_string());
            let progress = ["Pulling fs layer", "Download complete", "Pull complete"]
                .into_iter()
                .map(|status| {
                    Ok(CreateImageInfo {
                        status: Some(status.to_string()),
                        ..Default::default()
                    })
                })
                .collect::<Vec<Result<CreateImageInfo>>>();
            stream::iter(progress).boxed()
        } else {
            let err = server_error(
                404,
                format!("pull access denied for {}, repository does not exist", image),
            );
            stream::iter(vec![Err(err)]).boxed()
        }
    }
}
