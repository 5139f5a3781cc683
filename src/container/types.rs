use std::collections::HashMap;
use std::time::Duration;

use bollard::models::{ContainerInspectResponse, ContainerSummary};
use serde::{Deserialize, Serialize};

use crate::ports::{Ports, Protocol};

/// Describes the container to create, and doubles as the filter used when
/// listing containers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInput {
    pub image: String,
    pub labels: HashMap<String, String>,
    pub environment: Vec<String>,
    pub ports: Ports,
    pub id: Option<String>,
    pub status: Option<String>,
    pub since: Option<String>,
    pub before: Option<String>,
    pub timeout: Option<Duration>,
}

/// A port as the runtime actually mapped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub private: u16,
    pub public: Option<u16>,
    pub protocol: Protocol,
    pub address: String,
}

/// Point in time view of a container. Only `refresh` replaces it.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub(crate) summary: ContainerSummary,
    pub(crate) inspect: ContainerInspectResponse,
    pub(crate) warnings: Vec<String>,
}
