use std::collections::HashMap;
use std::fmt;

use bollard::models::HostConfig;
use serde::{Deserialize, Serialize};

pub const ALL_INTERFACES: &str = "0.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicPort {
    Fixed(u16),
    /// Let the runtime pick a free host port.
    Random,
}

/// A single port exposure requested for a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Port {
    pub private: u16,
    pub protocol: Protocol,
    /// `None` leaves the port to publish-all.
    pub public: Option<PublicPort>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ports {
    pub specs: Vec<Port>,
    pub publish_all: bool,
}

/// Port configuration in the shape the runtime expects.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPorts {
    pub host_config: HostConfig,
    pub exposed_ports: HashMap<String, HashMap<(), ()>>,
}
