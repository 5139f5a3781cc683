use std::collections::HashMap;

use bollard::models::{HostConfig, PortBinding};

use super::types::{ALL_INTERFACES, Port, Ports, Protocol, PublicPort, ResolvedPorts};
use crate::error::{Error, Result};

impl Port {
    pub fn tcp(private: u16) -> Self {
        Port {
            private,
            protocol: Protocol::Tcp,
            ..Default::default()
        }
    }

    pub fn udp(private: u16) -> Self {
        Port {
            private,
            protocol: Protocol::Udp,
            ..Default::default()
        }
    }

    pub fn with_public(mut self, public: PublicPort) -> Self {
        self.public = Some(public);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// The runtime's key for this port, e.g. `80/tcp`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.private, self.protocol)
    }

    /// Host binding for this port. `Random` leaves the host port empty so the
    /// runtime assigns one.
    pub fn binding(&self) -> PortBinding {
        let host_port = match self.public {
            Some(PublicPort::Fixed(port)) => port.to_string(),
            Some(PublicPort::Random) | None => String::new(),
        };
        PortBinding {
            host_ip: Some(
                self.address
                    .clone()
                    .unwrap_or_else(|| ALL_INTERFACES.to_string()),
            ),
            host_port: Some(host_port),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.private == 0 {
            return Err(Error::InvalidPortSpec {
                key: self.key(),
                reason: "internal port must be between 1 and 65535".to_string(),
            });
        }
        if self.public == Some(PublicPort::Fixed(0)) {
            return Err(Error::InvalidPortSpec {
                key: self.key(),
                reason: "external port must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Ports {
    fn default() -> Self {
        Self::new()
    }
}

impl Ports {
    pub fn new() -> Self {
        Ports {
            specs: Vec::new(),
            publish_all: true,
        }
    }

    pub fn add(&mut self, port: Port) {
        self.specs.push(port);
    }

    /// Exposes internal tcp port `internal` on host port `external`.
    pub fn publish(&mut self, internal: u16, external: u16) {
        self.add(Port::tcp(internal).with_public(PublicPort::Fixed(external)));
    }

    pub fn publish_all(&mut self, enabled: bool) {
        self.publish_all = enabled;
    }

    pub fn bindings(&self) -> Result<HashMap<String, Option<Vec<PortBinding>>>> {
        let mut bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut requested: HashMap<String, (Option<PublicPort>, &str)> = HashMap::new();

        for port in &self.specs {
            port.validate()?;
            let key = port.key();

            // Without publish-all an unbound port would be unreachable.
            let public = match port.public {
                None if self.publish_all => None,
                None => Some(PublicPort::Random),
                explicit => explicit,
            };

            let address = port.address.as_deref().unwrap_or(ALL_INTERFACES);
            let normalized = (public, address);

            if let Some(previous) = requested.get(&key) {
                if *previous == normalized {
                    continue;
                }
                return Err(Error::InvalidPortSpec {
                    key,
                    reason: format!(
                        "conflicting bindings {:?} on {} and {:?} on {}",
                        previous.0, previous.1, public, address
                    ),
                });
            }
            requested.insert(key.clone(), normalized);

            if public.is_some() {
                let binding = Port {
                    public,
                    ..port.clone()
                }
                .binding();
                bindings.insert(key, Some(vec![binding]));
            }
        }

        Ok(bindings)
    }

    pub fn resolve(&self) -> Result<ResolvedPorts> {
        let bindings = self.bindings()?;
        let exposed_ports = self
            .specs
            .iter()
            .map(|port| (port.key(), HashMap::new()))
            .collect();

        let host_config = HostConfig {
            publish_all_ports: Some(self.publish_all),
            port_bindings: if bindings.is_empty() {
                None
            } else {
                Some(bindings)
            },
            ..Default::default()
        };

        Ok(ResolvedPorts {
            host_config,
            exposed_ports,
        })
    }
}
