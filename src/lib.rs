//! Disposable Docker containers for integration tests.
//!
//! A [`Service`] creates a container from a [`ClientInput`], optionally pings
//! it until it is usable, and removes it again on `terminate` or when the
//! ping fails. [`DockerClient`] exposes the underlying lifecycle operations.

pub mod client;
pub mod config;
pub mod container;
pub mod deadline;
pub mod docker;
pub mod error;
pub mod ports;
pub mod service;

// Shared by the unit and integration tests.
pub mod test_support;

pub use client::{DockerClient, Listing};
pub use config::{ClientConfig, DEFAULT_SERVICE_TIMEOUT};
pub use container::{ClientInput, ContainerInfo, PortMapping};
pub use docker::{BollardGateway, RuntimeGateway};
pub use error::{AggregateError, BoxError, Error, Result};
pub use ports::{Port, Ports, Protocol, PublicPort};
pub use service::{Ping, PingInput, Service, ServiceState};
