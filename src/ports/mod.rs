pub mod ports;
pub mod types;

pub use types::{ALL_INTERFACES, Port, Ports, Protocol, PublicPort, ResolvedPorts};
