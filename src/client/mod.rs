pub mod client;
pub mod list;
pub mod types;

pub use types::{DockerClient, Listing};
