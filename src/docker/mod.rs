pub mod docker;
pub mod types;

pub use docker::split_image_reference;
pub use types::{BollardGateway, PullStream, RuntimeGateway};
