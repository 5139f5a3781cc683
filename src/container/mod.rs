pub mod info;
pub mod input;
pub mod types;

pub use info::TIME_NOT_SET;
pub use types::{ClientInput, ContainerInfo, PortMapping};
