pub mod service;
pub mod state;
pub mod types;

pub use state::{ServiceState, valid_state_transition};
pub use types::{Ping, PingInput, Service};
