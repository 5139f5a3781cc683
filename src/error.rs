use std::fmt;

use crate::service::ServiceState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container id prefix matches {matches} containers: {id}")]
    AmbiguousContainerId { id: String, matches: usize },

    #[error("no such image: {0}")]
    ImageNotFound(String),

    /// Returned by `ContainerInfo::port` when the internal port is not mapped.
    #[error("the requested port could not be found: {0}")]
    PortNotFound(u16),

    #[error("container not running")]
    ContainerNotRunning,

    #[error("container still running")]
    ContainerStillRunning,

    #[error("input field not provided")]
    InputNotProvided,

    #[error("image must not be empty")]
    EmptyImage,

    #[error("container not started")]
    ContainerNotStarted,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("invalid port spec '{key}': {reason}")]
    InvalidPortSpec { key: String, reason: String },

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: ServiceState, to: ServiceState },

    #[error("readiness probe failed: {0}")]
    Probe(#[source] BoxError),

    #[error("lookup worker exited without reporting")]
    WorkerLost,

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Several failures collected from operations that do not stop at the first
/// error.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    /// `None` when nothing failed, the error itself when exactly one thing
    /// failed, `Error::Aggregate` otherwise.
    pub fn into_error(mut self) -> Option<Error> {
        match self.errors.len() {
            0 => None,
            1 => self.errors.pop(),
            _ => Some(Error::Aggregate(self)),
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl FromIterator<Error> for AggregateError {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}
