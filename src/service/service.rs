use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_util::future::FutureExt;
use tracing::{info, warn};
use uuid::Uuid;

use super::state::{ServiceState, valid_state_transition};
use super::types::{PingInput, Service};
use crate::client::DockerClient;
use crate::container::{ClientInput, ContainerInfo};
use crate::deadline::{deadline_after, within};
use crate::error::{AggregateError, BoxError, Error, Result};

impl DockerClient {
    pub fn service(&self, input: ClientInput) -> Service {
        Service::new(self.clone(), Some(input))
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("timeout", &self.timeout)
            .field("ping", &self.ping.is_some())
            .field("state", &self.state)
            .field("container", &self.container.as_ref().map(ContainerInfo::id))
            .finish()
    }
}

impl Service {
    pub fn new(client: DockerClient, input: Option<ClientInput>) -> Self {
        Service {
            name: format!("service-{}", Uuid::new_v4().simple()),
            input,
            timeout: None,
            ping: None,
            client,
            container: None,
            state: ServiceState::Idle,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ping<F, Fut>(mut self, ping: F) -> Self
    where
        F: Fn(PingInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
    {
        self.ping = Some(Box::new(move |input| ping(input).boxed()));
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// The container once `run` has created it. Kept after `terminate` so the
    /// caller can still see what was removed.
    pub fn container(&self) -> Option<&ContainerInfo> {
        self.container.as_ref()
    }

    fn timeout(&self) -> Duration {
        self.client.config.timeout_or_default(self.timeout)
    }

    fn transition(&mut self, to: ServiceState) -> Result<()> {
        if !valid_state_transition(&self.state, &to) {
            return Err(Error::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        info!(service = %self.name, from = ?self.state, to = ?to, "service state change");
        self.state = to;
        Ok(())
    }

    /// Creates and starts the container, then pings it if a ping is set.
    ///
    /// A failed ping removes the container before returning; the returned
    /// error carries the ping failure and, if removal failed too, that error
    /// as well.
    pub async fn run(&mut self) -> Result<()> {
        let Some(input) = &self.input else {
            return Err(Error::InputNotProvided);
        };
        if !valid_state_transition(&self.state, &ServiceState::Created) {
            return Err(Error::InvalidStateTransition {
                from: self.state,
                to: ServiceState::Created,
            });
        }

        let deadline = deadline_after(self.timeout());
        let container = self.client.create_and_start(input, deadline).await?;
        self.container = Some(container.clone());
        self.transition(ServiceState::Created)?;

        let Some(ping) = &self.ping else {
            return Ok(());
        };
        let ping_input = PingInput {
            name: self.name.clone(),
            container,
            deadline,
        };
        let outcome = within(deadline, async {
            ping(ping_input).await.map_err(Error::Probe)
        })
        .await;

        match outcome {
            Ok(()) => self.transition(ServiceState::Ready),
            Err(err) => {
                warn!(service = %self.name, error = %err, "ping failed, terminating service");
                self.transition(ServiceState::Failed)?;

                let mut errors = AggregateError::new();
                errors.push(err);
                if let Err(term_err) = self.terminate().await {
                    errors.push(term_err);
                }
                match errors.into_error() {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    }

    /// Removes the container. Calling it again once it succeeded does nothing.
    pub async fn terminate(&mut self) -> Result<()> {
        match self.state {
            ServiceState::Idle => return Err(Error::ContainerNotStarted),
            ServiceState::Terminated => return Ok(()),
            _ => {}
        }
        let id = match &self.container {
            Some(container) => container.id().to_string(),
            None => return Err(Error::ContainerNotStarted),
        };

        let deadline = deadline_after(self.timeout());
        self.client.remove(&id, deadline).await?;
        self.transition(ServiceState::Terminated)
    }

    /// Swaps the held snapshot for a fresh one.
    pub async fn refresh(&mut self) -> Result<()> {
        match self.container.as_mut() {
            Some(container) => container.refresh(&self.client).await,
            None => Err(Error::ContainerNotStarted),
        }
    }
}
