use bollard::container::ListContainersOptions;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::types::{DockerClient, Listing};
use crate::container::{ClientInput, ContainerInfo};
use crate::deadline::within;
use crate::error::{Error, Result};

impl Listing {
    /// Number of lookups that produced an outcome.
    pub fn len(&self) -> usize {
        self.containers.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The containers, or `Error::Aggregate` if any lookup failed.
    pub fn into_result(self) -> Result<Vec<ContainerInfo>> {
        if self.errors.is_empty() {
            Ok(self.containers)
        } else {
            Err(Error::Aggregate(self.errors))
        }
    }
}

impl DockerClient {
    /// Lists the containers matching `input.filter_args()` and fetches full
    /// details for each of them concurrently.
    ///
    /// Failed lookups do not stop the others; they are collected in
    /// `Listing::errors`. Only running containers are considered unless
    /// `input.status` is set. Dropping the returned future cancels the
    /// lookups that are still running.
    pub async fn list_containers(&self, input: &ClientInput) -> Result<Listing> {
        let deadline = self.deadline(input.timeout);
        let options = ListContainersOptions {
            all: input.status.is_some(),
            filters: input.filter_args(),
            ..Default::default()
        };

        let ids: Vec<String> = within(deadline, self.gateway.list(options))
            .await?
            .into_iter()
            .filter_map(|summary| summary.id)
            .collect();
        let expected = ids.len();
        debug!(count = expected, image = %input.image, "fetching container details");

        let (ok_tx, mut ok_rx) = mpsc::channel::<ContainerInfo>(expected.max(1));
        let (err_tx, mut err_rx) = mpsc::channel::<Error>(expected.max(1));

        // Dropping the set aborts any lookup still in flight.
        let mut workers = JoinSet::new();
        for id in ids {
            let client = self.clone();
            let ok_tx = ok_tx.clone();
            let err_tx = err_tx.clone();
            workers.spawn(async move {
                match client.container_info_within(&id, deadline).await {
                    Ok(info) => {
                        let _ = ok_tx.send(info).await;
                    }
                    Err(err) => {
                        debug!(container_id = %id, error = %err, "container lookup failed");
                        let _ = err_tx.send(err).await;
                    }
                }
            });
        }
        drop(ok_tx);
        drop(err_tx);

        let mut listing = Listing::default();
        let mut received = 0;
        while received < expected {
            tokio::select! {
                Some(info) = ok_rx.recv() => listing.containers.push(info),
                Some(err) = err_rx.recv() => listing.errors.push(err),
                else => break,
            }
            received += 1;
        }

        if received < expected {
            warn!(
                missing = expected - received,
                "lookup workers exited without reporting"
            );
            for _ in received..expected {
                listing.errors.push(Error::WorkerLost);
            }
        }

        Ok(listing)
    }
}
