use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bollard::models::{ContainerInspectResponse, ContainerState, ContainerSummary, PortTypeEnum};
use chrono::{DateTime, Utc};

use super::types::{ContainerInfo, PortMapping};
use crate::client::DockerClient;
use crate::error::{Error, Result};
use crate::ports::{ALL_INTERFACES, Protocol};

/// What the runtime reports for a timestamp that was never set.
pub const TIME_NOT_SET: &str = "0001-01-01T00:00:00Z";

impl ContainerInfo {
    pub fn new(
        summary: ContainerSummary,
        inspect: ContainerInspectResponse,
        warnings: Vec<String>,
    ) -> Self {
        ContainerInfo {
            summary,
            inspect,
            warnings,
        }
    }

    pub fn summary(&self) -> &ContainerSummary {
        &self.summary
    }

    pub fn inspect(&self) -> &ContainerInspectResponse {
        &self.inspect
    }

    /// Warnings the runtime returned when the container was created.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn id(&self) -> &str {
        self.summary
            .id
            .as_deref()
            .or(self.inspect.id.as_deref())
            .unwrap_or_default()
    }

    pub fn image(&self) -> &str {
        self.summary.image.as_deref().unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.summary.status.as_deref().unwrap_or_default()
    }

    pub fn labels(&self) -> Option<&HashMap<String, String>> {
        self.summary.labels.as_ref()
    }

    pub fn get_label(&self, name: &str) -> Option<&str> {
        self.labels()
            .and_then(|labels| labels.get(name))
            .map(String::as_str)
    }

    pub fn has_label(&self, name: &str, value: &str) -> bool {
        self.get_label(name) == Some(value)
    }

    pub fn ports(&self) -> Vec<PortMapping> {
        self.summary
            .ports
            .iter()
            .flatten()
            .map(|port| PortMapping {
                private: port.private_port,
                public: port.public_port,
                protocol: match port.typ {
                    Some(PortTypeEnum::UDP) => Protocol::Udp,
                    _ => Protocol::Tcp,
                },
                address: port
                    .ip
                    .clone()
                    .unwrap_or_else(|| ALL_INTERFACES.to_string()),
            })
            .collect()
    }

    /// First mapping for the given internal port.
    pub fn port(&self, internal: u16) -> Result<PortMapping> {
        self.ports()
            .into_iter()
            .find(|port| port.private == internal)
            .ok_or(Error::PortNotFound(internal))
    }

    fn state_time(&self, select: fn(&ContainerState) -> Option<&String>) -> Option<&str> {
        self.inspect
            .state
            .as_ref()
            .and_then(select)
            .map(String::as_str)
            .filter(|value| !value.is_empty() && *value != TIME_NOT_SET)
    }

    pub fn started(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .state_time(|state| state.started_at.as_ref())
            .ok_or(Error::ContainerNotRunning)?;
        parse_timestamp(raw)
    }

    pub fn finished(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .state_time(|state| state.finished_at.as_ref())
            .ok_or(Error::ContainerStillRunning)?;
        parse_timestamp(raw)
    }

    /// How long the container has been running, or ran for if it stopped.
    /// Zero if it never started.
    pub fn elapsed(&self) -> Result<Duration> {
        let started = match self.started() {
            Ok(started) => started,
            Err(Error::ContainerNotRunning) => return Ok(Duration::ZERO),
            Err(err) => return Err(err),
        };
        let finished = match self.finished() {
            Ok(finished) => finished,
            Err(Error::ContainerStillRunning) => Utc::now(),
            Err(err) => return Err(err),
        };
        Ok((finished - started).to_std().unwrap_or(Duration::ZERO))
    }

    /// Replaces this snapshot with a fresh one from the runtime. Creation
    /// warnings are kept.
    pub async fn refresh(&mut self, client: &DockerClient) -> Result<()> {
        let mut updated = client.container_info(self.id()).await?;
        updated.warnings = std::mem::take(&mut self.warnings);
        *self = updated;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| Error::InvalidTimestamp {
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{image:{}, id:{}, status:{}}}",
            self.image(),
            self.id(),
            self.status()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::Port;

    fn info_with_times(started: Option<&str>, finished: Option<&str>) -> ContainerInfo {
        ContainerInfo::new(
            ContainerSummary::default(),
            ContainerInspectResponse {
                state: Some(ContainerState {
                    started_at: started.map(str::to_string),
                    finished_at: finished.map(str::to_string),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Vec::new(),
        )
    }

    #[test]
    fn test_display() {
        let info = ContainerInfo::new(
            ContainerSummary {
                image: Some("image".to_string()),
                id: Some("id".to_string()),
                status: Some("status".to_string()),
                ..Default::default()
            },
            ContainerInspectResponse::default(),
            Vec::new(),
        );
        assert_eq!(info.to_string(), "{image:image, id:id, status:status}");
    }

    #[test]
    fn test_has_label() {
        let mut labels = HashMap::new();
        labels.insert("foo".to_string(), "bar".to_string());
        let info = ContainerInfo::new(
            ContainerSummary {
                labels: Some(labels),
                ..Default::default()
            },
            ContainerInspectResponse::default(),
            Vec::new(),
        );
        assert!(info.has_label("foo", "bar"));
        assert!(!info.has_label("foo", ""));
        assert_eq!(info.get_label("missing"), None);
    }

    #[test]
    fn test_port_lookup() {
        let info = ContainerInfo::new(
            ContainerSummary {
                ports: Some(vec![Port {
                    ip: Some("127.0.0.1".to_string()),
                    private_port: 50000,
                    public_port: Some(2),
                    typ: Some(PortTypeEnum::UDP),
                }]),
                ..Default::default()
            },
            ContainerInspectResponse::default(),
            Vec::new(),
        );

        let port = info.port(50000).unwrap();
        assert_eq!(port.public, Some(2));
        assert_eq!(port.protocol, Protocol::Udp);
        assert_eq!(port.address, "127.0.0.1");
        assert!(matches!(info.port(12), Err(Error::PortNotFound(12))));
    }

    #[test]
    fn test_elapsed_finished_container() {
        let info = info_with_times(Some("2024-01-01T00:00:00Z"), Some("2024-01-01T01:00:00Z"));
        assert_eq!(info.elapsed().unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_elapsed_never_started() {
        let info = info_with_times(Some(TIME_NOT_SET), Some(TIME_NOT_SET));
        assert_eq!(info.elapsed().unwrap(), Duration::ZERO);
        assert!(matches!(info.started(), Err(Error::ContainerNotRunning)));

        let info = info_with_times(None, None);
        assert_eq!(info.elapsed().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_still_running() {
        let started = (Utc::now() - chrono::Duration::seconds(90)).to_rfc3339();
        let info = info_with_times(Some(&started), Some(TIME_NOT_SET));

        assert!(matches!(info.finished(), Err(Error::ContainerStillRunning)));
        let elapsed = info.elapsed().unwrap();
        assert!(elapsed >= Duration::from_secs(90));
        assert!(elapsed < Duration::from_secs(120));
    }

    #[test]
    fn test_started_with_fractional_seconds() {
        let info = info_with_times(Some("2024-05-01T10:00:00.123456789Z"), None);
        let started = info.started().unwrap();
        assert_eq!(started.timestamp(), 1714557600);
    }

    #[test]
    fn test_invalid_timestamp() {
        let info = info_with_times(Some("yesterday"), None);
        assert!(matches!(
            info.elapsed(),
            Err(Error::InvalidTimestamp { .. })
        ));
    }
}
