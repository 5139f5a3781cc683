use std::time::Duration;

use tracing::warn;

/// Timeout applied to client and service operations when the caller does not
/// provide one.
pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

pub const TIMEOUT_ENV_VAR: &str = "CUBETEST_TIMEOUT_SECS";

/// Label attached to every container this crate creates.
pub const OWNER_LABEL: &str = "cubetest";
pub const OWNER_LABEL_VALUE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout: DEFAULT_SERVICE_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(timeout: Duration) -> Self {
        ClientConfig { timeout }
    }

    /// Defaults overridden by `CUBETEST_TIMEOUT_SECS` when it is set to a
    /// positive integer.
    pub fn from_env() -> Self {
        let mut config = ClientConfig::default();
        if let Ok(raw) = std::env::var(TIMEOUT_ENV_VAR) {
            match parse_timeout_secs(&raw) {
                Some(timeout) => config.timeout = timeout,
                None => warn!(
                    value = %raw,
                    "ignoring invalid {}, using default timeout",
                    TIMEOUT_ENV_VAR
                ),
            }
        }
        config
    }

    /// Picks the caller's timeout unless it is unset or zero.
    pub fn timeout_or_default(&self, timeout: Option<Duration>) -> Duration {
        match timeout {
            Some(t) if !t.is_zero() => t,
            _ => self.timeout,
        }
    }
}

fn parse_timeout_secs(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(ClientConfig::default().timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_timeout_or_default() {
        let config = ClientConfig::new(Duration::from_secs(10));
        assert_eq!(config.timeout_or_default(None), Duration::from_secs(10));
        assert_eq!(
            config.timeout_or_default(Some(Duration::ZERO)),
            Duration::from_secs(10)
        );
        assert_eq!(
            config.timeout_or_default(Some(Duration::from_millis(5))),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout_secs(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_timeout_secs("0"), None);
        assert_eq!(parse_timeout_secs("soon"), None);
    }
}
