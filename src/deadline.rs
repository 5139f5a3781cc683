use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};

// Roughly a year; used when `now + timeout` would overflow.
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// Runs `fut` unless `deadline` has already passed, dropping it if the
/// deadline passes while it is pending.
pub async fn within<F, T>(deadline: Instant, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if Instant::now() >= deadline {
        return Err(Error::DeadlineExceeded);
    }
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::DeadlineExceeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_passes_result_through() {
        let value = within(deadline_after(Duration::from_secs(5)), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_within_expired_deadline() {
        let deadline = deadline_after(Duration::from_nanos(1));
        tokio::time::sleep(Duration::from_millis(1)).await;
        let result = within(deadline, async { Ok(()) }).await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_within_abandons_slow_future() {
        let deadline = deadline_after(Duration::from_millis(20));
        let result: Result<()> = within(deadline, async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_deadline_after_does_not_overflow() {
        let _ = deadline_after(Duration::MAX);
    }
}
