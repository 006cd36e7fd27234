use std::{future::Future, time::Duration};

use tracing::{info, warn};

use countdown_common::{parse_time_payload, CurrentTime, NetworkError, TimeFormat, TimeServiceConfig};

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One authoritative reading of the current time.
pub trait TimeProvider {
    fn fetch(&self) -> impl Future<Output = Result<CurrentTime, NetworkError>> + Send;
}

pub struct HttpTimeProvider {
    http: reqwest::Client,
    url: String,
    format: TimeFormat,
}

impl HttpTimeProvider {
    pub fn new(config: &TimeServiceConfig) -> Result<Self, NetworkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| NetworkError::Request(err.to_string()))?;

        Ok(Self {
            http,
            url: config.endpoint(),
            format: config.format,
        })
    }
}

impl TimeProvider for HttpTimeProvider {
    async fn fetch(&self) -> Result<CurrentTime, NetworkError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|err| NetworkError::Request(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| NetworkError::Request(err.without_url().to_string()))?;
        info!("time service replied: {}", body.trim());

        parse_time_payload(self.format, &body)
    }
}

/// Fetches the time, retrying with doubling backoff. The last error is
/// returned once every attempt has failed.
pub async fn sync_with_retry<P: TimeProvider>(
    provider: &P,
    attempts: u32,
    initial_backoff: Duration,
) -> Result<CurrentTime, NetworkError> {
    let attempts = attempts.max(1);
    let mut backoff = initial_backoff;
    let mut attempt = 1;

    loop {
        match provider.fetch().await {
            Ok(now) => return Ok(now),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                warn!("time sync attempt {attempt}/{attempts} failed: {err}; retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
    }

    impl TimeProvider for FlakyProvider {
        async fn fetch(&self) -> Result<CurrentTime, NetworkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(NetworkError::Status(503))
            } else {
                Ok(CurrentTime::from_fields(2025, 4, 29, 12, 0, 0).unwrap())
            }
        }
    }

    #[tokio::test]
    async fn retries_until_the_service_answers() {
        let provider = FlakyProvider {
            failures: 2,
            calls: AtomicU32::new(0),
        };

        let now = sync_with_retry(&provider, 5, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(now.day(), 29);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_last_attempt() {
        let provider = FlakyProvider {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };

        let err = sync_with_retry(&provider, 3, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert_eq!(err, NetworkError::Status(503));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
