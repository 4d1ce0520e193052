use crate::config::HttpConfig;
use crate::types::{PipelineError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, RequestBuilder, Response};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Bounded retries with exponential backoff: `base_delay * 2^attempt`
/// between attempts, nothing after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    fn backoff(&self) -> ExponentialBackoff<backoff::SystemClock> {
        let cap = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(self.max_attempts.min(31)));

        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: cap,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Runs `operation` until it succeeds or the attempts are used up.
    ///
    /// `operation` receives the 0-based attempt index and reports failure
    /// as an error string, which is logged and kept as the last error.
    pub async fn execute<Op, Fut, T>(&self, label: &str, operation: Op) -> Result<T>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, String>>,
    {
        self.execute_with_observer(label, operation, |_, _| {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_backoff(next_attempt, delay)`
    /// before each sleep.
    pub async fn execute_with_observer<Op, Fut, T, OnBackoff>(
        &self,
        label: &str,
        mut operation: Op,
        mut on_backoff: OnBackoff,
    ) -> Result<T>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, String>>,
        OnBackoff: FnMut(u32, Duration),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.backoff();
        let mut last_error = String::from("no attempt made");

        for attempt in 0..max_attempts {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded on attempt {}", label, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{} attempt {}/{} failed: {}", label, attempt + 1, max_attempts, e);
                    last_error = e;
                }
            }

            if attempt + 1 < max_attempts {
                if let Some(delay) = backoff.next_backoff() {
                    debug!("{} retrying in {:?}", label, delay);
                    on_backoff(attempt + 1, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        error!("{} failed after {} attempts", label, max_attempts);
        Err(PipelineError::TransportExhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

/// HTTP client wrapper that sends every request through a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct ResilientCaller {
    client: Client,
    policy: RetryPolicy,
}

impl ResilientCaller {
    pub fn new(config: &HttpConfig, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, policy))
    }

    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends the request produced by `build`, rebuilding it for each attempt.
    /// Transport errors and non-2xx statuses both count as failed attempts.
    pub async fn send<B>(&self, label: &str, build: B) -> Result<Response>
    where
        B: Fn(&Client) -> RequestBuilder,
    {
        self.policy
            .execute(label, |_attempt| {
                let request = build(&self.client);
                async move {
                    let response = request.send().await.map_err(|e| e.to_string())?;
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let body = response.text().await.unwrap_or_default();
                    let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
                    Err(format!("HTTP {}: {}", status, preview))
                }
            })
            .await
    }
}
