//! Bounded, retrying, cancellable parallel runner used for backend HTTP
//! fan-out. A shared [`Executor`] schedules per-series GET requests with
//! exponential backoff, an overall deadline, and a gather contract that
//! preserves request order and short-circuits on the first error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use stats_core::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

const MAX_DIAGNOSTIC_BODY: usize = 512;

/// Tunable executor parameters. Defaults match the recommended production
/// values for this backend.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Maximum number of HTTP attempts in flight at once.
    pub parallelism: usize,
    /// Maximum number of tasks (queued + in flight) admitted at once.
    pub max_queue_depth: usize,
    /// Attempts per task before giving up.
    pub max_attempts: u32,
    /// Timeout for a single HTTP attempt.
    pub attempt_timeout: Duration,
    /// Deadline for a whole task, across all of its attempts.
    pub task_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallelism: 16,
            max_queue_depth: 256,
            max_attempts: 8,
            attempt_timeout: Duration::from_secs(5),
            task_timeout: Duration::from_secs(30),
        }
    }
}

/// Bounded, retrying, cancellable parallel HTTP runner.
///
/// Shared across requests: the HTTP client, worker semaphore, and queue
/// depth counter all outlive any individual call to [`Executor::gather`].
pub struct Executor {
    client: reqwest::Client,
    semaphore: Arc<tokio::sync::Semaphore>,
    queued: Arc<AtomicUsize>,
    config: ExecutorConfig,
    auth_token: Option<String>,
}

impl Executor {
    pub fn new(client: reqwest::Client, config: ExecutorConfig) -> Self {
        Self::with_auth_token(client, config, None)
    }

    /// Build an executor that attaches `X-Auth-Token: <token>` to every
    /// backend request, per the backend wire contract.
    pub fn with_auth_token(client: reqwest::Client, config: ExecutorConfig, auth_token: Option<String>) -> Self {
        Self {
            client,
            semaphore: Arc::new(tokio::sync::Semaphore::new(config.parallelism)),
            queued: Arc::new(AtomicUsize::new(0)),
            config,
            auth_token,
        }
    }

    /// Scatter one GET per URL and gather the bodies in the same order as
    /// `urls`. Resolves to the first error encountered (short-circuit);
    /// still-running sibling tasks are cancelled cooperatively.
    pub async fn gather(&self, urls: Vec<Url>) -> Result<Vec<String>, Error> {
        let n = urls.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let _admitted = self.admit(n)?;
        let cancel = CancellationToken::new();
        let mut futs = FuturesUnordered::new();

        for (idx, url) in urls.into_iter().enumerate() {
            let client = self.client.clone();
            let semaphore = self.semaphore.clone();
            let cancel = cancel.clone();
            let config = self.config;
            let auth_token = self.auth_token.clone();
            futs.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("executor semaphore never closes");
                let outcome = tokio::time::timeout(
                    config.task_timeout,
                    fetch_with_retry(&client, &url, &config, &cancel, auth_token.as_deref()),
                )
                .await;
                let result = match outcome {
                    Ok(r) => r,
                    Err(_) => Err(Error::Transport("task deadline exceeded".to_string())),
                };
                (idx, result)
            });
        }

        let mut results: Vec<Option<String>> = (0..n).map(|_| None).collect();
        while let Some((idx, outcome)) = futs.next().await {
            match outcome {
                Ok(body) => results[idx] = Some(body),
                Err(err) => {
                    cancel.cancel();
                    drop(futs);
                    return Err(err);
                }
            }
        }

        Ok(results.into_iter().map(|r| r.expect("all slots filled on success path")).collect())
    }

    fn admit(&self, n: usize) -> Result<AdmitGuard<'_>, Error> {
        let prev = self.queued.fetch_add(n, Ordering::SeqCst);
        if prev + n > self.config.max_queue_depth {
            self.queued.fetch_sub(n, Ordering::SeqCst);
            return Err(Error::Internal(format!(
                "executor queue depth exceeded: {n} requested, {prev} already in flight, max {}",
                self.config.max_queue_depth
            )));
        }
        Ok(AdmitGuard {
            counter: &self.queued,
            n,
        })
    }
}

struct AdmitGuard<'a> {
    counter: &'a AtomicUsize,
    n: usize,
}

impl Drop for AdmitGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(self.n, Ordering::SeqCst);
    }
}

enum AttemptError {
    Timeout,
    Transport(String),
    Status(u16, String),
    Cancelled,
}

async fn fetch_with_retry(
    client: &reqwest::Client,
    url: &Url,
    config: &ExecutorConfig,
    cancel: &CancellationToken,
    auth_token: Option<&str>,
) -> Result<String, Error> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;

        let attempt_result = tokio::select! {
            _ = cancel.cancelled() => Err(AttemptError::Cancelled),
            res = tokio::time::timeout(config.attempt_timeout, {
                let mut req = client.get(url.clone());
                if let Some(token) = auth_token {
                    req = req.header("X-Auth-Token", token);
                }
                req.send()
            }) => {
                match res {
                    Err(_) => Err(AttemptError::Timeout),
                    Ok(Err(e)) => Err(AttemptError::Transport(e.to_string())),
                    Ok(Ok(response)) => {
                        let status = response.status();
                        if status.as_u16() >= 400 {
                            let body = response.text().await.unwrap_or_default();
                            Err(AttemptError::Status(status.as_u16(), truncate(&body)))
                        } else {
                            match response.text().await {
                                Ok(body) => Ok(body),
                                Err(e) => Err(AttemptError::Transport(e.to_string())),
                            }
                        }
                    }
                }
            }
        };

        match attempt_result {
            Ok(body) => return Ok(body),
            Err(AttemptError::Status(status, body)) => return Err(Error::BackendStatus { status, body }),
            Err(AttemptError::Cancelled) => {
                return Err(Error::Transport("request cancelled".to_string()))
            }
            Err(retryable) => {
                if attempt >= config.max_attempts {
                    return Err(match retryable {
                        AttemptError::Timeout => Error::Transport("attempt timed out".to_string()),
                        AttemptError::Transport(m) => Error::Transport(m),
                        AttemptError::Status(..) | AttemptError::Cancelled => unreachable!(),
                    });
                }
                tokio::select! {
                    _ = tokio::time::sleep(backoff_delay(attempt)) => {}
                    _ = cancel.cancelled() => return Err(Error::Transport("request cancelled".to_string())),
                }
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let millis = 100u64.saturating_mul(1u64 << attempt.saturating_sub(1).min(63));
    Duration::from_millis(millis.min(30_000))
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_DIAGNOSTIC_BODY {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_DIAGNOSTIC_BODY).collect();
        truncated.push_str("...");
        truncated
    }
}
