// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Throttle protection: bounded retry with backoff around remote calls.

use crate::api::RemoteError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use trawl_core::LogSink;

/// Retry policy for throttled and transient failures.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Retries after the initial attempt. Budget 3 means 4 attempts total.
    pub max_retries: u32,
    /// First backoff delay when the remote gives no hint.
    pub base_delay: Duration,
    /// Ceiling for the backoff curve.
    pub max_delay: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ThrottleConfig {
    trawl_core::setters! {
        set {
            max_retries: u32,
            base_delay: Duration,
            max_delay: Duration,
        }
    }
}

/// Wraps outbound remote calls with rate-limit detection and retry.
///
/// Rate-limit signals wait the remote's hint when present, otherwise the
/// exponential default. Transient faults use the default curve. Permanent
/// errors surface immediately. Exhausting the budget surfaces the last
/// error to the caller, which decides whether to abort the operation or
/// skip the unit of work.
#[derive(Clone)]
pub struct Throttle {
    config: ThrottleConfig,
    sink: Arc<dyn LogSink>,
}

impl Throttle {
    pub fn new(config: ThrottleConfig, sink: Arc<dyn LogSink>) -> Self {
        Self { config, sink }
    }

    /// Run `op`, retrying per policy. `label` names the call in log lines.
    pub async fn call<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut retries_done = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err @ RemoteError::Permanent(_)) => {
                    tracing::warn!(%label, error = %err, "remote call failed permanently");
                    return Err(err);
                }
                Err(err) => {
                    if retries_done >= self.config.max_retries {
                        self.sink.append(&format!(
                            "{label}: {err}; retry budget exhausted after {retries_done} retries"
                        ));
                        return Err(err);
                    }
                    let delay = match &err {
                        RemoteError::RateLimited {
                            retry_after: Some(hint),
                        } => *hint,
                        _ => self.backoff(retries_done),
                    };
                    retries_done += 1;
                    self.sink.append(&format!(
                        "{label}: {err}; retry {retries_done}/{} in {}ms",
                        self.config.max_retries,
                        delay.as_millis()
                    ));
                    tracing::info!(%label, attempt = retries_done, delay_ms = delay.as_millis() as u64, "backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn backoff(&self, retries_done: u32) -> Duration {
        let factor = 2u32.saturating_pow(retries_done);
        self.config
            .base_delay
            .saturating_mul(factor)
            .min(self.config.max_delay)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod fake {
    use parking_lot::Mutex;
    use std::sync::Arc;
    use trawl_core::LogSink;

    /// Sink that records appended lines for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl LogSink for RecordingSink {
        fn append(&self, line: &str) {
            self.lines.lock().push(line.to_string());
        }
    }
}

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;
