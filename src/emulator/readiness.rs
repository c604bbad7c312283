use std::time::Duration;

use reqwest::Client;

use crate::emulator::constants::{DEFAULT_READINESS_ATTEMPTS, DEFAULT_READINESS_DELAY_SECS};
use crate::emulator::error::{invalid_config, not_ready, EmulatorResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl ReadinessPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READINESS_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_READINESS_DELAY_SECS),
        }
    }
}

/// Polls `url` until the emulator answers with any HTTP status.
///
/// Only transport failures count as "not ready"; a 404 or 500 still proves the
/// process is listening. Returns the number of attempts that were needed.
pub async fn wait_until_ready(
    client: &Client,
    url: &str,
    policy: ReadinessPolicy,
) -> EmulatorResult<u32> {
    if policy.attempts == 0 {
        return Err(invalid_config("Readiness attempts must be at least 1"));
    }

    let mut last_error = String::new();
    for attempt in 1..=policy.attempts {
        match client.get(url).send().await {
            Ok(response) => {
                log::debug!(
                    "emulator at {url} answered with {} on attempt {attempt}",
                    response.status()
                );
                return Ok(attempt);
            }
            Err(err) => {
                last_error = err.to_string();
                if attempt < policy.attempts {
                    log::warn!(
                        "Attempt {attempt} failed, retrying in {}s...",
                        policy.delay.as_secs()
                    );
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(not_ready(format!(
        "{url} not accessible after {} attempts: {last_error}",
        policy.attempts
    )))
}
