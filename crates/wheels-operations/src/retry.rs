//! Bounded exponential backoff for calls to the release host.

use std::thread;
use std::time::Duration;

use tracing::warn;
use wheels_project::RetryConfig;

use crate::{OperationError, Result};

/// Share of each backoff delay that is randomized.
const JITTER: f64 = 0.5;

/// Output fragments that mark a failed host call as worth retrying.
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timed out",
    "timeout",
    "connection reset",
    "connection refused",
    "could not resolve host",
    "temporary failure",
    "tls handshake",
    "unexpected eof",
    "http 429",
    "rate limit",
    "http 500",
    "http 502",
    "http 503",
    "http 504",
    "bad gateway",
    "service unavailable",
];

/// Whether command output looks like a network hiccup rather than a
/// deterministic failure.
#[must_use]
pub fn looks_transient(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    TRANSIENT_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
}

/// Delay before retry number `attempt` (1-based), doubling from the base
/// delay and capped at the maximum.
#[must_use]
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    config
        .base_delay()
        .saturating_mul(2_u32.saturating_pow(exponent))
        .min(config.max_delay())
}

/// Scales `delay` by a random factor in `[1 - JITTER, 1]`, so concurrent
/// fetches that fail together do not retry in lockstep.
#[must_use]
pub fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(1.0 - JITTER * rand::random::<f64>())
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// attempt budget is spent.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub fn with_backoff<T, F>(config: &RetryConfig, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < config.max_attempts() => {
                let delay = jittered(backoff_delay(config, attempt));
                warn!(
                    operation,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient failure, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Maps a timed-out or failed command to `TransientNetwork` when its output
/// matches a transient signature.
pub(crate) fn classify(operation: &str, err: OperationError) -> OperationError {
    match err {
        OperationError::CommandTimedOut { command, timeout_secs } => {
            OperationError::TransientNetwork {
                operation: operation.to_string(),
                detail: format!("'{command}' timed out after {timeout_secs}s"),
            }
        }
        OperationError::CommandFailed { stderr, .. } if looks_transient(&stderr) => {
            OperationError::TransientNetwork {
                operation: operation.to_string(),
                detail: stderr,
            }
        }
        other => other,
    }
}
