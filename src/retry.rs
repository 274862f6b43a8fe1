use anyhow::Result;
use tracing::{error, warn};

/// How many times a fallible step may be attempted. Always at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Values of zero or below still allow a single attempt.
    pub fn new(max_retries: i32) -> Self {
        Self {
            max_attempts: max_retries.max(1) as u32,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RETRIES)
    }
}

/// Result of a retried step. Exhausted steps keep the last error for the caller.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { error: anyhow::Error, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Exhausted { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Succeeded { value, .. } => Ok(value),
            Self::Exhausted { error, .. } => Err(error),
        }
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// Retries happen immediately, with no backoff. Every failed attempt but the
/// last is logged as a warning; the last one is logged as an error and
/// returned as [`RetryOutcome::Exhausted`].
pub fn execute_with_retry<T, F>(label: &str, policy: RetryPolicy, mut op: F) -> RetryOutcome<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op() {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) if attempt >= policy.max_attempts() => {
                error!(
                    "Operation '{}' failed after {} attempts: {:#}",
                    label, attempt, e
                );
                return RetryOutcome::Exhausted {
                    error: e,
                    attempts: attempt,
                };
            }
            Err(e) => {
                warn!(
                    "Operation '{}' failed on attempt {}. Retrying... ({:#})",
                    label, attempt, e
                );
            }
        }
    }
}
