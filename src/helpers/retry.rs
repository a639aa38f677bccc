//! Bounded retry with exponential backoff.
//!
//! Used around single-record saves that can collide with a concurrent
//! writer. Only errors accepted by the caller's transient predicate are
//! retried; everything else is returned on the first failure.

use sea_orm::{DbErr, RuntimeErr};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// SQLSTATE / result codes that signal a retryable write collision.
///
/// PostgreSQL: `40001` serialization failure, `40P01` deadlock.
/// SQLite: `5` busy, `6` locked, `517` busy snapshot.
const TRANSIENT_DB_CODES: &[&str] = &["40001", "40P01", "5", "6", "517"];

/// Retry policy for transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each following retry.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the failed `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// On exhaustion the error from the last attempt is returned.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    config: &RetryConfig,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}/{}", attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) if is_transient(&e) && attempt < max_attempts => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Transient failure (attempt {}/{}), retrying in {:?}: {}",
                    attempt, max_attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if is_transient(&e) {
                    error!("Giving up after {} attempts: {}", attempt, e);
                } else {
                    debug!("Permanent failure on attempt {}: {}", attempt, e);
                }
                return Err(e);
            }
        }
    }
}

/// Detect write collisions and pool exhaustion that resolve on their own.
///
/// Constraint violations, missing rows and malformed queries are permanent.
pub fn is_transient_db_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => {
            is_transient_runtime_error(runtime)
        }
        _ => false,
    }
}

fn is_transient_runtime_error(err: &RuntimeErr) -> bool {
    if let RuntimeErr::SqlxError(sqlx_err) = err {
        return match sqlx_err {
            sea_orm::sqlx::Error::Database(db_err) => db_err
                .code()
                .is_some_and(|code| TRANSIENT_DB_CODES.contains(&code.as_ref())),
            sea_orm::sqlx::Error::PoolTimedOut => true,
            _ => false,
        };
    }

    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("database is locked") || msg.contains("could not serialize access")
}
