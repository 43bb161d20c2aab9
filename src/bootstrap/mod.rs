//! Startup connection with bounded, cancellable retries.
//!
//! A cache server that is still booting should not take the process down,
//! so [`connect_with_retry`] keeps PINGing on a [`RetryPolicy`] schedule
//! until the server answers, the attempts run out, or the caller cancels.
//! The resulting [`KvClient`] is returned to the caller; nothing is stored
//! globally.

mod error;
mod retry;

pub use error::BootstrapError;
pub use retry::RetryPolicy;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::KvClient;
use crate::config::{ConfigLoader, RedisSettings, Settings};
use crate::store::{KvStore, RedisStore};

/// PING `store` until it answers.
///
/// Returns the number of attempts it took.
///
/// # Errors
///
/// - [`BootstrapError::Cancelled`] as soon as `cancel` fires, including
///   in the middle of a backoff sleep
/// - [`BootstrapError::Exhausted`] with the last store error once
///   `policy.max_attempts` attempts have failed
pub async fn wait_until_ready(
    store: &dyn KvStore,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<u32, BootstrapError> {
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(BootstrapError::Cancelled { attempts });
        }
        attempts = attempts.saturating_add(1);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BootstrapError::Cancelled { attempts }),
            reply = store.ping() => reply,
        };

        let err = match outcome {
            Ok(_) => {
                tracing::info!(attempts, "Cache server is ready");
                return Ok(attempts);
            }
            Err(e) => e,
        };

        if !policy.allows_retry(attempts) {
            tracing::error!(attempts, error = %err, "Giving up on cache server");
            return Err(BootstrapError::Exhausted {
                attempts,
                last_error: err,
            });
        }

        let delay = policy.delay_for(attempts - 1);
        tracing::warn!(
            attempt = attempts,
            error = %err,
            retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Cache server not ready, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BootstrapError::Cancelled { attempts }),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Build a Redis-backed client and wait until the server answers PING.
pub async fn connect_with_retry(
    settings: &RedisSettings,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<KvClient, BootstrapError> {
    let store = RedisStore::new(settings).map_err(BootstrapError::InvalidSettings)?;

    tracing::info!(
        address = %settings.address,
        database = settings.database,
        max_attempts = policy.max_attempts,
        "Connecting to cache server"
    );
    wait_until_ready(&store, policy, cancel).await?;

    Ok(KvClient::from_settings(Arc::new(store), settings))
}

/// Validate `settings` and connect using its retry section.
pub async fn connect(
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<KvClient, BootstrapError> {
    settings.validate()?;
    let policy = settings.retry.clone().into_policy();
    connect_with_retry(&settings.redis, &policy, cancel).await
}

/// Load settings with [`ConfigLoader::new`] and connect.
pub async fn connect_from_env(cancel: &CancellationToken) -> Result<KvClient, BootstrapError> {
    let settings = ConfigLoader::new()?.load()?;
    connect(&settings, cancel).await
}
