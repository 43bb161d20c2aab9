//! Key-value store backends.
//!
//! - `RedisStore`: Redis through a bb8 pool of multiplexed connections
//! - `MemoryStore`: in-process store for tests and local development
//!
//! Both implement [`KvStore`], which [`KvClient`](crate::client::KvClient)
//! holds as `Arc<dyn KvStore>`.

mod memory;
mod redis;
mod traits;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::traits::{KvStore, Ttl};

use std::time::Duration;

/// Milliseconds for a `PX`/`PEXPIRE` argument.
///
/// Non-zero durations below one millisecond round up so they are not
/// mistaken for an immediate expiry.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !ttl.is_zero() { 1 } else { ms }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis() {
        assert_eq!(ttl_millis(Duration::from_secs(2)), 2000);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::ZERO), 0);
    }
}
