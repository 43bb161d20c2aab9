//! KvStore trait definition.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::KvResult;

/// Remaining lifetime of an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key exists and has no expiry
    Persistent,
    /// The key expires after the given duration
    Expires(Duration),
}

impl Ttl {
    /// Interpret a `PTTL` reply. `-2` (missing key) yields `None`.
    pub fn from_pttl(reply: i64) -> Option<Self> {
        match reply {
            -2 => None,
            ms if ms < 0 => Some(Ttl::Persistent),
            ms => Some(Ttl::Expires(Duration::from_millis(ms as u64))),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Ttl::Persistent => None,
            Ttl::Expires(d) => Some(*d),
        }
    }
}

/// Command surface of a key-value backend.
///
/// Keys reaching a store are already fully namespaced. Absent keys are
/// reported as `None`/empty values here; turning them into `NotFound` is
/// the job of [`KvClient`](crate::client::KvClient).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Liveness probe, returns the server's reply (normally `PONG`).
    async fn ping(&self) -> KvResult<String>;

    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Write a string value. `ttl` of `None` stores it without expiry.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> KvResult<()>;

    /// Remove keys, returning how many existed.
    async fn del(&self, keys: &[String]) -> KvResult<u64>;

    /// Count existing keys; a key listed twice counts twice.
    async fn exists(&self, keys: &[String]) -> KvResult<u64>;

    /// Set expiry on a key. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool>;

    /// `None` when the key does not exist.
    async fn ttl(&self, key: &str) -> KvResult<Option<Ttl>>;

    /// Write hash fields and, when `ttl` is set, the key expiry as a single
    /// atomic step.
    async fn hset(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> KvResult<()>;

    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>>;

    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>>;

    async fn hexists(&self, key: &str, field: &str) -> KvResult<bool>;

    async fn hdel(&self, key: &str, fields: &[String]) -> KvResult<u64>;

    /// Add set members, returning how many were new.
    async fn sadd(&self, key: &str, members: &[String]) -> KvResult<u64>;

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>>;

    /// One `SCAN` step. Returns the next cursor (`0` when done) and a batch
    /// of keys matching the glob `pattern`.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize)
    -> KvResult<(u64, Vec<String>)>;

    async fn dbsize(&self) -> KvResult<u64>;

    /// Raw `INFO` reply for the given sections (all default sections if empty).
    async fn info(&self, sections: &[String]) -> KvResult<String>;
}
