//! Key-value façade over a [`KvStore`].
//!
//! [`KvClient`] namespaces keys, turns empty replies into typed errors,
//! encodes structured values as JSON and logs every failure. It holds no
//! locks and no cached values; each call is one round trip to the store
//! (enumeration aside, which pages through SCAN).
//!
//! Operations are split by data type:
//! - `strings`: `set`, `set_json`, `get`, `get_bytes`, `scan`
//! - `sets`: `sset`, `sget`
//! - `hashes`: `hset`, `hset_obj`, `hmset`, `hget`, `hget_obj`, `hget_all`,
//!   `hexists`, `hdel`
//! - `keys`: `exists`, `expire`, `ttl`, `del`, `delete`, `get_keys`,
//!   `get_keys_count`, `scan_keys`
//! - `server`: `info`, `db_size`, `ping`

mod hashes;
mod keys;
mod server;
mod sets;
mod strings;

use std::sync::Arc;
use std::time::Duration;

use crate::config::settings::RedisSettings;
use crate::error::KvResult;
use crate::store::KvStore;
use crate::utils::keys::KEY_SEPARATOR;

const DEFAULT_SCAN_COUNT: usize = 100;

/// Cloneable handle to a key-value store.
///
/// Clones share the same store, so a client can be handed to as many tasks
/// as needed.
#[derive(Clone)]
pub struct KvClient {
    store: Arc<dyn KvStore>,
    namespace: Arc<str>,
    scan_count: usize,
}

impl KvClient {
    /// Wrap a store with no namespace.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            namespace: Arc::from(""),
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// Wrap a store using the namespace and scan count from `settings`.
    pub fn from_settings(store: Arc<dyn KvStore>, settings: &RedisSettings) -> Self {
        Self::new(store)
            .with_namespace(settings.key_prefix.as_str())
            .with_scan_count(settings.scan_count)
    }

    /// Store every key as `<namespace>:<key>`. Trailing separators are dropped.
    pub fn with_namespace(mut self, namespace: impl AsRef<str>) -> Self {
        self.namespace = Arc::from(namespace.as_ref().trim_end_matches(KEY_SEPARATOR));
        self
    }

    /// COUNT hint for each SCAN step; clamped to at least 1.
    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub(crate) fn full_key(&self, key: &str) -> String {
        if self.namespace.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", self.namespace, KEY_SEPARATOR, key)
        }
    }

    pub(crate) fn full_keys<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        keys.iter().map(|key| self.full_key(key.as_ref())).collect()
    }

    /// Inverse of [`full_key`](Self::full_key); `None` for keys outside the namespace.
    pub(crate) fn strip_namespace(&self, key: String) -> Option<String> {
        if self.namespace.is_empty() {
            return Some(key);
        }
        key.strip_prefix(&*self.namespace)
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
            .map(str::to_string)
    }

    /// Log a failed call and hand the result back unchanged.
    fn observe<T>(&self, op: &'static str, key: &str, result: KvResult<T>) -> KvResult<T> {
        if let Err(ref e) = result {
            if e.is_not_found() {
                tracing::debug!(op, key, "key not found");
            } else {
                tracing::warn!(op, key, error = %e, kind = ?e.kind(), "kv operation failed");
            }
        }
        result
    }
}

impl std::fmt::Debug for KvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvClient")
            .field("namespace", &self.namespace)
            .field("scan_count", &self.scan_count)
            .finish_non_exhaustive()
    }
}

/// `None` and zero both mean "no expiry".
pub(crate) fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|d| !d.is_zero())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::MemoryStore;

    pub(crate) fn memory_client() -> (Arc<MemoryStore>, KvClient) {
        let store = Arc::new(MemoryStore::new());
        let client = KvClient::new(store.clone());
        (store, client)
    }
}
