use std::collections::HashSet;
use std::time::Duration;

use super::KvClient;
use crate::error::{KvError, KvResult};
use crate::store::Ttl;
use crate::utils::keys::{KEY_SEPARATOR, escape_glob};

impl KvClient {
    /// How many of `keys` exist. A key listed twice counts twice.
    pub async fn exists<S: AsRef<str>>(&self, keys: &[S]) -> KvResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let full = self.full_keys(keys);
        let result = self.store.exists(&full).await;
        self.observe("exists", &full.join(","), result)
    }

    /// Set a key's time to live. `NotFound` if the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> KvResult<()> {
        let full = self.full_key(key);
        let result = match self.store.expire(&full, ttl).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(KvError::not_found(&full)),
            Err(e) => Err(e),
        };
        self.observe("expire", &full, result)
    }

    /// Remaining lifetime of a key.
    pub async fn ttl(&self, key: &str) -> KvResult<Ttl> {
        let full = self.full_key(key);
        let result = match self.store.ttl(&full).await {
            Ok(Some(ttl)) => Ok(ttl),
            Ok(None) => Err(KvError::not_found(&full)),
            Err(e) => Err(e),
        };
        self.observe("ttl", &full, result)
    }

    /// Delete keys, returning how many existed. Absent keys are not an error.
    pub async fn del<S: AsRef<str>>(&self, keys: &[S]) -> KvResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let full = self.full_keys(keys);
        let result = self.store.del(&full).await;
        self.observe("del", &full.join(","), result)
    }

    /// Single-key [`del`](Self::del).
    pub async fn delete(&self, key: &str) -> KvResult<u64> {
        self.del(&[key]).await
    }

    /// Every key under `prefix:`, with glob characters in `prefix` matched
    /// literally.
    ///
    /// An empty prefix lists every key in the namespace. It does not match
    /// only keys that begin with `:`, as a literal `:*` pattern would.
    pub async fn get_keys(&self, prefix: &str) -> KvResult<Vec<String>> {
        let pattern = if prefix.is_empty() {
            self.namespace_pattern("*")
        } else {
            format!(
                "{}{}*",
                escape_glob(&self.full_key(prefix)),
                KEY_SEPARATOR
            )
        };
        let result = self.scan_pattern(&pattern).await;
        self.observe("get_keys", &pattern, result)
    }

    pub async fn get_keys_count(&self, prefix: &str) -> KvResult<usize> {
        self.get_keys(prefix).await.map(|keys| keys.len())
    }

    /// Every key matching a raw glob `pattern` inside the namespace.
    pub async fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        let pattern = self.namespace_pattern(pattern);
        let result = self.scan_pattern(&pattern).await;
        self.observe("scan_keys", &pattern, result)
    }

    fn namespace_pattern(&self, pattern: &str) -> String {
        if self.namespace.is_empty() {
            pattern.to_string()
        } else {
            format!("{}{}{}", escape_glob(&self.namespace), KEY_SEPARATOR, pattern)
        }
    }

    /// Page through SCAN until the cursor wraps to 0.
    ///
    /// SCAN may return a key more than once; duplicates are dropped and the
    /// first-seen order is kept.
    async fn scan_pattern(&self, pattern: &str) -> KvResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor = 0;
        let mut rounds = 0u32;

        loop {
            let (next, batch) = self.store.scan(cursor, pattern, self.scan_count).await?;
            rounds += 1;
            for key in batch {
                if seen.insert(key.clone()) {
                    if let Some(key) = self.strip_namespace(key) {
                        keys.push(key);
                    }
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(pattern, rounds, found = keys.len(), "scan finished");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::client::test_support::memory_client;
    use crate::error::ErrorKind;

    fn set_of(keys: Vec<String>) -> HashSet<String> {
        keys.into_iter().collect()
    }

    fn expected(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_exists_counts_and_missing() {
        let (_, client) = memory_client();
        client.set("a", "1", None).await.unwrap();
        assert_eq!(client.exists(&["missing"]).await.unwrap(), 0);
        assert_eq!(client.exists(&["a", "missing", "a"]).await.unwrap(), 2);
        assert_eq!(client.exists::<&str>(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exists_transport_error_is_not_zero() {
        let (store, client) = memory_client();
        store.set_offline(true);
        let err = client.exists(&["a"]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_expire_then_ttl() {
        let (_, client) = memory_client();
        client.set("k", "v", None).await.unwrap();
        assert_eq!(client.ttl("k").await.unwrap(), Ttl::Persistent);

        client.expire("k", Duration::from_secs(10)).await.unwrap();
        match client.ttl("k").await.unwrap() {
            Ttl::Expires(d) => assert!(!d.is_zero() && d <= Duration::from_secs(10)),
            other => panic!("expected expiry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expire_and_ttl_missing_key() {
        let (_, client) = memory_client();
        assert!(client
            .expire("missing", Duration::from_secs(1))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(client.ttl("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_expired_key_disappears() {
        let (_, client) = memory_client();
        client
            .set("brief", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(client.get("brief").await.unwrap_err().is_not_found());
        assert_eq!(client.exists(&["brief"]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let (_, client) = memory_client();
        client.set("k", "v", None).await.unwrap();
        client.sset("s", &["m"]).await.unwrap();
        assert_eq!(client.del(&["k", "s", "nope"]).await.unwrap(), 2);
        assert_eq!(client.del(&["k"]).await.unwrap(), 0);
        assert_eq!(client.delete("k").await.unwrap(), 0);
        assert_eq!(client.del::<String>(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_keys_by_prefix() {
        let (_, client) = memory_client();
        for key in ["root:a", "root:b", "other:c", "rootless:d", "root"] {
            client.set(key, "v", None).await.unwrap();
        }
        let keys = client.get_keys("root").await.unwrap();
        assert_eq!(set_of(keys), expected(&["root:a", "root:b"]));
        assert_eq!(client.get_keys_count("root").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_keys_no_match_is_empty() {
        let (_, client) = memory_client();
        assert!(client.get_keys("nothing").await.unwrap().is_empty());
        assert_eq!(client.get_keys_count("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_keys_pages_through_scan() {
        let (_, client) = memory_client();
        let client = client.with_scan_count(3);
        for i in 0..20 {
            client.set(&format!("bulk:{i}"), "v", None).await.unwrap();
        }
        let keys = client.get_keys("bulk").await.unwrap();
        assert_eq!(keys.len(), 20);
        assert_eq!(set_of(keys).len(), 20);
    }

    #[tokio::test]
    async fn test_get_keys_escapes_glob_in_prefix() {
        let (_, client) = memory_client();
        client.set("a*:1", "v", None).await.unwrap();
        client.set("ab:2", "v", None).await.unwrap();
        let keys = client.get_keys("a*").await.unwrap();
        assert_eq!(keys, vec!["a*:1".to_string()]);
    }

    #[tokio::test]
    async fn test_namespace_hidden_from_enumeration() {
        let (_, client) = memory_client();
        let app = client.clone().with_namespace("app");
        app.set("root:a", "v", None).await.unwrap();
        client.set("root:b", "v", None).await.unwrap();

        assert_eq!(app.get_keys("root").await.unwrap(), vec!["root:a".to_string()]);
        assert_eq!(app.get_keys("").await.unwrap(), vec!["root:a".to_string()]);
        assert_eq!(
            set_of(client.get_keys("").await.unwrap()),
            expected(&["app:root:a", "root:b"])
        );
    }

    #[tokio::test]
    async fn test_scan_keys_raw_pattern() {
        let (_, client) = memory_client();
        for key in ["user:1", "user:2", "user:10", "job:1"] {
            client.set(key, "v", None).await.unwrap();
        }
        let keys = client.scan_keys("user:?").await.unwrap();
        assert_eq!(set_of(keys), expected(&["user:1", "user:2"]));
    }
}
