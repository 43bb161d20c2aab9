use super::KvClient;
use crate::error::KvResult;
use crate::utils::info::{ServerInfo, parse_info};

impl KvClient {
    /// INFO for the given sections (all default sections when empty),
    /// flattened into `field -> value`.
    pub async fn info<S: AsRef<str>>(&self, sections: &[S]) -> KvResult<ServerInfo> {
        let sections: Vec<String> = sections.iter().map(|s| s.as_ref().to_string()).collect();
        let result = self.store.info(&sections).await.map(|raw| parse_info(&raw));
        self.observe("info", "", result)
    }

    /// Number of keys in the selected database, across all namespaces.
    pub async fn db_size(&self) -> KvResult<u64> {
        let result = self.store.dbsize().await;
        self.observe("db_size", "", result)
    }

    pub async fn ping(&self) -> KvResult<String> {
        let result = self.store.ping().await;
        self.observe("ping", "", result)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::memory_client;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_db_size_counts_live_keys() {
        let (_, client) = memory_client();
        assert_eq!(client.db_size().await.unwrap(), 0);
        client.set("a", "1", None).await.unwrap();
        client.sset("b", &["x"]).await.unwrap();
        client.hset("c", "f", "v", None).await.unwrap();
        assert_eq!(client.db_size().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_info_keyspace_section() {
        let (_, client) = memory_client();
        client.set("a", "1", None).await.unwrap();
        let info = client.info(&["keyspace"]).await.unwrap();
        let db0 = info.get("db0").expect("db0 entry");
        assert!(db0.starts_with("keys=1"), "{db0}");
        assert!(!info.keys().any(|k| k.starts_with('#')));
    }

    #[tokio::test]
    async fn test_ping_and_offline() {
        let (store, client) = memory_client();
        assert_eq!(client.ping().await.unwrap(), "PONG");
        store.set_offline(true);
        assert_eq!(client.ping().await.unwrap_err().kind(), ErrorKind::Transport);
        assert_eq!(client.db_size().await.unwrap_err().kind(), ErrorKind::Transport);
    }
}
