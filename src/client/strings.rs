use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvClient, effective_ttl};
use crate::error::{KvError, KvResult};

impl KvClient {
    /// Write a string or byte value. `None` or a zero `ttl` means no expiry.
    pub async fn set(
        &self,
        key: &str,
        value: impl AsRef<[u8]>,
        ttl: Option<Duration>,
    ) -> KvResult<()> {
        let full = self.full_key(key);
        let result = self
            .store
            .set(&full, value.as_ref(), effective_ttl(ttl))
            .await;
        self.observe("set", &full, result)
    }

    /// Serialize `value` as JSON and write it.
    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> KvResult<()>
    where
        T: Serialize + ?Sized,
    {
        let full = self.full_key(key);
        let result = match serde_json::to_vec(value) {
            Ok(bytes) => self.store.set(&full, &bytes, effective_ttl(ttl)).await,
            Err(e) => Err(KvError::encode(&full, e.to_string())),
        };
        self.observe("set_json", &full, result)
    }

    /// Read a UTF-8 value.
    pub async fn get(&self, key: &str) -> KvResult<String> {
        let full = self.full_key(key);
        let result = match self.read(&full).await {
            Ok(bytes) => String::from_utf8(bytes).map_err(|e| KvError::decode(&full, e.to_string())),
            Err(e) => Err(e),
        };
        self.observe("get", &full, result)
    }

    /// Read the raw bytes of a value.
    pub async fn get_bytes(&self, key: &str) -> KvResult<Vec<u8>> {
        let full = self.full_key(key);
        let result = self.read(&full).await;
        self.observe("get_bytes", &full, result)
    }

    /// Read a JSON value and decode it into `T`.
    pub async fn scan<T: DeserializeOwned>(&self, key: &str) -> KvResult<T> {
        let full = self.full_key(key);
        let result = match self.read(&full).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| KvError::decode(&full, e.to_string()))
            }
            Err(e) => Err(e),
        };
        self.observe("scan", &full, result)
    }

    async fn read(&self, full: &str) -> KvResult<Vec<u8>> {
        self.store
            .get(full)
            .await?
            .ok_or_else(|| KvError::not_found(full))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::memory_client;
    use crate::error::ErrorKind;
    use crate::store::{KvStore, Ttl};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: u64,
        roles: Vec<String>,
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let (_, client) = memory_client();
        let err = client.get("never-written").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(client.get_bytes("never-written").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_, client) = memory_client();
        client.set("greeting", "hello", None).await.unwrap();
        assert_eq!(client.get("greeting").await.unwrap(), "hello");

        client.set("greeting", b"bye".as_slice(), None).await.unwrap();
        assert_eq!(client.get_bytes("greeting").await.unwrap(), b"bye");
    }

    #[tokio::test]
    async fn test_set_with_ttl_and_zero_ttl() {
        let (store, client) = memory_client();
        client
            .set("short", "v", Some(Duration::from_secs(30)))
            .await
            .unwrap();
        assert!(matches!(
            store.ttl("short").await.unwrap(),
            Some(Ttl::Expires(_))
        ));

        client
            .set("forever", "v", Some(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(store.ttl("forever").await.unwrap(), Some(Ttl::Persistent));
    }

    #[tokio::test]
    async fn test_get_non_utf8_is_decode_error() {
        let (_, client) = memory_client();
        client.set("blob", [0xffu8, 0xfe, 0x00], None).await.unwrap();
        let err = client.get("blob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(client.get_bytes("blob").await.unwrap(), vec![0xff, 0xfe, 0x00]);
    }

    #[tokio::test]
    async fn test_set_json_then_scan() {
        let (_, client) = memory_client();
        let session = Session {
            user_id: 42,
            roles: vec!["admin".to_string()],
        };
        client.set_json("session:42", &session, None).await.unwrap();

        let decoded: Session = client.scan("session:42").await.unwrap();
        assert_eq!(decoded, session);
    }

    #[tokio::test]
    async fn test_scan_wrong_shape_is_decode_error() {
        let (_, client) = memory_client();
        client.set("session:1", "not json", None).await.unwrap();
        let err = client.scan::<Session>("session:1").await.unwrap_err();
        assert!(matches!(err, KvError::Decode { ref key, .. } if key == "session:1"));

        let missing = client.scan::<Session>("session:2").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_namespace_is_applied() {
        let (store, client) = memory_client();
        let client = client.with_namespace("app");
        client.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("app:k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_on_hash_is_type_mismatch() {
        let (_, client) = memory_client();
        client.hset("h", "f", "v", None).await.unwrap();
        let err = client.get("h").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let (store, client) = memory_client();
        store.set_offline(true);
        let err = client.set("k", "v", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
