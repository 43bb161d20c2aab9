use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvClient, effective_ttl};
use crate::error::{KvError, KvResult};

impl KvClient {
    /// Write one hash field. A non-zero `ttl` applies to the whole key and is
    /// set atomically with the field.
    pub async fn hset(
        &self,
        key: &str,
        field: &str,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> KvResult<()> {
        let full = self.full_key(key);
        let fields = [(field.to_string(), value.into())];
        let result = self.store.hset(&full, &fields, effective_ttl(ttl)).await;
        self.observe("hset", &full, result)
    }

    /// JSON-encode `value` into one hash field.
    pub async fn hset_obj<T>(
        &self,
        key: &str,
        field: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> KvResult<()>
    where
        T: Serialize + ?Sized,
    {
        let full = self.full_key(key);
        let result = match serde_json::to_string(value) {
            Ok(encoded) => {
                let fields = [(field.to_string(), encoded)];
                self.store.hset(&full, &fields, effective_ttl(ttl)).await
            }
            Err(e) => Err(KvError::encode(&full, e.to_string())),
        };
        self.observe("hset_obj", &full, result)
    }

    /// Write several hash fields in one round trip.
    ///
    /// An empty `fields` is a no-op and never reaches the store.
    pub async fn hmset<I, F, V>(&self, key: &str, fields: I, ttl: Option<Duration>) -> KvResult<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        let fields: Vec<(String, String)> = fields
            .into_iter()
            .map(|(f, v)| (f.into(), v.into()))
            .collect();
        if fields.is_empty() {
            return Ok(());
        }

        let full = self.full_key(key);
        let result = self.store.hset(&full, &fields, effective_ttl(ttl)).await;
        self.observe("hmset", &full, result)
    }

    /// Read one field. `NotFound` if the key or the field is missing.
    pub async fn hget(&self, key: &str, field: &str) -> KvResult<String> {
        let full = self.full_key(key);
        let result = self.read_field(&full, field).await;
        self.observe("hget", &full, result)
    }

    /// Read one field and JSON-decode it into `T`.
    pub async fn hget_obj<T: DeserializeOwned>(&self, key: &str, field: &str) -> KvResult<T> {
        let full = self.full_key(key);
        let result = match self.read_field(&full, field).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| KvError::decode(&full, e.to_string())),
            Err(e) => Err(e),
        };
        self.observe("hget_obj", &full, result)
    }

    /// All fields of a hash. A missing key is `NotFound`, since Redis never
    /// keeps an empty hash.
    pub async fn hget_all(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let full = self.full_key(key);
        let result = match self.store.hgetall(&full).await {
            Ok(fields) if fields.is_empty() => Err(KvError::not_found(&full)),
            other => other,
        };
        self.observe("hget_all", &full, result)
    }

    pub async fn hexists(&self, key: &str, field: &str) -> KvResult<bool> {
        let full = self.full_key(key);
        let result = self.store.hexists(&full, field).await;
        self.observe("hexists", &full, result)
    }

    /// Remove fields, returning how many existed.
    pub async fn hdel<S: AsRef<str>>(&self, key: &str, fields: &[S]) -> KvResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let full = self.full_key(key);
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        let result = self.store.hdel(&full, &fields).await;
        self.observe("hdel", &full, result)
    }

    async fn read_field(&self, full: &str, field: &str) -> KvResult<String> {
        self.store
            .hget(full, field)
            .await?
            .ok_or_else(|| KvError::not_found(format!("{}#{}", full, field)))
    }
}
