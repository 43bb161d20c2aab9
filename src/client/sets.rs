use super::KvClient;
use crate::error::KvResult;

impl KvClient {
    /// Add members to a set, returning how many were new.
    pub async fn sset<S: AsRef<str>>(&self, key: &str, members: &[S]) -> KvResult<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        let full = self.full_key(key);
        let members: Vec<String> = members.iter().map(|m| m.as_ref().to_string()).collect();
        let result = self.store.sadd(&full, &members).await;
        self.observe("sset", &full, result)
    }

    /// Members of a set in no particular order; empty for a missing key.
    pub async fn sget(&self, key: &str) -> KvResult<Vec<String>> {
        let full = self.full_key(key);
        let result = self.store.smembers(&full).await;
        self.observe("sget", &full, result)
    }
}
