//! In-process store implementation.
//!
//! Mirrors the Redis command semantics the façade relies on (type checks,
//! expiry, cursor-based SCAN) so the client can be exercised without a
//! server. Expired keys are dropped lazily when touched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;

use crate::error::{KvError, KvResult};
use crate::store::{KvStore, Ttl};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

enum Data {
    Str(Vec<u8>),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

struct Entry {
    data: Data,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

// Ordered so a SCAN cursor can resume after the last key it returned
type Entries = BTreeMap<String, Entry>;

/// In-memory store for tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
    offline: AtomicBool,
    failures_left: AtomicU32,
    cursors: Mutex<HashMap<u64, String>>,
    last_cursor: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `calls` operations with a transport error.
    pub fn fail_next(&self, calls: u32) {
        self.failures_left.store(calls, Ordering::SeqCst);
    }

    fn lock(&self, op: &'static str) -> KvResult<MutexGuard<'_, Entries>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(KvError::transport(op, "store is offline"));
        }
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(KvError::transport(op, "injected failure"));
        }
        self.entries
            .lock()
            .map_err(|e| KvError::transport(op, e.to_string()))
    }

    /// Hand out a cursor that resumes after `last_key`.
    fn open_cursor(&self, last_key: String) -> KvResult<u64> {
        let id = self
            .last_cursor
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
            .max(1);
        self.cursors
            .lock()
            .map_err(|e| KvError::transport("scan", e.to_string()))?
            .insert(id, last_key);
        Ok(id)
    }

    /// Consume a cursor, returning the key to resume after.
    fn take_cursor(&self, cursor: u64) -> KvResult<String> {
        self.cursors
            .lock()
            .map_err(|e| KvError::transport("scan", e.to_string()))?
            .remove(&cursor)
            .ok_or_else(|| KvError::InvalidArgument(format!("unknown scan cursor {}", cursor)))
    }
}

/// Live entry for `key`, evicting it first if it has expired.
fn live<'a>(entries: &'a mut Entries, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn purge_expired(entries: &mut Entries, now: Instant) {
    entries.retain(|_, e| !e.is_expired(now));
}

/// Translate a Redis glob (`*`, `?`, `[...]`, `\` escapes) into an anchored regex.
fn glob_to_regex(pattern: &str) -> KvResult<Regex> {
    let mut re = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    re.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                }
            }
            '[' => {
                re.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    re.push('^');
                }
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '-' => re.push('-'),
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                push_class_char(&mut re, escaped);
                            }
                        }
                        other => push_class_char(&mut re, other),
                    }
                }
                if !closed {
                    return Err(KvError::InvalidArgument(format!(
                        "unterminated character class in pattern '{}'",
                        pattern
                    )));
                }
                re.push(']');
            }
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');

    Regex::new(&re)
        .map_err(|e| KvError::InvalidArgument(format!("invalid pattern '{}': {}", pattern, e)))
}

fn push_class_char(re: &mut String, c: char) {
    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        re.push('\\');
    }
    re.push(c);
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn ping(&self) -> KvResult<String> {
        let _guard = self.lock("ping")?;
        Ok("PONG".to_string())
    }

    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let mut entries = self.lock("get")?;
        match live(&mut entries, key, Instant::now()) {
            None => Ok(None),
            Some(Entry {
                data: Data::Str(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> KvResult<()> {
        let mut entries = self.lock("set")?;
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        entries.insert(
            key.to_string(),
            Entry {
                data: Data::Str(value.to_vec()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> KvResult<u64> {
        let mut entries = self.lock("del")?;
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            if live(&mut entries, key, now).is_some() {
                entries.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, keys: &[String]) -> KvResult<u64> {
        let mut entries = self.lock("exists")?;
        let now = Instant::now();
        let mut count = 0;
        for key in keys {
            if live(&mut entries, key, now).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        let mut entries = self.lock("expire")?;
        let now = Instant::now();
        let Some(entry) = live(&mut entries, key, now) else {
            return Ok(false);
        };
        if ttl.is_zero() {
            entries.remove(key);
        } else {
            entry.expires_at = now.checked_add(ttl);
        }
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> KvResult<Option<Ttl>> {
        let mut entries = self.lock("ttl")?;
        let now = Instant::now();
        Ok(live(&mut entries, key, now).map(|entry| match entry.expires_at {
            None => Ttl::Persistent,
            Some(at) => Ttl::Expires(at.saturating_duration_since(now)),
        }))
    }

    async fn hset(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> KvResult<()> {
        let mut entries = self.lock("hset")?;
        let now = Instant::now();

        if live(&mut entries, key, now).is_none() {
            entries.insert(
                key.to_string(),
                Entry {
                    data: Data::Hash(HashMap::new()),
                    expires_at: None,
                },
            );
        }
        let Some(entry) = entries.get_mut(key) else {
            return Err(KvError::transport("hset", "entry vanished"));
        };
        let Data::Hash(hash) = &mut entry.data else {
            return Err(KvError::type_mismatch(key, WRONGTYPE));
        };

        hash.extend(fields.iter().cloned());
        if let Some(ttl) = ttl {
            entry.expires_at = now.checked_add(ttl);
        }
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        let mut entries = self.lock("hget")?;
        match live(&mut entries, key, Instant::now()) {
            None => Ok(None),
            Some(Entry {
                data: Data::Hash(hash),
                ..
            }) => Ok(hash.get(field).cloned()),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
        }
    }

    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let mut entries = self.lock("hgetall")?;
        match live(&mut entries, key, Instant::now()) {
            None => Ok(HashMap::new()),
            Some(Entry {
                data: Data::Hash(hash),
                ..
            }) => Ok(hash.clone()),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
        }
    }

    async fn hexists(&self, key: &str, field: &str) -> KvResult<bool> {
        let mut entries = self.lock("hexists")?;
        match live(&mut entries, key, Instant::now()) {
            None => Ok(false),
            Some(Entry {
                data: Data::Hash(hash),
                ..
            }) => Ok(hash.contains_key(field)),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
        }
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> KvResult<u64> {
        let mut entries = self.lock("hdel")?;
        let (removed, now_empty) = match live(&mut entries, key, Instant::now()) {
            None => return Ok(0),
            Some(Entry {
                data: Data::Hash(hash),
                ..
            }) => {
                let removed = fields.iter().filter(|f| hash.remove(*f).is_some()).count();
                (removed as u64, hash.is_empty())
            }
            Some(_) => return Err(KvError::type_mismatch(key, WRONGTYPE)),
        };
        // Redis drops a hash once its last field is gone
        if now_empty {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> KvResult<u64> {
        let mut entries = self.lock("sadd")?;
        if live(&mut entries, key, Instant::now()).is_none() {
            entries.insert(
                key.to_string(),
                Entry {
                    data: Data::Set(HashSet::new()),
                    expires_at: None,
                },
            );
        }
        match entries.get_mut(key) {
            Some(Entry {
                data: Data::Set(set),
                ..
            }) => Ok(members.iter().filter(|m| set.insert((*m).clone())).count() as u64),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
            None => Err(KvError::transport("sadd", "entry vanished")),
        }
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut entries = self.lock("smembers")?;
        match live(&mut entries, key, Instant::now()) {
            None => Ok(Vec::new()),
            Some(Entry {
                data: Data::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(KvError::type_mismatch(key, WRONGTYPE)),
        }
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> KvResult<(u64, Vec<String>)> {
        let matcher = glob_to_regex(pattern)?;
        let mut entries = self.lock("scan")?;
        purge_expired(&mut entries, Instant::now());

        let resume_after = match cursor {
            0 => None,
            n => Some(self.take_cursor(n)?),
        };
        let lower = match resume_after.as_deref() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };

        let mut walk = entries
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(key, _)| key);
        let visited: Vec<&String> = walk.by_ref().take(count.max(1)).collect();
        let more = walk.next().is_some();

        let batch = visited
            .iter()
            .filter(|k| matcher.is_match(k))
            .map(|k| (*k).clone())
            .collect();
        let next = match visited.last() {
            Some(last) if more => self.open_cursor((*last).clone())?,
            _ => 0,
        };

        Ok((next, batch))
    }

    async fn dbsize(&self) -> KvResult<u64> {
        let mut entries = self.lock("dbsize")?;
        purge_expired(&mut entries, Instant::now());
        Ok(entries.len() as u64)
    }

    async fn info(&self, sections: &[String]) -> KvResult<String> {
        let mut entries = self.lock("info")?;
        purge_expired(&mut entries, Instant::now());

        let wants = |name: &str| {
            sections.is_empty()
                || sections
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(name) || s.eq_ignore_ascii_case("all"))
        };

        let mut out = String::new();
        if wants("server") {
            out.push_str("# Server\r\n");
            out.push_str("redis_mode:standalone\r\n");
            out.push_str("server_name:fusion-kv-memory\r\n");
            out.push_str("\r\n");
        }
        if wants("keyspace") && !entries.is_empty() {
            let expires = entries.values().filter(|e| e.expires_at.is_some()).count();
            out.push_str("# Keyspace\r\n");
            out.push_str(&format!("db0:keys={},expires={}\r\n", entries.len(), expires));
        }
        Ok(out)
    }
}
