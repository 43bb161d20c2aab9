//! Redis store implementation using bb8 connection pool.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, FromRedisValue, IntoConnectionInfo, RedisError, Script, ServerError};

use crate::config::settings::RedisSettings;
use crate::error::{KvError, KvResult};
use crate::store::{KvStore, Ttl, ttl_millis};

type RedisPool = Pool<Client>;

/// HSET then PEXPIRE in one script. `redis.call` aborts on the first error,
/// so a failed field write never touches the key's expiry.
///
/// KEYS[1] = key, ARGV[1] = ttl in ms, ARGV[2..] = field/value pairs.
static HSET_WITH_EXPIRY: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
for i = 2, #ARGV, 2 do
    redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
redis.call('PEXPIRE', KEYS[1], ARGV[1])
return 1
",
    )
});

/// Redis-backed store with a bb8 pool of multiplexed connections.
///
/// Cloning the pool is cheap, and the pool is safe to share between tasks.
pub struct RedisStore {
    pool: RedisPool,
    ping_timeout: Duration,
}

impl RedisStore {
    /// Build the store without touching the network.
    ///
    /// Must be called inside a Tokio runtime; the pool spawns its reaper task.
    ///
    /// Connections are opened lazily on first use. Use [`RedisStore::connect`]
    /// or [`wait_until_ready`](crate::bootstrap::wait_until_ready) to verify
    /// the server is reachable.
    pub fn new(settings: &RedisSettings) -> KvResult<Self> {
        let invalid =
            |e: RedisError| KvError::InvalidArgument(format!("invalid redis settings: {}", e));

        // Older and proxied servers reject CLIENT SETINFO; never send it
        let info = settings
            .connection_url()
            .as_str()
            .into_connection_info()
            .map_err(invalid)?;
        let handshake = info.redis_settings().clone().set_skip_set_lib_name();
        let client = Client::open(info.set_redis_settings(handshake)).map_err(invalid)?;

        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .connection_timeout(Duration::from_secs(settings.connection_timeout))
            .retry_connection(false)
            .build_unchecked(client);

        Ok(Self {
            pool,
            ping_timeout: Duration::from_secs(settings.ping_timeout),
        })
    }

    /// Build the store and issue a single PING.
    pub async fn connect(settings: &RedisSettings) -> KvResult<Self> {
        let store = Self::new(settings)?;
        store.ping().await?;
        Ok(store)
    }

    async fn get_conn(&self, op: &'static str) -> KvResult<PooledConnection<'_, Client>> {
        self.pool
            .get()
            .await
            .map_err(|e| KvError::transport(op, e.to_string()))
    }

    async fn query<T>(&self, op: &'static str, key: &str, cmd: &Cmd) -> KvResult<T>
    where
        T: FromRedisValue + Send,
    {
        let mut conn: PooledConnection<'_, Client> = self.get_conn(op).await?;

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        cmd.query_async(conn_ref)
            .await
            .map_err(|e| classify(op, key, e))
    }
}

/// Map a client error onto the façade's error model.
///
/// Pipeline and script failures wrap the server reply, so every server
/// error carried by `err` is checked, not just the top-level code.
fn classify(op: &'static str, key: &str, err: RedisError) -> KvError {
    let message = err.to_string();
    let wrong_type = err
        .into_server_errors()
        .is_some_and(|errors| errors.iter().any(|(_, e)| is_wrong_type(e)));

    if wrong_type {
        KvError::type_mismatch(key, message)
    } else {
        KvError::transport(op, message)
    }
}

fn is_wrong_type(err: &ServerError) -> bool {
    // Before Redis 7 a script error arrives as `ERR ... WRONGTYPE ...`
    err.code() == "WRONGTYPE" || err.details().is_some_and(|d| d.contains("WRONGTYPE"))
}

#[async_trait]
impl KvStore for RedisStore {
    async fn ping(&self) -> KvResult<String> {
        let cmd = redis::cmd("PING");
        match tokio::time::timeout(self.ping_timeout, self.query::<String>("ping", "", &cmd)).await
        {
            Ok(reply) => reply,
            Err(_) => Err(KvError::transport(
                "ping",
                format!("no reply within {}s", self.ping_timeout.as_secs_f64()),
            )),
        }
    }

    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query("get", key, &cmd).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> KvResult<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        self.query::<()>("set", key, &cmd).await
    }

    async fn del(&self, keys: &[String]) -> KvResult<u64> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(keys);
        self.query("del", &keys.join(","), &cmd).await
    }

    async fn exists(&self, keys: &[String]) -> KvResult<u64> {
        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(keys);
        self.query("exists", &keys.join(","), &cmd).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        let mut cmd = redis::cmd("PEXPIRE");
        cmd.arg(key).arg(ttl_millis(ttl));
        self.query("expire", key, &cmd).await
    }

    async fn ttl(&self, key: &str) -> KvResult<Option<Ttl>> {
        let mut cmd = redis::cmd("PTTL");
        cmd.arg(key);
        let reply: i64 = self.query("ttl", key, &cmd).await?;
        Ok(Ttl::from_pttl(reply))
    }

    async fn hset(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> KvResult<()> {
        let Some(ttl) = ttl else {
            let mut cmd = redis::cmd("HSET");
            cmd.arg(key);
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
            return self.query::<()>("hset", key, &cmd).await;
        };

        let mut invocation = HSET_WITH_EXPIRY.key(key);
        invocation.arg(ttl_millis(ttl));
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn("hset").await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        invocation
            .invoke_async::<()>(conn_ref)
            .await
            .map_err(|e| classify("hset", key, e))
    }

    async fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(key).arg(field);
        self.query("hget", key, &cmd).await
    }

    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        self.query("hgetall", key, &cmd).await
    }

    async fn hexists(&self, key: &str, field: &str) -> KvResult<bool> {
        let mut cmd = redis::cmd("HEXISTS");
        cmd.arg(key).arg(field);
        self.query("hexists", key, &cmd).await
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> KvResult<u64> {
        let mut cmd = redis::cmd("HDEL");
        cmd.arg(key).arg(fields);
        self.query("hdel", key, &cmd).await
    }

    async fn sadd(&self, key: &str, members: &[String]) -> KvResult<u64> {
        let mut cmd = redis::cmd("SADD");
        cmd.arg(key).arg(members);
        self.query("sadd", key, &cmd).await
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut cmd = redis::cmd("SMEMBERS");
        cmd.arg(key);
        self.query("smembers", key, &cmd).await
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> KvResult<(u64, Vec<String>)> {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count);
        self.query("scan", pattern, &cmd).await
    }

    async fn dbsize(&self) -> KvResult<u64> {
        self.query("dbsize", "", &redis::cmd("DBSIZE")).await
    }

    async fn info(&self, sections: &[String]) -> KvResult<String> {
        let mut cmd = redis::cmd("INFO");
        cmd.arg(sections);
        self.query("info", "", &cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::net::tcp::OwnedReadHalf;

    type CommandLog = Arc<Mutex<Vec<Vec<String>>>>;

    const WRONGTYPE_REPLY: &str =
        "-WRONGTYPE Operation against a key holding the wrong kind of value\r\n";

    /// Minimal RESP2 server on a random port. Records every command and
    /// answers each one with `reply`.
    async fn fake_server(reply: fn(&[String]) -> &'static str) -> (String, CommandLog) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let log = CommandLog::default();

        let seen = log.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let seen = seen.clone();
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut reader = BufReader::new(read);
                    while let Some(command) = read_command(&mut reader).await {
                        let answer = reply(&command);
                        seen.lock().unwrap().push(command);
                        if write.write_all(answer.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        (address, log)
    }

    async fn read_command(reader: &mut BufReader<OwnedReadHalf>) -> Option<Vec<String>> {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

        let mut command = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            reader.read_line(&mut line).await.ok()?;
            let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
            let mut buf = vec![0; len + 2];
            reader.read_exact(&mut buf).await.ok()?;
            buf.truncate(len);
            command.push(String::from_utf8_lossy(&buf).into_owned());
        }
        Some(command)
    }

    fn command_name(command: &[String]) -> String {
        command.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default()
    }

    fn store_for(address: String) -> RedisStore {
        RedisStore::new(&RedisSettings {
            address,
            ..Default::default()
        })
        .unwrap()
    }

    fn names(log: &CommandLog) -> Vec<String> {
        log.lock().unwrap().iter().map(|c| command_name(c)).collect()
    }

    #[tokio::test]
    async fn test_new_does_not_connect() {
        let settings = RedisSettings {
            address: "127.0.0.1:1".to_string(),
            ..Default::default()
        };
        assert!(RedisStore::new(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_new_rejects_garbage_address() {
        let settings = RedisSettings {
            address: "not a host:port".to_string(),
            ..Default::default()
        };
        let err = RedisStore::new(&settings).err().expect("should reject address");
        assert!(matches!(err, KvError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_connection_skips_client_setinfo() {
        fn reply(command: &[String]) -> &'static str {
            match command_name(command).as_str() {
                "PING" => "+PONG\r\n",
                _ => "+OK\r\n",
            }
        }
        let (address, log) = fake_server(reply).await;
        let store = store_for(address);

        assert_eq!(store.ping().await.unwrap(), "PONG");
        let seen = names(&log);
        assert!(seen.contains(&"PING".to_string()));
        assert!(!seen.contains(&"CLIENT".to_string()), "sent {:?}", seen);
    }

    #[tokio::test]
    async fn test_hset_with_ttl_on_wrong_type_leaves_expiry_alone() {
        fn reply(command: &[String]) -> &'static str {
            match command_name(command).as_str() {
                "PING" => "+PONG\r\n",
                "EVALSHA" | "EVAL" => WRONGTYPE_REPLY,
                _ => "+OK\r\n",
            }
        }
        let (address, log) = fake_server(reply).await;
        let store = store_for(address);

        let err = store
            .hset(
                "strkey",
                &[("f".to_string(), "v".to_string())],
                Some(Duration::from_secs(60)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KvError::TypeMismatch { .. }), "got {:?}", err);

        // The expiry only runs inside the script, never as its own command
        let seen = names(&log);
        assert!(seen.contains(&"EVALSHA".to_string()));
        assert!(
            !seen.iter().any(|c| c == "PEXPIRE" || c == "MULTI"),
            "sent {:?}",
            seen
        );
    }

    #[tokio::test]
    async fn test_script_error_from_older_server_is_type_mismatch() {
        fn reply(command: &[String]) -> &'static str {
            match command_name(command).as_str() {
                "PING" => "+PONG\r\n",
                "EVALSHA" | "EVAL" => {
                    "-ERR Error running script (call to f_1): @user_script:3: WRONGTYPE Operation against a key holding the wrong kind of value\r\n"
                }
                _ => "+OK\r\n",
            }
        }
        let (address, _log) = fake_server(reply).await;
        let store = store_for(address);

        let err = store
            .hset(
                "strkey",
                &[("f".to_string(), "v".to_string())],
                Some(Duration::from_secs(1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KvError::TypeMismatch { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_plain_wrong_type_reply_is_type_mismatch() {
        fn reply(command: &[String]) -> &'static str {
            match command_name(command).as_str() {
                "PING" => "+PONG\r\n",
                "GET" => WRONGTYPE_REPLY,
                _ => "+OK\r\n",
            }
        }
        let (address, _log) = fake_server(reply).await;
        let store = store_for(address);

        let err = store.get("h").await.unwrap_err();
        assert!(matches!(err, KvError::TypeMismatch { .. }), "got {:?}", err);
    }
}
