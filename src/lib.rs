//! Fusion-KV Library
//!
//! Typed key-value façade over a Redis-compatible cache: strings, sets,
//! hashes, expiry, SCAN-based key listing and server introspection, plus
//! layered configuration, logger setup and a cancellable startup
//! connection loop.
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = fusion_kv::config::ConfigLoader::new()?.load()?;
//! let client = fusion_kv::bootstrap::connect(&settings, &CancellationToken::new()).await?;
//!
//! client.set("greeting", "hello", Some(Duration::from_secs(60))).await?;
//! assert_eq!(client.get("greeting").await?, "hello");
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod store;
pub mod utils;

pub use bootstrap::{BootstrapError, RetryPolicy, connect_with_retry};
pub use client::KvClient;
pub use error::{ErrorKind, KvError, KvResult};
pub use store::{KvStore, MemoryStore, RedisStore, Ttl};
pub use utils::info::ServerInfo;
