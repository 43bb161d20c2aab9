mod kv_error;

pub use kv_error::{ErrorKind, KvError, KvResult};
