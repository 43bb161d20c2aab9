use thiserror::Error;

/// Error returned by every key-value operation.
///
/// A missing key, a value of the wrong type and a failed round trip are
/// distinct variants, so callers never have to guess from an empty reply.
#[derive(Error, Debug)]
pub enum KvError {
    /// The key (or hash field) does not exist
    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// The key holds a value of another type (server replied WRONGTYPE)
    #[error("Wrong type for key {key}: {message}")]
    TypeMismatch { key: String, message: String },

    /// Pool checkout, IO, timeout or any other server-side failure
    #[error("Transport error during {op}: {message}")]
    Transport { op: &'static str, message: String },

    /// A structured value could not be serialized
    #[error("Failed to encode value for {key}: {message}")]
    Encode { key: String, message: String },

    /// A stored value could not be decoded into the requested type
    #[error("Failed to decode value for {key}: {message}")]
    Decode { key: String, message: String },

    /// The caller passed arguments the command cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Flat classification of [`KvError`], handy for metrics and match arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TypeMismatch,
    Transport,
    Codec,
    InvalidArgument,
}

impl KvError {
    pub fn not_found(key: impl Into<String>) -> Self {
        KvError::NotFound { key: key.into() }
    }

    pub fn type_mismatch(key: impl Into<String>, message: impl Into<String>) -> Self {
        KvError::TypeMismatch {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn transport(op: &'static str, message: impl Into<String>) -> Self {
        KvError::Transport {
            op,
            message: message.into(),
        }
    }

    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        KvError::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn encode(key: impl Into<String>, message: impl Into<String>) -> Self {
        KvError::Encode {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KvError::NotFound { .. } => ErrorKind::NotFound,
            KvError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            KvError::Transport { .. } => ErrorKind::Transport,
            KvError::Encode { .. } | KvError::Decode { .. } => ErrorKind::Codec,
            KvError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound { .. })
    }
}

/// Type alias for Result with KvError to simplify function signatures
pub type KvResult<T> = Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(KvError::not_found("a").kind(), ErrorKind::NotFound);
        assert_eq!(
            KvError::type_mismatch("a", "WRONGTYPE").kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(KvError::transport("get", "eof").kind(), ErrorKind::Transport);
        assert_eq!(KvError::decode("a", "bad utf-8").kind(), ErrorKind::Codec);
        assert_eq!(KvError::encode("a", "bad map").kind(), ErrorKind::Codec);
        assert_eq!(
            KvError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(KvError::not_found("user:1").is_not_found());
        assert!(!KvError::transport("get", "timeout").is_not_found());
    }

    #[test]
    fn test_display_includes_context() {
        let err = KvError::transport("hgetall", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error during hgetall: connection refused"
        );
        assert_eq!(
            KvError::not_found("user:1").to_string(),
            "Key not found: user:1"
        );
    }
}
