//! Error types for the cache client
//!
//! Provides unified error handling using thiserror.

use redis::RedisError;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache client.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation attempted on a client that has no pool
    #[error("cache was not initialized")]
    NotInitialized,

    /// The store could not be reached, or the pool could not hand out a connection
    #[error("connection error ({context}): {source}")]
    Connection {
        context: String,
        #[source]
        source: RedisError,
    },

    /// The pool gave up waiting for a free connection
    #[error("connection error ({0}): timed out waiting for a pooled connection")]
    PoolTimeout(String),

    /// The store replied with an error to a command
    #[error("failed to run '{command}' on key '{key}': {source}")]
    Command {
        command: &'static str,
        key: String,
        #[source]
        source: RedisError,
    },

    /// A stored value could not be converted to the requested type
    #[error("cannot convert value of key '{key}' to {target}: {reason}")]
    Conversion {
        key: String,
        target: &'static str,
        reason: String,
    },

    /// The store rejected a parameter of the command
    #[error("invalid argument to '{command}' on key '{key}': {reason}")]
    InvalidArgument {
        command: &'static str,
        key: String,
        reason: String,
    },

    /// The client configuration could not be turned into a connection target
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    // == Classify ==
    /// Wraps a store error with the command and effective key it was raised for.
    ///
    /// Transport failures become [`CacheError::Connection`]. Server replies
    /// rejecting an expire time become [`CacheError::InvalidArgument`], every
    /// other failure is a [`CacheError::Command`].
    pub fn from_store(command: &'static str, key: &str, err: RedisError) -> Self {
        if is_transport_error(&err) {
            return CacheError::Connection {
                context: format!("{} '{}'", command, key),
                source: err,
            };
        }

        if let Some(reason) = invalid_argument_reason(&err) {
            return CacheError::InvalidArgument {
                command,
                key: key.to_string(),
                reason,
            };
        }

        CacheError::Command {
            command,
            key: key.to_string(),
            source: err,
        }
    }

    /// Returns true if this error came from the transport rather than the store.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            CacheError::Connection { .. } | CacheError::PoolTimeout(_)
        )
    }
}

fn is_transport_error(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
}

fn invalid_argument_reason(err: &RedisError) -> Option<String> {
    err.code()?;
    let detail = err.detail()?;
    if detail.to_ascii_lowercase().contains("invalid expire time") {
        Some(detail.to_string())
    } else {
        None
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache client.
pub type Result<T> = std::result::Result<T, CacheError>;
