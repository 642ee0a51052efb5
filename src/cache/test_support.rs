//! Test Helpers
//!
//! Pool managers over `redis_test` mock connections, shared by the cache unit
//! and property tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bb8::ManageConnection;
use redis::{RedisError, Value};
use redis_test::MockRedisConnection;

// == Mock Manager ==
/// Hands out clones of one mock connection; every clone shares the
/// expected command queue.
pub(crate) struct MockManager {
    pub(crate) conn: MockRedisConnection,
}

impl ManageConnection for MockManager {
    type Connection = MockRedisConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        Ok(self.conn.clone())
    }

    async fn is_valid(&self, _: &mut Self::Connection) -> Result<(), Self::Error> {
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

// == Switchable Manager ==
/// Mock manager whose store can go down after the pool is built.
///
/// While `down` is set, dials and borrow-time PINGs are refused. Setting
/// `stale` fails the next PING only, as a connection the server closed would.
pub(crate) struct SwitchableManager {
    pub(crate) conn: MockRedisConnection,
    pub(crate) down: Arc<AtomicBool>,
    pub(crate) stale: Arc<AtomicBool>,
}

impl SwitchableManager {
    pub(crate) fn new(conn: MockRedisConnection) -> Self {
        Self {
            conn,
            down: Arc::new(AtomicBool::new(false)),
            stale: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ManageConnection for SwitchableManager {
    type Connection = MockRedisConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        if self.down.load(Ordering::SeqCst) {
            return Err(io_error(io::ErrorKind::ConnectionRefused));
        }
        Ok(self.conn.clone())
    }

    async fn is_valid(&self, _: &mut Self::Connection) -> Result<(), Self::Error> {
        if self.down.load(Ordering::SeqCst) {
            return Err(io_error(io::ErrorKind::ConnectionRefused));
        }
        if self.stale.swap(false, Ordering::SeqCst) {
            return Err(io_error(io::ErrorKind::BrokenPipe));
        }
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

// == Errors ==
pub(crate) fn io_error(kind: io::ErrorKind) -> RedisError {
    RedisError::from(io::Error::new(kind, "connection lost"))
}

/// Parses a RESP error line into the error the store would return.
pub(crate) fn server_error(reply: &[u8]) -> RedisError {
    redis::parse_redis_value(reply)
        .and_then(Value::extract_error)
        .unwrap_err()
}
