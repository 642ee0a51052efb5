//! Pool Construction
//!
//! Opens the `redis::Client` for a config and sizes the bb8 pool around it.
//! The `redis` crate's `bb8` feature supplies the manager: multiplexed
//! connections, checked with PING on borrow.

use std::time::Duration;

use bb8::ManageConnection;
use redis::{Client, RedisError};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{CacheError, Result};
use crate::pool::ConnectionFailures;

/// Pool of connections to the store.
pub type StorePool = bb8::Pool<Client>;

/// How long a checkout waits for a free connection while the store is healthy.
///
/// Long enough that an exhausted pool behaves as a blocking wait. Dial and
/// PING failures end the wait early through [`ConnectionFailures`].
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24);

/// Opens a client for the address and credentials in `config`.
///
/// Nothing is dialed yet.
pub fn open_client(config: &ClientConfig) -> Result<Client> {
    let url = config.connection_url()?;
    Client::open(url.as_str())
        .map_err(|e| CacheError::Config(format!("invalid address '{}': {}", config.address, e)))
}

// == Build Pool ==
/// Pool settings derived from `config`, reporting failures to `failures`.
pub fn pool_builder<M>(config: &ClientConfig, failures: &ConnectionFailures) -> bb8::Builder<M>
where
    M: ManageConnection<Error = RedisError>,
{
    bb8::Pool::builder()
        .max_size(config.max_active)
        .min_idle(Some(config.max_idle.min(config.max_active)))
        .test_on_check_out(true)
        .retry_connection(false)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .error_sink(Box::new(failures.clone()))
}

/// Builds a pool sized from `config`, checking connections with PING on borrow.
///
/// The pool opens its idle connections before returning, so an unreachable
/// store fails here with [`CacheError::Connection`].
pub async fn build_pool(config: &ClientConfig, failures: &ConnectionFailures) -> Result<StorePool> {
    let client = open_client(config)?;

    let pool = pool_builder(config, failures)
        .build(client)
        .await
        .map_err(|e| CacheError::Connection {
            context: format!("dial {}", config.address),
            source: e,
        })?;

    info!(
        "Connection pool ready: address={}, max_active={}, idle={}",
        config.address,
        config.max_active,
        config.max_idle.min(config.max_active)
    );
    Ok(pool)
}
