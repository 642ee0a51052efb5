//! Cache Client Module
//!
//! Namespaced, typed operations forwarded to a pooled store connection.

use std::fmt;
use std::time::Duration;

use bb8::{ManageConnection, Pool, PooledConnection, RunError};
use redis::aio::ConnectionLike;
use redis::{Cmd, FromRedisValue, RedisError, ToRedisArgs, Value};
use tracing::{debug, info, warn};

use crate::cache::{namespaced_key, FromReply, PoolStats, DEFAULT_SEPARATOR};
use crate::config::{ClientConfig, Credentials};
use crate::error::{CacheError, Result};
use crate::pool::{build_pool, ConnectionFailures};

/// Pattern matching every key
const MATCH_ALL: &str = "*";

// == Cache Client ==
/// Namespaced key-value client over a connection pool.
///
/// A client without a pool is in the "not initialized" state: every operation
/// returns [`CacheError::NotInitialized`]. Cloning shares the pool.
pub struct CacheClient<M: ManageConnection = redis::Client> {
    /// Connection pool, `None` until configured
    pool: Option<Pool<M>>,
    /// Failures the pool reported to its error sink
    failures: Option<ConnectionFailures>,
    /// Placed between namespace segments and before the base key
    separator: String,
}

impl CacheClient<redis::Client> {
    // == Constructors ==
    /// Connects to the store at `address` with the default pool settings.
    ///
    /// `credentials` holds zero, one or two strings: no auth, password only,
    /// or username and password.
    ///
    /// # Example
    /// ```no_run
    /// # async fn run() -> ns_cache::error::Result<()> {
    /// use ns_cache::CacheClient;
    ///
    /// let cache = CacheClient::new("localhost:6379", &["app", "secret"]).await?;
    /// cache.set("greeting", "hello", &["app"]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new<S: AsRef<str>>(address: &str, credentials: &[S]) -> Result<Self> {
        let config = ClientConfig::new(address, Credentials::from_parts(credentials));
        Self::connect(&config).await
    }

    /// Connects using every setting in `config`, including the separator.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let failures = ConnectionFailures::new();
        let pool = build_pool(config, &failures).await?;
        info!("Cache client connected to {}", config.address);
        Ok(Self::from_pool(pool)
            .with_failures(failures)
            .with_separator(config.separator.clone()))
    }
}

impl<M: ManageConnection> CacheClient<M> {
    /// Wraps an existing pool, using the default separator.
    ///
    /// Without [`with_failures`](Self::with_failures) a checkout only ends
    /// when the pool hands out a connection or its timeout fires.
    pub fn from_pool(pool: Pool<M>) -> Self {
        Self {
            pool: Some(pool),
            failures: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Watches `failures`, the error sink the pool was built with, so that a
    /// checkout fails with [`CacheError::Connection`] once the store stops
    /// answering.
    pub fn with_failures(mut self, failures: ConnectionFailures) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Creates a client with no pool. Every operation on it fails with
    /// [`CacheError::NotInitialized`].
    pub fn uninitialized() -> Self {
        Self {
            pool: None,
            failures: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Replaces the namespace separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The underlying pool, if the client was initialized.
    pub fn pool(&self) -> Option<&Pool<M>> {
        self.pool.as_ref()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Current connection counts, or `None` when not initialized.
    pub fn stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().map(|pool| PoolStats::from(pool.state()))
    }

    /// Effective store key for `key` under `namespace`.
    pub fn key(&self, key: &str, namespace: &[&str]) -> String {
        namespaced_key(&self.separator, key, namespace).into_owned()
    }
}

impl<M> CacheClient<M>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    // == Ping ==
    /// Checks that the store answers.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.checkout("PING").await?;
        run::<M, ()>(&mut conn, &redis::cmd("PING"), "PING", "").await
    }

    // == Get ==
    /// Returns the raw reply stored under `key`, `Value::Nil` when absent.
    pub async fn get(&self, key: &str, namespace: &[&str]) -> Result<Value> {
        let key = self.key(key, namespace);
        self.fetch(&key).await
    }

    /// Reads `key` and converts it to `T`. Absent keys are `Ok(None)`.
    pub async fn get_as<T: FromReply>(&self, key: &str, namespace: &[&str]) -> Result<Option<T>> {
        let key = self.key(key, namespace);
        let raw = self.fetch(&key).await?;
        T::from_reply(raw).map_err(|reason| {
            warn!("Conversion of '{}' to {} failed: {}", key, T::TARGET, reason);
            CacheError::Conversion {
                key,
                target: T::TARGET,
                reason,
            }
        })
    }

    pub async fn get_bool(&self, key: &str, namespace: &[&str]) -> Result<Option<bool>> {
        self.get_as(key, namespace).await
    }

    pub async fn get_bytes(&self, key: &str, namespace: &[&str]) -> Result<Option<Vec<u8>>> {
        self.get_as(key, namespace).await
    }

    pub async fn get_int(&self, key: &str, namespace: &[&str]) -> Result<Option<i64>> {
        self.get_as(key, namespace).await
    }

    pub async fn get_string(&self, key: &str, namespace: &[&str]) -> Result<Option<String>> {
        self.get_as(key, namespace).await
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any previous value. No expiry.
    pub async fn set<V>(&self, key: &str, value: V, namespace: &[&str]) -> Result<()>
    where
        V: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.checkout("SET").await?;
        let key = self.key(key, namespace);
        debug!("SET {}", key);

        let mut cmd = redis::cmd("SET");
        cmd.arg(&key).arg(value);
        run::<M, ()>(&mut conn, &cmd, "SET", &key).await
    }

    /// Stores `value` under `key` with an expiry of `ttl`.
    ///
    /// The TTL is truncated to whole seconds, so anything below one second is
    /// sent as `0` and rejected by the store as [`CacheError::InvalidArgument`].
    pub async fn set_ex<V>(
        &self,
        key: &str,
        value: V,
        ttl: Duration,
        namespace: &[&str],
    ) -> Result<()>
    where
        V: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.checkout("SETEX").await?;
        let key = self.key(key, namespace);
        let seconds = ttl.as_secs();
        debug!("SETEX {} {}s", key, seconds);

        let mut cmd = redis::cmd("SETEX");
        cmd.arg(&key).arg(seconds).arg(value);
        run::<M, ()>(&mut conn, &cmd, "SETEX", &key).await
    }

    // == Exists ==
    pub async fn exists(&self, key: &str, namespace: &[&str]) -> Result<bool> {
        let mut conn = self.checkout("EXISTS").await?;
        let key = self.key(key, namespace);
        debug!("EXISTS {}", key);

        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(&key);
        let count: i64 = run::<M, i64>(&mut conn, &cmd, "EXISTS", &key).await?;
        Ok(count > 0)
    }

    // == Delete ==
    /// Removes `key`. Succeeds whether or not the key existed.
    pub async fn delete(&self, key: &str, namespace: &[&str]) -> Result<()> {
        let mut conn = self.checkout("DEL").await?;
        let key = self.key(key, namespace);
        debug!("DEL {}", key);

        let mut cmd = redis::cmd("DEL");
        cmd.arg(&key);
        run::<M, ()>(&mut conn, &cmd, "DEL", &key).await
    }

    // == Get Keys ==
    /// Lists every key matching the glob `pattern` under `namespace`.
    ///
    /// Pages are concatenated in the order the store returns them. The store
    /// may report a key on more than one page; duplicates are kept.
    pub async fn get_keys(&self, pattern: &str, namespace: &[&str]) -> Result<Vec<String>> {
        let mut conn = self.checkout("SCAN").await?;
        let pattern = self.key(pattern, namespace);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, page) = scan_page::<M>(&mut conn, cursor, &pattern).await?;
            keys.extend(page);

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!("SCAN {} found {} keys", pattern, keys.len());
        Ok(keys)
    }

    pub async fn get_all_keys(&self, namespace: &[&str]) -> Result<Vec<String>> {
        self.get_keys(MATCH_ALL, namespace).await
    }

    // == Clear ==
    /// Unlinks every key matching the glob `pattern` under `namespace`.
    ///
    /// Each page is unlinked before the next one is fetched. On error the
    /// loop stops; pages already unlinked stay deleted.
    pub async fn clear(&self, pattern: &str, namespace: &[&str]) -> Result<()> {
        let mut conn = self.checkout("SCAN").await?;
        let pattern = self.key(pattern, namespace);

        let mut removed = 0usize;
        let mut cursor: u64 = 0;
        loop {
            let (next, page) = scan_page::<M>(&mut conn, cursor, &pattern).await?;

            if !page.is_empty() {
                let mut cmd = redis::cmd("UNLINK");
                cmd.arg(&page);
                run::<M, ()>(&mut conn, &cmd, "UNLINK", &pattern).await?;
                removed += page.len();
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!("Cleared {} keys matching {}", removed, pattern);
        Ok(())
    }

    pub async fn clear_all(&self, namespace: &[&str]) -> Result<()> {
        self.clear(MATCH_ALL, namespace).await
    }

    // == Internals ==
    /// Borrows a connection, waiting while the pool is exhausted.
    ///
    /// A failure reported by the pool triggers a fresh dial. If that dial
    /// fails too, the store is unreachable and the dial error is returned.
    /// Otherwise the failure was a stale connection the pool already
    /// discarded, and the wait goes on.
    async fn checkout(&self, command: &'static str) -> Result<PooledConnection<'_, M>> {
        let pool = self.pool.as_ref().ok_or(CacheError::NotInitialized)?;
        let Some(failures) = &self.failures else {
            return pool.get().await.map_err(|e| checkout_error(command, e));
        };

        let mut watch = failures.watch();
        let get = pool.get();
        tokio::pin!(get);
        loop {
            tokio::select! {
                biased;
                conn = &mut get => return conn.map_err(|e| checkout_error(command, e)),
                failure = watch.next() => {
                    debug!("Pool reported '{}' during checkout for {}", failure, command);
                    match pool.dedicated_connection().await {
                        Ok(conn) => {
                            // Full pools drop the extra connection
                            let _ = pool.add(conn);
                        }
                        Err(source) => {
                            warn!("Store unreachable during checkout for {}: {}", command, source);
                            return Err(CacheError::Connection {
                                context: format!("checkout for {}", command),
                                source,
                            });
                        }
                    }
                }
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Value> {
        let mut conn = self.checkout("GET").await?;
        debug!("GET {}", key);

        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        run::<M, Value>(&mut conn, &cmd, "GET", key).await
    }
}

async fn run<M, T>(
    conn: &mut PooledConnection<'_, M>,
    cmd: &Cmd,
    command: &'static str,
    key: &str,
) -> Result<T>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
    T: FromRedisValue,
{
    let reply: redis::RedisResult<T> = cmd.query_async(&mut **conn).await;
    reply.map_err(|e| {
        warn!("{} '{}' failed: {}", command, key, e);
        CacheError::from_store(command, key, e)
    })
}

fn checkout_error(command: &'static str, err: RunError<RedisError>) -> CacheError {
    match err {
        RunError::User(source) => {
            warn!("Failed to check out a connection for {}: {}", command, source);
            CacheError::Connection {
                context: format!("checkout for {}", command),
                source,
            }
        }
        _ => {
            warn!("Timed out checking out a connection for {}", command);
            CacheError::PoolTimeout(format!("checkout for {}", command))
        }
    }
}

async fn scan_page<M>(
    conn: &mut PooledConnection<'_, M>,
    cursor: u64,
    pattern: &str,
) -> Result<(u64, Vec<String>)>
where
    M: ManageConnection<Error = RedisError>,
    M::Connection: ConnectionLike + Send,
{
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor).arg("MATCH").arg(pattern);
    run::<M, (u64, Vec<String>)>(conn, &cmd, "SCAN", pattern).await
}

impl<M: ManageConnection> Clone for CacheClient<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            failures: self.failures.clone(),
            separator: self.separator.clone(),
        }
    }
}

impl<M: ManageConnection> Default for CacheClient<M> {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl<M: ManageConnection> fmt::Debug for CacheClient<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("initialized", &self.pool.is_some())
            .field("separator", &self.separator)
            .finish()
    }
}
