//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;

use url::Url;

use crate::cache::DEFAULT_SEPARATOR;
use crate::error::{CacheError, Result};

/// Default store address
pub const DEFAULT_ADDRESS: &str = "localhost:6379";

/// Default maximum number of connections checked out at once
pub const DEFAULT_MAX_ACTIVE: u32 = 10;

/// Default number of idle connections kept in the pool
pub const DEFAULT_MAX_IDLE: u32 = 5;

// == Credentials ==
/// Authentication used when dialing the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication
    #[default]
    None,
    /// Password only (legacy `AUTH <password>`)
    Password(String),
    /// ACL user with password
    UserPassword { username: String, password: String },
}

impl Credentials {
    /// Maps 0, 1 or 2 strings to no auth, password only, or username + password.
    ///
    /// Anything past the second string is ignored.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Self {
        match parts {
            [] => Credentials::None,
            [password] => Credentials::Password(password.as_ref().to_string()),
            [username, password, ..] => Credentials::UserPassword {
                username: username.as_ref().to_string(),
                password: password.as_ref().to_string(),
            },
        }
    }
}

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Store address, either `host:port` or a full `redis://` URL
    pub address: String,
    /// Credentials used when dialing
    pub credentials: Credentials,
    /// Separator placed between namespace segments and the base key
    pub separator: String,
    /// Maximum number of pooled connections
    pub max_active: u32,
    /// Idle connections the pool keeps open
    pub max_idle: u32,
}

impl ClientConfig {
    /// Creates a config for `address` with default pool settings.
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials,
            ..Self::default()
        }
    }

    /// Creates a new ClientConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ADDR` - Store address (default: localhost:6379)
    /// - `CACHE_USERNAME` - ACL username, only used together with a password
    /// - `CACHE_PASSWORD` - Password (default: no authentication)
    /// - `CACHE_SEPARATOR` - Namespace separator (default: ":")
    /// - `CACHE_POOL_MAX_ACTIVE` - Maximum pooled connections (default: 10)
    /// - `CACHE_POOL_MAX_IDLE` - Idle connections kept open (default: 5)
    pub fn from_env() -> Self {
        let username = env::var("CACHE_USERNAME").ok().filter(|v| !v.is_empty());
        let password = env::var("CACHE_PASSWORD").ok().filter(|v| !v.is_empty());
        let credentials = match (username, password) {
            (Some(username), Some(password)) => Credentials::UserPassword { username, password },
            (None, Some(password)) => Credentials::Password(password),
            _ => Credentials::None,
        };

        Self {
            address: env::var("CACHE_ADDR").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string()),
            credentials,
            separator: env::var("CACHE_SEPARATOR")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            max_active: env::var("CACHE_POOL_MAX_ACTIVE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ACTIVE),
            max_idle: env::var("CACHE_POOL_MAX_IDLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_IDLE),
        }
    }

    // == Connection URL ==
    /// Builds the connection URL for the store, embedding credentials.
    ///
    /// Bare `host:port` addresses get the `redis://` scheme. Credentials are
    /// percent-encoded by the URL setters.
    pub fn connection_url(&self) -> Result<Url> {
        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            CacheError::Config(format!("invalid address '{}': {}", self.address, e))
        })?;

        let rejected = |_: ()| {
            CacheError::Config(format!("address '{}' cannot carry credentials", self.address))
        };
        match &self.credentials {
            Credentials::None => {}
            Credentials::Password(password) => {
                url.set_password(Some(password.as_str())).map_err(rejected)?;
            }
            Credentials::UserPassword { username, password } => {
                url.set_username(username).map_err(rejected)?;
                url.set_password(Some(password.as_str())).map_err(rejected)?;
            }
        }

        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            credentials: Credentials::None,
            separator: DEFAULT_SEPARATOR.to_string(),
            max_active: DEFAULT_MAX_ACTIVE,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}
