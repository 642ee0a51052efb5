//! ns_cache - A namespaced key-value cache client
//!
//! Command-line key lister: connects with the environment configuration, pings the
//! store and lists the keys matching a pattern.
//!
//! # Usage
//! ```text
//! ns_cache [PATTERN] [NAMESPACE...]
//! ```

use anyhow::Context;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ns_cache::{CacheClient, ClientConfig, PoolStats};

/// Report printed to stdout as JSON.
#[derive(Debug, Serialize)]
struct KeyReport {
    address: String,
    pattern: String,
    namespace: Vec<String>,
    keys: Vec<String>,
    pool: Option<PoolStats>,
    /// Share of `max_active` connections borrowed when the report was taken
    pool_utilization: Option<f64>,
}

/// Entry point for the key lister.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the pool and ping the store
/// 4. Scan for keys matching the requested pattern
/// 5. Print the report as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ns_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let pattern = args.next().unwrap_or_else(|| "*".to_string());
    let namespace: Vec<String> = args.collect();

    let config = ClientConfig::from_env();
    info!(
        "Configuration loaded: address={}, separator={:?}, max_active={}, max_idle={}",
        config.address, config.separator, config.max_active, config.max_idle
    );

    let cache = CacheClient::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.address))?;
    cache.ping().await.context("store did not answer PING")?;
    info!("Store answered PING");

    let segments: Vec<&str> = namespace.iter().map(String::as_str).collect();
    let keys = cache
        .get_keys(&pattern, &segments)
        .await
        .with_context(|| format!("failed to list keys matching '{}'", pattern))?;
    info!("Found {} keys", keys.len());

    let pool = cache.stats();
    let report = KeyReport {
        address: config.address.clone(),
        pattern,
        namespace,
        keys,
        pool,
        pool_utilization: pool.map(|stats| stats.utilization(config.max_active)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
