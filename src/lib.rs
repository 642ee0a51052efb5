//! ns_cache - A namespaced key-value cache client
//!
//! Typed get/set, existence checks, deletion and pattern-based key listing
//! and clearing over a pooled connection to a Redis-protocol store.

pub mod cache;
pub mod config;
pub mod error;
pub mod pool;

pub use cache::{CacheClient, PoolStats};
pub use config::{ClientConfig, Credentials};
pub use error::CacheError;
