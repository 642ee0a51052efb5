//! Cache Module
//!
//! Namespaced cache client over a pooled store connection.

mod client;
mod key;
mod stats;
mod value;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod test_support;

// Re-export public types
pub use client::CacheClient;
pub use key::namespaced_key;
pub use stats::PoolStats;
pub use value::FromReply;

// == Public Constants ==
/// Separator placed between namespace segments and the base key
pub const DEFAULT_SEPARATOR: &str = ":";
