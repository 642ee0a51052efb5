//! Pool Module
//!
//! Connection management for the store: pool construction from config over
//! `redis::Client`, and the channel that reports dial and PING failures to
//! waiting checkouts.

mod builder;
mod failures;

pub use builder::{build_pool, open_client, pool_builder, StorePool, CHECKOUT_TIMEOUT};
pub use failures::{ConnectionFailures, FailureWatch};
