//! Pool Statistics Module
//!
//! Snapshot of how many pooled connections are open, idle, and checked out.

use serde::Serialize;

// == Pool Stats ==
/// Point-in-time view of the connection pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Connections currently open (idle + checked out)
    pub connections: u32,
    /// Connections sitting idle in the pool
    pub idle_connections: u32,
    /// Connections currently borrowed by callers
    pub active_connections: u32,
}

impl PoolStats {
    // == Constructor ==
    /// Creates stats from open and idle connection counts.
    pub fn new(connections: u32, idle_connections: u32) -> Self {
        Self {
            connections,
            idle_connections,
            active_connections: connections.saturating_sub(idle_connections),
        }
    }

    // == Utilization ==
    /// Fraction of `max_active` currently borrowed, or 0.0 for an empty pool.
    pub fn utilization(&self, max_active: u32) -> f64 {
        if max_active == 0 {
            0.0
        } else {
            self.active_connections as f64 / max_active as f64
        }
    }
}

impl From<bb8::State> for PoolStats {
    fn from(state: bb8::State) -> Self {
        Self::new(state.connections, state.idle_connections)
    }
}
