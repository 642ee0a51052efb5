//! Connection Failure Channel
//!
//! bb8 reports dial and borrow-time PING failures to an error sink instead of
//! returning them from `Pool::get`. This sink republishes them so a waiting
//! checkout can give up as soon as the store stops answering.

use redis::RedisError;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Failures kept for slow subscribers before older ones are dropped
const FAILURE_BUFFER: usize = 16;

// == Connection Failures ==
/// Error sink that fans pool failures out to every waiting checkout.
///
/// Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct ConnectionFailures {
    sender: broadcast::Sender<RedisError>,
}

impl ConnectionFailures {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FAILURE_BUFFER);
        Self { sender }
    }

    /// Starts watching for failures reported after this call.
    pub fn watch(&self) -> FailureWatch {
        FailureWatch {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ConnectionFailures {
    fn default() -> Self {
        Self::new()
    }
}

impl bb8::ErrorSink<RedisError> for ConnectionFailures {
    fn sink(&self, error: RedisError) {
        warn!("Pool connection failure: {}", error);
        if self.sender.send(error).is_err() {
            debug!("No checkout waiting on the failure");
        }
    }

    fn boxed_clone(&self) -> Box<dyn bb8::ErrorSink<RedisError>> {
        Box::new(self.clone())
    }
}

// == Failure Watch ==
/// Receiving end held by one checkout.
#[derive(Debug)]
pub struct FailureWatch {
    receiver: broadcast::Receiver<RedisError>,
}

impl FailureWatch {
    /// Waits for the next reported failure.
    ///
    /// Never resolves once every sender is gone.
    pub async fn next(&mut self) -> RedisError {
        loop {
            match self.receiver.recv().await {
                Ok(error) => return error,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Skipped {} pool failures", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return std::future::pending().await;
                }
            }
        }
    }
}
