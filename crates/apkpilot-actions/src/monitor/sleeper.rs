//! Delay between poll cycles

use std::time::Duration;

use async_trait::async_trait;

/// Waits out the interval between poll cycles.
///
/// Tests substitute an implementation that records the requested delays
/// instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
