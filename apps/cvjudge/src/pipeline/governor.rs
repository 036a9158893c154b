//! Rate-Limit Governor — a fixed cooldown after every batch of processed records.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

/// Blocks the pipeline for a duration. Injected so tests never touch the clock.
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real waiter backed by the tokio timer.
pub struct TokioWaiter;

#[async_trait]
impl Waiter for TokioWaiter {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct RateLimitGovernor {
    batch_size: usize,
    cooldown: Duration,
    waiter: Arc<dyn Waiter>,
    processed: usize,
}

impl RateLimitGovernor {
    /// `batch_size` must be at least 1.
    pub fn new(batch_size: usize, cooldown: Duration, waiter: Arc<dyn Waiter>) -> Self {
        Self {
            batch_size: batch_size.max(1),
            cooldown,
            waiter,
            processed: 0,
        }
    }

    /// Counts one processed record and sleeps when it completes a batch.
    /// Returns whether a cooldown happened.
    pub async fn record_processed(&mut self) -> bool {
        self.processed += 1;
        if self.processed % self.batch_size != 0 || self.cooldown.is_zero() {
            return false;
        }
        info!(
            "Batch of {} rows processed. Waiting for {}s to avoid rate limits...",
            self.batch_size,
            self.cooldown.as_secs()
        );
        self.waiter.wait(self.cooldown).await;
        true
    }
}
