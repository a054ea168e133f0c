//! Global query rate limiting.
//!
//! A token bucket shared by every worker. Tokens are semaphore permits; a
//! ticker task owned by the bucket adds one permit per `1 / rate` seconds
//! and silently drops the refill when the bucket is already full.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub struct TokenBucket {
    permits: Option<Arc<Semaphore>>,
    ticker: Option<JoinHandle<()>>,
}

impl TokenBucket {
    /// Creates a bucket refilled at `rate` tokens per second holding at most
    /// `burst` tokens. The bucket starts full.
    ///
    /// A `rate` of zero disables limiting. A `burst` of zero is treated as one
    /// so a limited bucket can always make progress.
    ///
    /// Must be called from within a Tokio runtime when `rate > 0`.
    pub fn new(rate: u32, burst: u32) -> Self {
        if rate == 0 {
            return Self::unlimited();
        }

        let burst: usize = burst.max(1) as usize;
        let permits = Arc::new(Semaphore::new(burst));
        let period: Duration = Duration::from_secs(1) / rate;
        let ticker = tokio::spawn(refill(permits.clone(), burst, period));

        Self {
            permits: Some(permits),
            ticker: Some(ticker),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            permits: None,
            ticker: None,
        }
    }

    pub fn is_limited(&self) -> bool {
        self.permits.is_some()
    }

    /// Suspends until a token is available and consumes it.
    ///
    /// After [`TokenBucket::shutdown`] this returns immediately.
    pub async fn acquire(&self) {
        let Some(permits) = &self.permits else {
            return;
        };

        if let Ok(permit) = permits.acquire().await {
            permit.forget();
        }
    }

    /// Stops the refill task and releases every waiter.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(permits) = &self.permits {
            permits.close();
        }
    }
}

impl Drop for TokenBucket {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn refill(permits: Arc<Semaphore>, burst: usize, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if permits.is_closed() {
            break;
        }
        // Only this task adds permits, so the check cannot race past `burst`.
        if permits.available_permits() < burst {
            permits.add_permits(1);
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
