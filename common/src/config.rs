use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_RATE: u32 = 5;
pub const DEFAULT_BURST: u32 = 2;
pub const DEFAULT_SHARED_THRESHOLD: usize = 10;

/// Knobs consumed by the resolution engine.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Global query rate in queries per second. `0` disables limiting.
    pub rate: u32,
    /// Token bucket capacity.
    pub burst: u32,
    /// Number of concurrent workers pulling candidates.
    pub workers: usize,
    /// Fixed delay before each query, in milliseconds.
    pub delay_ms: u64,
    /// Upper bound of the random delay added on top of `delay_ms`.
    pub jitter_ms: u64,
    /// Disables every network lookup (DNS, SPF, CT).
    ///
    /// Names can still be resolved through a loaded hosts override map.
    pub offline: bool,
    /// Drops CDN and wildcard addresses from findings.
    pub filter_cdn: bool,
    /// A /24 with more host associations than this is shared infrastructure.
    pub shared_threshold: usize,
    /// Seed for resolver rotation and jitter. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            burst: DEFAULT_BURST,
            workers: DEFAULT_WORKERS,
            delay_ms: 0,
            jitter_ms: 0,
            offline: false,
            filter_cdn: false,
            shared_threshold: DEFAULT_SHARED_THRESHOLD,
            seed: None,
        }
    }
}

impl ScanConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
