//! # Resolution Engine
//!
//! Fans candidate labels out to a fixed pool of workers.
//!
//! The producer pushes labels into one bounded queue and closes it by
//! dropping the sender once the wordlist is exhausted. Workers pull until the
//! queue is closed and drained, which is the only completion signal; the
//! engine then joins every worker before returning.
//!
//! Per label a worker:
//! 1. waits for a token from the global [`TokenBucket`],
//! 2. sleeps for the configured delay plus jitter when a delay is set,
//! 3. resolves `label.domain`,
//! 4. drops answers made only of wildcard addresses,
//! 5. classifies each address, optionally dropping CDN/wildcard ones,
//! 6. claims the finding in the [`DedupStore`] and, if it won, emits it and
//!    registers its addresses.
//!
//! Failures at any step mean "nothing found" for that label and never stop
//! the pool.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinError;
use tracing::{trace, warn};

use subscratch_common::config::ScanConfig;
use subscratch_common::network::domain::{Domain, normalize_label};

use crate::intel::{Classification, Classifier};
use crate::limiter::TokenBucket;
use crate::registry::{DedupKey, DedupStore, Registry, Source};
use crate::resolver::Resolve;
use crate::signal::StopSignal;
use crate::sink::{Finding, FindingSink};

const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Called with the running number of probed candidates.
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub probed: usize,
    pub findings: usize,
    pub interrupted: bool,
}

pub struct Engine {
    domain: Domain,
    resolver: Arc<dyn Resolve>,
    classifier: Arc<Classifier>,
    registry: Arc<Registry>,
    dedup: Arc<DedupStore>,
    limiter: Arc<TokenBucket>,
    sinks: Vec<Arc<dyn FindingSink>>,
    base_delay: Duration,
    jitter_ms: u64,
    filter_cdn: bool,
    workers: usize,
    seed: Option<u64>,
    stop: StopSignal,
    on_progress: Option<ProgressFn>,
}

impl Engine {
    /// Must be called from within a Tokio runtime (the limiter spawns its
    /// refill task here).
    pub fn new(
        domain: Domain,
        cfg: &ScanConfig,
        resolver: Arc<dyn Resolve>,
        classifier: Arc<Classifier>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            domain,
            resolver,
            classifier,
            registry,
            dedup: Arc::new(DedupStore::new()),
            limiter: Arc::new(TokenBucket::new(cfg.rate, cfg.burst)),
            sinks: Vec::new(),
            base_delay: cfg.base_delay(),
            jitter_ms: cfg.jitter_ms,
            filter_cdn: cfg.filter_cdn,
            workers: cfg.worker_count(),
            seed: cfg.seed,
            stop: StopSignal::new(),
            on_progress: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn FindingSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_dedup(mut self, dedup: Arc<DedupStore>) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn on_progress(mut self, callback: ProgressFn) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Resolves every candidate label and blocks until all workers exited.
    ///
    /// Blank labels and `#` comments are skipped. Output order is whatever
    /// the scheduler produces.
    pub async fn run<I>(&self, candidates: I) -> anyhow::Result<ScanStats>
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send,
    {
        let pipeline = Arc::new(Pipeline {
            domain: self.domain.clone(),
            resolver: self.resolver.clone(),
            classifier: self.classifier.clone(),
            registry: self.registry.clone(),
            dedup: self.dedup.clone(),
            limiter: self.limiter.clone(),
            sinks: self.sinks.clone(),
            base_delay: self.base_delay,
            jitter_ms: self.jitter_ms,
            filter_cdn: self.filter_cdn,
            probed: AtomicUsize::new(0),
            found: AtomicUsize::new(0),
            on_progress: self.on_progress.clone(),
        });

        let (tx, rx) = mpsc::channel::<String>(self.workers * QUEUE_DEPTH_PER_WORKER);
        let queue = Arc::new(Mutex::new(rx));
        let mut master_rng: StdRng = crate::rng_from_seed(self.seed);

        let handles: Vec<_> = (0..self.workers)
            .map(|id| {
                let rng = StdRng::seed_from_u64(master_rng.random());
                tokio::spawn(worker(
                    id,
                    pipeline.clone(),
                    queue.clone(),
                    rng,
                    self.stop.clone(),
                ))
            })
            .collect();

        for raw in candidates {
            let label: String = normalize_label(&raw);
            if label.is_empty() || label.starts_with('#') {
                continue;
            }

            tokio::select! {
                biased;
                _ = self.stop.triggered() => break,
                sent = tx.send(label) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        drop(tx);

        let mut failure: Option<JoinError> = None;
        for handle in handles {
            if let Err(e) = handle.await {
                failure.get_or_insert(e);
            }
        }
        if let Some(e) = failure {
            return Err(e.into());
        }

        Ok(ScanStats {
            probed: pipeline.probed.load(Ordering::Relaxed),
            findings: pipeline.found.load(Ordering::Relaxed),
            interrupted: self.stop.is_triggered(),
        })
    }
}

async fn worker(
    id: usize,
    pipeline: Arc<Pipeline>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    mut rng: StdRng,
    stop: StopSignal,
) {
    loop {
        let next: Option<String> = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = stop.triggered() => None,
                label = rx.recv() => label,
            }
        };
        let Some(label) = next else {
            break;
        };

        tokio::select! {
            biased;
            _ = stop.triggered() => break,
            _ = pipeline.process(&label, &mut rng) => {}
        }
    }
    trace!("worker {id} exiting");
}

struct Pipeline {
    domain: Domain,
    resolver: Arc<dyn Resolve>,
    classifier: Arc<Classifier>,
    registry: Arc<Registry>,
    dedup: Arc<DedupStore>,
    limiter: Arc<TokenBucket>,
    sinks: Vec<Arc<dyn FindingSink>>,
    base_delay: Duration,
    jitter_ms: u64,
    filter_cdn: bool,
    probed: AtomicUsize,
    found: AtomicUsize,
    on_progress: Option<ProgressFn>,
}

impl Pipeline {
    async fn process(&self, label: &str, rng: &mut StdRng) -> Option<Finding> {
        let probed: usize = self.probed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(callback) = &self.on_progress {
            callback(probed);
        }

        self.limiter.acquire().await;
        self.pause(rng).await;

        let name: String = self.domain.join(label);
        let resolution = match self.resolver.resolve(&name).await {
            Ok(resolution) if !resolution.is_empty() => resolution,
            Ok(_) => return None,
            Err(e) => {
                trace!("{name}: {e}");
                return None;
            }
        };

        if self.classifier.wildcard().covers_all(&resolution.addresses) {
            trace!("{name}: wildcard answer");
            return None;
        }

        let (addresses, tags): (Vec<IpAddr>, Vec<Classification>) = resolution
            .addresses
            .iter()
            .map(|ip| ip.to_canonical())
            .map(|ip| (ip, self.classifier.classify(ip)))
            .filter(|(_, tag)| !(self.filter_cdn && tag.is_shared()))
            .unzip();

        if addresses.is_empty() {
            return None;
        }
        if !self.dedup.insert_if_absent(DedupKey::new(label, &addresses)) {
            return None;
        }

        let finding = Finding {
            name,
            label: label.to_string(),
            addresses,
            tags,
            resolver: resolution.resolver,
        };

        for sink in &self.sinks {
            if let Err(e) = sink.emit(&finding) {
                warn!("failed to write {}: {e:#}", finding.name);
            }
        }
        for ip in &finding.addresses {
            self.registry.register(*ip, &finding.name, Source::Wordlist);
        }
        self.found.fetch_add(1, Ordering::Relaxed);

        Some(finding)
    }

    /// Jitter only spreads out a configured delay, it never adds one.
    async fn pause(&self, rng: &mut StdRng) {
        if self.base_delay.is_zero() {
            return;
        }
        let jitter: u64 = if self.jitter_ms > 0 {
            rng.random_range(0..=self.jitter_ms)
        } else {
            0
        };
        tokio::time::sleep(self.base_delay + Duration::from_millis(jitter)).await;
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
