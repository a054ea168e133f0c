//! # Subscratch Core
//!
//! The concurrent, rate-limited resolution pipeline.
//!
//! A run looks like this:
//!
//! 1. [`wildcard`] learns which addresses the zone hands out for names that
//!    do not exist.
//! 2. [`engine`] fans candidate labels out to a pool of workers. Each worker
//!    waits on the [`limiter`], resolves through [`resolver`], drops wildcard
//!    noise, tags addresses with [`intel`] and records survivors in the
//!    [`registry`].
//! 3. [`recon`] runs the low-volume SPF, CNAME and certificate transparency
//!    passes into the same registry.
//! 4. [`cluster`] groups every registered address by network block.

pub mod cluster;
pub mod engine;
pub mod intel;
pub mod limiter;
pub mod recon;
pub mod registry;
pub mod resolver;
pub mod signal;
pub mod sink;
pub mod wildcard;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Builds the run's master RNG. A fixed seed makes resolver rotation and
/// jitter reproducible.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
