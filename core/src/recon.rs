//! Low-volume discovery passes that run after the worker pool drained.
//!
//! They bypass the rate limiter and feed the same [`Registry`] as the
//! wordlist pass, each under its own [`Source`]:
//!
//! * [`spf`]: `ip4:` mechanisms in the apex TXT records.
//! * [`cname`]: a fixed set of common labels, recording CNAME hops.
//! * [`ct`]: names from certificate transparency logs.
//!
//! [`Registry`]: crate::registry::Registry
//! [`Source`]: crate::registry::Source

pub mod cname;
pub mod ct;
pub mod spf;

pub use cname::{CnameHit, chase_cnames};
pub use ct::{CrtSh, CtSource, ct_discovery};
pub use spf::spf_leaks;
