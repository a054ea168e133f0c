//! Wire formats spoken by the resolution engine.
//!
//! * [`dns`]: query construction and answer extraction for UDP DNS.
//! * [`spf`]: `ip4:` mechanisms inside TXT records.
//! * [`ct`]: certificate transparency search results.

pub mod ct;
pub mod dns;
pub mod spf;
