//! Shared models and helpers for the `subscratch` workspace.
//!
//! Everything in here is free of network IO so that the resolution engine,
//! the protocol helpers and the terminal front-end can all depend on it.

pub mod config;
pub mod hosts;
pub mod network;

pub mod log;

#[doc(hidden)]
pub use tracing as __tracing;
