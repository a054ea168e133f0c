//! The **abstraction** every name lookup goes through.
//!
//! The pipeline only ever talks to [`Resolve`]. Concrete strategies live in
//! submodules:
//!
//! * [`pool`]: rotating upstream resolvers over UDP.
//! * [`local`]: the operator-supplied hosts override map.
//! * [`system`]: the operating system's resolver.
//!
//! [`Layered`] puts the override map in front of a network resolver, which is
//! the combination the engine runs with.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use subscratch_common::hosts::HostsMap;

pub mod local;
pub mod pool;
pub mod system;

pub use local::LocalResolver;
pub use pool::{ResolverPool, Upstream};
pub use system::SystemResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("offline mode: network resolution is disabled")]
    Offline,
    #[error("no records for {0}")]
    NotFound(String),
    #[error("query to {resolver} timed out")]
    Timeout { resolver: String },
    #[error("resolver pool is empty")]
    NoUpstream,
    #[error("malformed DNS message: {0}")]
    Protocol(String),
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which resolver produced an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolverId {
    Local,
    System,
    Upstream { addr: SocketAddr, name: String },
}

impl ResolverId {
    /// Stable machine label: `local`, `system` or the upstream `ip:port`.
    pub fn label(&self) -> String {
        match self {
            ResolverId::Local => "local".to_string(),
            ResolverId::System => "system".to_string(),
            ResolverId::Upstream { addr, .. } => addr.to_string(),
        }
    }

    /// Human readable name shown next to findings.
    pub fn display_name(&self) -> &str {
        match self {
            ResolverId::Local => "LocalHosts",
            ResolverId::System => "System",
            ResolverId::Upstream { name, .. } => name,
        }
    }
}

impl fmt::Display for ResolverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome of resolving one fully qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub addresses: Vec<IpAddr>,
    pub resolver: ResolverId,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError>;
}

/// Record lookups beyond plain addresses, used by the auxiliary passes.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ResolveError>;
    async fn lookup_cname(&self, name: &str) -> Result<Option<String>, ResolveError>;
}

/// Hosts override first, network second.
///
/// A loaded override map wins for every name it knows, offline or not. Names
/// it does not know fall through to `network`, which is expected to refuse
/// the query itself when the run is offline.
pub struct Layered {
    local: Option<LocalResolver>,
    network: Arc<dyn Resolve>,
}

impl Layered {
    pub fn new(hosts: Option<Arc<HostsMap>>, network: Arc<dyn Resolve>) -> Self {
        Self {
            local: hosts.map(LocalResolver::new),
            network,
        }
    }
}

#[async_trait]
impl Resolve for Layered {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
        if let Some(local) = &self.local
            && let Some(resolution) = local.lookup(name)
        {
            return Ok(resolution);
        }
        self.network.resolve(name).await
    }
}

/// Removes duplicate addresses while keeping the order they arrived in.
pub(crate) fn dedup_addresses(addresses: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut unique: Vec<IpAddr> = Vec::new();
    for ip in addresses {
        if !unique.contains(&ip) {
            unique.push(ip);
        }
    }
    unique
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
