use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net;

use super::{Resolution, Resolve, ResolveError, ResolverId};

const SYSTEM_TIMEOUT: Duration = Duration::from_secs(5);

/// The operating system resolver (`getaddrinfo`).
///
/// Used where a single sample is enough: wildcard detection and the
/// low-volume auxiliary passes.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    offline: bool,
}

impl SystemResolver {
    pub fn new(offline: bool) -> Self {
        Self { offline }
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
        if self.offline {
            return Err(ResolveError::Offline);
        }

        let lookup = tokio::time::timeout(SYSTEM_TIMEOUT, net::lookup_host((name, 0)))
            .await
            .map_err(|_| ResolveError::Timeout {
                resolver: ResolverId::System.label(),
            })??;

        let addresses: Vec<IpAddr> = super::dedup_addresses(lookup.map(|sock| sock.ip()));
        if addresses.is_empty() {
            return Err(ResolveError::NotFound(name.to_string()));
        }

        Ok(Resolution {
            name: name.to_string(),
            addresses,
            resolver: ResolverId::System,
        })
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
