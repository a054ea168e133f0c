use std::sync::Arc;

use async_trait::async_trait;

use subscratch_common::hosts::HostsMap;

use super::{Resolution, Resolve, ResolveError, ResolverId};

/// Answers from the hosts override map only. Never touches the network.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    hosts: Arc<HostsMap>,
}

impl LocalResolver {
    pub fn new(hosts: Arc<HostsMap>) -> Self {
        Self { hosts }
    }

    /// Returns the mapped addresses, or `None` when the name is not listed.
    pub fn lookup(&self, name: &str) -> Option<Resolution> {
        self.hosts.lookup(name).map(|addrs| Resolution {
            name: name.to_ascii_lowercase(),
            addresses: super::dedup_addresses(addrs.iter().copied()),
            resolver: ResolverId::Local,
        })
    }
}

#[async_trait]
impl Resolve for LocalResolver {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
        self.lookup(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}
