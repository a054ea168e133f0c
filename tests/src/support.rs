use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use subscratch_common::config::ScanConfig;
use subscratch_common::network::domain::Domain;
use subscratch_core::resolver::{Resolution, ResolveError, Resolve, ResolverId};

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn domain() -> Domain {
    "example.com".parse().unwrap()
}

pub fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fast, reproducible engine settings.
pub fn test_config() -> ScanConfig {
    ScanConfig {
        rate: 0,
        workers: 4,
        seed: Some(42),
        ..ScanConfig::default()
    }
}

/// In-memory zone. Names not in the table get `catch_all` when it is set,
/// mimicking a wildcard record, and do not exist otherwise.
pub struct Zone {
    records: HashMap<String, Vec<IpAddr>>,
    catch_all: Vec<IpAddr>,
    queries: AtomicUsize,
}

impl Zone {
    pub fn new(records: &[(&str, &[&str])]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(name, addrs)| (name.to_string(), addrs.iter().map(|a| ip(a)).collect()))
                .collect(),
            catch_all: Vec::new(),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn with_wildcard(mut self, addrs: &[&str]) -> Self {
        self.catch_all = addrs.iter().map(|a| ip(a)).collect();
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolve for Zone {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let addresses = match self.records.get(name) {
            Some(addresses) => addresses.clone(),
            None if !self.catch_all.is_empty() => self.catch_all.clone(),
            None => return Err(ResolveError::NotFound(name.to_string())),
        };
        Ok(Resolution {
            name: name.to_string(),
            addresses,
            resolver: ResolverId::Upstream {
                addr: "192.0.2.53:53".parse().unwrap(),
                name: "Stub".to_string(),
            },
        })
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
