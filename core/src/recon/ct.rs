use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use subscratch_common::network::domain::Domain;
use subscratch_protocols::ct;

use crate::registry::{Registry, Source};
use crate::resolver::Resolve;
use crate::signal::StopSignal;

const CT_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything that can list certificate names issued under a domain.
#[async_trait]
pub trait CtSource: Send + Sync {
    async fn names(&self, domain: &Domain) -> anyhow::Result<Vec<String>>;
}

/// The public crt.sh search.
pub struct CrtSh {
    client: reqwest::Client,
}

impl CrtSh {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(CT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CtSource for CrtSh {
    async fn names(&self, domain: &Domain) -> anyhow::Result<Vec<String>> {
        let body: String = self
            .client
            .get(ct::search_url(domain))
            .send()
            .await
            .context("CT log request failed")?
            .error_for_status()
            .context("CT log returned an error status")?
            .text()
            .await
            .context("failed to read CT log response")?;

        ct::parse_names(&body, domain)
    }
}

/// Resolves every CT name directly and registers the addresses.
///
/// Returns the names the source reported. When `stop` fires the pending
/// request or lookup is dropped and whatever was registered so far stays.
pub async fn ct_discovery(
    domain: &Domain,
    source: &dyn CtSource,
    resolver: &dyn Resolve,
    registry: &Registry,
    stop: &StopSignal,
) -> anyhow::Result<Vec<String>> {
    let Some(names) = stop.run_until(source.names(domain)).await else {
        debug!("CT request for {domain} interrupted");
        return Ok(Vec::new());
    };
    let names: Vec<String> = names?;

    for name in &names {
        match stop.run_until(resolver.resolve(name)).await {
            None => {
                debug!("CT resolution interrupted at {name}");
                break;
            }
            Some(Ok(resolution)) => {
                for address in resolution.addresses {
                    registry.register(address, name, Source::CtLog);
                }
            }
            Some(Err(e)) => debug!("{name}: {e}"),
        }
    }

    Ok(names)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Resolution, ResolveError, ResolverId};
    use std::time::Instant;

    struct FixedLog(Vec<&'static str>);

    #[async_trait]
    impl CtSource for FixedLog {
        async fn names(&self, _domain: &Domain) -> anyhow::Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingLog;

    #[async_trait]
    impl CtSource for FailingLog {
        async fn names(&self, _domain: &Domain) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("crt.sh unavailable")
        }
    }

    struct HangingLog;

    #[async_trait]
    impl CtSource for HangingLog {
        async fn names(&self, _domain: &Domain) -> anyhow::Result<Vec<String>> {
            std::future::pending().await
        }
    }

    /// Answers `vpn.example.com`, hangs on everything else.
    struct VpnThenHang;

    #[async_trait]
    impl Resolve for VpnThenHang {
        async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
            if name != "vpn.example.com" {
                std::future::pending::<()>().await;
            }
            OnlyVpn.resolve(name).await
        }
    }

    fn trigger_after(stop: &StopSignal, millis: u64) {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            stop.trigger();
        });
    }

    struct OnlyVpn;

    #[async_trait]
    impl Resolve for OnlyVpn {
        async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
            if name != "vpn.example.com" {
                return Err(ResolveError::NotFound(name.to_string()));
            }
            Ok(Resolution {
                name: name.to_string(),
                addresses: vec!["192.0.2.44".parse().unwrap()],
                resolver: ResolverId::System,
            })
        }
    }

    #[tokio::test]
    async fn resolvable_ct_names_are_registered() {
        let domain: Domain = "example.com".parse().unwrap();
        let registry = Registry::new();
        let log = FixedLog(vec!["vpn.example.com", "old.example.com"]);

        let names = ct_discovery(&domain, &log, &OnlyVpn, &registry, &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(names.len(), 2);
        assert_eq!(registry.len(), 1);
        let entry = registry.get(&"192.0.2.44".parse().unwrap()).unwrap();
        assert_eq!(entry.first_seen, Source::CtLog);
        assert_eq!(entry.names, vec!["vpn.example.com"]);
    }

    #[tokio::test]
    async fn source_failure_is_reported() {
        let domain: Domain = "example.com".parse().unwrap();
        let registry = Registry::new();
        let stop = StopSignal::new();

        assert!(
            ct_discovery(&domain, &FailingLog, &OnlyVpn, &registry, &stop)
                .await
                .is_err()
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn stop_abandons_a_hanging_ct_request() {
        let domain: Domain = "example.com".parse().unwrap();
        let registry = Registry::new();
        let stop = StopSignal::new();
        trigger_after(&stop, 50);

        let start = Instant::now();
        let names = ct_discovery(&domain, &HangingLog, &OnlyVpn, &registry, &stop)
            .await
            .unwrap();

        assert!(names.is_empty());
        assert!(start.elapsed() < CT_TIMEOUT);
    }

    #[tokio::test]
    async fn stop_keeps_names_registered_before_a_hanging_lookup() {
        let domain: Domain = "example.com".parse().unwrap();
        let registry = Registry::new();
        let stop = StopSignal::new();
        let log = FixedLog(vec!["vpn.example.com", "slow.example.com", "old.example.com"]);
        trigger_after(&stop, 50);

        let lookup = ct_discovery(&domain, &log, &VpnThenHang, &registry, &stop);
        let names = tokio::time::timeout(Duration::from_secs(2), lookup)
            .await
            .expect("CT pass ignored the stop signal")
            .unwrap();

        assert_eq!(names.len(), 3);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&"192.0.2.44".parse().unwrap()).is_some());
    }

    #[tokio::test]
    #[ignore = "queries crt.sh"]
    async fn crt_sh_lists_names() {
        let domain: Domain = "example.com".parse().unwrap();
        let names = CrtSh::new().unwrap().names(&domain).await.unwrap();
        assert!(names.iter().all(|name| domain.contains(name)));
    }
}
