//! # Wildcard Detection
//!
//! Many zones answer every non-existent subdomain with a catch-all record,
//! usually pointing at a CDN edge. Without filtering, every brute-forced
//! label would look like a discovery.
//!
//! Detection resolves one name that cannot exist and remembers every address
//! it gets back. The resulting [`WildcardSet`] is computed once per run and
//! never changes afterwards.

use std::collections::HashSet;
use std::net::IpAddr;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::debug;

use subscratch_common::network::domain::Domain;

use crate::resolver::Resolve;

const PROBE_LABEL_LEN: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardSet {
    addresses: HashSet<IpAddr>,
}

impl WildcardSet {
    pub fn new(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addresses: addresses.into_iter().map(|ip| ip.to_canonical()).collect(),
        }
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.addresses.contains(&ip.to_canonical())
    }

    /// `true` when every address in `addresses` is a wildcard answer.
    ///
    /// An empty set never covers anything, so zones without a wildcard
    /// record filter nothing.
    pub fn covers_all(&self, addresses: &[IpAddr]) -> bool {
        !self.addresses.is_empty() && addresses.iter().all(|ip| self.contains(ip))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Members in ascending order.
    pub fn sorted(&self) -> Vec<IpAddr> {
        let mut addrs: Vec<IpAddr> = self.addresses.iter().copied().collect();
        addrs.sort();
        addrs
    }
}

/// A random label long enough that no real zone will contain it.
pub fn improbable_label<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(PROBE_LABEL_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("wc-{suffix}")
}

/// Probes `domain` for a wildcard record through `resolver`.
///
/// Lookup failure means there is no wildcard and yields an empty set.
pub async fn detect<R: Rng + ?Sized>(
    domain: &Domain,
    resolver: &dyn Resolve,
    rng: &mut R,
) -> WildcardSet {
    let probe: String = domain.join(&improbable_label(rng));

    match resolver.resolve(&probe).await {
        Ok(resolution) => WildcardSet::new(resolution.addresses),
        Err(e) => {
            debug!("wildcard probe {probe} did not resolve: {e}");
            WildcardSet::default()
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Resolution, ResolveError, ResolverId};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct CatchAll(Vec<IpAddr>);

    #[async_trait]
    impl Resolve for CatchAll {
        async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
            if self.0.is_empty() {
                return Err(ResolveError::NotFound(name.to_string()));
            }
            Ok(Resolution {
                name: name.to_string(),
                addresses: self.0.clone(),
                resolver: ResolverId::System,
            })
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn detect_collects_catch_all_addresses() {
        let domain: Domain = "example.com".parse().unwrap();
        let resolver = CatchAll(vec![ip("9.9.9.9"), ip("9.9.9.10")]);
        let mut rng = StdRng::seed_from_u64(1);

        let set = detect(&domain, &resolver, &mut rng).await;
        assert_eq!(set.sorted(), vec![ip("9.9.9.9"), ip("9.9.9.10")]);
    }

    #[tokio::test]
    async fn detect_without_wildcard_is_empty() {
        let domain: Domain = "example.com".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let set = detect(&domain, &CatchAll(Vec::new()), &mut rng).await;
        assert!(set.is_empty());
    }

    #[test]
    fn covers_all_requires_every_address() {
        let set = WildcardSet::new([ip("9.9.9.9")]);
        assert!(set.covers_all(&[ip("9.9.9.9")]));
        assert!(!set.covers_all(&[ip("9.9.9.9"), ip("1.2.3.4")]));
        assert!(!WildcardSet::default().covers_all(&[ip("9.9.9.9")]));
    }

    #[test]
    fn mapped_addresses_match_their_ipv4_form() {
        let set = WildcardSet::new([ip("::ffff:9.9.9.9")]);
        assert!(set.contains(&ip("9.9.9.9")));
        assert!(set.covers_all(&[ip("::ffff:9.9.9.9"), ip("9.9.9.9")]));
        assert_eq!(set.sorted(), vec![ip("9.9.9.9")]);
    }

    #[test]
    fn improbable_label_is_a_valid_dns_label() {
        let mut rng = StdRng::seed_from_u64(42);
        let label = improbable_label(&mut rng);

        assert_eq!(label.len(), PROBE_LABEL_LEN + 3);
        assert!(label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert_ne!(label, improbable_label(&mut rng));
    }
}
