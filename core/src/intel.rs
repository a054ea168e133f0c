//! # Address Classification
//!
//! Tags resolved addresses as CDN edge, wildcard/anycast catch-all or
//! probable origin server.
//!
//! Provider knowledge comes from an [`IpIntel`] oracle. The built-in
//! [`CdnRanges`] oracle matches against published edge ranges of the large
//! CDN and cloud-edge providers; anything smarter can be plugged in behind
//! the same trait. Classification is advisory: it drives display and the
//! optional filter, nothing else.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use pnet::ipnetwork::IpNetwork;
use tracing::debug;

use crate::wildcard::WildcardSet;

/// Raw oracle answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntelVerdict {
    pub matched: bool,
    pub provider: String,
    /// Set when the oracle could not make a decision.
    pub error: Option<String>,
}

impl IntelVerdict {
    pub fn provider(name: impl Into<String>) -> Self {
        Self {
            matched: true,
            provider: name.into(),
            error: None,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// A match only counts when the oracle reported no error alongside it.
    pub fn is_provider(&self) -> bool {
        self.matched && self.error.is_none()
    }
}

pub trait IpIntel: Send + Sync {
    fn check(&self, ip: IpAddr) -> IntelVerdict;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Cdn(String),
    WildcardAnycast,
    TrueOrigin,
}

impl Classification {
    /// CDN and wildcard addresses are shared infrastructure.
    pub fn is_shared(&self) -> bool {
        !matches!(self, Classification::TrueOrigin)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Cdn(provider) => write!(f, "{provider} CDN"),
            Classification::WildcardAnycast => f.write_str("CDN Anycast/Wildcard"),
            Classification::TrueOrigin => f.write_str("TRUE ORIGIN"),
        }
    }
}

pub struct Classifier {
    intel: Arc<dyn IpIntel>,
    wildcard: Arc<WildcardSet>,
}

impl Classifier {
    pub fn new(intel: Arc<dyn IpIntel>, wildcard: Arc<WildcardSet>) -> Self {
        Self { intel, wildcard }
    }

    pub fn wildcard(&self) -> &WildcardSet {
        &self.wildcard
    }

    /// The oracle is consulted first, so an address that is both a known CDN
    /// edge and a wildcard answer is reported as CDN.
    pub fn classify(&self, ip: IpAddr) -> Classification {
        let ip: IpAddr = ip.to_canonical();
        let verdict: IntelVerdict = self.intel.check(ip);
        if let Some(err) = &verdict.error {
            debug!("intel lookup for {ip} failed: {err}");
        }

        if verdict.is_provider() {
            Classification::Cdn(verdict.provider)
        } else if self.wildcard.contains(&ip) {
            Classification::WildcardAnycast
        } else {
            Classification::TrueOrigin
        }
    }
}

/// Published edge ranges of well-known CDN and cloud-edge providers.
const CDN_RANGES: &[(&str, &str)] = &[
    ("Cloudflare", "173.245.48.0/20"),
    ("Cloudflare", "103.21.244.0/22"),
    ("Cloudflare", "103.22.200.0/22"),
    ("Cloudflare", "103.31.4.0/22"),
    ("Cloudflare", "141.101.64.0/18"),
    ("Cloudflare", "108.162.192.0/18"),
    ("Cloudflare", "190.93.240.0/20"),
    ("Cloudflare", "188.114.96.0/20"),
    ("Cloudflare", "197.234.240.0/22"),
    ("Cloudflare", "198.41.128.0/17"),
    ("Cloudflare", "162.158.0.0/15"),
    ("Cloudflare", "104.16.0.0/13"),
    ("Cloudflare", "104.24.0.0/14"),
    ("Cloudflare", "172.64.0.0/13"),
    ("Cloudflare", "131.0.72.0/22"),
    ("Cloudflare", "2400:cb00::/32"),
    ("Cloudflare", "2606:4700::/32"),
    ("Cloudflare", "2803:f800::/32"),
    ("Cloudflare", "2405:b500::/32"),
    ("Cloudflare", "2405:8100::/32"),
    ("Cloudflare", "2a06:98c0::/29"),
    ("Cloudflare", "2c0f:f248::/32"),
    ("Fastly", "23.235.32.0/20"),
    ("Fastly", "43.249.72.0/22"),
    ("Fastly", "103.244.50.0/24"),
    ("Fastly", "103.245.222.0/23"),
    ("Fastly", "103.245.224.0/24"),
    ("Fastly", "104.156.80.0/20"),
    ("Fastly", "140.248.64.0/18"),
    ("Fastly", "140.248.128.0/17"),
    ("Fastly", "146.75.0.0/17"),
    ("Fastly", "151.101.0.0/16"),
    ("Fastly", "157.52.64.0/18"),
    ("Fastly", "167.82.0.0/17"),
    ("Fastly", "172.111.64.0/18"),
    ("Fastly", "185.31.16.0/22"),
    ("Fastly", "199.27.72.0/21"),
    ("Fastly", "199.232.0.0/16"),
    ("Fastly", "2a04:4e40::/32"),
    ("Fastly", "2a04:4e42::/32"),
    ("Akamai", "23.32.0.0/11"),
    ("Akamai", "23.64.0.0/14"),
    ("Akamai", "2.16.0.0/13"),
    ("Akamai", "96.16.0.0/15"),
    ("Akamai", "104.64.0.0/10"),
    ("Akamai", "184.24.0.0/13"),
    ("CloudFront", "13.32.0.0/15"),
    ("CloudFront", "13.224.0.0/14"),
    ("CloudFront", "18.64.0.0/14"),
    ("CloudFront", "52.84.0.0/15"),
    ("CloudFront", "54.182.0.0/16"),
    ("CloudFront", "54.192.0.0/16"),
    ("CloudFront", "54.230.0.0/16"),
    ("CloudFront", "54.239.128.0/18"),
    ("CloudFront", "99.84.0.0/16"),
    ("CloudFront", "143.204.0.0/16"),
    ("CloudFront", "205.251.192.0/19"),
    ("Google", "142.250.0.0/15"),
    ("Google", "172.217.0.0/16"),
    ("Google", "216.58.192.0/19"),
    ("Incapsula", "45.60.0.0/16"),
    ("Incapsula", "45.64.64.0/22"),
    ("Incapsula", "103.28.248.0/22"),
    ("Incapsula", "107.154.0.0/16"),
    ("Incapsula", "149.126.72.0/21"),
    ("Incapsula", "185.11.124.0/22"),
    ("Incapsula", "192.230.64.0/18"),
    ("Incapsula", "198.143.32.0/19"),
    ("Incapsula", "199.83.128.0/21"),
    ("Sucuri", "66.248.200.0/22"),
    ("Sucuri", "185.93.228.0/22"),
    ("Sucuri", "192.88.134.0/23"),
    ("Sucuri", "208.109.0.0/22"),
];

/// Oracle backed by a static table of provider ranges.
#[derive(Debug, Clone)]
pub struct CdnRanges {
    ranges: Vec<(IpNetwork, String)>,
}

impl Default for CdnRanges {
    fn default() -> Self {
        let ranges = CDN_RANGES
            .iter()
            .filter_map(|(provider, cidr)| {
                cidr.parse::<IpNetwork>()
                    .ok()
                    .map(|net| (net, provider.to_string()))
            })
            .collect();
        Self { ranges }
    }
}

impl CdnRanges {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn with_range(mut self, network: IpNetwork, provider: impl Into<String>) -> Self {
        self.ranges.push((network, provider.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl IpIntel for CdnRanges {
    fn check(&self, ip: IpAddr) -> IntelVerdict {
        self.ranges
            .iter()
            .find(|(net, _)| net.contains(ip))
            .map(|(_, provider)| IntelVerdict::provider(provider.clone()))
            .unwrap_or_else(IntelVerdict::unknown)
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
