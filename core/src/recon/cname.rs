use std::collections::HashSet;
use std::net::IpAddr;

use tracing::debug;

use subscratch_common::network::domain::Domain;

use crate::registry::{Registry, Source};
use crate::resolver::{RecordLookup, Resolve};

/// Labels probed directly; the empty label is the apex.
pub const COMMON_LABELS: &[&str] = &[
    "", "www", "dev", "api", "origin", "staging", "internal", "mail", "portal",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameHit {
    pub name: String,
    pub address: IpAddr,
    /// Target of the CNAME hop, when the name is an alias.
    pub cname: Option<String>,
}

/// Resolves [`COMMON_LABELS`] and registers every address found.
///
/// `records` is `None` in offline runs, in which case CNAME hops are not
/// looked up and only the resolver (usually backed by the hosts map) runs.
/// Each address is reported once, under the first name that produced it.
pub async fn chase_cnames(
    domain: &Domain,
    records: Option<&dyn RecordLookup>,
    resolver: &dyn Resolve,
    registry: &Registry,
) -> Vec<CnameHit> {
    let mut seen: HashSet<IpAddr> = HashSet::new();
    let mut hits: Vec<CnameHit> = Vec::new();

    for label in COMMON_LABELS {
        let name: String = domain.join(label);

        let cname: Option<String> = match records {
            Some(records) => records
                .lookup_cname(&name)
                .await
                .ok()
                .flatten()
                .map(|target| target.trim_end_matches('.').to_string())
                .filter(|target| !target.eq_ignore_ascii_case(&name)),
            None => None,
        };

        let resolution = match resolver.resolve(&name).await {
            Ok(resolution) => resolution,
            Err(e) => {
                debug!("{name}: {e}");
                continue;
            }
        };

        for address in resolution.addresses {
            registry.register(address, &name, Source::DnsCname);
            if seen.insert(address) {
                hits.push(CnameHit {
                    name: name.clone(),
                    address,
                    cname: cname.clone(),
                });
            }
        }
    }

    hits
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
