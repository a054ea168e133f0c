//! # Subnet Clustering
//!
//! Post-pass over the registry once every worker has exited.
//!
//! Addresses are grouped by network block (/24 for IPv4, /64 for IPv6). The
//! number of hostnames pointing into a block is a cheap multi-tenancy signal:
//! a block carrying many names is most likely shared hosting, a block with a
//! handful is a better origin-server candidate.
//!
//! This is a heuristic. A dedicated server can sit in a busy block and a
//! shared host can look quiet when only a few of its tenants are known.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::net::IpAddr;

use pnet::ipnetwork::IpNetwork;

use subscratch_common::network::subnet;

use crate::intel::{Classification, Classifier};
use crate::registry::RegistryEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetLabel {
    Cdn(String),
    SharedInfrastructure,
    UniqueOrigin,
}

impl fmt::Display for SubnetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetLabel::Cdn(provider) => write!(f, "CDN: {provider}"),
            SubnetLabel::SharedInfrastructure => f.write_str("SHARED INFRA"),
            SubnetLabel::UniqueOrigin => f.write_str("UNIQUE ORIGIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    pub network: IpNetwork,
    pub members: BTreeSet<IpAddr>,
    /// Sum of associated names over every member.
    pub host_associations: usize,
    pub label: SubnetLabel,
}

/// Groups `entries` by block and labels each group.
///
/// One member (the lowest address) is classified as a sample for the whole
/// block. Groups come back ordered by network address.
pub fn cluster(
    entries: &BTreeMap<IpAddr, RegistryEntry>,
    classifier: &Classifier,
    shared_threshold: usize,
) -> Vec<SubnetGroup> {
    let mut blocks: HashMap<IpNetwork, (BTreeSet<IpAddr>, usize)> = HashMap::new();

    for (ip, entry) in entries {
        let (members, associations) = blocks.entry(subnet::block_of(*ip)).or_default();
        members.insert(*ip);
        *associations += entry.names.len();
    }

    let mut groups: Vec<SubnetGroup> = blocks
        .into_iter()
        .filter_map(|(network, (members, host_associations))| {
            let sample: IpAddr = *members.iter().next()?;
            let label = match classifier.classify(sample) {
                Classification::Cdn(provider) => SubnetLabel::Cdn(provider),
                _ if host_associations > shared_threshold => SubnetLabel::SharedInfrastructure,
                _ => SubnetLabel::UniqueOrigin,
            };
            Some(SubnetGroup {
                network,
                members,
                host_associations,
                label,
            })
        })
        .collect();

    groups.sort_by_key(|group| (group.network.network(), group.network.prefix()));
    groups
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
