//! Network block helpers for clustering addresses.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

pub const IPV4_BLOCK_PREFIX: u8 = 24;
pub const IPV6_BLOCK_PREFIX: u8 = 64;

/// Returns the block `ip` belongs to: its /24 for IPv4, its /64 for IPv6.
pub fn block_of(ip: IpAddr) -> IpNetwork {
    match ip {
        IpAddr::V4(v4) => IpNetwork::V4(ipv4_block(v4)),
        IpAddr::V6(v6) => IpNetwork::V6(ipv6_block(v6)),
    }
}

fn ipv4_block(ip: Ipv4Addr) -> Ipv4Network {
    let mask: u32 = u32::MAX << (32 - IPV4_BLOCK_PREFIX);
    let network = Ipv4Addr::from(u32::from(ip) & mask);
    // The prefix is a compile-time constant below 32, construction cannot fail.
    Ipv4Network::new(network, IPV4_BLOCK_PREFIX).unwrap_or_else(|_| Ipv4Network::from(network))
}

fn ipv6_block(ip: Ipv6Addr) -> Ipv6Network {
    let mask: u128 = u128::MAX << (128 - IPV6_BLOCK_PREFIX);
    let network = Ipv6Addr::from(u128::from(ip) & mask);
    Ipv6Network::new(network, IPV6_BLOCK_PREFIX).unwrap_or_else(|_| Ipv6Network::from(network))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
