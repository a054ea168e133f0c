use crate::terminal::colors;
use colored::*;
use std::net::{IpAddr, Ipv6Addr};
use subscratch_core::cluster::SubnetLabel;
use subscratch_core::intel::Classification;

pub fn ipv6_to_type_str(ipv6_addr: &Ipv6Addr) -> &'static str {
    if is_global_unicast(ipv6_addr) {
        return "GUA";
    }
    if ipv6_addr.is_unique_local() {
        return "ULA";
    }
    if ipv6_addr.is_unicast_link_local() {
        return "LLA";
    }
    "IPv6"
}

// 2000::/3
fn is_global_unicast(ipv6_addr: &Ipv6Addr) -> bool {
    let first_byte = ipv6_addr.octets()[0];
    (0x20..=0x3F).contains(&first_byte)
}

pub fn address(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(_) => ip.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(_) => ip.to_string().color(colors::IPV6_ADDR),
    }
}

pub fn classification(tag: &Classification) -> ColoredString {
    let text: String = format!("[{tag}]");
    match tag {
        Classification::Cdn(_) => text.color(colors::CDN),
        Classification::WildcardAnycast => text.color(colors::WILDCARD),
        Classification::TrueOrigin => text.color(colors::ORIGIN).bold(),
    }
}

pub fn subnet_label(label: &SubnetLabel) -> ColoredString {
    let text: String = format!("[{label}]");
    match label {
        SubnetLabel::Cdn(_) => text.color(colors::CDN),
        SubnetLabel::SharedInfrastructure => text.color(colors::SHARED),
        SubnetLabel::UniqueOrigin => text.color(colors::ORIGIN).bold(),
    }
}

/// One `(kind, "address [tag]")` pair per address.
pub fn address_details(ips: &[IpAddr], tags: &[Classification]) -> Vec<(String, ColoredString)> {
    ips.iter()
        .zip(tags)
        .map(|(ip, tag)| {
            let key: &str = match ip {
                IpAddr::V4(_) => "IPv4",
                IpAddr::V6(ipv6_addr) => ipv6_to_type_str(ipv6_addr),
            };
            let value: ColoredString = format!("{} {}", address(ip), classification(tag)).normal();
            (key.to_string(), value)
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
