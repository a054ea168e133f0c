//! Extraction of `ip4:` mechanisms from SPF/TXT records.
//!
//! Mail senders listed in SPF are frequently the origin servers a CDN is
//! supposed to hide.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

const IP4_MECHANISM: &str = "ip4:";

/// Returns every `ip4:` address found in `records`, in order of appearance.
///
/// CIDR values (`ip4:203.0.113.0/24`) yield their network address. Qualified
/// mechanisms (`+ip4:`, `~ip4:`) are accepted, malformed values are skipped.
pub fn extract_ip4(records: &[String]) -> Vec<Ipv4Addr> {
    let mut found: Vec<Ipv4Addr> = Vec::new();

    for record in records {
        for token in record.split_whitespace() {
            let token = token.trim_start_matches(['+', '-', '~', '?']);
            let Some(prefix) = token.get(..IP4_MECHANISM.len()) else {
                continue;
            };
            if !prefix.eq_ignore_ascii_case(IP4_MECHANISM) {
                continue;
            }

            let value = &token[IP4_MECHANISM.len()..];
            if let Some(ip) = parse_ip4_value(value)
                && !found.contains(&ip)
            {
                found.push(ip);
            }
        }
    }

    found
}

fn parse_ip4_value(value: &str) -> Option<Ipv4Addr> {
    if value.contains('/') {
        return value.parse::<Ipv4Network>().ok().map(|net| net.network());
    }
    value.parse::<Ipv4Addr>().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
