//! Certificate transparency search results (crt.sh JSON output).

use std::collections::BTreeSet;

use anyhow::Context;
use serde::Deserialize;

use subscratch_common::network::domain::Domain;

#[derive(Debug, Deserialize)]
struct CtEntry {
    name_value: String,
}

/// Builds the crt.sh search URL for every certificate under `domain`.
pub fn search_url(domain: &Domain) -> String {
    format!("https://crt.sh/?q=%25.{domain}&output=json")
}

/// Extracts the unique hostnames under `domain` from a crt.sh JSON body.
///
/// A single entry may carry several newline-separated names. Wildcard
/// prefixes are stripped and names outside `domain` are dropped.
pub fn parse_names(body: &str, domain: &Domain) -> anyhow::Result<Vec<String>> {
    let entries: Vec<CtEntry> =
        serde_json::from_str(body).context("failed to decode CT search results")?;

    let names: BTreeSet<String> = entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(|name| {
            name.trim()
                .trim_start_matches("*.")
                .trim_end_matches('.')
                .to_ascii_lowercase()
        })
        .filter(|name| !name.is_empty() && !name.contains('*') && domain.contains(name))
        .collect();

    Ok(names.into_iter().collect())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
