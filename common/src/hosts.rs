//! # Hosts Override Map
//!
//! A static `host -> addresses` table supplied by the operator. When loaded it
//! short-circuits every network lookup, which makes fully offline runs and
//! deterministic test environments possible.
//!
//! The format follows `/etc/hosts` with the columns swapped:
//!
//! ```text
//! # comment
//! api.example.com 10.0.0.5
//! www.example.com 10.0.0.6 10.0.0.7
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostsError {
    #[error("invalid hosts entry at line {line}")]
    Parse { line: usize },
    #[error("invalid address '{value}' at line {line}")]
    InvalidAddress { line: usize, value: String },
    #[error("failed to read hosts file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct HostsMap {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl HostsMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostsError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, HostsError> {
        let mut entries: HashMap<String, Vec<IpAddr>> = HashMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no: usize = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(host) = fields.next() else {
                continue;
            };

            let addrs = fields
                .map(|value| {
                    value.parse::<IpAddr>().map_err(|_| HostsError::InvalidAddress {
                        line: line_no,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<IpAddr>, _>>()?;

            if addrs.is_empty() {
                return Err(HostsError::Parse { line: line_no });
            }

            entries
                .entry(normalize(host))
                .or_default()
                .extend(addrs);
        }

        Ok(Self { entries })
    }

    /// Case-insensitive lookup. A trailing root dot is ignored.
    pub fn lookup(&self, name: &str) -> Option<&[IpAddr]> {
        self.entries.get(&normalize(name)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
