//! # Target Domain Model
//!
//! The apex every candidate label is appended to. Parsing normalizes case,
//! strips a trailing root dot and rejects anything that is not a plain
//! hostname (URLs, wildcards, IP literals).

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain cannot be empty")]
    Empty,
    #[error("domain is longer than {MAX_NAME_LEN} characters")]
    TooLong,
    #[error("'{0}' is an IP address, not a domain")]
    IpLiteral(String),
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds `label.domain`, normalizing the label the same way candidates are.
    pub fn join(&self, label: &str) -> String {
        let label = normalize_label(label);
        if label.is_empty() {
            return self.0.clone();
        }
        format!("{label}.{}", self.0)
    }

    /// Returns `true` when `name` is the apex itself or one of its subdomains.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim_end_matches('.').to_ascii_lowercase();
        name == self.0 || name.ends_with(&format!(".{}", self.0))
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().trim_end_matches('.').to_ascii_lowercase();

        if lower.is_empty() {
            return Err(DomainError::Empty);
        }
        if lower.len() > MAX_NAME_LEN {
            return Err(DomainError::TooLong);
        }
        if lower.parse::<IpAddr>().is_ok() {
            return Err(DomainError::IpLiteral(lower));
        }

        for label in lower.split('.') {
            if !is_valid_label(label) {
                return Err(DomainError::InvalidLabel(label.to_string()));
            }
        }

        Ok(Self(lower))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims and lower-cases a wordlist entry.
pub fn normalize_label(label: &str) -> String {
    label.trim().trim_matches('.').to_ascii_lowercase()
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
