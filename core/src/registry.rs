//! # Dedup Store & Address Registry
//!
//! The only state shared between workers. Both stores wrap their map in a
//! single mutex, and every mutation happens inside one critical section, so
//! a registration can never be lost and an insert-if-absent has exactly one
//! winner.
//!
//! A [`Registry`] is created per run and handed to every component that
//! records addresses; there is no global instance.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Where an address was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Wordlist,
    SpfLeak,
    DnsCname,
    CtLog,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Source::Wordlist => "Wordlist",
            Source::SpfLeak => "SPF Leak",
            Source::DnsCname => "DNS/CNAME",
            Source::CtLog => "CT Log",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Number of registrations, one per call.
    pub count: usize,
    /// Names the address was seen under, in registration order.
    pub names: Vec<String>,
    pub first_seen: Source,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<IpAddr, RegistryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// IPv4-mapped IPv6 addresses are recorded under their IPv4 form.
    pub fn register(&self, ip: IpAddr, name: &str, source: Source) {
        let mut entries = self.lock();
        let entry = entries.entry(ip.to_canonical()).or_insert_with(|| RegistryEntry {
            count: 0,
            names: Vec::new(),
            first_seen: source,
        });
        entry.count += 1;
        entry.names.push(name.to_string());
    }

    pub fn get(&self, ip: &IpAddr) -> Option<RegistryEntry> {
        self.lock().get(&ip.to_canonical()).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every entry, ordered by address.
    pub fn snapshot(&self) -> BTreeMap<IpAddr, RegistryEntry> {
        self.lock()
            .iter()
            .map(|(ip, entry)| (*ip, entry.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, RegistryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identity of a reported finding: the candidate label plus its sorted
/// address set, with IPv4-mapped addresses folded into IPv4.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    label: String,
    addresses: Vec<IpAddr>,
}

impl DedupKey {
    pub fn new(label: &str, addresses: &[IpAddr]) -> Self {
        let mut addresses: Vec<IpAddr> = addresses.iter().map(IpAddr::to_canonical).collect();
        addresses.sort();
        addresses.dedup();
        Self {
            label: label.to_ascii_lowercase(),
            addresses,
        }
    }
}

#[derive(Debug, Default)]
pub struct DedupStore {
    seen: Mutex<HashSet<DedupKey>>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for exactly one caller per key.
    pub fn insert_if_absent(&self, key: DedupKey) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
