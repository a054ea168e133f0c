//! Where findings go.
//!
//! The engine hands each unique finding to every configured sink. Rendering
//! and file formats belong to the sinks; the engine only guarantees that a
//! finding is emitted once.

use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};

use crate::intel::Classification;
use crate::resolver::ResolverId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Fully qualified name, `label.domain`.
    pub name: String,
    pub label: String,
    pub addresses: Vec<IpAddr>,
    /// One tag per entry in `addresses`.
    pub tags: Vec<Classification>,
    pub resolver: ResolverId,
}

/// Sinks are shared by every worker and must serialize their own writes.
pub trait FindingSink: Send + Sync {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()>;

    /// Called once after the worker pool has drained or been interrupted.
    fn finish(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps every finding in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    findings: Mutex<Vec<Finding>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected findings sorted by name.
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = self
            .findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        findings.sort_by(|a, b| a.name.cmp(&b.name).then(a.addresses.cmp(&b.addresses)));
        findings
    }
}

impl FindingSink for CollectSink {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()> {
        self.findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(finding.clone());
        Ok(())
    }
}
