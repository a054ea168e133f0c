use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use subscratch_core::sink::{Finding, FindingSink};

use crate::terminal::print;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlainMode {
    Names,
    Addresses,
}

/// Bare one-value-per-line output for piping into other tools.
///
/// Every value is printed at most once per run, including values handed in
/// later by the auxiliary passes.
pub struct PlainSink {
    mode: PlainMode,
    printed: Mutex<HashSet<String>>,
}

impl PlainSink {
    pub fn new(mode: PlainMode) -> Self {
        Self {
            mode,
            printed: Mutex::new(HashSet::new()),
        }
    }

    pub fn mode(&self) -> PlainMode {
        self.mode
    }

    /// Returns the values not printed before, in input order.
    pub fn fresh<I, S>(&self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        values
            .into_iter()
            .map(|value| value.to_string())
            .filter(|value| printed.insert(value.clone()))
            .collect()
    }

    pub fn print_fresh<I, S>(&self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let fresh: Vec<String> = self.fresh(values);
        if !fresh.is_empty() {
            print::block(&fresh);
        }
    }
}

impl FindingSink for PlainSink {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()> {
        match self.mode {
            PlainMode::Names => self.print_fresh([&finding.name]),
            PlainMode::Addresses => self.print_fresh(&finding.addresses),
        }
        Ok(())
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
