use colored::*;

use subscratch_core::sink::{Finding, FindingSink};

use crate::terminal::{colors, format, print};

/// Default human readable output: one small tree per finding.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn render(finding: &Finding) -> Vec<String> {
        let resolver: ColoredString = format!("via {}", finding.resolver).color(colors::RESOLVER);
        let mut lines: Vec<String> = vec![print::tree_head(&finding.name, resolver)];
        lines.extend(print::tree_one_level(&format::address_details(
            &finding.addresses,
            &finding.tags,
        )));
        lines
    }
}

impl FindingSink for ConsoleSink {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()> {
        print::block(&Self::render(finding));
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
