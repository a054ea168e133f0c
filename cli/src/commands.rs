pub mod enumerate;
pub mod resolvers;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use subscratch_common::config::{
    DEFAULT_BURST, DEFAULT_RATE, DEFAULT_SHARED_THRESHOLD, DEFAULT_WORKERS, ScanConfig,
};
use subscratch_common::network::domain::Domain;

#[derive(Parser)]
#[command(name = "subscratch")]
#[command(about = "A rate-limited subdomain enumerator and origin finder.")]
pub struct CommandLine {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Brute-force subdomains of a domain and map their infrastructure
    #[command(alias = "e")]
    Enumerate(EnumerateArgs),
    /// List the public resolvers queries are rotated across
    #[command(alias = "r")]
    Resolvers,
}

#[derive(Args)]
pub struct EnumerateArgs {
    /// Target apex domain
    pub domain: Domain,
    /// Path or http(s) URL of the wordlist
    #[arg(short, long, default_value = "subs.txt")]
    pub wordlist: String,
    /// Number of workers
    #[arg(short = 't', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
    /// Global query rate in queries per second (0 = unlimited)
    #[arg(long, default_value_t = DEFAULT_RATE)]
    pub qps: u32,
    /// Rate limiter burst size
    #[arg(long, default_value_t = DEFAULT_BURST)]
    pub burst: u32,
    /// Base delay before each query, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay: u64,
    /// Random delay added on top of --delay, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub jitter: u64,
    /// Hide CDN and wildcard addresses
    #[arg(long)]
    pub filter: bool,
    /// Local hosts map (`host ip1 [ip2...]` per line)
    #[arg(long)]
    pub hosts: Option<PathBuf>,
    /// Disable every network lookup (DNS, SPF, CT)
    #[arg(long)]
    pub offline: bool,
    /// Print discovered names only
    #[arg(long, conflicts_with = "ip")]
    pub url: bool,
    /// Print discovered addresses only
    #[arg(long)]
    pub ip: bool,
    /// Write <domain>_recon.csv
    #[arg(long)]
    pub csv: bool,
    /// Write <domain>_recon.txt
    #[arg(long)]
    pub txt: bool,
    /// Write <domain>_recon.xml
    #[arg(long)]
    pub xml: bool,
    /// Write <domain>_recon.grep
    #[arg(long)]
    pub grep: bool,
    /// Seed resolver rotation and jitter for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
    /// Host associations above which a /24 is reported as shared
    #[arg(long, default_value_t = DEFAULT_SHARED_THRESHOLD)]
    pub threshold: usize,
}

impl EnumerateArgs {
    /// `--url` and `--ip` runs print bare values only.
    pub fn is_silent(&self) -> bool {
        self.url || self.ip
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            rate: self.qps,
            burst: self.burst,
            workers: self.workers,
            delay_ms: self.delay,
            jitter_ms: self.jitter,
            offline: self.offline,
            filter_cdn: self.filter,
            shared_threshold: self.threshold,
            seed: self.seed,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
