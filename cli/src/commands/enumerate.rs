use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::Instrument;

use subscratch_common::config::ScanConfig;
use subscratch_common::hosts::HostsMap;
use subscratch_common::network::domain::Domain;
use subscratch_common::{error, info, success, warn};
use subscratch_core::cluster::{self, SubnetGroup, SubnetLabel};
use subscratch_core::engine::{Engine, ScanStats};
use subscratch_core::intel::{CdnRanges, Classifier};
use subscratch_core::recon::{self, CrtSh};
use subscratch_core::registry::{Registry, RegistryEntry};
use subscratch_core::resolver::pool::default_upstreams;
use subscratch_core::resolver::{Layered, RecordLookup, Resolve, ResolverPool, SystemResolver};
use subscratch_core::signal::StopSignal;
use subscratch_core::sink::FindingSink;
use subscratch_core::wildcard::{self, WildcardSet};

use crate::commands::EnumerateArgs;
use crate::output::{ConsoleSink, PlainMode, PlainSink, ReportFiles, ReportFormat};
use crate::terminal::{colors, format, print, progress};
use crate::{mprint, wordlist};

/// Everything the post-passes need once the worker pool drained.
struct Run {
    domain: Domain,
    cfg: ScanConfig,
    pool: Arc<ResolverPool>,
    direct: Layered,
    classifier: Arc<Classifier>,
    registry: Arc<Registry>,
    plain: Option<Arc<PlainSink>>,
}

pub async fn enumerate(args: EnumerateArgs) -> anyhow::Result<()> {
    let start_time: Instant = Instant::now();
    let cfg: ScanConfig = args.scan_config();
    let domain: Domain = args.domain.clone();
    let silent: bool = args.is_silent();

    let hosts: Option<Arc<HostsMap>> = load_hosts(args.hosts.as_deref(), silent)?;
    let words: Vec<String> = load_wordlist(&args.wordlist, silent).await?;

    if !silent {
        print_settings(&domain, &args.wordlist, words.len(), &cfg);
    }

    let mut rng: StdRng = subscratch_core::rng_from_seed(cfg.seed);
    let pool = Arc::new(ResolverPool::new(
        default_upstreams(),
        StdRng::seed_from_u64(rng.random()),
        cfg.offline,
    ));
    let system: Arc<dyn Resolve> = Arc::new(SystemResolver::new(cfg.offline));
    let resolver: Arc<dyn Resolve> = Arc::new(Layered::new(hosts.clone(), pool.clone()));
    let direct = Layered::new(hosts, system.clone());

    let wildcard: WildcardSet = if cfg.offline {
        info!("Offline mode enabled. Skipping wildcard detection.");
        WildcardSet::default()
    } else {
        info!("Detecting wildcard responses...");
        let found = wildcard::detect(&domain, system.as_ref(), &mut rng).await;
        if !found.is_empty() {
            let ips: Vec<String> = found.sorted().iter().map(|ip| ip.to_string()).collect();
            success!("Detected {} wildcard IP(s): {}", found.len(), ips.join(", "));
        }
        found
    };

    let classifier = Arc::new(Classifier::new(
        Arc::new(CdnRanges::default()),
        Arc::new(wildcard),
    ));
    let registry = Arc::new(Registry::new());

    let plain: Option<Arc<PlainSink>> = match (args.url, args.ip) {
        (true, _) => Some(Arc::new(PlainSink::new(PlainMode::Names))),
        (_, true) => Some(Arc::new(PlainSink::new(PlainMode::Addresses))),
        _ => None,
    };
    let reports = Arc::new(
        ReportFiles::create(Path::new("."), &domain, &report_formats(&args))
            .context("failed to prepare report files")?,
    );

    let mut sinks: Vec<Arc<dyn FindingSink>> = Vec::new();
    match &plain {
        Some(plain) => sinks.push(plain.clone()),
        None => sinks.push(Arc::new(ConsoleSink)),
    }
    if !reports.is_empty() {
        sinks.push(reports.clone());
    }

    let stop = StopSignal::new();
    let interrupt: JoinHandle<()> = spawn_interrupt_handler(stop.clone());

    let mut engine = Engine::new(
        domain.clone(),
        &cfg,
        resolver,
        classifier.clone(),
        registry.clone(),
    )
    .with_stop_signal(stop.clone());
    for sink in &sinks {
        engine = engine.with_sink(sink.clone());
    }

    if !silent {
        mprint!();
        print::header("enumeration");
    }
    let span = (!silent).then(|| progress::enumeration_span(words.len()));
    if let Some(span) = &span {
        engine = engine.on_progress(progress::reporter(span));
    }

    let run = engine.run(words);
    let stats: ScanStats = match span {
        Some(span) => run.instrument(span).await?,
        None => run.await?,
    };

    let run = Run {
        domain,
        cfg,
        pool,
        direct,
        classifier,
        registry,
        plain,
    };

    if stats.interrupted {
        warn!("Scan interrupted, skipping auxiliary discovery.");
    } else {
        info!("Scan complete. All workers have exited.");
        auxiliary_passes(&run, &stop).await;
    }

    infrastructure_report(&run);

    let finished: anyhow::Result<()> = sinks.iter().try_for_each(|sink| sink.finish());
    interrupt.abort();
    finished?;
    for path in reports.paths() {
        success!("Report written to {}", path.display());
    }

    if !silent {
        print_summary(&stats, run.registry.len(), start_time.elapsed());
    }
    Ok(())
}

fn load_hosts(path: Option<&Path>, silent: bool) -> anyhow::Result<Option<Arc<HostsMap>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let hosts = HostsMap::load(path)
        .with_context(|| format!("hosts file error: {}", path.display()))?;
    if !silent {
        info!("Loaded {} host entries from {}", hosts.len(), path.display());
    }
    Ok(Some(Arc::new(hosts)))
}

async fn load_wordlist(source: &str, silent: bool) -> anyhow::Result<Vec<String>> {
    if wordlist::is_url(source) && !silent {
        info!("Fetching wordlist from: {source}");
    }
    let words = wordlist::load(source).await?;
    if wordlist::is_url(source) && !silent {
        success!("Downloaded {} words from online wordlist", words.len());
    }
    Ok(words)
}

fn report_formats(args: &EnumerateArgs) -> Vec<ReportFormat> {
    [
        (args.csv, ReportFormat::Csv),
        (args.txt, ReportFormat::Txt),
        (args.xml, ReportFormat::Xml),
        (args.grep, ReportFormat::Grep),
    ]
    .into_iter()
    .filter_map(|(enabled, format)| enabled.then_some(format))
    .collect()
}

/// First Ctrl-C stops the run gracefully, a second one exits at once.
///
/// Stays alive until the sinks are finished: once installed, the runtime
/// keeps swallowing SIGINT for the rest of the process.
fn spawn_interrupt_handler(stop: StopSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, finishing up with the results collected so far...");
        stop.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            error!("Interrupted again, exiting without flushing reports.");
            std::process::exit(130);
        }
    })
}

fn print_settings(domain: &Domain, source: &str, words: usize, cfg: &ScanConfig) {
    print::header("configuration");
    print::set_key_width(&["Target", "Wordlist", "Workers", "Rate", "Delay", "Mode"]);

    let rate: String = match cfg.rate {
        0 => "unlimited".to_string(),
        qps => format!("{qps} qps, burst {}", cfg.burst),
    };
    let mode: &str = match (cfg.offline, cfg.filter_cdn) {
        (true, true) => "offline, CDN filter",
        (true, false) => "offline",
        (false, true) => "online, CDN filter",
        (false, false) => "online",
    };

    print::aligned_line("Target", domain.as_str().color(colors::PRIMARY).bold());
    print::aligned_line("Wordlist", format!("{source} ({words} words)"));
    print::aligned_line("Workers", cfg.worker_count().to_string());
    print::aligned_line("Rate", rate);
    print::aligned_line(
        "Delay",
        format!("{}ms + 0..={}ms jitter", cfg.delay_ms, cfg.jitter_ms),
    );
    print::aligned_line("Mode", mode);
}

fn section(title: &str, domain: &Domain) {
    mprint!();
    print::header(&format!("{title}: {domain}"));
}

/// SPF, CNAME and CT passes in order, each abandoned as soon as `stop` fires.
async fn auxiliary_passes(run: &Run, stop: &StopSignal) {
    let completed: bool = stop.run_until(spf_pass(run)).await.is_some()
        && stop.run_until(cname_pass(run)).await.is_some();
    if completed {
        ct_pass(run, stop).await;
    }
    if stop.is_triggered() {
        warn!("Auxiliary discovery interrupted.");
    }
}

async fn spf_pass(run: &Run) {
    if run.plain.is_none() {
        section("spf leaks", &run.domain);
    }
    if run.cfg.offline {
        info!("Offline mode enabled. Skipping SPF/TXT checks.");
        return;
    }

    info!("Checking SPF/TXT records for origin IP leaks...");
    let leaked = recon::spf_leaks(&run.domain, &*run.pool, &run.registry).await;
    if leaked.is_empty() {
        info!("No ip4 mechanisms published for {}", run.domain);
    }
    if run.plain.is_none() {
        for ip in leaked {
            print::print(&format!(
                "{} {}",
                format::address(&IpAddr::V4(ip)),
                "[SPF Leak]".color(colors::SHARED)
            ));
        }
    }
}

async fn cname_pass(run: &Run) {
    if run.plain.is_none() {
        section("cname chaser", &run.domain);
    }

    let records: Option<&dyn RecordLookup> = if run.cfg.offline {
        None
    } else {
        Some(&*run.pool)
    };
    let hits = recon::chase_cnames(&run.domain, records, &run.direct, &run.registry).await;

    if run.plain.is_some() {
        return;
    }
    if hits.is_empty() {
        info!("None of the common labels resolved");
    }
    for hit in hits {
        let tag = format::classification(&run.classifier.classify(hit.address));
        let source: String = match &hit.cname {
            Some(cname) => format!("CNAME: {cname}"),
            None => "A".to_string(),
        };
        print::print(&format!(
            "{} {} {} {}",
            pad(&format::address(&hit.address), 15),
            pad(&tag, 25),
            "|".color(colors::SEPARATOR),
            source
        ));
    }
}

async fn ct_pass(run: &Run, stop: &StopSignal) {
    if run.plain.is_none() {
        section("certificate transparency", &run.domain);
    }
    if run.cfg.offline {
        info!("Offline mode enabled. Skipping CT discovery.");
        return;
    }

    let source = match CrtSh::new() {
        Ok(source) => source,
        Err(e) => {
            warn!("CT discovery unavailable: {e:#}");
            return;
        }
    };
    match recon::ct_discovery(&run.domain, &source, &run.direct, &run.registry, stop).await {
        Ok(_) if stop.is_triggered() => {}
        Ok(names) if names.is_empty() => info!("No CT subdomains found"),
        Ok(names) => success!("Found {} subdomains from CT logs", names.len()),
        Err(e) => warn!("CT discovery failed: {e:#}"),
    }
}

fn infrastructure_report(run: &Run) {
    let snapshot: BTreeMap<IpAddr, RegistryEntry> = run.registry.snapshot();
    let groups: Vec<SubnetGroup> =
        cluster::cluster(&snapshot, &run.classifier, run.cfg.shared_threshold);
    let visible = groups
        .iter()
        .filter(|group| !(run.cfg.filter_cdn && matches!(group.label, SubnetLabel::Cdn(_))));

    if let Some(plain) = &run.plain {
        for group in visible {
            match plain.mode() {
                PlainMode::Addresses => plain.print_fresh(&group.members),
                PlainMode::Names => plain.print_fresh(
                    group
                        .members
                        .iter()
                        .filter_map(|ip| snapshot.get(ip))
                        .flat_map(|entry| entry.names.iter()),
                ),
            }
        }
        return;
    }

    section("infrastructure analysis", &run.domain);
    for group in visible {
        let mut lines: Vec<String> = vec![format!(
            "{} {}",
            pad(&group.network.to_string().color(colors::PRIMARY), 18),
            format::subnet_label(&group.label)
        )];
        lines.extend(group.members.iter().map(|ip| {
            let names: usize = snapshot.get(ip).map_or(0, |entry| entry.names.len());
            format!(
                "  {} {} ({} subdomains)",
                "└──".bright_black(),
                pad(&format::address(ip), 15),
                names
            )
        }));
        lines.push(String::new());
        print::block(&lines);
    }
}

/// Left-aligns colored text on its visible width.
fn pad(text: &ColoredString, width: usize) -> String {
    let visible: usize = console::measure_text_width(&text.to_string());
    format!("{}{}", text, " ".repeat(width.saturating_sub(visible)))
}

fn print_summary(stats: &ScanStats, addresses: usize, total_time: Duration) {
    if stats.findings == 0 && addresses == 0 {
        print::header("zero hosts detected");
        print::no_results();
        return;
    }

    let findings: ColoredString = format!("{} subdomains", stats.findings).bold().green();
    let addresses: ColoredString = format!("{addresses} addresses").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!(
        "Enumeration Complete: {findings} and {addresses} in {total_time} ({} probed)",
        stats.probed
    );

    print::fat_separator();
    print::centerln(&output);
}
