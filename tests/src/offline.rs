use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use subscratch_common::config::ScanConfig;
use subscratch_common::hosts::HostsMap;
use subscratch_core::engine::Engine;
use subscratch_core::intel::{CdnRanges, Classifier};
use subscratch_core::recon;
use subscratch_core::registry::{Registry, Source};
use subscratch_core::resolver::pool::default_upstreams;
use subscratch_core::resolver::{
    Layered, Resolve, ResolveError, ResolverPool, SystemResolver,
};
use subscratch_core::sink::{CollectSink, Finding};
use subscratch_core::wildcard::WildcardSet;

use crate::support::{domain, ip, labels};

const HOSTS: &str = "\
# offline fixture
api.example.com 10.0.0.5
Mail.Example.com. 10.0.0.25
";

fn offline_config() -> ScanConfig {
    ScanConfig {
        rate: 0,
        offline: true,
        seed: Some(9),
        ..ScanConfig::default()
    }
}

fn offline_pool() -> Arc<ResolverPool> {
    Arc::new(ResolverPool::new(
        default_upstreams(),
        StdRng::seed_from_u64(9),
        true,
    ))
}

async fn offline_run(words: &[&str]) -> (Vec<Finding>, Arc<Registry>) {
    let hosts = Arc::new(HostsMap::parse(HOSTS).unwrap());
    let resolver = Arc::new(Layered::new(Some(hosts), offline_pool()));
    let classifier = Arc::new(Classifier::new(
        Arc::new(CdnRanges::default()),
        Arc::new(WildcardSet::default()),
    ));
    let registry = Arc::new(Registry::new());
    let sink = Arc::new(CollectSink::new());

    Engine::new(domain(), &offline_config(), resolver, classifier, registry.clone())
        .with_sink(sink.clone())
        .run(labels(words))
        .await
        .unwrap();

    (sink.findings(), registry)
}

#[tokio::test]
async fn offline_run_resolves_only_from_the_hosts_map() {
    let (findings, registry) = offline_run(&["api", "www", "dev", "staging"]).await;

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].name, "api.example.com");
    assert_eq!(findings[0].addresses, vec![ip("10.0.0.5")]);
    assert_eq!(findings[0].resolver.label(), "local");
    assert_eq!(findings[0].resolver.display_name(), "LocalHosts");
    assert_eq!(registry.get(&ip("10.0.0.5")).unwrap().first_seen, Source::Wordlist);
}

#[tokio::test]
async fn offline_runs_are_reproducible() {
    let words = ["mail", "api", "www", "api"];
    let (first, _) = offline_run(&words).await;
    let (second, _) = offline_run(&words).await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn offline_network_resolvers_refuse_every_query() {
    let pool = offline_pool();
    assert!(matches!(
        pool.resolve("api.example.com").await,
        Err(ResolveError::Offline)
    ));

    let system = SystemResolver::new(true);
    assert!(matches!(
        system.resolve("localhost").await,
        Err(ResolveError::Offline)
    ));
}

#[tokio::test]
async fn fixed_label_pass_still_reads_the_hosts_map_offline() {
    let hosts = Arc::new(HostsMap::parse(HOSTS).unwrap());
    let direct = Layered::new(Some(hosts), Arc::new(SystemResolver::new(true)));
    let registry = Registry::new();

    let hits = recon::chase_cnames(&domain(), None, &direct, &registry).await;

    let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();
    assert_eq!(names, vec!["api.example.com", "mail.example.com"]);
    assert_eq!(
        registry.get(&ip("10.0.0.25")).unwrap().first_seen,
        Source::DnsCname
    );
}
