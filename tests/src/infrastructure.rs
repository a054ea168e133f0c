use async_trait::async_trait;
use subscratch_common::network::domain::Domain;
use subscratch_core::cluster::{self, SubnetLabel};
use subscratch_core::engine::Engine;
use subscratch_core::intel::{CdnRanges, Classifier};
use subscratch_core::recon::{self, CtSource};
use subscratch_core::registry::{Registry, Source};
use subscratch_core::resolver::{RecordLookup, ResolveError};
use subscratch_core::signal::StopSignal;
use subscratch_core::wildcard::WildcardSet;

use crate::support::{Zone, domain, ip, labels, shared, test_config};

struct SpfOnly;

#[async_trait]
impl RecordLookup for SpfOnly {
    async fn lookup_txt(&self, _name: &str) -> Result<Vec<String>, ResolveError> {
        Ok(vec!["v=spf1 ip4:203.0.113.10 ~all".to_string()])
    }

    async fn lookup_cname(&self, _name: &str) -> Result<Option<String>, ResolveError> {
        Ok(None)
    }
}

struct StaticLog;

#[async_trait]
impl CtSource for StaticLog {
    async fn names(&self, _domain: &Domain) -> anyhow::Result<Vec<String>> {
        Ok(vec!["legacy.example.com".to_string()])
    }
}

const QUIET: &[&str] = &["1.2.3.4"];
const BUSY: &[&str] = &["1.2.3.9"];
const EDGE: &[&str] = &["104.16.5.5"];
const LEGACY: &[&str] = &["203.0.113.11"];

/// Three names on one address and nine on its neighbour, one CDN edge and
/// a CT-only name.
fn zone() -> Zone {
    let busy: Vec<String> = (0..9).map(|i| format!("b{i}.example.com")).collect();
    let mut records: Vec<(&str, &[&str])> = vec![
        ("a0.example.com", QUIET),
        ("a1.example.com", QUIET),
        ("a2.example.com", QUIET),
        ("cdn.example.com", EDGE),
        ("legacy.example.com", LEGACY),
    ];
    records.extend(busy.iter().map(|name| (name.as_str(), BUSY)));
    Zone::new(&records)
}

#[tokio::test]
async fn every_source_feeds_the_subnet_report() {
    let zone = shared(zone());
    let classifier = shared(Classifier::new(
        shared(CdnRanges::default()),
        shared(WildcardSet::default()),
    ));
    let registry = shared(Registry::new());

    let words: Vec<String> = (0..3)
        .map(|i| format!("a{i}"))
        .chain((0..9).map(|i| format!("b{i}")))
        .chain(labels(&["cdn"]))
        .collect();
    let stats = Engine::new(domain(), &test_config(), zone.clone(), classifier.clone(), registry.clone())
        .run(words)
        .await
        .unwrap();
    assert_eq!(stats.findings, 13);

    recon::spf_leaks(&domain(), &SpfOnly, &registry).await;
    recon::ct_discovery(&domain(), &StaticLog, &*zone, &registry, &StopSignal::new())
        .await
        .unwrap();

    assert_eq!(registry.get(&ip("203.0.113.10")).unwrap().first_seen, Source::SpfLeak);
    assert_eq!(registry.get(&ip("203.0.113.11")).unwrap().first_seen, Source::CtLog);

    let groups = cluster::cluster(&registry.snapshot(), &classifier, 10);
    let labels: Vec<(String, SubnetLabel)> = groups
        .iter()
        .map(|group| (group.network.to_string(), group.label.clone()))
        .collect();

    assert_eq!(
        labels,
        vec![
            ("1.2.3.0/24".to_string(), SubnetLabel::SharedInfrastructure),
            ("104.16.5.0/24".to_string(), SubnetLabel::Cdn("Cloudflare".to_string())),
            ("203.0.113.0/24".to_string(), SubnetLabel::UniqueOrigin),
        ]
    );
    assert_eq!(groups[0].host_associations, 12);
    assert_eq!(groups[2].members.len(), 2);
}

#[tokio::test]
async fn quiet_block_stays_a_unique_origin() {
    let zone = shared(zone());
    let classifier = shared(Classifier::new(
        shared(CdnRanges::empty()),
        shared(WildcardSet::default()),
    ));
    let registry = shared(Registry::new());

    Engine::new(domain(), &test_config(), zone, classifier.clone(), registry.clone())
        .run(labels(&["a0", "a1", "a2"]))
        .await
        .unwrap();

    let groups = cluster::cluster(&registry.snapshot(), &classifier, 10);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, SubnetLabel::UniqueOrigin);
    assert_eq!(groups[0].host_associations, 3);
}
