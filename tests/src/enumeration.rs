use rand::SeedableRng;
use rand::rngs::StdRng;
use subscratch_common::config::ScanConfig;
use subscratch_core::engine::Engine;
use subscratch_core::intel::{CdnRanges, Classification, Classifier};
use subscratch_core::registry::{DedupStore, Registry};
use subscratch_core::sink::CollectSink;
use subscratch_core::wildcard::{self, WildcardSet};

use crate::support::{Zone, domain, ip, labels, shared, test_config};

#[tokio::test]
async fn second_run_over_the_same_store_reports_nothing_new() {
    let zone = shared(Zone::new(&[
        ("api.example.com", &["10.0.0.5"]),
        ("www.example.com", &["10.0.0.6", "10.0.0.7"]),
    ]));
    let classifier = shared(Classifier::new(
        shared(CdnRanges::empty()),
        shared(WildcardSet::default()),
    ));
    let registry = shared(Registry::new());
    let dedup = shared(DedupStore::new());
    let sink = shared(CollectSink::new());

    let engine = Engine::new(domain(), &test_config(), zone.clone(), classifier, registry.clone())
        .with_dedup(dedup.clone())
        .with_sink(sink.clone());

    let first = engine.run(labels(&["api", "www", "ftp"])).await.unwrap();
    let second = engine.run(labels(&["www", "api"])).await.unwrap();

    assert_eq!(first.findings, 2);
    assert_eq!(second.findings, 0);
    assert_eq!(second.probed, 2);
    assert_eq!(zone.queries(), 5);
    assert_eq!(sink.findings().len(), 2);
    assert_eq!(dedup.len(), 2);
    // Registration only happens for winners.
    assert_eq!(registry.get(&ip("10.0.0.5")).unwrap().count, 1);
}

#[tokio::test]
async fn wildcard_answers_are_suppressed() {
    let zone = shared(
        Zone::new(&[
            ("api.example.com", &["10.0.0.5"]),
            ("mixed.example.com", &["9.9.9.9", "10.0.0.9"]),
        ])
        .with_wildcard(&["9.9.9.9"]),
    );

    let mut rng = StdRng::seed_from_u64(3);
    let wildcard: WildcardSet = wildcard::detect(&domain(), &*zone, &mut rng).await;
    assert_eq!(wildcard.sorted(), vec![ip("9.9.9.9")]);

    let classifier = shared(Classifier::new(shared(CdnRanges::empty()), shared(wildcard)));
    let registry = shared(Registry::new());
    let sink = shared(CollectSink::new());
    let engine = Engine::new(domain(), &test_config(), zone, classifier, registry.clone())
        .with_sink(sink.clone());

    let stats = engine
        .run(labels(&["api", "nope", "random", "mixed"]))
        .await
        .unwrap();

    let findings = sink.findings();
    assert_eq!(stats.findings, 2);
    assert_eq!(findings[0].name, "api.example.com");
    assert_eq!(findings[1].name, "mixed.example.com");
    assert_eq!(
        findings[1].tags,
        vec![Classification::WildcardAnycast, Classification::TrueOrigin]
    );
    assert!(registry.get(&ip("9.9.9.9")).is_some());
    assert_eq!(registry.get(&ip("9.9.9.9")).unwrap().names, vec!["mixed.example.com"]);
}

#[tokio::test]
async fn filtering_drops_cdn_and_wildcard_addresses() {
    let zone = shared(Zone::new(&[
        ("cdn.example.com", &["104.16.1.1"]),
        ("mixed.example.com", &["104.16.1.2", "198.51.100.20"]),
    ]));
    let classifier = shared(Classifier::new(
        shared(CdnRanges::default()),
        shared(WildcardSet::default()),
    ));
    let registry = shared(Registry::new());
    let sink = shared(CollectSink::new());
    let cfg = ScanConfig {
        filter_cdn: true,
        ..test_config()
    };

    let engine = Engine::new(domain(), &cfg, zone, classifier, registry.clone())
        .with_sink(sink.clone());
    engine.run(labels(&["cdn", "mixed"])).await.unwrap();

    let findings = sink.findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].addresses, vec![ip("198.51.100.20")]);
    assert_eq!(registry.len(), 1);
}
