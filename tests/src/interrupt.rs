use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use subscratch_common::network::domain::Domain;
use subscratch_core::engine::Engine;
use subscratch_core::intel::{CdnRanges, Classifier};
use subscratch_core::recon::{self, CtSource};
use subscratch_core::registry::{Registry, Source};
use subscratch_core::resolver::{RecordLookup, ResolveError};
use subscratch_core::signal::StopSignal;
use subscratch_core::sink::{Finding, FindingSink};
use subscratch_core::wildcard::WildcardSet;

use crate::support::{Zone, domain, ip, labels, shared, test_config};

/// Buffers names until `finish` moves them to `flushed`.
#[derive(Default)]
struct BufferedSink {
    pending: Mutex<Vec<String>>,
    flushed: Mutex<Vec<String>>,
}

impl BufferedSink {
    fn flushed(&self) -> Vec<String> {
        let mut names = self.flushed.lock().unwrap().clone();
        names.sort();
        names
    }
}

impl FindingSink for BufferedSink {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()> {
        self.pending.lock().unwrap().push(finding.name.clone());
        Ok(())
    }

    fn finish(&self) -> anyhow::Result<()> {
        let mut pending = self.pending.lock().unwrap();
        self.flushed.lock().unwrap().append(&mut pending);
        Ok(())
    }
}

/// Record lookups never answer.
struct StalledTxt;

#[async_trait]
impl RecordLookup for StalledTxt {
    async fn lookup_txt(&self, _name: &str) -> Result<Vec<String>, ResolveError> {
        std::future::pending().await
    }

    async fn lookup_cname(&self, _name: &str) -> Result<Option<String>, ResolveError> {
        std::future::pending().await
    }
}

/// A CT log that never answers.
struct StalledLog;

#[async_trait]
impl CtSource for StalledLog {
    async fn names(&self, _domain: &Domain) -> anyhow::Result<Vec<String>> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn stop_during_auxiliary_passes_still_flushes_findings() {
    let zone = shared(Zone::new(&[
        ("api.example.com", &["10.0.0.5"]),
        ("www.example.com", &["10.0.0.6"]),
    ]));
    let classifier = shared(Classifier::new(
        shared(CdnRanges::empty()),
        shared(WildcardSet::default()),
    ));
    let registry = shared(Registry::new());
    let sink = shared(BufferedSink::default());
    let stop = StopSignal::new();

    let stats = Engine::new(domain(), &test_config(), zone.clone(), classifier, registry.clone())
        .with_stop_signal(stop.clone())
        .with_sink(sink.clone())
        .run(labels(&["api", "www", "missing"]))
        .await
        .unwrap();
    assert!(!stats.interrupted);
    assert_eq!(stats.findings, 2);

    let trigger = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
    });

    let passes = async {
        let spf = stop
            .run_until(recon::spf_leaks(&domain(), &StalledTxt, &registry))
            .await;
        let ct = recon::ct_discovery(&domain(), &StalledLog, &*zone, &registry, &stop).await;
        (spf, ct)
    };
    let (spf, ct) = tokio::time::timeout(Duration::from_secs(2), passes)
        .await
        .expect("auxiliary passes ignored the stop signal");

    assert!(spf.is_none());
    assert!(ct.unwrap().is_empty());

    sink.finish().unwrap();
    assert_eq!(sink.flushed(), vec!["api.example.com", "www.example.com"]);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(&ip("10.0.0.5")).unwrap().first_seen, Source::Wordlist);
}
