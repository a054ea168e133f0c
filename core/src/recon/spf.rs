use std::net::{IpAddr, Ipv4Addr};

use tracing::debug;

use subscratch_common::network::domain::Domain;
use subscratch_protocols::spf;

use crate::registry::{Registry, Source};
use crate::resolver::RecordLookup;

/// Registers every `ip4:` address published in the apex TXT records.
pub async fn spf_leaks(
    domain: &Domain,
    records: &dyn RecordLookup,
    registry: &Registry,
) -> Vec<Ipv4Addr> {
    let txt: Vec<String> = match records.lookup_txt(domain.as_str()).await {
        Ok(txt) => txt,
        Err(e) => {
            debug!("no TXT records for {domain}: {e}");
            return Vec::new();
        }
    };

    let leaked: Vec<Ipv4Addr> = spf::extract_ip4(&txt);
    for ip in &leaked {
        registry.register(IpAddr::V4(*ip), domain.as_str(), Source::SpfLeak);
    }
    leaked
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use async_trait::async_trait;

    struct Txt(Vec<String>);

    #[async_trait]
    impl RecordLookup for Txt {
        async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ResolveError> {
            if self.0.is_empty() {
                return Err(ResolveError::NotFound(name.to_string()));
            }
            Ok(self.0.clone())
        }

        async fn lookup_cname(&self, _name: &str) -> Result<Option<String>, ResolveError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn spf_addresses_are_registered_under_the_apex() {
        let domain: Domain = "example.com".parse().unwrap();
        let records = Txt(vec![
            "v=spf1 ip4:203.0.113.7 ip4:198.51.100.0/24 include:_spf.google.com -all".to_string(),
            "google-site-verification=abc".to_string(),
        ]);
        let registry = Registry::new();

        let leaked = spf_leaks(&domain, &records, &registry).await;

        assert_eq!(leaked.len(), 2);
        let entry = registry.get(&"203.0.113.7".parse().unwrap()).unwrap();
        assert_eq!(entry.names, vec!["example.com"]);
        assert_eq!(entry.first_seen, Source::SpfLeak);
        assert!(registry.get(&"198.51.100.0".parse().unwrap()).is_some());
    }

    #[tokio::test]
    async fn missing_txt_records_are_not_an_error() {
        let domain: Domain = "example.com".parse().unwrap();
        let registry = Registry::new();

        assert!(spf_leaks(&domain, &Txt(Vec::new()), &registry).await.is_empty());
        assert!(registry.is_empty());
    }
}
