//! `<domain>_recon.<ext>` report files.
//!
//! Every file is opened and given its header before the first worker
//! starts, sits behind its own mutex while workers append rows, and gets
//! its footer on [`FindingSink::finish`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;

use subscratch_common::network::domain::Domain;
use subscratch_core::registry::Source;
use subscratch_core::sink::{Finding, FindingSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Txt,
    Csv,
    Xml,
    Grep,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "txt",
            ReportFormat::Csv => "csv",
            ReportFormat::Xml => "xml",
            ReportFormat::Grep => "grep",
        }
    }

    pub fn file_name(&self, domain: &Domain) -> String {
        format!("{}_recon.{}", domain, self.extension())
    }

    fn header(&self, domain: &Domain) -> Option<String> {
        match self {
            ReportFormat::Txt => None,
            ReportFormat::Csv => Some("subdomain,ips,resolver".to_string()),
            ReportFormat::Xml => Some(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<subdomains>".to_string(),
            ),
            ReportFormat::Grep => Some(format!("# Subscratcher Grepable Report for {domain}")),
        }
    }

    fn row(&self, finding: &Finding) -> String {
        let ips: String = join_addresses(&finding.addresses);
        let name: &str = &finding.name;
        let resolver: &str = finding.resolver.display_name();
        match self {
            ReportFormat::Txt => name.to_string(),
            ReportFormat::Csv => format!("{name},\"{ips}\",{resolver}"),
            ReportFormat::Xml => {
                format!("  <host><subdomain>{name}</subdomain><ips>{ips}</ips></host>")
            }
            ReportFormat::Grep => format!(
                "Host: {name}\tIPs: {ips}\tResolver: {resolver}\tSource: {}",
                Source::Wordlist
            ),
        }
    }

    fn footer(&self) -> Option<&'static str> {
        match self {
            ReportFormat::Xml => Some("</subdomains>"),
            _ => None,
        }
    }
}

fn join_addresses(addresses: &[IpAddr]) -> String {
    addresses
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

struct ReportFile {
    format: ReportFormat,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl ReportFile {
    fn create(dir: &Path, domain: &Domain, format: ReportFormat) -> anyhow::Result<Self> {
        let path: PathBuf = dir.join(format.file_name(domain));
        let file = File::create(&path)
            .with_context(|| format!("could not create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        if let Some(header) = format.header(domain) {
            writeln!(writer, "{header}")?;
        }
        Ok(Self {
            format,
            path,
            writer: Mutex::new(writer),
        })
    }

    fn write_line(&self, line: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    fn finish(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(footer) = self.format.footer() {
            writeln!(writer, "{footer}")?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))
    }
}

pub struct ReportFiles {
    files: Vec<ReportFile>,
}

impl ReportFiles {
    pub fn create(dir: &Path, domain: &Domain, formats: &[ReportFormat]) -> anyhow::Result<Self> {
        let files = formats
            .iter()
            .map(|format| ReportFile::create(dir, domain, *format))
            .collect::<anyhow::Result<Vec<ReportFile>>>()?;
        Ok(Self { files })
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|file| file.path.as_path()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FindingSink for ReportFiles {
    fn emit(&self, finding: &Finding) -> anyhow::Result<()> {
        for file in &self.files {
            file.write_line(&file.format.row(finding))?;
        }
        Ok(())
    }

    fn finish(&self) -> anyhow::Result<()> {
        for file in &self.files {
            file.finish()?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use subscratch_core::intel::Classification;
    use subscratch_core::resolver::ResolverId;

    fn finding() -> Finding {
        Finding {
            name: "api.example.com".to_string(),
            label: "api".to_string(),
            addresses: vec!["10.0.0.5".parse().unwrap(), "10.0.0.6".parse().unwrap()],
            tags: vec![Classification::TrueOrigin, Classification::TrueOrigin],
            resolver: ResolverId::Upstream {
                addr: "8.8.8.8:53".parse().unwrap(),
                name: "Google".to_string(),
            },
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("subscratch-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn rows_follow_each_format() {
        let finding = finding();
        assert_eq!(ReportFormat::Txt.row(&finding), "api.example.com");
        assert_eq!(
            ReportFormat::Csv.row(&finding),
            "api.example.com,\"10.0.0.5, 10.0.0.6\",Google"
        );
        assert_eq!(
            ReportFormat::Xml.row(&finding),
            "  <host><subdomain>api.example.com</subdomain><ips>10.0.0.5, 10.0.0.6</ips></host>"
        );
        assert_eq!(
            ReportFormat::Grep.row(&finding),
            "Host: api.example.com\tIPs: 10.0.0.5, 10.0.0.6\tResolver: Google\tSource: Wordlist"
        );
    }

    #[test]
    fn files_get_header_rows_and_footer() {
        let dir = scratch_dir("reports");
        let domain: Domain = "example.com".parse().unwrap();
        let reports =
            ReportFiles::create(&dir, &domain, &[ReportFormat::Csv, ReportFormat::Xml]).unwrap();

        reports.emit(&finding()).unwrap();
        reports.finish().unwrap();

        let csv = std::fs::read_to_string(dir.join("example.com_recon.csv")).unwrap();
        assert_eq!(
            csv,
            "subdomain,ips,resolver\napi.example.com,\"10.0.0.5, 10.0.0.6\",Google\n"
        );

        let xml = std::fs::read_to_string(dir.join("example.com_recon.xml")).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<subdomains>\n"));
        assert!(xml.ends_with("</host>\n</subdomains>\n"));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
