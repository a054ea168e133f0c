//! Candidate labels from a local file or an http(s) URL.

use std::time::Duration;

use anyhow::Context;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub async fn load(source: &str) -> anyhow::Result<Vec<String>> {
    let text: String = if is_url(source) {
        fetch(source).await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to open wordlist {source}"))?
    };
    Ok(parse(&text))
}

async fn fetch(url: &str) -> anyhow::Result<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch wordlist from {url}"))?
        .error_for_status()
        .with_context(|| format!("wordlist server refused {url}"))?
        .text()
        .await
        .context("failed to read wordlist body")
}

/// One label per line; blank lines and `#` comments are skipped.
pub fn parse(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
