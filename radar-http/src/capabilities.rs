//! One-time probe of optional fetch engines.
//!
//! The result is computed on first use and shared read-only for the life of
//! the process; later callers get the same answer regardless of the settings
//! they pass.

use std::path::PathBuf;
use std::time::Duration;

use radar_common::settings::FetchSettings;
use serde::Serialize;
use tokio::sync::OnceCell;

static CAPABILITIES: OnceCell<Capabilities> = OnceCell::const_new();

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    /// `reqwest` was built with HTTP/2 support.
    pub http2: bool,
    /// Resolved curl-impersonate wrapper, if installed.
    pub impersonate: Option<PathBuf>,
    /// WebDriver endpoint answered `/status`.
    pub browser: bool,
}

/// Probe once and cache.
pub async fn capabilities(settings: &FetchSettings) -> &'static Capabilities {
    CAPABILITIES
        .get_or_init(|| async {
            let caps = probe(settings).await;
            tracing::info!(
                http2 = caps.http2,
                impersonate = ?caps.impersonate,
                browser = caps.browser,
                "fetch.capabilities"
            );
            caps
        })
        .await
}

/// Uncached probe.
pub async fn probe(settings: &FetchSettings) -> Capabilities {
    Capabilities {
        http2: true,
        impersonate: which::which(&settings.impersonate_binary).ok(),
        browser: settings.browser_enabled && webdriver_ready(&settings.webdriver_url).await,
    }
}

async fn webdriver_ready(base: &str) -> bool {
    let url = format!("{}/status", base.trim_end_matches('/'));
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    match client.get(&url).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(err) => {
            tracing::debug!(%url, error = %err, "fetch.capabilities.webdriver_unreachable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_engines_are_reported_absent() {
        let settings = FetchSettings {
            impersonate_binary: "radar-no-such-binary-4242".into(),
            browser_enabled: false,
            ..FetchSettings::default()
        };
        let caps = probe(&settings).await;
        assert!(caps.impersonate.is_none());
        assert!(!caps.browser);
        assert!(caps.http2);
    }
}
