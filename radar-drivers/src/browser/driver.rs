use crate::browser::{
    behavioral::BehavioralEngine,
    fingerprint::{UserAgentManager, UserAgentProfile},
    page::RadarPage,
    stealth::build_stealth_arguments,
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use radar_common::StealthLevel;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// How to reach and configure the WebDriver service.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth: StealthLevel,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            stealth: StealthLevel::Balanced,
        }
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// A driver is one browser session. Callers own it for a single fetch attempt
/// and must call [`RadarDriver::close`] on every path.
pub struct RadarDriver {
    pub client: Client,
    pub behavioral_engine: BehavioralEngine,
    pub profile: UserAgentProfile,
    pub stealth: StealthLevel,
}

pub(crate) fn chrome_capabilities(opts: &DriverOptions, profile: &UserAgentProfile) -> Capabilities {
    let mut args = build_stealth_arguments(opts.stealth, profile);
    if opts.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args.dedup();

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

impl RadarDriver {
    /// Open a new browser session on the configured WebDriver endpoint.
    pub async fn connect(opts: &DriverOptions) -> Result<Self> {
        let profile = UserAgentManager::new().session_profile();
        let caps = chrome_capabilities(opts, &profile);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&opts.webdriver_url)
            .await
            .with_context(|| format!("webdriver connect failed: {}", opts.webdriver_url))?;

        tracing::debug!(webdriver = %opts.webdriver_url, headless = opts.headless, "browser.session.open");

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            profile,
            stealth: opts.stealth,
        })
    }

    /// Page wrapper sharing this session.
    pub fn page(&self) -> RadarPage {
        RadarPage::new(
            self.client.clone(),
            self.stealth,
            self.profile.clone(),
            self.behavioral_engine.clone(),
        )
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        tracing::debug!("browser.session.closed");
        Ok(())
    }
}
