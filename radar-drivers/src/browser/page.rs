use crate::browser::{
    behavioral::BehavioralEngine, fingerprint::UserAgentProfile, stealth::StealthScripts,
};
use anyhow::Result;
use fantoccini::Client;
use radar_common::StealthLevel;
use std::time::Duration;

/// Navigation helper around a live WebDriver session.
pub struct RadarPage {
    client: Client,
    stealth: StealthLevel,
    profile: UserAgentProfile,
    behavioral_engine: BehavioralEngine,
}

impl RadarPage {
    pub fn new(
        client: Client,
        stealth: StealthLevel,
        profile: UserAgentProfile,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth,
            profile,
            behavioral_engine,
        }
    }

    /// Navigate to `url` and apply the stealth scripts for this session's level.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.behavioral_engine.random_delay(300, 1200).await;
        self.client.goto(url).await?;

        for script in StealthScripts::for_level(self.stealth, &self.profile) {
            // Evasions are best effort; some pages forbid redefining navigator props.
            if let Err(err) = self.client.execute(&script, vec![]).await {
                tracing::debug!(error = %err, "browser.stealth.script_failed");
            }
        }
        Ok(())
    }

    /// Poll `document.readyState` until complete, then give late XHR a moment.
    pub async fn settle(&self, budget: Duration, linger: Duration) -> Result<()> {
        let started = tokio::time::Instant::now();
        while started.elapsed() < budget {
            let state = self
                .client
                .execute("return document.readyState;", vec![])
                .await?;
            if state.as_str() == Some("complete") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        tokio::time::sleep(linger).await;
        Ok(())
    }

    /// Return the full page HTML source.
    pub async fn content(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// Return the current page URL.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }
}
