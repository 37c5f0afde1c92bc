//! Staged fetch: run the ladder in order and stop at the first rung that
//! returns content.
//!
//! Rungs never run in parallel. Each one is attempted only after the previous
//! one definitively failed, so the browser is paid for only when the cheap
//! rungs could not get through.

use std::time::Duration;

use async_trait::async_trait;
use radar_common::RadarError;
use radar_common::settings::FetchSettings;
use radar_drivers::browser::driver::DriverOptions;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::browser::BrowserStrategy;
use crate::capabilities::capabilities;
use crate::client::HttpStrategy;
use crate::impersonate::ImpersonateStrategy;
use crate::plan::build_plan;
use crate::strategy::{FetchResult, FetchStrategy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Skipped,
    /// Ran and got a non-success status.
    Status(u16),
    Error(String),
    /// Returned usable content (status absent for the browser rung).
    Completed(Option<u16>),
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub strategy: &'static str,
    pub outcome: AttemptOutcome,
}

impl From<&FetchResult> for FetchAttempt {
    fn from(r: &FetchResult) -> Self {
        let outcome = if !r.executed {
            AttemptOutcome::Skipped
        } else if r.is_success() {
            AttemptOutcome::Completed(r.status)
        } else if let Some(err) = &r.error {
            AttemptOutcome::Error(err.clone())
        } else if let Some(status) = r.status.filter(|s| !(200..300).contains(s)) {
            AttemptOutcome::Status(status)
        } else {
            AttemptOutcome::Error("empty body".to_string())
        };
        Self {
            strategy: r.strategy,
            outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub url: String,
    #[serde(skip)]
    pub html: Option<String>,
    pub attempts: Vec<FetchAttempt>,
}

impl FetchOutcome {
    /// Name of the rung that produced the content.
    pub fn succeeded_with(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Completed(_)))
            .map(|a| a.strategy)
    }

    /// The fetched document, or [`RadarError::Fetch`] naming the last rung that ran.
    pub fn into_html(self) -> radar_common::Result<String> {
        if let Some(html) = self.html {
            return Ok(html);
        }
        let last = self
            .attempts
            .iter()
            .rev()
            .find(|a| a.outcome != AttemptOutcome::Skipped);
        let reason = match last.map(|a| (a.strategy, &a.outcome)) {
            Some((strategy, AttemptOutcome::Status(status))) => format!("{strategy} got status {status}"),
            Some((strategy, AttemptOutcome::Error(error))) => format!("{strategy}: {error}"),
            _ => "no strategy ran".to_string(),
        };
        Err(RadarError::Fetch(format!("{}: {reason}", self.url)))
    }
}

/// Anything that can turn a URL into HTML. The ingest layer depends on this
/// rather than on the ladder itself.
#[async_trait]
pub trait HtmlSource: Send + Sync {
    async fn fetch_html(&self, url: &str, cancel: &CancellationToken) -> Option<String>;
}

pub struct FetchOrchestrator {
    settings: FetchSettings,
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchOrchestrator {
    pub fn new(settings: FetchSettings, strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self {
            settings,
            strategies,
        }
    }

    /// The standard ladder: HTTP/2, HTTP/1.1, curl-impersonate, browser.
    /// Optional rungs consult the process-wide capability probe.
    pub async fn standard(settings: FetchSettings) -> Self {
        let caps = capabilities(&settings).await;
        let driver = DriverOptions {
            webdriver_url: settings.webdriver_url.clone(),
            headless: settings.headless,
            stealth: settings.stealth_level,
        };
        let strategies: Vec<Box<dyn FetchStrategy>> = vec![
            Box::new(HttpStrategy::http2()),
            Box::new(HttpStrategy::http1()),
            Box::new(ImpersonateStrategy::new(caps.impersonate.clone())),
            Box::new(BrowserStrategy::new(
                driver,
                caps.browser,
                Duration::from_secs(settings.browser_timeout_secs.max(1)),
            )),
        ];
        Self::new(settings, strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let plan = match build_plan(url, &self.settings) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(%url, error = %err, "fetch.plan.invalid");
                return FetchOutcome {
                    url: url.to_string(),
                    html: None,
                    attempts: Vec::new(),
                };
            }
        };

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for step in &self.strategies {
            if cancel.is_cancelled() {
                tracing::debug!(url = %plan.url, "fetch.cancelled");
                break;
            }
            let result = step.fetch(&plan, cancel).await;
            let attempt = FetchAttempt::from(&result);
            log_attempt(plan.url.as_str(), &attempt);
            attempts.push(attempt);

            if result.is_success() {
                return FetchOutcome {
                    url: plan.url.to_string(),
                    html: result.html,
                    attempts,
                };
            }
        }

        tracing::warn!(url = %plan.url, attempts = ?attempts, "fetch.exhausted");
        FetchOutcome {
            url: plan.url.to_string(),
            html: None,
            attempts,
        }
    }
}

fn log_attempt(url: &str, attempt: &FetchAttempt) {
    match &attempt.outcome {
        AttemptOutcome::Skipped => {
            tracing::info!(%url, strategy = attempt.strategy, "fetch.step.skipped")
        }
        AttemptOutcome::Status(status) => {
            tracing::info!(%url, strategy = attempt.strategy, status, "fetch.step")
        }
        AttemptOutcome::Error(error) => {
            tracing::info!(%url, strategy = attempt.strategy, %error, "fetch.step")
        }
        AttemptOutcome::Completed(status) => {
            tracing::info!(%url, strategy = attempt.strategy, status = ?status, "fetch.step.completed")
        }
    }
}

#[async_trait]
impl HtmlSource for FetchOrchestrator {
    async fn fetch_html(&self, url: &str, cancel: &CancellationToken) -> Option<String> {
        self.fetch(url, cancel).await.html
    }
}
