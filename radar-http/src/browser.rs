//! Last rung: a real browser session via WebDriver.
//!
//! Sessions are opened per attempt and always closed, including on timeout
//! and cancellation, so an aborted batch never leaks a Chrome process.

use std::time::Duration;

use async_trait::async_trait;
use radar_drivers::browser::driver::{DriverOptions, RadarDriver};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::plan::FetchPlan;
use crate::strategy::{FetchResult, FetchStrategy};

/// Extra wait after `readyState == complete` for late XHR content.
const NETWORK_IDLE_LINGER: Duration = Duration::from_millis(2000);

pub struct BrowserStrategy {
    options: DriverOptions,
    available: bool,
    timeout: Duration,
}

impl BrowserStrategy {
    pub fn new(options: DriverOptions, available: bool, timeout: Duration) -> Self {
        Self {
            options,
            available,
            timeout,
        }
    }
}

async fn render(driver: &RadarDriver, plan: &FetchPlan, budget: Duration) -> anyhow::Result<String> {
    let page = driver.page();
    if let Some(warmup) = &plan.warmup {
        if let Err(err) = page.goto(warmup.as_str()).await {
            tracing::debug!(strategy = "browser", %warmup, error = %err, "fetch.warmup.failed");
        }
    }
    page.goto(plan.url.as_str()).await?;
    page.settle(budget, NETWORK_IDLE_LINGER).await?;
    page.content().await
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, plan: &FetchPlan, cancel: &CancellationToken) -> FetchResult {
        if !self.available {
            return FetchResult::skipped(self.name(), "webdriver unavailable");
        }
        if cancel.is_cancelled() {
            return FetchResult::failed(self.name(), FetchError::Cancelled);
        }

        // One deadline covers the WebDriver handshake and the page render.
        let deadline = tokio::time::Instant::now() + self.timeout;
        let connected = tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = tokio::time::timeout_at(deadline, RadarDriver::connect(&self.options)) => match res {
                Ok(Ok(driver)) => Ok(driver),
                Ok(Err(err)) => Err(FetchError::Network(format!("{err:#}"))),
                Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
            },
        };
        let driver = match connected {
            Ok(driver) => driver,
            Err(err) => return FetchResult::failed(self.name(), err),
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = tokio::time::timeout_at(deadline, render(&driver, plan, self.timeout)) => match res {
                Ok(Ok(html)) => Ok(html),
                Ok(Err(err)) => Err(FetchError::Network(format!("{err:#}"))),
                Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
            },
        };

        if let Err(err) = driver.close().await {
            tracing::warn!(error = %err, "browser.session.close_failed");
        }

        match outcome {
            // WebDriver does not expose the document status; content is the signal.
            Ok(html) => FetchResult::completed(self.name(), None, html),
            Err(err) => FetchResult::failed(self.name(), err),
        }
    }
}
