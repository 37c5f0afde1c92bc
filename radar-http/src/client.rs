//! Plain HTTP rungs built on `reqwest`.
//!
//! Each attempt builds its own client so the cookie jar filled by the warm-up
//! request is scoped to that attempt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::plan::FetchPlan;
use crate::strategy::{FetchResult, FetchStrategy};

const SNIPPET_MAX: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// ALPN negotiation; HTTP/2 where the server offers it.
    Negotiate,
    Http1Only,
}

pub struct HttpStrategy {
    protocol: Protocol,
}

impl HttpStrategy {
    pub fn http2() -> Self {
        Self {
            protocol: Protocol::Negotiate,
        }
    }

    pub fn http1() -> Self {
        Self {
            protocol: Protocol::Http1Only,
        }
    }

    fn client(&self, plan: &FetchPlan) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .timeout(plan.timeout)
            .default_headers(plan.headers.clone());
        if self.protocol == Protocol::Http1Only {
            builder = builder.http1_only();
        }
        builder.build().map_err(|e| FetchError::Build(e.to_string()))
    }

    async fn run(&self, plan: &FetchPlan) -> Result<(u16, String), FetchError> {
        let client = self.client(plan)?;

        if let Some(warmup) = &plan.warmup {
            match client.get(warmup.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    // Drain so the connection can be reused for the target.
                    let _ = resp.bytes().await;
                    tracing::debug!(strategy = self.name(), %warmup, status, "fetch.warmup");
                }
                Err(err) => {
                    tracing::debug!(strategy = self.name(), %warmup, error = %err, "fetch.warmup.failed")
                }
            }
        }

        let resp = client
            .get(plan.url.clone())
            .send()
            .await
            .map_err(|e| classify(e, plan))?;
        let status = resp.status().as_u16();
        let version = resp.version();
        let body = resp.text().await.map_err(|e| classify(e, plan))?;

        tracing::debug!(
            strategy = self.name(),
            url = %plan.url,
            status,
            version = ?version,
            body_len = body.len(),
            body_snippet = %snip_body(&body),
            "fetch.http.response"
        );
        Ok((status, body))
    }
}

fn classify(err: reqwest::Error, plan: &FetchPlan) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(plan.timeout.as_secs())
    } else {
        FetchError::Network(err.to_string())
    }
}

fn snip_body(body: &str) -> String {
    let mut snip: String = body.chars().take(SNIPPET_MAX).collect();
    if snip.len() < body.len() {
        snip.push_str("...");
    }
    snip.replace('\n', " ")
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    fn name(&self) -> &'static str {
        match self.protocol {
            Protocol::Negotiate => "http2",
            Protocol::Http1Only => "http1",
        }
    }

    async fn fetch(&self, plan: &FetchPlan, cancel: &CancellationToken) -> FetchResult {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = self.run(plan) => res,
        };
        match outcome {
            Ok((status, body)) => FetchResult::completed(self.name(), Some(status), body),
            Err(err) => FetchResult::failed(self.name(), err),
        }
    }
}
