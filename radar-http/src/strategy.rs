use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::plan::FetchPlan;

/// What one ladder step produced.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub html: Option<String>,
    pub status: Option<u16>,
    pub strategy: &'static str,
    /// `false` when the step never ran (engine absent in this runtime).
    pub executed: bool,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn skipped(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn failed(strategy: &'static str, error: impl ToString) -> Self {
        Self {
            strategy,
            executed: true,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn completed(strategy: &'static str, status: Option<u16>, body: String) -> Self {
        Self {
            strategy,
            executed: true,
            status,
            html: Some(body),
            error: None,
        }
    }

    /// Executed, non-blank body, and a 2xx status when one is known.
    pub fn is_success(&self) -> bool {
        self.executed
            && self.error.is_none()
            && self.status.is_none_or(|s| (200..300).contains(&s))
            && self.html.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

/// One rung of the fetch ladder.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, plan: &FetchPlan, cancel: &CancellationToken) -> FetchResult;
}
