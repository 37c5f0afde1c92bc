//! TLS-fingerprint rung: shells out to a `curl-impersonate` wrapper
//! (`curl_chrome120` and friends) so the handshake looks like real Chrome.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::plan::FetchPlan;
use crate::strategy::{FetchResult, FetchStrategy};

/// Marker printed by `-w` after the body so the status can be split off.
const STATUS_MARKER: &str = "\n__radar_status__:";

pub struct ImpersonateStrategy {
    binary: Option<PathBuf>,
}

impl ImpersonateStrategy {
    /// `binary` is the resolved wrapper path, or `None` when it is not installed.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    fn command(&self, binary: &Path, plan: &FetchPlan, url: &str, jar: &Path) -> Command {
        let mut cmd = Command::new(binary);
        cmd.arg("--silent")
            .arg("--show-error")
            .arg("--location")
            .arg("--compressed")
            .arg("--max-time")
            .arg(plan.timeout.as_secs().to_string())
            .arg("--cookie-jar")
            .arg(jar)
            .arg("--cookie")
            .arg(jar);
        for (name, value) in plan.header_pairs() {
            cmd.arg("-H").arg(format!("{name}: {value}"));
        }
        cmd.arg("--write-out")
            .arg(format!("{STATUS_MARKER}%{{http_code}}"))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_once(
        &self,
        binary: &Path,
        plan: &FetchPlan,
        url: &str,
        jar: &Path,
    ) -> Result<(u16, String), FetchError> {
        // curl enforces --max-time itself; this is the backstop if it hangs on exit.
        let budget = plan.timeout + Duration::from_secs(5);
        let output = tokio::time::timeout(budget, self.command(binary, plan, url, jar).output())
            .await
            .map_err(|_| FetchError::Timeout(plan.timeout.as_secs()))?
            .map_err(|e| FetchError::Process(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Process(format!(
                "exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        split_status(&String::from_utf8_lossy(&output.stdout))
    }

    async fn run(&self, binary: &Path, plan: &FetchPlan) -> Result<(u16, String), FetchError> {
        let jar = tempfile::NamedTempFile::new().map_err(|e| FetchError::Process(e.to_string()))?;

        if let Some(warmup) = &plan.warmup {
            match self.run_once(binary, plan, warmup.as_str(), jar.path()).await {
                Ok((status, _)) => tracing::debug!(strategy = self.name(), %warmup, status, "fetch.warmup"),
                Err(err) => tracing::debug!(strategy = self.name(), %warmup, error = %err, "fetch.warmup.failed"),
            }
        }
        self.run_once(binary, plan, plan.url.as_str(), jar.path()).await
    }
}

fn split_status(stdout: &str) -> Result<(u16, String), FetchError> {
    let (body, code) = stdout
        .rsplit_once(STATUS_MARKER)
        .ok_or_else(|| FetchError::Process("missing status trailer".into()))?;
    let status = code
        .trim()
        .parse::<u16>()
        .map_err(|_| FetchError::Process(format!("bad status trailer: {code}")))?;
    if status == 0 {
        return Err(FetchError::Network("no response".into()));
    }
    Ok((status, body.to_string()))
}

#[async_trait]
impl FetchStrategy for ImpersonateStrategy {
    fn name(&self) -> &'static str {
        "impersonate"
    }

    async fn fetch(&self, plan: &FetchPlan, cancel: &CancellationToken) -> FetchResult {
        let Some(binary) = &self.binary else {
            return FetchResult::skipped(self.name(), "curl-impersonate not installed");
        };
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = self.run(binary, plan) => res,
        };
        match outcome {
            Ok((status, body)) => FetchResult::completed(self.name(), Some(status), body),
            Err(err) => FetchResult::failed(self.name(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::settings::FetchSettings;

    #[test]
    fn status_trailer_is_split_from_body() {
        let out = format!("<html>ok</html>{STATUS_MARKER}200");
        let (status, body) = split_status(&out).unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, "<html>ok</html>");
    }

    #[test]
    fn zero_status_means_no_response() {
        let out = format!("{STATUS_MARKER}000");
        assert!(matches!(split_status(&out), Err(FetchError::Network(_))));
        assert!(split_status("no trailer").is_err());
    }

    #[tokio::test]
    async fn absent_binary_is_skipped_not_failed() {
        let plan = crate::plan::build_plan("https://bank.gov.ua/news", &FetchSettings::default()).unwrap();
        let res = ImpersonateStrategy::new(None)
            .fetch(&plan, &CancellationToken::new())
            .await;
        assert!(!res.executed);
        assert_eq!(res.strategy, "impersonate");
    }
}
