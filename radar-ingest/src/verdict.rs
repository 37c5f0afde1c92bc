use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of one ingest attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Duplicate,
    RejectedNotWhitelisted,
    RejectedNoBody,
    RejectedNoDate,
    /// Feed date older than the staleness window; decided before any fetch.
    RejectedStale,
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Duplicate => "duplicate",
            Verdict::RejectedNotWhitelisted => "rejected_not_whitelisted",
            Verdict::RejectedNoBody => "rejected_no_body",
            Verdict::RejectedNoDate => "rejected_no_date",
            Verdict::RejectedStale => "rejected_stale",
            Verdict::Error => "error",
        }
    }

    /// Verdicts that count against the source in cycle reports.
    pub fn is_source_failure(self) -> bool {
        matches!(self, Verdict::Error | Verdict::RejectedNoBody)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
