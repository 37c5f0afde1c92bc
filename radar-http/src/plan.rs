//! Per-site request planning.
//!
//! A [`FetchPlan`] fixes everything a strategy needs before the first byte is
//! sent: the normalized target, the header set, and the warm-up page that
//! seeds cookies on defended sites.

use std::time::Duration;

use radar_common::settings::{normalize_host, FetchSettings, SiteProfile};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{FetchError, Result};

#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub url: Url,
    /// Normalized host (lowercase, no `www.`).
    pub domain: String,
    pub headers: HeaderMap,
    pub warmup: Option<Url>,
    pub timeout: Duration,
}

impl FetchPlan {
    /// Headers as `(name, value)` pairs, for strategies that cannot take a `HeaderMap`.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect()
    }
}

/// Build the plan for `raw` using the first matching site profile.
pub fn build_plan(raw: &str, settings: &FetchSettings) -> Result<FetchPlan> {
    let mut url = Url::parse(raw.trim()).map_err(|e| FetchError::Url(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::Url(format!("unsupported scheme: {}", url.scheme())));
    }
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::Url(format!("no host: {raw}")))?;
    let domain = normalize_host(host);
    url.set_fragment(None);

    let profile = settings.sites.iter().find(|p| p.matches(&domain));

    if let Some(canonical) = profile.and_then(|p| p.canonical_host.as_deref()) {
        let rebuilt = match url.query() {
            Some(q) => format!("https://{canonical}{}?{q}", url.path()),
            None => format!("https://{canonical}{}", url.path()),
        };
        url = Url::parse(&rebuilt).map_err(|e| FetchError::Url(e.to_string()))?;
    }

    let header_source = match profile {
        Some(p) if !p.headers.is_empty() => p.headers.clone(),
        _ => SiteProfile::default_headers(),
    };
    let headers = to_header_map(&header_source);

    let warmup = profile
        .and_then(|p| p.warmup_url.as_deref())
        .and_then(|w| Url::parse(w).ok())
        .filter(|w| w != &url);

    Ok(FetchPlan {
        url,
        domain,
        headers,
        warmup,
        timeout: Duration::from_secs(settings.timeout_secs.max(1)),
    })
}

fn to_header_map<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a String)>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
        match (
            HeaderName::from_bytes(k.as_bytes()),
            HeaderValue::from_str(v),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = %k, "fetch.plan.invalid_header"),
        }
    }
    map
}
