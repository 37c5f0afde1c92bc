//! Settings model shared by the loader, the pipeline crates, and the CLI.
//!
//! Every struct carries `#[serde(default)]`, so an empty YAML document (or no
//! file at all) yields a working configuration for the tax/NBU sites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::StealthLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarSettings {
    pub version: Option<String>,
    pub fetch: FetchSettings,
    pub extract: ExtractSettings,
    pub preview: PreviewSettings,
    pub ingest: IngestSettings,
    pub utm: Option<UtmSettings>,
}

/// Knobs for the staged fetch ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout for the HTTP and impersonation steps.
    pub timeout_secs: u64,
    /// Navigation budget for the headless browser step.
    pub browser_timeout_secs: u64,
    pub webdriver_url: String,
    pub headless: bool,
    /// Disable the browser step entirely (e.g. on hosts without chromedriver).
    pub browser_enabled: bool,
    /// Name or path of the curl-impersonate wrapper.
    pub impersonate_binary: String,
    pub stealth_level: StealthLevel,
    /// Per-site header sets and warm-up URLs, matched by domain suffix.
    pub sites: Vec<SiteProfile>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            browser_timeout_secs: 30,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            browser_enabled: true,
            impersonate_binary: "curl_chrome120".to_string(),
            stealth_level: StealthLevel::Balanced,
            sites: vec![SiteProfile::tax_gov_ua()],
        }
    }
}

/// How a defended site wants to be approached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Domain suffix this profile applies to.
    pub domain: String,
    /// Force `https://{canonical_host}` for every URL on this site.
    #[serde(default)]
    pub canonical_host: Option<String>,
    /// Page requested before the target to collect cookies.
    #[serde(default)]
    pub warmup_url: Option<String>,
    /// Full header set. Empty means "use the default browser headers".
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

pub const CHROME_WINDOWS_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const CHROME_LINUX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

impl SiteProfile {
    /// Built-in profile for the State Tax Service site, which drops requests
    /// that do not look like a same-origin browser navigation.
    pub fn tax_gov_ua() -> Self {
        let base = "https://www.tax.gov.ua/";
        let headers = [
            ("User-Agent", CHROME_WINDOWS_UA),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "uk-UA,uk;q=0.9,en-US;q=0.7,en;q=0.6"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Cache-Control", "no-cache"),
            ("Pragma", "no-cache"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "same-origin"),
            ("Sec-Fetch-User", "?1"),
            ("Referer", base),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            domain: "tax.gov.ua".to_string(),
            canonical_host: Some("www.tax.gov.ua".to_string()),
            warmup_url: Some(base.to_string()),
            headers,
        }
    }

    /// Headers used for every site without a dedicated profile.
    pub fn default_headers() -> BTreeMap<String, String> {
        [
            ("User-Agent", CHROME_LINUX_UA),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
            ("Accept-Language", "uk-UA,uk;q=0.9,en;q=0.8"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Suffix match on a normalized (lowercase, no `www.`) domain.
    pub fn matches(&self, domain: &str) -> bool {
        domain_matches(domain, &self.domain)
    }
}

/// Lowercase, strip a leading `www.` and any trailing dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// `sub.tax.gov.ua` matches `tax.gov.ua`; `eviltax.gov.ua` does not.
pub fn domain_matches(domain: &str, suffix: &str) -> bool {
    let domain = normalize_host(domain);
    let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
    if suffix.is_empty() {
        return false;
    }
    domain == suffix || domain.ends_with(&format!(".{suffix}"))
}

/// Thresholds for body extraction. Tuned per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub stop_phrases: Vec<String>,
    pub min_body_chars: usize,
    pub min_blocks: usize,
    /// How many significant words from the head of the body are checked against the HTML.
    pub word_window: usize,
    pub word_matches: usize,
    pub max_body_chars: usize,
    /// Stricter floor for critical sites.
    pub critical_min_chars: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            stop_phrases: [
                "поділитися",
                "поширити",
                "останні новини",
                "читайте також",
                "теги",
                "корисні посилання",
                "схожі новини",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_body_chars: 250,
            min_blocks: 2,
            word_window: 8,
            word_matches: 3,
            max_body_chars: 4000,
            critical_min_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub with_image_limit: usize,
    pub without_image_limit: usize,
    pub link_label: String,
    pub promo_url: String,
    pub promo_text: String,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            with_image_limit: 1024,
            without_image_limit: 4096,
            link_label: "читати далі".to_string(),
            promo_url: "https://t.me/ITTaxRadar".to_string(),
            promo_text: "Підпишись на IT Tax Radar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Admission whitelist, matched by domain suffix.
    pub whitelist: Vec<String>,
    /// Sites whose missing HTML means "no body" rather than "error".
    pub critical_domains: Vec<String>,
    pub concurrency: usize,
    pub staleness_days: i64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            whitelist: [
                "tax.gov.ua",
                "bank.gov.ua",
                "minfin.gov.ua",
                "mof.gov.ua",
                "rada.gov.ua",
                "kmu.gov.ua",
                "epravda.com.ua",
                "dtkt.ua",
                "buhgalter911.com",
                "ain.ua",
                "dou.ua",
                "liga.net",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            critical_domains: vec!["bank.gov.ua".to_string()],
            concurrency: 4,
            staleness_days: 7,
        }
    }
}

impl IngestSettings {
    pub fn is_whitelisted(&self, domain: &str) -> bool {
        self.whitelist.iter().any(|s| domain_matches(domain, s))
    }

    pub fn is_critical(&self, domain: &str) -> bool {
        self.critical_domains.iter().any(|s| domain_matches(domain, s))
    }
}

/// Campaign parameters appended to outbound links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmSettings {
    pub source: String,
    pub medium: String,
    pub campaign: String,
}
