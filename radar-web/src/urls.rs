//! URL rules: redirect unwrapping, tax print views, campaign tags.

use std::sync::LazyLock;

use radar_common::settings::{domain_matches, normalize_host, UtmSettings};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

const TAX_NEWS_PREFIX: &str = "/media-tsentr/novini/";

static TAX_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4,}").expect("id regex"));
static PRINT_LINKS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"link[rel*="alternate"][href*="print-"]"#,
        r#"link[media*="print"][href*="print-"]"#,
        r#"a[href*="/media-tsentr/novini/print-"]"#,
        r#"a[href*="print-"][class*="print"]"#,
        r#"a[href*="print-"]"#,
    ]
    .into_iter()
    .map(|css| Selector::parse(css).expect("print link selector"))
    .collect()
});

fn is_tax_host(url: &Url) -> bool {
    url.host_str().is_some_and(|h| domain_matches(h, "tax.gov.ua"))
}

/// `news.google.com` links carry the real target in `url` or `u`.
pub fn unwrap_google_news(url: &Url) -> Option<Url> {
    let host = normalize_host(url.host_str()?);
    if host != "news.google.com" {
        return None;
    }
    url.query_pairs()
        .find(|(k, v)| (k == "url" || k == "u") && !v.is_empty())
        .and_then(|(_, v)| Url::parse(&v).ok())
}

/// Trim, unwrap redirects, canonicalize tax print views, drop the fragment.
///
/// ```
/// use radar_web::urls::normalize_article_url;
///
/// let url = normalize_article_url(" https://tax.gov.ua/media-tsentr/novini/print-945326.html#top ").unwrap();
/// assert_eq!(url.as_str(), "https://tax.gov.ua/media-tsentr/novini/945326.html");
/// ```
pub fn normalize_article_url(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if let Some(inner) = unwrap_google_news(&url) {
        url = inner;
    }
    if let Some(canonical) = tax_canonical_url(&url) {
        url = canonical;
    }
    url.set_fragment(None);
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Lowercase host without `www.`.
pub fn domain_of(url: &Url) -> Option<String> {
    url.host_str().map(normalize_host).filter(|h| !h.is_empty())
}

/// Print-friendly version of a tax news URL.
///
/// `…/novyna-945326.html` and `…/945326.html` both map to
/// `…/print-945326.html`; an existing print path only gains `.html`.
/// Anything outside the news section, or without a numeric id, has none.
pub fn tax_print_url(url: &Url) -> Option<Url> {
    if !is_tax_host(url) || !url.path().starts_with(TAX_NEWS_PREFIX) {
        return None;
    }
    let trimmed = url.path().trim_end_matches('/');
    let path = if trimmed.contains("print-") {
        if trimmed.ends_with(".html") {
            trimmed.to_string()
        } else {
            format!("{trimmed}.html")
        }
    } else {
        let slug = trimmed.rsplit('/').next().unwrap_or_default();
        let id = TAX_ID_RE.find(slug)?.as_str();
        format!("{TAX_NEWS_PREFIX}print-{id}.html")
    };
    let mut print = url.clone();
    print.set_path(&path);
    print.set_query(None);
    print.set_fragment(None);
    Some(print)
}

/// Article URL for a tax print view; other tax URLs come back unchanged.
pub fn tax_canonical_url(url: &Url) -> Option<Url> {
    if !is_tax_host(url) {
        return None;
    }
    let path = url.path();
    let Some(rest) = path
        .strip_prefix(TAX_NEWS_PREFIX)
        .and_then(|rest| rest.strip_prefix("print-"))
    else {
        return Some(url.clone());
    };
    let rest = rest.trim_end_matches('/');
    let rest = if rest.ends_with(".html") {
        rest.to_string()
    } else {
        format!("{rest}.html")
    };
    let mut canonical = url.clone();
    canonical.set_path(&format!("{TAX_NEWS_PREFIX}{rest}"));
    canonical.set_fragment(None);
    Some(canonical)
}

/// Print URL linked from the article HTML, else the one derived from the id.
pub fn discover_tax_print_url(url: &Url, html: Option<&str>) -> Option<Url> {
    let derived = tax_print_url(url);
    let Some(html) = html.filter(|h| !h.trim().is_empty()) else {
        return derived;
    };
    let doc = Html::parse_document(html);
    for selector in PRINT_LINKS.iter() {
        for el in doc.select(selector) {
            let Some(href) = el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
                continue;
            };
            let Ok(absolute) = url.join(href) else {
                continue;
            };
            if let Some(print) = tax_print_url(&absolute) {
                return Some(print);
            }
            if absolute.path().contains(TAX_NEWS_PREFIX) && absolute.path().contains("print-") {
                return Some(absolute);
            }
        }
    }
    derived
}

/// Append campaign parameters, replacing existing `utm_*` values.
pub fn with_utm(url: &str, utm: Option<&UtmSettings>) -> String {
    let Some(utm) = utm else {
        return url.to_string();
    };
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !matches!(k.as_ref(), "utm_source" | "utm_medium" | "utm_campaign"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("utm_source", &utm.source)
        .append_pair("utm_medium", &utm.medium)
        .append_pair("utm_campaign", &utm.campaign);
    parsed.to_string()
}
