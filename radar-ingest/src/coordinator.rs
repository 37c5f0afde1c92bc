//! One candidate in, one [`Verdict`] out.
//!
//! Admission runs cheapest first: URL normalization and the whitelist cost
//! nothing, the duplicate check costs a store lookup, and only then is the
//! fetch ladder paid for. Tax news pages are fetched twice (article, then
//! print view) because the print view carries the cleanest body while the
//! article page carries the lead image.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use radar_common::settings::{ExtractSettings, IngestSettings, domain_matches};
use radar_http::HtmlSource;
use radar_web::image::{self, TAX_CONTENT_SELECTORS};
use radar_web::meta::{choose_summary, published_from_html};
use radar_web::text::clean_paragraphs;
use radar_web::urls::{discover_tax_print_url, domain_of, normalize_article_url};
use radar_web::BodyExtractor;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::store::{ArticleRecord, ArticleStore, StoreError};
use crate::verdict::Verdict;

const TAX_DOMAIN: &str = "tax.gov.ua";

/// A feed entry waiting for admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl CandidateItem {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: None,
            published_at: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Domain of the normalized URL, if it has one.
    pub fn domain(&self) -> Option<String> {
        normalize_article_url(&self.url).as_ref().and_then(domain_of)
    }
}

/// A fetched page and the URL it was fetched from.
struct Page {
    url: Url,
    html: String,
}

/// Article page first, print view second (tax only).
#[derive(Default)]
struct Pages {
    main: Option<Page>,
    print: Option<Page>,
}

impl Pages {
    fn is_empty(&self) -> bool {
        self.main.is_none() && self.print.is_none()
    }

    /// In body order: print view before the article page.
    fn body_order(&self) -> impl Iterator<Item = &Page> {
        self.print.iter().chain(self.main.iter())
    }

    /// In image order: article page before the print view.
    fn image_order(&self) -> impl Iterator<Item = &Page> {
        self.main.iter().chain(self.print.iter())
    }
}

pub struct IngestCoordinator {
    source: Arc<dyn HtmlSource>,
    store: Arc<dyn ArticleStore>,
    extractor: BodyExtractor,
    settings: IngestSettings,
}

impl IngestCoordinator {
    pub fn new(
        source: Arc<dyn HtmlSource>,
        store: Arc<dyn ArticleStore>,
        extract: ExtractSettings,
        settings: IngestSettings,
    ) -> Self {
        Self {
            source,
            store,
            extractor: BodyExtractor::new(extract),
            settings,
        }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Run the admission pipeline for one item. Store failures and panics
    /// inside the pipeline come back as [`Verdict::Error`].
    pub async fn ingest(&self, item: &CandidateItem, cancel: &CancellationToken) -> Verdict {
        let verdict = match AssertUnwindSafe(self.admit(item, cancel)).catch_unwind().await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(err)) => {
                warn!(url = %item.url, error = %err, "ingest.store.failed");
                Verdict::Error
            }
            Err(_) => {
                error!(url = %item.url, "ingest.item.panicked");
                Verdict::Error
            }
        };
        info!(url = %item.url, %verdict, "ingest.verdict");
        verdict
    }

    async fn admit(&self, item: &CandidateItem, cancel: &CancellationToken) -> Result<Verdict, StoreError> {
        let Some(url) = normalize_article_url(&item.url) else {
            debug!(url = %item.url, "ingest.url.invalid");
            return Ok(Verdict::RejectedNotWhitelisted);
        };
        let Some(domain) = domain_of(&url) else {
            return Ok(Verdict::RejectedNotWhitelisted);
        };
        if !self.settings.is_whitelisted(&domain) {
            debug!(%url, %domain, "ingest.not_whitelisted");
            return Ok(Verdict::RejectedNotWhitelisted);
        }

        let original = item.url.trim();
        if self.store.exists(url.as_str()).await?
            || (original != url.as_str() && self.store.exists(original).await?)
        {
            return Ok(Verdict::Duplicate);
        }

        let pages = self.fetch_pages(&url, &domain, cancel).await;
        let critical = self.settings.is_critical(&domain);
        let title = item.title.trim();

        let body = if pages.is_empty() {
            if critical {
                debug!(%url, "ingest.no_html.critical");
                return Ok(Verdict::RejectedNoBody);
            }
            match choose_summary(title, item.summary.as_deref(), None) {
                Some(summary) => summary,
                None => {
                    warn!(%url, "ingest.no_html");
                    return Ok(Verdict::Error);
                }
            }
        } else {
            match self.extract_body(&pages, title, critical, item.summary.as_deref()) {
                Some(body) => body,
                None => return Ok(Verdict::RejectedNoBody),
            }
        };

        let published_at = item.published_at.or_else(|| {
            pages
                .image_order()
                .find_map(|page| published_from_html(&page.html))
        });
        let Some(published_at) = published_at else {
            return Ok(Verdict::RejectedNoDate);
        };

        let record = ArticleRecord {
            title: title.to_string(),
            url: url.to_string(),
            domain,
            published_at,
            body_checksum: ArticleRecord::checksum(&body),
            body_text: body,
            image_url: resolve_image(&pages),
            summary: item
                .summary
                .as_deref()
                .map(clean_paragraphs)
                .filter(|s| !s.is_empty()),
        };
        match self.store.insert(record).await {
            Ok(()) => Ok(Verdict::Accepted),
            Err(StoreError::Conflict(_)) => Ok(Verdict::Duplicate),
            Err(err) => Err(err),
        }
    }

    async fn fetch_pages(&self, url: &Url, domain: &str, cancel: &CancellationToken) -> Pages {
        let mut pages = Pages::default();
        if let Some(html) = self.source.fetch_html(url.as_str(), cancel).await {
            pages.main = Some(Page {
                url: url.clone(),
                html,
            });
        }
        if !domain_matches(domain, TAX_DOMAIN) || cancel.is_cancelled() {
            return pages;
        }
        let main_html = pages.main.as_ref().map(|p| p.html.as_str());
        let Some(print_url) = discover_tax_print_url(url, main_html).filter(|p| p != url) else {
            return pages;
        };
        debug!(%url, print = %print_url, "ingest.print.fetch");
        if let Some(html) = self.source.fetch_html(print_url.as_str(), cancel).await {
            pages.print = Some(Page {
                url: print_url,
                html,
            });
        }
        pages
    }

    fn extract_body(&self, pages: &Pages, title: &str, critical: bool, provided: Option<&str>) -> Option<String> {
        let extracted = pages.body_order().find_map(|page| {
            if critical {
                self.extractor.extract_reliable(&page.html, Some(title))
            } else {
                self.extractor.extract(&page.html, Some(title))
            }
        });
        if extracted.is_some() || critical {
            return extracted;
        }
        let html = pages.image_order().next().map(|p| p.html.as_str());
        choose_summary(title, provided, html)
    }
}

/// Article image first, print image second; a preview asset is swapped for a
/// full image from either page when one exists.
fn resolve_image(pages: &Pages) -> Option<String> {
    let picked = pages
        .image_order()
        .find_map(|page| image::resolve(&page.html, Some(page.url.as_str())));
    if picked.as_deref().is_some_and(|p| !image::is_preview(p)) {
        return picked;
    }
    pages
        .image_order()
        .find_map(|page| image::full_image_in(&page.html, Some(page.url.as_str()), TAX_CONTENT_SELECTORS))
        .or(picked)
}
