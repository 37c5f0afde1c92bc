//! HTML understanding for news pages: body text, lead image, publication
//! date, and the URL rules of the sites we ingest from.
//!
//! Everything here is synchronous and side-effect free; fetching lives in
//! `radar-http`.
//!
//! ```
//! use radar_web::{BodyExtractor, ExtractedArticle};
//!
//! let html = r#"<html><head><meta property="og:image" content="/i/lead.jpg"></head><body>
//!   <h1>Нові правила</h1><div>21 жовтня 2025</div>
//!   <p>Платники податків отримали нові правила подання звітності.</p>
//!   <p>Зміни набувають чинності з першого числа наступного місяця.</p>
//!   <div class="share">Поділитися</div></body></html>"#;
//!
//! let article = ExtractedArticle::from_html(&BodyExtractor::default(), html, "https://tax.gov.ua/n/1", None);
//! assert!(article.body.unwrap().starts_with("Платники податків"));
//! assert_eq!(article.image_url.as_deref(), Some("https://tax.gov.ua/i/lead.jpg"));
//! ```

pub mod body;
pub mod dates;
pub mod dom;
pub mod image;
pub mod meta;
pub mod text;
pub mod urls;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use body::{BlockKind, BodyExtractor, ContentBlock};

/// Body, image and date pulled from one page. Consumed by the ingest step,
/// never stored as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ExtractedArticle {
    pub fn from_html(extractor: &BodyExtractor, html: &str, base_url: &str, title: Option<&str>) -> Self {
        Self {
            body: extractor.extract(html, title),
            image_url: image::resolve_preferring(html, Some(base_url), image::TAX_CONTENT_SELECTORS),
            published_at: meta::published_from_html(html),
        }
    }
}
