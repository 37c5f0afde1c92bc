//! Page metadata and summary fallbacks.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use crate::dates;
use crate::dom::text_of;
use crate::text::{cap_length, clean_paragraphs, collapse_ws};

const MAX_SUMMARY_CHARS: usize = 4000;

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|css| Selector::parse(css).expect("static selector"))
        .collect()
}

static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        r#"meta[property="og:description"]"#,
        r#"meta[name="description"]"#,
        r#"meta[name="twitter:description"]"#,
    ])
});
static TITLE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"meta[property="og:title"]"#, "title", "h1"]));
static PUBLISHED_ATTRS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    [
        (r#"meta[property="article:published_time"]"#, "content"),
        (r#"meta[itemprop="datePublished"]"#, "content"),
        (r#"meta[name="pubdate"]"#, "content"),
        ("time[datetime]", "datetime"),
    ]
    .into_iter()
    .map(|(css, attr)| (Selector::parse(css).expect("static selector"), attr))
    .collect()
});
static PUBLISHED_TEXT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[".date", ".news-date", ".article__date", "time", r#"[class*="date"]"#])
});
static ARTICLE_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        ".article__content",
        ".article__body",
        ".article__text",
        ".news__content",
        ".news__text",
        "main article",
        "article",
        "main",
        "section",
        r#"div[data-component="article"]"#,
        r#"div[itemprop="articleBody"]"#,
    ])
});
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p, li").expect("block selector"));

/// First non-empty of og/description/twitter descriptions.
pub fn meta_description(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    DESCRIPTION.iter().find_map(|sel| {
        doc.select(sel)
            .filter_map(|m| m.value().attr("content"))
            .map(clean_paragraphs)
            .find(|s| !s.is_empty())
    })
}

pub fn page_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    TITLE.iter().find_map(|sel| {
        doc.select(sel)
            .map(|el| match el.value().attr("content") {
                Some(content) => collapse_ws(content),
                None => text_of(el),
            })
            .find(|s| !s.is_empty())
    })
}

/// Publication instant from structured metadata, then from visible date
/// elements.
pub fn published_from_html(html: &str) -> Option<DateTime<Utc>> {
    let doc = Html::parse_document(html);
    let from_attrs = PUBLISHED_ATTRS.iter().find_map(|(sel, attr)| {
        doc.select(sel)
            .filter_map(|el| el.value().attr(attr))
            .find_map(|value| dates::parse(value, None))
    });
    from_attrs.or_else(|| {
        PUBLISHED_TEXT.iter().find_map(|sel| {
            doc.select(sel)
                .map(text_of)
                .filter(|t| !t.is_empty() && t.chars().count() <= 80)
                .find_map(|t| dates::parse(&t, None))
        })
    })
}

/// Paragraph and list text from the first article-like container that has any.
pub fn generic_article_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    for sel in ARTICLE_CONTAINERS.iter() {
        let Some(container) = doc.select(sel).next() else {
            continue;
        };
        let mut seen = HashSet::new();
        let mut blocks: Vec<String> = container
            .select(&BLOCKS)
            .map(text_of)
            .filter(|t| t.chars().count() >= 4)
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if blocks.is_empty() {
            let whole = text_of(container);
            if !whole.is_empty() {
                blocks.push(whole);
            }
        }
        let combined = blocks.join("\n\n");
        if !combined.trim().is_empty() {
            return Some(cap_length(&combined, MAX_SUMMARY_CHARS));
        }
    }
    None
}

fn same_text(a: &str, b: &str) -> bool {
    collapse_ws(a).to_lowercase() == collapse_ws(b).to_lowercase()
}

/// Summary for an item whose body could not be extracted: the feed summary
/// unless it merely repeats the title, then the meta description, then
/// generic article text.
pub fn choose_summary(title: &str, provided: Option<&str>, html: Option<&str>) -> Option<String> {
    let provided = provided
        .map(clean_paragraphs)
        .filter(|s| !s.is_empty() && !same_text(s, title));
    if provided.is_some() {
        return provided;
    }
    let html = html?;
    meta_description(html)
        .filter(|d| !same_text(d, title))
        .or_else(|| generic_article_text(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn description_prefers_open_graph() {
        let html = r#"<head><meta name="description" content="Звичайний опис">
            <meta property="og:description" content="  Опис   для соцмереж "></head>"#;
        assert_eq!(meta_description(html).as_deref(), Some("Опис для соцмереж"));
    }

    #[test]
    fn published_from_meta_then_visible_date() {
        let html = r#"<meta property="article:published_time" content="2025-10-23T14:13:00+03:00">"#;
        assert_eq!(
            published_from_html(html),
            Some(Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap())
        );
        let html = r#"<div class="news-date">23 жовт. 2025 14:13</div>"#;
        assert_eq!(
            published_from_html(html),
            Some(Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap())
        );
        assert_eq!(published_from_html("<p>без дати</p>"), None);
    }

    #[test]
    fn summary_skips_title_echo() {
        let html = r#"<meta name="description" content="Новий порядок сплати ЄСВ"><article><p>Текст статті про ЄСВ.</p></article>"#;
        assert_eq!(
            choose_summary("Новий порядок сплати ЄСВ", Some("новий порядок  сплати ЄСВ"), Some(html)).as_deref(),
            Some("Текст статті про ЄСВ.")
        );
        assert_eq!(
            choose_summary("Заголовок", Some("Короткий зміст"), None).as_deref(),
            Some("Короткий зміст")
        );
        assert_eq!(choose_summary("Заголовок", Some("Заголовок"), None), None);
    }

    #[test]
    fn title_falls_back_to_document_title() {
        assert_eq!(
            page_title("<html><head><title> ДПС | Новини </title></head></html>").as_deref(),
            Some("ДПС | Новини")
        );
    }
}
