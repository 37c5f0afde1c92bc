//! Lead image discovery.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static META_KEYS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];
static IMG_ATTRS: &[&str] = &["data-src", "data-original", "data-lazy-src", "data-srcset", "srcset", "src"];
static IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif", ".avif"];

/// Content-image selectors for the tax site, most specific first.
pub const TAX_CONTENT_SELECTORS: &[&str] = &[".article__content img", ".news__content img", "article img", "img"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static META: LazyLock<Selector> = LazyLock::new(|| selector("meta[content]"));
static LINK_IMAGE_SRC: LazyLock<Selector> = LazyLock::new(|| selector("link[rel~=image_src][href]"));
static SOURCES: LazyLock<Selector> = LazyLock::new(|| selector("source[srcset], source[data-srcset]"));
static IMGS: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static STYLED: LazyLock<Selector> = LazyLock::new(|| selector("[style]"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"background(?:-image)?\s*:[^;]*url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("background regex")
});

/// Resolve `raw` against `base` and keep it only if it ends up http(s).
///
/// ```
/// use radar_web::image::normalize_image_url;
///
/// assert_eq!(
///     normalize_image_url("//cdn.example.org/a.jpg", None).as_deref(),
///     Some("https://cdn.example.org/a.jpg"),
/// );
/// assert_eq!(normalize_image_url("data:image/png;base64,AAAA", None), None);
/// ```
pub fn normalize_image_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let candidate = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    let parsed = if let Some(rest) = candidate.strip_prefix("//") {
        Url::parse(&format!("https://{rest}")).ok()?
    } else {
        match Url::parse(candidate) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(candidate).ok()?,
            Err(_) => return None,
        }
    };
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Best entry of a `srcset`: the largest `w` descriptor, `x` densities count
/// as thousands, entries without a descriptor score zero.
pub fn pick_from_srcset(value: &str, base: Option<&Url>) -> Option<String> {
    let mut best: Option<(f64, String)> = None;
    for entry in value.split(',') {
        let mut parts = entry.split_whitespace();
        let Some(raw) = parts.next() else {
            continue;
        };
        let Some(url) = normalize_image_url(raw, base) else {
            continue;
        };
        let score = parts
            .next()
            .and_then(|d| {
                if let Some(w) = d.strip_suffix('w') {
                    w.parse::<f64>().ok()
                } else {
                    d.strip_suffix('x').and_then(|x| x.parse::<f64>().ok()).map(|x| x * 1000.0)
                }
            })
            .unwrap_or(0.0);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, url));
        }
    }
    best.map(|(_, url)| url)
}

/// Whether the URL points at a low-resolution `preview*` asset.
pub fn is_preview(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase());
    path.contains("preview")
}

fn img_candidate(img: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    IMG_ATTRS.iter().find_map(|attr| {
        let value = img.value().attr(attr)?;
        if attr.ends_with("srcset") {
            pick_from_srcset(value, base)
        } else {
            normalize_image_url(value, base)
        }
    })
}

/// Every usable image URL in priority order, deduplicated.
pub fn candidates(html: &str, base_url: Option<&str>) -> Vec<String> {
    let doc = Html::parse_document(html);
    let base = base_url.and_then(|b| Url::parse(b).ok());
    let base = base.as_ref();
    let mut out: Vec<String> = Vec::new();
    let mut push = |url: Option<String>| {
        if let Some(url) = url {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    };

    for key in META_KEYS {
        for meta in doc.select(&META) {
            let value = meta.value();
            let named = value.attr("property").or_else(|| value.attr("name"));
            if named.is_some_and(|n| n.eq_ignore_ascii_case(key)) {
                push(value.attr("content").and_then(|c| normalize_image_url(c, base)));
            }
        }
    }
    for link in doc.select(&LINK_IMAGE_SRC) {
        push(link.value().attr("href").and_then(|h| normalize_image_url(h, base)));
    }
    for source in doc.select(&SOURCES) {
        let value = source.value();
        let set = value.attr("srcset").or_else(|| value.attr("data-srcset"));
        push(set.and_then(|s| pick_from_srcset(s, base)));
    }
    for img in doc.select(&IMGS) {
        push(img_candidate(img, base));
    }
    for el in doc.select(&STYLED) {
        if let Some(style) = el.value().attr("style") {
            for caps in BACKGROUND_RE.captures_iter(style) {
                push(normalize_image_url(&caps[1], base));
            }
        }
    }
    for a in doc.select(&ANCHORS) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let path = href.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            push(normalize_image_url(href, base));
        }
    }
    out
}

/// First candidate in priority order, skipping preview assets when anything
/// else exists.
///
/// ```
/// use radar_web::image;
///
/// let html = r#"<meta property="og:image" content="/img/lead.jpg"><img src="/img/other.png">"#;
/// assert_eq!(
///     image::resolve(html, Some("https://tax.gov.ua/news/1.html")).as_deref(),
///     Some("https://tax.gov.ua/img/lead.jpg"),
/// );
/// ```
pub fn resolve(html: &str, base_url: Option<&str>) -> Option<String> {
    let all = candidates(html, base_url);
    all.iter()
        .find(|url| !is_preview(url))
        .or_else(|| all.first())
        .cloned()
}

/// Resolve, then when the pick is a preview asset look for a full image
/// inside `content_selectors` (and `<picture>` sources) before settling.
pub fn resolve_preferring(
    html: &str,
    base_url: Option<&str>,
    content_selectors: &[&str],
) -> Option<String> {
    let picked = resolve(html, base_url);
    if picked.as_deref().is_some_and(|p| !is_preview(p)) {
        return picked;
    }
    full_image_in(html, base_url, content_selectors).or(picked)
}

/// A non-preview image from `<picture>` sources or the given content selectors.
pub fn full_image_in(html: &str, base_url: Option<&str>, content_selectors: &[&str]) -> Option<String> {
    let doc = Html::parse_document(html);
    let base = base_url.and_then(|b| Url::parse(b).ok());
    let base = base.as_ref();

    let from_sources = doc.select(&SOURCES).find_map(|source| {
        let value = source.value();
        let set = value.attr("srcset").or_else(|| value.attr("data-srcset"))?;
        pick_from_srcset(set, base).filter(|u| !is_preview(u))
    });
    if from_sources.is_some() {
        return from_sources;
    }
    content_selectors
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|sel| {
            doc.select(&sel)
                .find_map(|img| img_candidate(img, base).filter(|u| !is_preview(u)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tag_beats_img_tags() {
        let html = r#"<html><head><meta property="og:image" content="/images/pic.png"></head>
            <body><img src="/a.jpg"><img data-src="/b.jpg"></body></html>"#;
        let base = Some("https://tax.gov.ua/media/article.html");
        assert_eq!(resolve(html, base).as_deref(), Some("https://tax.gov.ua/images/pic.png"));
    }

    #[test]
    fn twitter_name_attribute_is_matched() {
        let html = r#"<meta name="twitter:image" content="https://example.com/t.jpg">"#;
        assert_eq!(resolve(html, None).as_deref(), Some("https://example.com/t.jpg"));
    }

    #[test]
    fn lazy_attributes_and_protocol_relative_urls() {
        let html = r#"<img data-src="//cdn.example.org/assets/main.jpeg" src="/placeholder.gif" />"#;
        assert_eq!(
            resolve(html, Some("https://example.org/post")).as_deref(),
            Some("https://cdn.example.org/assets/main.jpeg")
        );
    }

    #[test]
    fn srcset_prefers_widest_then_densest() {
        let html = r#"<img srcset="/img/small.jpg 320w, /img/large.jpg 1024w">"#;
        assert_eq!(
            resolve(html, Some("https://example.com/news")).as_deref(),
            Some("https://example.com/img/large.jpg")
        );
        let base = Url::parse("https://example.com/").ok();
        assert_eq!(
            pick_from_srcset("/a.jpg 1x, /b.jpg 2x, /c.jpg", base.as_ref()).as_deref(),
            Some("https://example.com/b.jpg")
        );
    }

    #[test]
    fn preview_picture_loses_to_plain_img() {
        let html = r#"<picture><source srcset="/upload/preview1.jpg 800w"></picture>
            <img src="/upload/full/photo.jpg">"#;
        assert_eq!(
            resolve(html, Some("https://tax.gov.ua/x.html")).as_deref(),
            Some("https://tax.gov.ua/upload/full/photo.jpg")
        );
    }

    #[test]
    fn preview_is_kept_when_nothing_else_exists() {
        let html = r#"<img src="/upload/preview1.jpg">"#;
        assert_eq!(
            resolve(html, Some("https://tax.gov.ua/")).as_deref(),
            Some("https://tax.gov.ua/upload/preview1.jpg")
        );
    }

    #[test]
    fn background_styles_and_image_anchors() {
        let html = r#"<div style="background-image: url('/bg/cover.webp')"></div>"#;
        assert_eq!(
            resolve(html, Some("https://dou.ua/")).as_deref(),
            Some("https://dou.ua/bg/cover.webp")
        );
        let html = r#"<a href="/files/photo.JPG?v=2">фото</a><a href="/news/1.html">новина</a>"#;
        assert_eq!(
            resolve(html, Some("https://ain.ua/")).as_deref(),
            Some("https://ain.ua/files/photo.JPG?v=2")
        );
    }

    #[test]
    fn rejects_data_uris_and_other_schemes() {
        assert_eq!(normalize_image_url("data:image/gif;base64,R0lG", None), None);
        assert_eq!(normalize_image_url("ftp://example.com/a.jpg", None), None);
        assert_eq!(normalize_image_url("/relative.jpg", None), None);
        assert_eq!(
            normalize_image_url(" 'https://example.com/q.jpg' ", None).as_deref(),
            Some("https://example.com/q.jpg")
        );
        assert_eq!(resolve("<p>нічого</p>", None), None);
    }

    #[test]
    fn content_selectors_upgrade_a_preview() {
        let html = r#"<meta property="og:image" content="/upload/preview2.jpg">
            <div class="article__content"><img src="/upload/big/photo.jpg"></div>"#;
        assert_eq!(
            resolve_preferring(html, Some("https://tax.gov.ua/"), TAX_CONTENT_SELECTORS).as_deref(),
            Some("https://tax.gov.ua/upload/big/photo.jpg")
        );
        let only_preview = r#"<meta property="og:image" content="/upload/preview2.jpg">"#;
        assert_eq!(
            resolve_preferring(only_preview, Some("https://tax.gov.ua/"), TAX_CONTENT_SELECTORS).as_deref(),
            Some("https://tax.gov.ua/upload/preview2.jpg")
        );
    }
}
