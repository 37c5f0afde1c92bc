use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use radar_common::settings::RadarSettings;
use radar_http::FetchOrchestrator;
use radar_http::capabilities::probe;
use radar_ingest::{CandidateItem, IngestCoordinator, MemoryArticleStore, run_cycle};
use radar_render::preamble::rebuild_draft_body;
use radar_render::{PreviewRenderer, PreviewVariants, split_post_sections};
use radar_web::{BodyExtractor, ExtractedArticle, meta};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::Command;

pub async fn run(command: Command, settings: RadarSettings, cancel: CancellationToken) -> Result<()> {
    match command {
        Command::Ingest {
            items,
            concurrency,
            out,
        } => ingest(settings, &items, concurrency, out.as_deref(), &cancel).await,
        Command::Fetch { url, print } => fetch(settings, &url, print, &cancel).await,
        Command::Extract {
            source,
            title,
            base_url,
        } => extract(settings, &source, title, base_url, &cancel).await,
        Command::Preview {
            title,
            body,
            link,
            tags,
            short,
        } => preview(settings, &title, &body, &link, &tags, short),
        Command::Capabilities => print_json(&probe(&settings.fetch).await),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Candidates from `.yaml`/`.yml` or JSON, by extension.
pub fn load_items(path: &Path) -> Result<Vec<CandidateItem>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let items = if is_yaml {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {} as YAML", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display()))?
    };
    Ok(items)
}

async fn ingest(
    settings: RadarSettings,
    items: &Path,
    concurrency: Option<usize>,
    out: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let items = load_items(items)?;
    let mut ingest_settings = settings.ingest;
    if let Some(concurrency) = concurrency {
        ingest_settings.concurrency = concurrency;
    }

    let source = Arc::new(FetchOrchestrator::standard(settings.fetch).await);
    let store = Arc::new(MemoryArticleStore::new());
    let coordinator = IngestCoordinator::new(source, store.clone(), settings.extract, ingest_settings);

    let report = run_cycle(&coordinator, items, cancel).await;
    if let Some(out) = out {
        let records = serde_json::to_string_pretty(&store.records())?;
        std::fs::write(out, records).with_context(|| format!("writing {}", out.display()))?;
    }
    print_json(&report)
}

async fn fetch(settings: RadarSettings, url: &str, print: bool, cancel: &CancellationToken) -> Result<()> {
    let ladder = FetchOrchestrator::standard(settings.fetch).await;
    let outcome = ladder.fetch(url, cancel).await;
    if print {
        println!("{}", outcome.into_html()?);
        return Ok(());
    }

    #[derive(Serialize)]
    struct Report<'a> {
        #[serde(flatten)]
        outcome: &'a radar_http::FetchOutcome,
        strategy: Option<&'static str>,
        html_len: Option<usize>,
    }
    print_json(&Report {
        outcome: &outcome,
        strategy: outcome.succeeded_with(),
        html_len: outcome.html.as_ref().map(String::len),
    })
}

async fn extract(
    settings: RadarSettings,
    source: &str,
    title: Option<String>,
    base_url: Option<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let (html, base_url) = if source.starts_with("http://") || source.starts_with("https://") {
        let ladder = FetchOrchestrator::standard(settings.fetch).await;
        let outcome = ladder.fetch(source, cancel).await;
        let html = outcome.into_html()?;
        (html, base_url.unwrap_or_else(|| source.to_string()))
    } else {
        let html = std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?;
        (html, base_url.unwrap_or_default())
    };

    let title = title.or_else(|| meta::page_title(&html));
    let extractor = BodyExtractor::new(settings.extract);
    let article = ExtractedArticle::from_html(&extractor, &html, &base_url, title.as_deref());

    #[derive(Serialize)]
    struct Report {
        title: Option<String>,
        #[serde(flatten)]
        article: ExtractedArticle,
    }
    print_json(&Report { title, article })
}

#[derive(Debug, Serialize)]
struct PreviewReport {
    /// The post that was rendered, after section selection and header cleanup.
    draft: String,
    #[serde(flatten)]
    variants: PreviewVariants,
}

/// Pick the long or short post from a draft and render it.
fn render_preview(settings: RadarSettings, title: &str, raw: &str, link: &str, tags: &str, short: bool) -> PreviewReport {
    let sections = split_post_sections(raw);
    let post = match sections.short {
        Some(short_post) if short => short_post,
        _ => sections.long,
    };
    let draft = rebuild_draft_body(&post, title, None);
    let renderer = PreviewRenderer::new(settings.preview).with_utm(settings.utm);
    let variants = renderer.render(title, &draft, link, tags);
    PreviewReport { draft, variants }
}

fn preview(settings: RadarSettings, title: &str, body: &Path, link: &str, tags: &str, short: bool) -> Result<()> {
    let raw = std::fs::read_to_string(body).with_context(|| format!("reading {}", body.display()))?;
    print_json(&render_preview(settings, title, &raw, link, tags, short))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn items_load_from_yaml_and_json() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            yaml,
            "- url: https://tax.gov.ua/media-tsentr/novini/945326.html\n  title: Нові ставки\n  published_at: 2025-10-23T11:13:00Z"
        )
        .unwrap();
        let items = load_items(yaml.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Нові ставки");
        assert!(items[0].published_at.is_some());

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"[{{"url": "https://dtkt.ua/a", "title": "А", "summary": "Зміст"}}]"#).unwrap();
        let items = load_items(json.path()).unwrap();
        assert_eq!(items[0].summary.as_deref(), Some("Зміст"));
    }

    #[test]
    fn bad_items_file_names_the_path() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, "not json").unwrap();
        let err = load_items(json.path()).unwrap_err();
        assert!(err.to_string().contains("as JSON"));
    }

    const DRAFT: &str = "**Нові ставки ЄСВ**\n23 жовтня 2025\n\nДовгий пост:\nДПС пояснює, як змінилися ставки для ФОП.\n\nКороткий пост: Ставки ЄСВ змінилися.";

    #[test]
    fn preview_renders_the_long_post_by_default() {
        let report = render_preview(
            RadarSettings::default(),
            "Нові ставки ЄСВ",
            DRAFT,
            "https://tax.gov.ua/media-tsentr/novini/945326.html",
            "#ЄСВ",
            false,
        );
        assert_eq!(report.draft, "**Нові ставки ЄСВ**\n\nДПС пояснює, як змінилися ставки для ФОП.");
        let text = &report.variants.with_image.text;
        assert!(text.starts_with("<b>Нові ставки ЄСВ</b>\n\nДПС пояснює"));
        assert!(!text.contains("Довгий пост"));
        assert!(!text.contains("Ставки ЄСВ змінилися"));
    }

    #[test]
    fn preview_can_pick_the_short_post() {
        let report = render_preview(
            RadarSettings::default(),
            "Нові ставки ЄСВ",
            DRAFT,
            "https://tax.gov.ua/media-tsentr/novini/945326.html",
            "",
            true,
        );
        assert_eq!(report.draft, "**Нові ставки ЄСВ**\n\nСтавки ЄСВ змінилися.");
        assert!(report.variants.without_image.text.contains("Ставки ЄСВ змінилися."));
    }

    #[test]
    fn short_flag_falls_back_to_a_plain_draft() {
        let report = render_preview(RadarSettings::default(), "Заголовок", "Лише один текст.", "", "", true);
        assert_eq!(report.draft, "**Заголовок**\n\nЛише один текст.");
    }
}
