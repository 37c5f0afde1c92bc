use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use radar_common::settings::{ExtractSettings, IngestSettings};
use radar_http::HtmlSource;
use radar_ingest::{CandidateItem, IngestCoordinator, MemoryArticleStore, Verdict, run_cycle_at};
use tokio_util::sync::CancellationToken;

const ARTICLE_URL: &str = "https://tax.gov.ua/media-tsentr/novini/945326.html";
const PRINT_URL: &str = "https://tax.gov.ua/media-tsentr/novini/print-945326.html";
const TITLE: &str = "Нові ставки єдиного податку";

const ARTICLE_HTML: &str = r#"<html><head>
<meta property="og:image" content="/data/material/000/945/preview1.jpg">
<meta property="article:published_time" content="2025-10-23T14:13:00+03:00">
</head><body><header><nav><a href="/">Головна</a></nav></header>
<div class="article__content"><h1>Нові ставки єдиного податку</h1><p>Коротко про головне.</p></div>
</body></html>"#;

const PRINT_HTML: &str = r#"<html><body><h1>Нові ставки єдиного податку</h1>
<p>Фізичні особи – підприємці першої групи сплачують єдиний податок за фіксованою ставкою до 10 відсотків прожиткового мінімуму.</p>
<p>Платники другої групи сплачують єдиний податок у розмірі до 20 відсотків мінімальної заробітної плати на 1 січня року.</p>
<p>Платники третьої групи сплачують 5 відсотків доходу або 3 відсотки доходу разом зі сплатою податку на додану вартість.</p>
<img src="/data/material/000/945/945326_big.jpg">
<div class="share">Поділитися</div></body></html>"#;

const NAV_ONLY_HTML: &str = r#"<html><body><nav><a href="/">Головна</a><a href="/news">Новини</a></nav></body></html>"#;

/// Serves canned pages and records every URL asked for.
#[derive(Default)]
struct ScriptedSource {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn with(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HtmlSource for ScriptedSource {
    async fn fetch_html(&self, url: &str, _cancel: &CancellationToken) -> Option<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned()
    }
}

struct PanickingSource;

#[async_trait]
impl HtmlSource for PanickingSource {
    async fn fetch_html(&self, _url: &str, _cancel: &CancellationToken) -> Option<String> {
        panic!("fetch blew up");
    }
}

fn tax_source() -> ScriptedSource {
    ScriptedSource::default()
        .with(ARTICLE_URL, ARTICLE_HTML)
        .with(PRINT_URL, PRINT_HTML)
}

fn coordinator(source: Arc<dyn HtmlSource>, store: Arc<MemoryArticleStore>) -> IngestCoordinator {
    IngestCoordinator::new(source, store, ExtractSettings::default(), IngestSettings::default())
}

#[tokio::test]
async fn tax_article_is_accepted_then_duplicate() {
    let source = Arc::new(tax_source());
    let store = Arc::new(MemoryArticleStore::new());
    let ingest = coordinator(source.clone(), store.clone());
    let cancel = CancellationToken::new();
    let item = CandidateItem::new(ARTICLE_URL, TITLE);

    assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::Accepted);
    assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::Duplicate);
    assert_eq!(source.requested(), vec![ARTICLE_URL, PRINT_URL]);

    let record = store.get(ARTICLE_URL).expect("stored");
    assert_eq!(record.domain, "tax.gov.ua");
    assert!(record.body_text.starts_with("Фізичні особи – підприємці першої групи"));
    assert!(record.body_text.contains("\n\nПлатники третьої групи"));
    assert!(!record.body_text.contains("Поділитися"));
    assert_eq!(
        record.image_url.as_deref(),
        Some("https://tax.gov.ua/data/material/000/945/945326_big.jpg")
    );
    assert_eq!(record.published_at, Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap());
    assert_eq!(record.body_checksum.len(), 64);
}

#[tokio::test]
async fn print_url_is_canonicalized_before_fetching() {
    let source = Arc::new(tax_source());
    let store = Arc::new(MemoryArticleStore::new());
    let ingest = coordinator(source.clone(), store.clone());

    let item = CandidateItem::new(format!("  {PRINT_URL}#top "), TITLE);
    assert_eq!(ingest.ingest(&item, &CancellationToken::new()).await, Verdict::Accepted);
    assert_eq!(source.requested(), vec![ARTICLE_URL, PRINT_URL]);
    assert!(store.get(ARTICLE_URL).is_some());
}

#[tokio::test]
async fn unlisted_domains_are_rejected_without_fetching() {
    let source = Arc::new(ScriptedSource::default());
    let ingest = coordinator(source.clone(), Arc::new(MemoryArticleStore::new()));
    let cancel = CancellationToken::new();

    for url in ["https://example.com/news/1", "https://eviltax.gov.ua/news/1", "not a url"] {
        let item = CandidateItem::new(url, TITLE);
        assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::RejectedNotWhitelisted, "{url}");
    }
    assert!(source.requested().is_empty());
}

#[tokio::test]
async fn google_news_wrapper_is_unwrapped_before_the_whitelist() {
    let source = Arc::new(tax_source());
    let store = Arc::new(MemoryArticleStore::new());
    let ingest = coordinator(source.clone(), store.clone());
    let cancel = CancellationToken::new();

    let wrapped = CandidateItem::new("https://news.google.com/articles/abc?url=https%3A%2F%2Fexample.com%2Fa", TITLE);
    assert_eq!(ingest.ingest(&wrapped, &cancel).await, Verdict::RejectedNotWhitelisted);
    assert!(source.requested().is_empty());

    let wrapped = CandidateItem::new(
        "https://news.google.com/rss/articles/abc?u=https%3A%2F%2Ftax.gov.ua%2Fmedia-tsentr%2Fnovini%2F945326.html",
        TITLE,
    );
    assert_eq!(ingest.ingest(&wrapped, &cancel).await, Verdict::Accepted);
    assert!(store.get(ARTICLE_URL).is_some());
}

#[tokio::test]
async fn short_page_on_a_critical_site_has_no_body() {
    let url = "https://bank.gov.ua/ua/news/all/korotke-povidomlennya";
    let source = Arc::new(ScriptedSource::default().with(
        url,
        "<html><body><h1>Повідомлення НБУ</h1><p>Коротке повідомлення для банків.</p></body></html>",
    ));
    let ingest = coordinator(source.clone(), Arc::new(MemoryArticleStore::new()));
    let item = CandidateItem::new(url, "Повідомлення НБУ").published(Utc::now());

    assert_eq!(ingest.ingest(&item, &CancellationToken::new()).await, Verdict::RejectedNoBody);
    assert_eq!(source.requested(), vec![url]);
}

#[tokio::test]
async fn unreachable_critical_site_has_no_body() {
    let ingest = coordinator(Arc::new(ScriptedSource::default()), Arc::new(MemoryArticleStore::new()));
    let item = CandidateItem::new("https://bank.gov.ua/ua/news/all/x", "Рішення НБУ")
        .with_summary("НБУ ухвалив рішення щодо облікової ставки.")
        .published(Utc::now());
    assert_eq!(ingest.ingest(&item, &CancellationToken::new()).await, Verdict::RejectedNoBody);
}

#[tokio::test]
async fn unreachable_regular_site_falls_back_to_the_feed_summary() {
    let store = Arc::new(MemoryArticleStore::new());
    let ingest = coordinator(Arc::new(ScriptedSource::default()), store.clone());
    let cancel = CancellationToken::new();
    let url = "https://minfin.gov.ua/news/view/zminy";

    let bare = CandidateItem::new(url, "Зміни до бюджету").published(Utc::now());
    assert_eq!(ingest.ingest(&bare, &cancel).await, Verdict::Error);

    let echo = bare.clone().with_summary("Зміни до бюджету");
    assert_eq!(ingest.ingest(&echo, &cancel).await, Verdict::Error);

    let item = bare.with_summary("Мінфін оприлюднив зміни до бюджету на наступний рік.");
    assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::Accepted);
    assert_eq!(
        store.get(url).map(|r| r.body_text),
        Some("Мінфін оприлюднив зміни до бюджету на наступний рік.".to_string())
    );
}

#[tokio::test]
async fn empty_page_uses_the_summary_chain() {
    let url = "https://minfin.gov.ua/news/view/navigation";
    let source = Arc::new(ScriptedSource::default().with(url, NAV_ONLY_HTML));
    let ingest = coordinator(source, Arc::new(MemoryArticleStore::new()));
    let cancel = CancellationToken::new();

    let item = CandidateItem::new(url, "Новини").published(Utc::now());
    assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::RejectedNoBody);

    let item = item.with_summary("Огляд новин міністерства за тиждень.");
    assert_eq!(ingest.ingest(&item, &cancel).await, Verdict::Accepted);
}

#[tokio::test]
async fn body_without_any_date_is_rejected() {
    let url = "https://minfin.gov.ua/news/view/bez-daty";
    let source = Arc::new(ScriptedSource::default().with(url, &PRINT_HTML.replace("<img", "<span")));
    let ingest = coordinator(source, Arc::new(MemoryArticleStore::new()));

    let item = CandidateItem::new(url, TITLE);
    assert_eq!(ingest.ingest(&item, &CancellationToken::new()).await, Verdict::RejectedNoDate);
}

#[tokio::test]
async fn panics_become_error_verdicts() {
    let ingest = coordinator(Arc::new(PanickingSource), Arc::new(MemoryArticleStore::new()));
    let item = CandidateItem::new(ARTICLE_URL, TITLE);
    assert_eq!(ingest.ingest(&item, &CancellationToken::new()).await, Verdict::Error);
}

#[tokio::test]
async fn cycle_reports_every_item() {
    let nbu = "https://bank.gov.ua/ua/news/all/short";
    let source = Arc::new(
        tax_source().with(nbu, "<html><body><h1>НБУ</h1><p>Надто коротко.</p></body></html>"),
    );
    let store = Arc::new(MemoryArticleStore::new());
    let ingest = coordinator(source.clone(), store.clone());
    let now = Utc.with_ymd_and_hms(2025, 10, 24, 9, 0, 0).unwrap();

    let items = vec![
        CandidateItem::new(ARTICLE_URL, TITLE),
        CandidateItem::new("https://tax.gov.ua/media-tsentr/novini/900001.html", "Стара новина")
            .published(Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()),
        CandidateItem::new("https://example.com/a", "Сторонній сайт"),
        CandidateItem::new(nbu, "НБУ").published(now),
    ];
    let report = run_cycle_at(&ingest, items, now, &CancellationToken::new()).await;

    assert_eq!(report.total(), 4);
    assert_eq!(report.count(Verdict::Accepted), 1);
    assert_eq!(report.count(Verdict::RejectedStale), 1);
    assert_eq!(report.count(Verdict::RejectedNotWhitelisted), 1);
    assert_eq!(report.count(Verdict::RejectedNoBody), 1);
    assert_eq!(report.failed_sources.get("bank.gov.ua"), Some(&1));
    assert_eq!(report.cancelled, 0);
    assert!(!source.requested().iter().any(|u| u.contains("900001")));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn cancelled_cycle_starts_nothing() {
    let source = Arc::new(tax_source());
    let ingest = coordinator(source.clone(), Arc::new(MemoryArticleStore::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let items = vec![CandidateItem::new(ARTICLE_URL, TITLE), CandidateItem::new(PRINT_URL, TITLE)];
    let report = run_cycle_at(&ingest, items, Utc::now(), &cancel).await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.cancelled, 2);
    assert!(source.requested().is_empty());
}

#[test]
fn candidates_deserialize_with_optional_fields() {
    let items: Vec<CandidateItem> = serde_json::from_str(
        r#"[{"url": "https://tax.gov.ua/a.html", "title": "А"},
            {"url": "https://dtkt.ua/b", "title": "Б", "summary": "Зміст", "published_at": "2025-10-23T11:13:00Z"}]"#,
    )
    .unwrap();
    assert_eq!(items[0].summary, None);
    assert_eq!(items[1].published_at, Some(Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap()));
    assert_eq!(items[1].domain().as_deref(), Some("dtkt.ua"));
}
