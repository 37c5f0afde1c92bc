use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use radar_common::RadarError;
use radar_common::settings::{FetchSettings, SiteProfile};
use radar_http::client::HttpStrategy;
use radar_http::{
    AttemptOutcome, FetchOrchestrator, FetchPlan, FetchResult, FetchStrategy, HtmlSource,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Rung that replays a fixed response and records that it ran.
struct Scripted {
    name: &'static str,
    status: u16,
    body: &'static str,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl FetchStrategy for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _plan: &FetchPlan, _cancel: &CancellationToken) -> FetchResult {
        self.calls.lock().unwrap().push(self.name);
        FetchResult::completed(self.name, Some(self.status), self.body.to_string())
    }
}

fn scripted(
    calls: &Arc<Mutex<Vec<&'static str>>>,
    name: &'static str,
    status: u16,
    body: &'static str,
) -> Box<dyn FetchStrategy> {
    Box::new(Scripted {
        name,
        status,
        body,
        calls: calls.clone(),
    })
}

#[tokio::test]
async fn third_rung_wins_after_two_403s() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let ladder = FetchOrchestrator::new(
        FetchSettings::default(),
        vec![
            scripted(&calls, "http2", 403, "<h1>Forbidden</h1>"),
            scripted(&calls, "http1", 403, "<h1>Forbidden</h1>"),
            scripted(&calls, "impersonate", 200, "<html><p>Стаття</p></html>"),
            scripted(&calls, "browser", 200, "<html>never</html>"),
        ],
    );

    let outcome = ladder
        .fetch("https://bank.gov.ua/ua/news/all/x", &CancellationToken::new())
        .await;

    assert_eq!(outcome.html.as_deref(), Some("<html><p>Стаття</p></html>"));
    let names: Vec<_> = outcome.attempts.iter().map(|a| a.strategy).collect();
    assert_eq!(names, vec!["http2", "http1", "impersonate"]);
    assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::Status(403));
    assert_eq!(outcome.attempts[1].outcome, AttemptOutcome::Status(403));
    assert_eq!(outcome.attempts[2].outcome, AttemptOutcome::Completed(Some(200)));
    assert_eq!(outcome.succeeded_with(), Some("impersonate"));
    assert_eq!(*calls.lock().unwrap(), vec!["http2", "http1", "impersonate"]);
}

#[tokio::test]
async fn exhausted_ladder_returns_no_html() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let ladder = FetchOrchestrator::new(
        FetchSettings::default(),
        vec![
            scripted(&calls, "http2", 503, "busy"),
            scripted(&calls, "http1", 200, "   "),
        ],
    );
    let cancel = CancellationToken::new();

    assert!(ladder.fetch_html("https://dou.ua/news", &cancel).await.is_none());
    let outcome = ladder.fetch("https://dou.ua/news", &cancel).await;
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(
        outcome.attempts[1].outcome,
        AttemptOutcome::Error("empty body".into())
    );

    let err = ladder.fetch("https://dou.ua/news", &cancel).await.into_html().unwrap_err();
    assert!(matches!(err, RadarError::Fetch(_)));
    assert!(err.to_string().contains("http1: empty body"), "{err}");
}

#[tokio::test]
async fn cancelled_token_stops_before_first_rung() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let ladder = FetchOrchestrator::new(
        FetchSettings::default(),
        vec![scripted(&calls, "http2", 200, "<p>x</p>")],
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = ladder.fetch("https://dou.ua/news", &cancel).await;
    assert!(outcome.html.is_none());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_url_makes_no_attempts() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let ladder = FetchOrchestrator::new(
        FetchSettings::default(),
        vec![scripted(&calls, "http2", 200, "<p>x</p>")],
    );
    let outcome = ladder.fetch("mailto:press@tax.gov.ua", &CancellationToken::new()).await;
    assert!(outcome.attempts.is_empty());
    assert!(outcome.html.is_none());
    let err = outcome.into_html().unwrap_err();
    assert!(err.to_string().contains("no strategy ran"), "{err}");
}

fn settings_for(server: &MockServer, warmup: bool) -> FetchSettings {
    let host = server.address().ip().to_string();
    FetchSettings {
        timeout_secs: 5,
        sites: vec![SiteProfile {
            domain: host,
            canonical_host: None,
            warmup_url: warmup.then(|| format!("{}/", server.uri())),
            headers: SiteProfile::default_headers(),
        }],
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn http_rung_warms_up_then_fetches_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=abc; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news/1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><h1>Новина</h1><p>Текст</p></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let plan = radar_http::build_plan(
        &format!("{}/news/1.html", server.uri()),
        &settings_for(&server, true),
    )
    .unwrap();
    assert!(plan.warmup.is_some());

    let res = HttpStrategy::http1()
        .fetch(&plan, &CancellationToken::new())
        .await;
    assert!(res.is_success(), "{res:?}");
    assert_eq!(res.status, Some(200));
    assert!(res.html.unwrap().contains("Новина"));
}

#[tokio::test]
async fn http_rungs_record_403_then_fall_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .expect(2)
        .mount(&server)
        .await;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let ladder = FetchOrchestrator::new(
        settings_for(&server, false),
        vec![
            Box::new(HttpStrategy::http2()),
            Box::new(HttpStrategy::http1()),
            scripted(&calls, "impersonate", 200, "<p>через відбиток</p>"),
        ],
    );

    let outcome = ladder
        .fetch(&format!("{}/blocked", server.uri()), &CancellationToken::new())
        .await;
    assert_eq!(outcome.html.as_deref(), Some("<p>через відбиток</p>"));
    assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::Status(403));
    assert_eq!(outcome.attempts[1].outcome, AttemptOutcome::Status(403));
}
