//! Staged page fetching for sites that push back on scrapers.
//!
//! - [`plan`]: per-site URL normalization, header sets, and warm-up pages
//! - [`strategy`]: the [`FetchStrategy`] contract shared by every rung
//! - [`client`]: `reqwest` rungs (negotiated HTTP/2, forced HTTP/1.1)
//! - [`impersonate`]: curl-impersonate subprocess rung
//! - [`browser`]: WebDriver rung
//! - [`capabilities`]: once-per-process probe of the optional rungs
//! - [`orchestrator`]: [`FetchOrchestrator`], the ladder itself
//!
//! Observability: every rung is logged as `fetch.step` with the strategy name
//! and either a status or an error; a fully failed ladder logs
//! `fetch.exhausted` with the attempt list.
//!
//! ```no_run
//! # async fn demo() {
//! use radar_common::settings::FetchSettings;
//! use radar_http::FetchOrchestrator;
//! use tokio_util::sync::CancellationToken;
//!
//! let ladder = FetchOrchestrator::standard(FetchSettings::default()).await;
//! let outcome = ladder
//!     .fetch("https://tax.gov.ua/media-tsentr/novini/945326.html", &CancellationToken::new())
//!     .await;
//! println!("{:?} via {:?}", outcome.html.as_ref().map(|h| h.len()), outcome.succeeded_with());
//! # }
//! ```

pub mod browser;
pub mod capabilities;
pub mod client;
pub mod error;
pub mod impersonate;
pub mod orchestrator;
pub mod plan;
pub mod strategy;

pub use error::FetchError;
pub use orchestrator::{AttemptOutcome, FetchAttempt, FetchOrchestrator, FetchOutcome, HtmlSource};
pub use plan::{FetchPlan, build_plan};
pub use strategy::{FetchResult, FetchStrategy};
