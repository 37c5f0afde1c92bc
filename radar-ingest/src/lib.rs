//! Admission of feed candidates into the article store.
//!
//! - [`coordinator`]: [`IngestCoordinator`], one candidate to one [`Verdict`]
//! - [`cycle`]: [`run_cycle`], a bounded concurrent batch with a [`CycleReport`]
//! - [`store`]: the [`ArticleStore`] seam and an in-memory implementation
//! - [`verdict`]: admission outcomes
//!
//! Observability: every item logs `ingest.verdict`; a batch logs
//! `ingest.cycle.done` with the counters and failing sources.

pub mod coordinator;
pub mod cycle;
pub mod store;
pub mod verdict;

pub use coordinator::{CandidateItem, IngestCoordinator};
pub use cycle::{CycleReport, run_cycle, run_cycle_at};
pub use store::{ArticleRecord, ArticleStore, MemoryArticleStore, StoreError};
pub use verdict::Verdict;
