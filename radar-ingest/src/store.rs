//! Where accepted articles go. The real schema lives outside this workspace;
//! [`MemoryArticleStore`] backs tests and the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Article already stored: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A normalized article as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub domain: String,
    pub published_at: DateTime<Utc>,
    pub body_text: String,
    pub image_url: Option<String>,
    /// blake3 of `body_text`, hex encoded.
    pub body_checksum: String,
    pub summary: Option<String>,
}

impl ArticleRecord {
    pub fn checksum(body: &str) -> String {
        hex::encode(blake3::hash(body.as_bytes()).as_bytes())
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Fails with [`StoreError::Conflict`] when the URL is already stored.
    async fn insert(&self, record: ArticleRecord) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    records: DashMap<String, ArticleRecord>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<ArticleRecord> {
        self.records.get(url).map(|r| r.value().clone())
    }

    pub fn records(&self) -> Vec<ArticleRecord> {
        let mut all: Vec<ArticleRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.url.cmp(&b.url)));
        all
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.records.contains_key(url))
    }

    async fn insert(&self, record: ArticleRecord) -> Result<()> {
        match self.records.entry(record.url.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.url)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(url: &str) -> ArticleRecord {
        let body = "Текст статті.";
        ArticleRecord {
            title: "Заголовок".to_string(),
            url: url.to_string(),
            domain: "tax.gov.ua".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 10, 23, 11, 13, 0).unwrap(),
            body_text: body.to_string(),
            image_url: None,
            body_checksum: ArticleRecord::checksum(body),
            summary: None,
        }
    }

    #[tokio::test]
    async fn second_insert_of_a_url_conflicts() {
        let store = MemoryArticleStore::new();
        let url = "https://tax.gov.ua/media-tsentr/novini/945326.html";
        assert!(!store.exists(url).await.unwrap());
        store.insert(record(url)).await.unwrap();
        assert!(store.exists(url).await.unwrap());
        assert!(matches!(store.insert(record(url)).await, Err(StoreError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn checksum_is_hex_blake3() {
        let sum = ArticleRecord::checksum("abc");
        assert_eq!(sum.len(), 64);
        assert_eq!(sum, blake3::hash(b"abc").to_hex().to_string());
    }
}
