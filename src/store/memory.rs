use super::DocumentStore;
use crate::error::StoreError;
use crate::models::{FeedSource, RenderedFeed};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: RwLock<HashMap<String, FeedSource>>,
    contents: RwLock<HashMap<String, RenderedFeed>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    async fn get_source(&self, id: &str) -> Result<Option<FeedSource>, StoreError> {
        Ok(self.sources.read().await.get(id).cloned())
    }

    async fn list_sources(&self) -> Result<Vec<FeedSource>, StoreError> {
        Ok(self.sources.read().await.values().cloned().collect())
    }

    async fn put_source(&self, source: &FeedSource) -> Result<(), StoreError> {
        self.sources
            .write()
            .await
            .insert(source.id.clone(), source.clone());
        Ok(())
    }

    async fn delete_source(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sources.write().await.remove(id).is_some())
    }

    async fn set_last_refreshed(&self, id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.sources.write().await.get_mut(id) {
            Some(source) => {
                source.last_refreshed = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_content(&self, id: &str) -> Result<Option<RenderedFeed>, StoreError> {
        Ok(self.contents.read().await.get(id).cloned())
    }

    async fn put_content(&self, id: &str, feed: &RenderedFeed) -> Result<(), StoreError> {
        self.contents
            .write()
            .await
            .insert(id.to_string(), feed.clone());
        Ok(())
    }

    async fn delete_content(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.contents.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source(id: &str) -> FeedSource {
        FeedSource {
            id: id.to_string(),
            name: "Example".to_string(),
            url: "https://example.com".to_string(),
            selector: "article".to_string(),
            description: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            last_refreshed: None,
        }
    }

    #[tokio::test]
    async fn test_source_lifecycle() {
        let store = MemoryStore::new();
        store.put_source(&source("a")).await.unwrap();
        store.put_source(&source("b")).await.unwrap();
        assert_eq!(store.list_sources().await.unwrap().len(), 2);

        let at = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert!(store.set_last_refreshed("a", at).await.unwrap());
        assert!(!store.set_last_refreshed("zzz", at).await.unwrap());
        let a = store.get_source("a").await.unwrap().unwrap();
        assert_eq!(a.last_refreshed, Some(at));

        assert!(store.delete_source("a").await.unwrap());
        assert!(!store.delete_source("a").await.unwrap());
        assert!(store.get_source("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_overwrite() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let first = RenderedFeed {
            content: "one".to_string(),
            generated_at: t0,
        };
        let second = RenderedFeed {
            content: "two".to_string(),
            generated_at: t0 + chrono::Duration::hours(1),
        };

        store.put_content("a", &first).await.unwrap();
        store.put_content("a", &second).await.unwrap();
        assert_eq!(store.get_content("a").await.unwrap(), Some(second));
        assert!(store.delete_content("a").await.unwrap());
        assert!(store.get_content("a").await.unwrap().is_none());
    }
}
