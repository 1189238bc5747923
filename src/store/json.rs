//! JSON file store.
//!
//! # Layout
//!
//! ```text
//! store_dir/
//! ├── feed_sources/
//! │   └── {id}.json
//! └── feed_contents/
//!     └── {id}.json
//! ```
//!
//! Documents are written to a temporary file of their own and renamed into
//! place, so a reader sees either the old or the new document, never a
//! partial one. Concurrent writers of one document each rename a complete
//! file; the last rename wins.
//!
//! Source documents are also mutated by read-modify-write
//! ([`DocumentStore::set_last_refreshed`]). Those updates, puts and deletes
//! of sources are serialized per store, so an update never brings back a
//! source deleted while it ran.

use super::{CONTENTS_COLLECTION, DocumentStore, SOURCES_COLLECTION};
use crate::error::StoreError;
use crate::models::{FeedSource, RenderedFeed};
use crate::utils::{ensure_writable_dir, generate_id, is_valid_id};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    sources_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    #[instrument(level = "info", skip_all, fields(dir = %dir))]
    pub async fn open(dir: &str) -> Result<Self, StoreError> {
        for collection in [SOURCES_COLLECTION, CONTENTS_COLLECTION] {
            let path = Path::new(dir).join(collection);
            let path = path.to_string_lossy();
            if let Err(e) = ensure_writable_dir(&path).await {
                error!(%path, error = %e, "Store directory is not writable");
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    e.to_string(),
                )));
            }
        }
        info!("Opened JSON file store");
        Ok(Self {
            root: PathBuf::from(dir),
            sources_lock: Arc::new(Mutex::new(())),
        })
    }

    fn path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(collection).join(format!("{id}.json")))
    }

    async fn read<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.path(collection, id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write<T: Serialize + Sync>(&self, collection: &str, id: &str, doc: &T) -> Result<(), StoreError> {
        let path = self.path(collection, id)?;
        let json = serde_json::to_vec_pretty(doc)?;
        let tmp = path.with_extension(format!("json.{}.tmp", generate_id()));
        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path = %path.display(), "Wrote document");
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        let path = self.path(collection, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl DocumentStore for JsonFileStore {
    async fn get_source(&self, id: &str) -> Result<Option<FeedSource>, StoreError> {
        self.read(SOURCES_COLLECTION, id).await
    }

    async fn list_sources(&self) -> Result<Vec<FeedSource>, StoreError> {
        let dir = self.root.join(SOURCES_COLLECTION);
        let mut entries = fs::read_dir(&dir).await?;
        let mut sources = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<FeedSource>(&bytes) {
                Ok(source) => sources.push(source),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed source document"),
            }
        }
        Ok(sources)
    }

    async fn put_source(&self, source: &FeedSource) -> Result<(), StoreError> {
        let _guard = self.sources_lock.lock().await;
        self.write(SOURCES_COLLECTION, &source.id, source).await
    }

    async fn delete_source(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.sources_lock.lock().await;
        self.remove(SOURCES_COLLECTION, id).await
    }

    async fn set_last_refreshed(&self, id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let _guard = self.sources_lock.lock().await;
        let Some(mut source) = self.read::<FeedSource>(SOURCES_COLLECTION, id).await? else {
            return Ok(false);
        };
        source.last_refreshed = Some(at);
        self.write(SOURCES_COLLECTION, id, &source).await?;
        Ok(true)
    }

    async fn get_content(&self, id: &str) -> Result<Option<RenderedFeed>, StoreError> {
        self.read(CONTENTS_COLLECTION, id).await
    }

    async fn put_content(&self, id: &str, feed: &RenderedFeed) -> Result<(), StoreError> {
        self.write(CONTENTS_COLLECTION, id, feed).await
    }

    async fn delete_content(&self, id: &str) -> Result<bool, StoreError> {
        self.remove(CONTENTS_COLLECTION, id).await
    }
}
