//! Directory-backed store: one pretty-printed `<id>.json` file per tag.
//!
//! Writes go through a `.tmp` file and a rename so a crash never leaves a
//! half-written record behind under the final name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{RawRecord, RecordIter, StoreError, StoreFuture, TagStore};
use crate::core::model::TagId;

pub const RECORD_EXTENSION: &str = "json";

#[derive(Clone, Debug)]
pub struct JsonDirTagStore {
    dir: PathBuf,
}

impl JsonDirTagStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: TagId) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn record_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext == RECORD_EXTENSION)
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl TagStore for JsonDirTagStore {
    fn iterate_all(&self) -> StoreFuture<'_, RecordIter> {
        Box::pin(async move {
            let records: Vec<Result<RawRecord, StoreError>> = self
                .record_files()?
                .into_iter()
                .map(|path| read_json(&path))
                .collect();
            Ok(records.into_iter())
        })
    }

    fn get(&self, id: TagId) -> StoreFuture<'_, Option<RawRecord>> {
        Box::pin(async move {
            let path = self.record_path(id);
            if !path.exists() {
                return Ok(None);
            }
            read_json(&path).map(Some)
        })
    }

    fn set(&self, id: TagId, record: RawRecord) -> StoreFuture<'_, RawRecord> {
        Box::pin(async move {
            write_json_atomic(self.record_path(id), &record)?;
            Ok(record)
        })
    }

    fn remove(&self, id: TagId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let path = self.record_path(id);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            Ok(())
        })
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            for path in self.record_files()? {
                std::fs::remove_file(path)?;
            }
            Ok(())
        })
    }

    fn length(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move { Ok(self.record_files()?.len()) })
    }
}

fn read_json(path: &Path) -> Result<RawRecord, StoreError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json_atomic<T: Serialize>(path: PathBuf, value: &T) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent)?;

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)?;
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn temp_store() -> JsonDirTagStore {
        let dir = std::env::temp_dir().join(format!("plc-tag-engine-store-{}", Uuid::new_v4()));
        JsonDirTagStore::new(dir)
    }

    #[tokio::test]
    async fn records_round_trip_through_files() {
        let store = temp_store();
        assert_eq!(store.length().await.unwrap(), 0);

        let id = TagId(Uuid::from_u128(5));
        store
            .set(id, json!({"id": id, "tagname": "Tag1"}))
            .await
            .unwrap();
        assert!(store.record_path(id).exists());
        assert!(!store.record_path(id).with_extension("tmp").exists());
        assert_eq!(store.get(id).await.unwrap().unwrap()["tagname"], "Tag1");
        assert_eq!(store.length().await.unwrap(), 1);

        store.remove(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), None);

        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn unreadable_file_is_an_err_item_not_a_failed_iteration() {
        let store = temp_store();
        let good = TagId(Uuid::from_u128(1));
        store.set(good, json!({"tagname": "Ok"})).await.unwrap();
        std::fs::write(store.dir().join("broken.json"), "{ not json").unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let items: Vec<_> = store.iterate_all().await.unwrap().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().filter(|item| item.is_err()).count(), 1);
        assert_eq!(store.length().await.unwrap(), 2);

        store.clear().await.unwrap();
        assert_eq!(store.length().await.unwrap(), 0);
        assert!(store.dir().join("notes.txt").exists());

        let _ = std::fs::remove_dir_all(store.dir());
    }
}
