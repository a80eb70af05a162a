//! In-memory store for tests and scratch projects.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{RawRecord, RecordIter, StoreError, StoreFuture, TagStore};
use crate::core::model::TagId;

#[derive(Default)]
pub struct MemoryTagStore {
    records: Mutex<BTreeMap<TagId, RawRecord>>,
    /// Test hook: when set, writes fail with `StoreError::Closed`.
    fail_writes: AtomicBool,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with records as-is, bypassing any checks.
    pub fn with_records(records: impl IntoIterator<Item = (TagId, RawRecord)>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl TagStore for MemoryTagStore {
    fn iterate_all(&self) -> StoreFuture<'_, RecordIter> {
        Box::pin(async move {
            let snapshot: Vec<Result<RawRecord, StoreError>> =
                self.records.lock().values().cloned().map(Ok).collect();
            Ok(snapshot.into_iter())
        })
    }

    fn get(&self, id: TagId) -> StoreFuture<'_, Option<RawRecord>> {
        Box::pin(async move { Ok(self.records.lock().get(&id).cloned()) })
    }

    fn set(&self, id: TagId, record: RawRecord) -> StoreFuture<'_, RawRecord> {
        Box::pin(async move {
            self.check_writable()?;
            self.records.lock().insert(id, record.clone());
            Ok(record)
        })
    }

    fn remove(&self, id: TagId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_writable()?;
            self.records.lock().remove(&id);
            Ok(())
        })
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_writable()?;
            self.records.lock().clear();
            Ok(())
        })
    }

    fn length(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move { Ok(self.records.lock().len()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn set_get_remove_and_length() {
        let store = MemoryTagStore::new();
        let id = TagId(Uuid::from_u128(1));

        let stored = store.set(id, json!({"tagname": "A"})).await.unwrap();
        assert_eq!(stored["tagname"], "A");
        assert_eq!(store.length().await.unwrap(), 1);
        assert_eq!(store.get(id).await.unwrap(), Some(json!({"tagname": "A"})));

        store.set(id, json!({"tagname": "B"})).await.unwrap();
        assert_eq!(store.length().await.unwrap(), 1);

        store.remove(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), None);

        store.set(id, json!({})).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.iterate_all().await.unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failing_writes_leave_records_untouched() {
        let id = TagId(Uuid::from_u128(2));
        let store = MemoryTagStore::with_records([(id, json!({"tagname": "Keep"}))]);
        store.set_fail_writes(true);

        assert!(matches!(
            store.set(id, json!({})).await,
            Err(StoreError::Closed)
        ));
        assert!(store.remove(id).await.is_err());
        assert_eq!(store.length().await.unwrap(), 1);
    }
}
