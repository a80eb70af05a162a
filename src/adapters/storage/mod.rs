//! Tag Store port: durable key-value persistence of tag records.
//!
//! The engine only sees raw JSON records; shape checks happen in the registry
//! so a damaged record never aborts a whole load.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::core::model::TagId;

pub mod json_dir;
pub mod memory;

pub use json_dir::JsonDirTagStore;
pub use memory::MemoryTagStore;

pub type RawRecord = serde_json::Value;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store is closed")]
    Closed,
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One-shot snapshot of every record. Entries that could not be read surface
/// as `Err` items instead of failing the whole iteration.
pub type RecordIter = std::vec::IntoIter<Result<RawRecord, StoreError>>;

pub trait TagStore: Send + Sync {
    fn iterate_all(&self) -> StoreFuture<'_, RecordIter>;

    fn get(&self, id: TagId) -> StoreFuture<'_, Option<RawRecord>>;

    /// Write-through, last write wins. Returns the record as stored.
    fn set(&self, id: TagId, record: RawRecord) -> StoreFuture<'_, RawRecord>;

    fn remove(&self, id: TagId) -> StoreFuture<'_, ()>;

    fn clear(&self) -> StoreFuture<'_, ()>;

    fn length(&self) -> StoreFuture<'_, usize>;
}

/// Lets a caller keep a handle on the store while a registry owns it.
impl<T: TagStore + ?Sized> TagStore for Arc<T> {
    fn iterate_all(&self) -> StoreFuture<'_, RecordIter> {
        (**self).iterate_all()
    }

    fn get(&self, id: TagId) -> StoreFuture<'_, Option<RawRecord>> {
        (**self).get(id)
    }

    fn set(&self, id: TagId, record: RawRecord) -> StoreFuture<'_, RawRecord> {
        (**self).set(id, record)
    }

    fn remove(&self, id: TagId) -> StoreFuture<'_, ()> {
        (**self).remove(id)
    }

    fn clear(&self) -> StoreFuture<'_, ()> {
        (**self).clear()
    }

    fn length(&self) -> StoreFuture<'_, usize> {
        (**self).length()
    }
}
