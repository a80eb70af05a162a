//! PLC tag addressing and value-encoding engine.
//! Responsibilities: validate tag addresses per vendor grammar, map abstract
//! datatypes onto vendor type names, encode values bit-exactly, and keep tag
//! addresses unique within a project.
//! Non-goals: UI, file formats, scheduling (handled by upper layers).

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod usecase;

pub use adapters::storage::{JsonDirTagStore, MemoryTagStore, StoreError, TagStore};
pub use config::EngineConfig;
pub use crate::core::grammar::{AddressError, AddressGrammar, ParsedAddress, ScopePath};
pub use crate::core::model::{DataType, Tag, TagDraft, TagId, Vendor};
pub use crate::core::{catalog, codec};
pub use error::{TagError, TagErrorKind, TagRejection};
pub use usecase::import::{import_tags, import_vendor_rows, ImportReport};
pub use usecase::registry::{SharedTagRegistry, TagRegistry};
