//! Tag engine: structured errors (stable shape for the UI layer).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::storage::StoreError;
use crate::core::grammar::{AddressError, ScopePath};
use crate::core::model::{DataType, TagId, Vendor};

#[derive(Debug, Error)]
pub enum TagError {
    #[error("invalid address '{tagname}': {source}")]
    InvalidAddress {
        tagname: String,
        #[source]
        source: AddressError,
    },

    #[error("invalid program name '{program}'")]
    InvalidProgramName { program: String },

    #[error("data type {datatype} is not supported by {vendor}")]
    UnsupportedDatatype { vendor: Vendor, datatype: DataType },

    #[error("address '{scope_path}' is already used by tag {existing}")]
    DuplicateAddress {
        scope_path: ScopePath,
        existing: TagId,
    },

    #[error("tag not found: {id}")]
    NotFound { id: TagId },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TagError {
    pub fn kind(&self) -> TagErrorKind {
        match self {
            TagError::InvalidAddress { .. } => TagErrorKind::InvalidAddress,
            TagError::InvalidProgramName { .. } => TagErrorKind::InvalidProgramName,
            TagError::UnsupportedDatatype { .. } => TagErrorKind::UnsupportedDatatype,
            TagError::DuplicateAddress { .. } => TagErrorKind::DuplicateAddress,
            TagError::NotFound { .. } => TagErrorKind::NotFound,
            TagError::Store(_) => TagErrorKind::StoreError,
        }
    }

    pub fn to_rejection(&self) -> TagRejection {
        let mut details = TagRejectionDetails::default();
        match self {
            TagError::InvalidAddress { tagname, .. } => details.tagname = Some(tagname.clone()),
            TagError::InvalidProgramName { program } => details.program = Some(program.clone()),
            TagError::UnsupportedDatatype { datatype, .. } => {
                details.datatype = Some(*datatype)
            }
            TagError::DuplicateAddress {
                scope_path,
                existing,
            } => {
                details.scope_path = Some(scope_path.to_string());
                details.existing_id = Some(*existing);
            }
            TagError::NotFound { id } => details.existing_id = Some(*id),
            TagError::Store(_) => {}
        }
        let details = if details == TagRejectionDetails::default() {
            None
        } else {
            Some(details)
        };
        TagRejection {
            kind: self.kind(),
            message: self.to_string(),
            details,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TagErrorKind {
    #[serde(rename = "InvalidAddress")]
    InvalidAddress,
    #[serde(rename = "InvalidProgramName")]
    InvalidProgramName,
    #[serde(rename = "UnsupportedDatatype")]
    UnsupportedDatatype,
    #[serde(rename = "DuplicateAddress")]
    DuplicateAddress,
    #[serde(rename = "NotFound")]
    NotFound,
    #[serde(rename = "StoreError")]
    StoreError,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TagRejectionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<TagId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagRejection {
    pub kind: TagErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<TagRejectionDetails>,
}
