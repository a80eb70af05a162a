//! Tag engine: stable data model.
//!
//! Constraints:
//! - every tag carries an immutable `id` (runtime primary key); `tagname` is the
//!   editable business key and never used as a foreign key
//! - persisted JSON uses camelCase field names; `program`, `desc`, `usage` and
//!   `smpAddress` default to empty so older records still load

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// PLC family whose addressing rules and type names are active for a project.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Logix / ControlLogix style symbolic addressing over CIP.
    AllenBradleyCip,
    /// Unity / Control Expert style variables with located `%` addresses.
    SchneiderM340,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::AllenBradleyCip => write!(f, "AllenBradleyCip"),
            Vendor::SchneiderM340 => write!(f, "SchneiderM340"),
        }
    }
}

/// Vendor-neutral datatype key. Declaration order is the order the UI lists them in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    #[serde(rename = "BOOL")]
    Bool,
    #[serde(rename = "SINT")]
    Sint,
    #[serde(rename = "USINT")]
    Usint,
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "UINT")]
    Uint,
    #[serde(rename = "DINT")]
    Dint,
    #[serde(rename = "UDINT")]
    Udint,
    #[serde(rename = "REAL")]
    Real,
}

impl DataType {
    pub const ALL: [DataType; 8] = [
        DataType::Bool,
        DataType::Sint,
        DataType::Usint,
        DataType::Int,
        DataType::Uint,
        DataType::Dint,
        DataType::Udint,
        DataType::Real,
    ];

    /// The abstract key as it appears in persisted records.
    pub fn key(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Sint => "SINT",
            DataType::Usint => "USINT",
            DataType::Int => "INT",
            DataType::Uint => "UINT",
            DataType::Dint => "DINT",
            DataType::Udint => "UDINT",
            DataType::Real => "REAL",
        }
    }

    pub fn is_integer(&self) -> bool {
        self.bit_width().is_some()
    }

    /// Storage width in bits for the integer types; `None` for BOOL and REAL.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            DataType::Sint | DataType::Usint => Some(8),
            DataType::Int | DataType::Uint => Some(16),
            DataType::Dint | DataType::Udint => Some(32),
            DataType::Bool | DataType::Real => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, DataType::Sint | DataType::Int | DataType::Dint)
    }

    /// Inclusive value range for the integer types.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            DataType::Sint => Some((i8::MIN as i64, i8::MAX as i64)),
            DataType::Usint => Some((0, u8::MAX as i64)),
            DataType::Int => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::Uint => Some((0, u16::MAX as i64)),
            DataType::Dint => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::Udint => Some((0, u32::MAX as i64)),
            DataType::Bool | DataType::Real => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TagId(pub Uuid);

impl TagId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TagId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub tagname: String,
    /// Empty = controller (global) scope.
    #[serde(default)]
    pub program: String,
    pub datatype: DataType,
    #[serde(default)]
    pub desc: String,
    /// Ids of the test artifacts reading or writing this tag.
    #[serde(default)]
    pub usage: BTreeSet<String>,
    /// Located address, only meaningful for [`Vendor::SchneiderM340`].
    #[serde(default)]
    pub smp_address: String,
    /// Stamped by the registry whenever the record is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Candidate record submitted by the UI or an importer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagDraft {
    /// `None` creates a new tag; `Some` edits the tag with that id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TagId>,
    pub tagname: String,
    #[serde(default)]
    pub program: String,
    pub datatype: DataType,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub smp_address: String,
}

impl TagDraft {
    pub fn new(tagname: impl Into<String>, datatype: DataType) -> Self {
        Self {
            id: None,
            tagname: tagname.into(),
            program: String::new(),
            datatype,
            desc: String::new(),
            smp_address: String::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_id(mut self, id: TagId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_smp_address(mut self, smp_address: impl Into<String>) -> Self {
        self.smp_address = smp_address.into();
        self
    }

    /// Materialize the draft. A fresh id is generated when none was given; usage starts empty.
    pub fn into_tag(self) -> Tag {
        Tag {
            id: self.id.unwrap_or_default(),
            tagname: self.tagname,
            program: self.program,
            datatype: self.datatype,
            desc: self.desc,
            usage: BTreeSet::new(),
            smp_address: self.smp_address,
            updated_at: None,
        }
    }
}

impl From<&Tag> for TagDraft {
    fn from(tag: &Tag) -> Self {
        Self {
            id: Some(tag.id),
            tagname: tag.tagname.clone(),
            program: tag.program.clone(),
            datatype: tag.datatype,
            desc: tag.desc.clone(),
            smp_address: tag.smp_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_json_uses_camel_case_and_abstract_keys() {
        let mut tag = TagDraft::new("Motor_Run", DataType::Dint)
            .with_id(TagId(Uuid::from_u128(7)))
            .into_tag();
        tag.usage.insert("step-1".to_string());

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["datatype"], "DINT");
        assert_eq!(json["smpAddress"], "");
        assert_eq!(json["usage"], serde_json::json!(["step-1"]));
        assert!(json.get("updatedAt").is_none());

        let back: Tag = serde_json::from_value(json).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let raw = serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "tagname": "Tag1",
            "datatype": "BOOL"
        });
        let tag: Tag = serde_json::from_value(raw).unwrap();
        assert_eq!(tag.program, "");
        assert!(tag.usage.is_empty());
    }

    #[test]
    fn integer_ranges_follow_width_and_signedness() {
        assert_eq!(DataType::Sint.integer_range(), Some((-128, 127)));
        assert_eq!(DataType::Usint.integer_range(), Some((0, 255)));
        assert_eq!(DataType::Udint.integer_range(), Some((0, 4_294_967_295)));
        assert_eq!(DataType::Real.integer_range(), None);
        assert!(!DataType::Bool.is_integer());
        assert!(DataType::Uint.is_integer());
    }
}
