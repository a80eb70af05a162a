//! Address grammars, one variant per vendor.
//!
//! `AddressGrammar::parse` decides structural validity and returns the parse
//! tree; `AddressGrammar::scope_path` turns a validated address into the key
//! the registry uses for uniqueness.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::Vendor;

pub mod cip;
mod cursor;
pub mod m340;

pub use m340::{LocatedAddress, LocatedArea, LocatedSize};

/// Controller naming limit for any single `:`/`.`/`[`/`]`/`,` separated segment.
pub const DEFAULT_MAX_SEGMENT_LEN: usize = 40;
pub const DEFAULT_MAX_ARRAY_INDEX: u32 = i32::MAX as u32;

const SEGMENT_DELIMITERS: [char; 5] = [':', '.', '[', ']', ','];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("unexpected input at {position}: expected {expected}")]
    Syntax {
        position: usize,
        expected: &'static str,
    },

    #[error("index at {position} exceeds {max}")]
    IndexOutOfRange { position: usize, max: u32 },

    #[error("segment '{segment}' has {len} characters (max {max})")]
    SegmentTooLong {
        segment: String,
        len: usize,
        max: usize,
    },

    #[error("address is scoped to program '{in_address}' but the tag belongs to '{in_field}'")]
    ProgramConflict {
        in_address: String,
        in_field: String,
    },
}

impl AddressError {
    /// Byte offset the parser reached; used to pick the more specific of two failures.
    pub fn position(&self) -> usize {
        match self {
            AddressError::Syntax { position, .. } => *position,
            AddressError::IndexOutOfRange { position, .. } => *position,
            AddressError::Empty
            | AddressError::SegmentTooLong { .. }
            | AddressError::ProgramConflict { .. } => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrammarLimits {
    pub max_segment_len: usize,
    pub max_array_index: u32,
}

impl Default for GrammarLimits {
    fn default() -> Self {
        Self {
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
            max_array_index: DEFAULT_MAX_ARRAY_INDEX,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    /// Empty when the member is not subscripted.
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTagAddress {
    /// Program named by a `Program:<name>.` prefix.
    pub program: Option<String>,
    /// The address without its program prefix.
    pub local_name: String,
    pub members: Vec<Member>,
    pub bit: Option<u8>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IoDirection {
    Input,
    Output,
    Config,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleIoAddress {
    pub module: String,
    /// `None` for rack-optimized connections.
    pub slot: Option<u8>,
    pub direction: IoDirection,
    pub member: Option<Member>,
    pub bit: Option<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "address")]
pub enum ParsedAddress {
    UserTag(UserTagAddress),
    ModuleIo(ModuleIoAddress),
    /// Free-form symbol of a vendor without a structural grammar.
    Symbol(String),
}

impl ParsedAddress {
    pub fn bit(&self) -> Option<u8> {
        match self {
            ParsedAddress::UserTag(address) => address.bit,
            ParsedAddress::ModuleIo(address) => address.bit,
            ParsedAddress::Symbol(_) => None,
        }
    }
}

/// Normalized `(program, tagname)` key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ScopePath(String);

impl ScopePath {
    pub(crate) fn from_raw(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Program names: empty, or `[A-Za-z0-9_]+` not starting or ending with `_`.
pub fn is_valid_program_name(program: &str) -> bool {
    if program.is_empty() {
        return true;
    }
    program.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        && !program.starts_with('_')
        && !program.ends_with('_')
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressGrammar {
    AllenBradleyCip(GrammarLimits),
    SchneiderM340(GrammarLimits),
}

impl AddressGrammar {
    pub fn for_vendor(vendor: Vendor, limits: GrammarLimits) -> Self {
        match vendor {
            Vendor::AllenBradleyCip => AddressGrammar::AllenBradleyCip(limits),
            Vendor::SchneiderM340 => AddressGrammar::SchneiderM340(limits),
        }
    }

    pub fn vendor(&self) -> Vendor {
        match self {
            AddressGrammar::AllenBradleyCip(_) => Vendor::AllenBradleyCip,
            AddressGrammar::SchneiderM340(_) => Vendor::SchneiderM340,
        }
    }

    pub fn limits(&self) -> &GrammarLimits {
        match self {
            AddressGrammar::AllenBradleyCip(limits) => limits,
            AddressGrammar::SchneiderM340(limits) => limits,
        }
    }

    pub fn parse(&self, tagname: &str) -> Result<ParsedAddress, AddressError> {
        match self {
            AddressGrammar::AllenBradleyCip(limits) => {
                let parsed = cip::parse(tagname, limits)?;
                check_segments(tagname, limits.max_segment_len)?;
                Ok(parsed)
            }
            AddressGrammar::SchneiderM340(_) => m340::parse(tagname),
        }
    }

    pub fn is_valid(&self, tagname: &str) -> bool {
        self.parse(tagname).is_ok()
    }

    pub fn is_valid_program_name(&self, program: &str) -> bool {
        is_valid_program_name(program)
            && program.chars().count() <= self.limits().max_segment_len
    }

    /// Located address check. Only M340 uses the field; other vendors ignore it.
    pub fn parse_smp_address(
        &self,
        smp_address: &str,
    ) -> Result<Option<LocatedAddress>, AddressError> {
        match self {
            AddressGrammar::AllenBradleyCip(_) => Ok(None),
            AddressGrammar::SchneiderM340(limits) => {
                if smp_address.trim().is_empty() {
                    return Ok(None);
                }
                m340::parse_located(smp_address, limits.max_array_index).map(Some)
            }
        }
    }

    /// Build the uniqueness key. A CIP `Program:<p>.` prefix scopes the tag to
    /// `<p>` when the program field is empty and must agree with it otherwise.
    pub fn scope_path(
        &self,
        program: &str,
        tagname: &str,
        parsed: &ParsedAddress,
    ) -> Result<ScopePath, AddressError> {
        let program = program.trim();
        match self {
            AddressGrammar::AllenBradleyCip(_) => {
                let (program, local) = match parsed {
                    ParsedAddress::UserTag(UserTagAddress {
                        program: Some(in_address),
                        local_name,
                        ..
                    }) => {
                        if !program.is_empty() && !program.eq_ignore_ascii_case(in_address) {
                            return Err(AddressError::ProgramConflict {
                                in_address: in_address.clone(),
                                in_field: program.to_string(),
                            });
                        }
                        (in_address.as_str(), local_name.as_str())
                    }
                    _ => (program, tagname.trim()),
                };
                let local = local.to_ascii_lowercase();
                Ok(ScopePath(if program.is_empty() {
                    local
                } else {
                    format!("program:{}.{}", program.to_ascii_lowercase(), local)
                }))
            }
            AddressGrammar::SchneiderM340(_) => {
                let local = tagname.trim().to_ascii_lowercase();
                Ok(ScopePath(if program.is_empty() {
                    local
                } else {
                    format!(
                        "{}{}{}",
                        program.to_ascii_lowercase(),
                        m340::SCOPE_SEPARATOR,
                        local
                    )
                }))
            }
        }
    }
}

fn check_segments(tagname: &str, max_len: usize) -> Result<(), AddressError> {
    for segment in tagname.split(SEGMENT_DELIMITERS) {
        let len = segment.chars().count();
        if len > max_len {
            return Err(AddressError::SegmentTooLong {
                segment: segment.to_string(),
                len,
                max: max_len,
            });
        }
    }
    Ok(())
}
