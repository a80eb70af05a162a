//! M340 (Unity / Control Expert) addressing.
//!
//! Symbol names are accepted as-is apart from being non-empty and free of the
//! `::` scope separator: the symbol table of the target project is the
//! authority on names. The located
//! address (`smpAddress`) does get a real grammar:
//! `%<area>[<size>]<n>{.<n>}` with at most three sub-address parts,
//! e.g. `%MW100`, `%MW100.3`, `%I0.2.5`, `%M12`.

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::{AddressError, ParsedAddress};

const MAX_SUB_ADDRESSES: usize = 3;

/// Joins program and symbol in a scope-path.
pub(super) const SCOPE_SEPARATOR: &str = "::";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocatedArea {
    Input,
    Output,
    Memory,
    Constant,
    System,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocatedSize {
    Bit,
    Byte,
    Word,
    DoubleWord,
    Float,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocatedAddress {
    pub area: LocatedArea,
    pub size: Option<LocatedSize>,
    /// Main index followed by up to three sub-addresses.
    pub indices: Vec<u32>,
}

pub(super) fn parse(text: &str) -> Result<ParsedAddress, AddressError> {
    let symbol = text.trim();
    if symbol.is_empty() {
        return Err(AddressError::Empty);
    }
    if let Some(position) = text.find(SCOPE_SEPARATOR) {
        return Err(AddressError::Syntax {
            position,
            expected: "symbol without '::'",
        });
    }
    Ok(ParsedAddress::Symbol(symbol.to_string()))
}

pub(super) fn parse_located(text: &str, max_index: u32) -> Result<LocatedAddress, AddressError> {
    let upper = text.trim().to_ascii_uppercase();
    let mut cur = Cursor::new(&upper);

    cur.expect(b'%', "'%'")?;
    let area = match cur.peek() {
        Some(b'I') => LocatedArea::Input,
        Some(b'Q') => LocatedArea::Output,
        Some(b'M') => LocatedArea::Memory,
        Some(b'K') => LocatedArea::Constant,
        Some(b'S') => LocatedArea::System,
        _ => return Err(cur.error("area I, Q, M, K or S")),
    };
    cur.bump();

    let size = match cur.peek() {
        Some(b'X') => Some(LocatedSize::Bit),
        Some(b'B') => Some(LocatedSize::Byte),
        Some(b'W') => Some(LocatedSize::Word),
        Some(b'D') => Some(LocatedSize::DoubleWord),
        Some(b'F') => Some(LocatedSize::Float),
        _ => None,
    };
    if size.is_some() {
        cur.bump();
    }

    let mut indices = vec![cur.number(usize::MAX, max_index)?];
    while cur.eat(b'.') {
        if indices.len() > MAX_SUB_ADDRESSES {
            return Err(cur.error("at most three sub-addresses"));
        }
        indices.push(cur.number(usize::MAX, max_index)?);
    }
    cur.expect_end()?;

    Ok(LocatedAddress {
        area,
        size,
        indices,
    })
}
