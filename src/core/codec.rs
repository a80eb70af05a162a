//! Value codec: canonical stored values and bit-level access for integer tags.
//!
//! Conventions:
//! - BOOL and single-bit writes normalize to `0`/`1` (`> 0` is on).
//! - Whole-value integer writes round half away from zero, then clamp to the
//!   datatype range. NaN stores as `0`.
//! - REAL passes through untouched; range checks belong to the input controls.
//! - Bit composition works in the W-bit two's-complement domain and the result
//!   is reinterpreted at that width, so it matches what the controller reports.

use std::ops::Range;

use thiserror::Error;

use super::model::DataType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("data type {0} has no addressable bits")]
    NotBitAddressable(DataType),

    #[error("bit {bit} out of range for {datatype} (width {width})")]
    BitOutOfRange {
        datatype: DataType,
        bit: u32,
        width: u32,
    },
}

/// Map the UI convention (`-1` = whole value) onto an optional bit index.
pub fn bit_index_from_raw(raw: i64) -> Option<u32> {
    if raw < 0 {
        None
    } else {
        u32::try_from(raw).ok()
    }
}

pub fn clamp(datatype: DataType, bit_index: Option<u32>, value: f64) -> f64 {
    if datatype == DataType::Bool {
        return bit_value(value);
    }

    let Some((min, max)) = datatype.integer_range() else {
        return value;
    };

    if bit_index.is_some() {
        return bit_value(value);
    }

    if value.is_nan() {
        return 0.0;
    }
    value.round().clamp(min as f64, max as f64)
}

/// Legal bit positions, `0..width`; empty for BOOL and REAL.
pub fn bit_positions(datatype: DataType) -> Range<u32> {
    0..datatype.bit_width().unwrap_or(0)
}

pub fn read_bit(datatype: DataType, value: i64, bit: u32) -> Result<u8, CodecError> {
    let width = require_bit(datatype, bit)?;
    let raw = to_raw(value, width);
    Ok(((raw >> bit) & 1) as u8)
}

/// Set or clear one bit of `value` and return the resulting whole value.
pub fn write_bit(datatype: DataType, value: i64, bit: u32, on: bool) -> Result<i64, CodecError> {
    let width = require_bit(datatype, bit)?;
    let raw = to_raw(value, width);
    let raw = if on { raw | (1 << bit) } else { raw & !(1 << bit) };
    Ok(from_raw(datatype, raw, width))
}

/// `value XOR (1 << bit)` at the datatype width.
pub fn flip_bit(datatype: DataType, value: i64, bit: u32) -> Result<i64, CodecError> {
    let width = require_bit(datatype, bit)?;
    let raw = to_raw(value, width) ^ (1 << bit);
    Ok(from_raw(datatype, raw, width))
}

fn bit_value(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn require_bit(datatype: DataType, bit: u32) -> Result<u32, CodecError> {
    let width = datatype
        .bit_width()
        .ok_or(CodecError::NotBitAddressable(datatype))?;
    if bit >= width {
        return Err(CodecError::BitOutOfRange {
            datatype,
            bit,
            width,
        });
    }
    Ok(width)
}

fn mask(width: u32) -> u64 {
    (1u64 << width) - 1
}

fn to_raw(value: i64, width: u32) -> u64 {
    (value as u64) & mask(width)
}

fn from_raw(datatype: DataType, raw: u64, width: u32) -> i64 {
    let sign_bit = 1u64 << (width - 1);
    if datatype.is_signed() && raw & sign_bit != 0 {
        raw as i64 - (1i64 << width)
    } else {
        raw as i64
    }
}
