//! Datatype catalog: abstract datatype keys <-> vendor type names.
//!
//! Entries without a vendor name are left out of that vendor's list but stay
//! valid abstract keys; callers get `None` instead of an error.

use super::model::{DataType, Vendor};

pub fn translate_to_display(vendor: Vendor, datatype: DataType) -> Option<&'static str> {
    match vendor {
        Vendor::AllenBradleyCip => Some(datatype.key()),
        Vendor::SchneiderM340 => match datatype {
            DataType::Bool => Some("EBOOL"),
            DataType::Sint => None,
            DataType::Usint => Some("BYTE"),
            DataType::Int => Some("INT"),
            DataType::Uint => Some("UINT"),
            DataType::Dint => Some("DINT"),
            DataType::Udint => Some("UDINT"),
            DataType::Real => Some("REAL"),
        },
    }
}

/// Reverse lookup used by importers; vendor names compare case-insensitively.
pub fn translate_from_display(vendor: Vendor, display_name: &str) -> Option<DataType> {
    let wanted = display_name.trim();
    DataType::ALL.into_iter().find(|datatype| {
        translate_to_display(vendor, *datatype)
            .map(|name| name.eq_ignore_ascii_case(wanted))
            .unwrap_or(false)
    })
}

/// `(abstract, vendor name)` pairs in catalog declaration order.
pub fn key_value_list(vendor: Vendor) -> Vec<(DataType, &'static str)> {
    DataType::ALL
        .into_iter()
        .filter_map(|datatype| translate_to_display(vendor, datatype).map(|name| (datatype, name)))
        .collect()
}

pub fn is_integer_type(datatype: DataType) -> bool {
    datatype.is_integer()
}

pub fn is_supported(vendor: Vendor, datatype: DataType) -> bool {
    translate_to_display(vendor, datatype).is_some()
}
