use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::grammar::{
    AddressGrammar, GrammarLimits, DEFAULT_MAX_ARRAY_INDEX, DEFAULT_MAX_SEGMENT_LEN,
};
use crate::core::model::Vendor;

/// Engine configuration for one loaded project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Active PLC family; selects grammar, catalog names and scope separator.
    pub vendor: Vendor,
    /// Longest allowed address segment (controller naming limit).
    pub max_segment_len: usize,
    /// Largest array subscript accepted by the grammar.
    pub max_array_index: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::allen_bradley()
    }
}

impl EngineConfig {
    pub fn allen_bradley() -> Self {
        Self {
            vendor: Vendor::AllenBradleyCip,
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
            max_array_index: DEFAULT_MAX_ARRAY_INDEX,
        }
    }

    pub fn m340() -> Self {
        Self {
            vendor: Vendor::SchneiderM340,
            ..Self::allen_bradley()
        }
    }

    pub fn new(vendor: Vendor) -> Self {
        match vendor {
            Vendor::AllenBradleyCip => Self::allen_bradley(),
            Vendor::SchneiderM340 => Self::m340(),
        }
    }

    /// Missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config from: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse engine config JSON from: {}", path.display())
        })?;
        Ok(config)
    }

    pub fn limits(&self) -> GrammarLimits {
        GrammarLimits {
            max_segment_len: self.max_segment_len,
            max_array_index: self.max_array_index,
        }
    }

    pub fn grammar(&self) -> AddressGrammar {
        AddressGrammar::for_vendor(self.vendor, self.limits())
    }
}
