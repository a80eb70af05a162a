//! Bulk submission of candidate tags (CSV import, clipboard paste).
//!
//! Records go through the registry one at a time with full validation, so
//! record N sees the duplicates created by records 1..N-1. A store failure
//! stops the run; everything accepted before it stays accepted.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::adapters::storage::TagStore;
use crate::core::catalog;
use crate::core::model::{TagDraft, TagId};
use crate::error::{TagError, TagRejection};

use super::registry::TagRegistry;

/// A row as the text parser produced it, datatype still in vendor naming.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorTagRow {
    pub tagname: String,
    #[serde(default)]
    pub program: String,
    pub datatype: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub smp_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRejection {
    /// 0-based position in the submitted sequence.
    pub index: usize,
    pub tagname: String,
    pub program: String,
    pub rejection: TagRejection,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub accepted: Vec<TagId>,
    pub rejected: Vec<ImportRejection>,
    /// Rows skipped because their datatype has no translation for the vendor.
    pub dropped: usize,
    /// Set when a store failure ended the run early.
    pub aborted: bool,
}

pub async fn import_tags<S: TagStore>(
    registry: &mut TagRegistry<S>,
    candidates: impl IntoIterator<Item = TagDraft>,
) -> ImportReport {
    let mut report = ImportReport::default();
    for (index, candidate) in candidates.into_iter().enumerate() {
        if !submit(registry, index, candidate, &mut report).await {
            break;
        }
    }
    debug!(
        "[tags][import] accepted={} rejected={} aborted={}",
        report.accepted.len(),
        report.rejected.len(),
        report.aborted
    );
    report
}

/// Translate vendor datatype names first; rows whose type does not translate
/// are dropped without a rejection entry.
pub async fn import_vendor_rows<S: TagStore>(
    registry: &mut TagRegistry<S>,
    rows: impl IntoIterator<Item = VendorTagRow>,
) -> ImportReport {
    let vendor = registry.config().vendor;
    let mut report = ImportReport::default();
    for (index, row) in rows.into_iter().enumerate() {
        let Some(datatype) = catalog::translate_from_display(vendor, &row.datatype) else {
            debug!(
                "[tags][import] drop row {} tagname={} datatype={}",
                index, row.tagname, row.datatype
            );
            report.dropped += 1;
            continue;
        };
        let candidate = TagDraft {
            id: None,
            tagname: row.tagname,
            program: row.program,
            datatype,
            desc: row.desc,
            smp_address: row.smp_address,
        };
        if !submit(registry, index, candidate, &mut report).await {
            break;
        }
    }
    report
}

/// Returns `false` when the run must stop.
async fn submit<S: TagStore>(
    registry: &mut TagRegistry<S>,
    index: usize,
    candidate: TagDraft,
    report: &mut ImportReport,
) -> bool {
    let tagname = candidate.tagname.clone();
    let program = candidate.program.clone();
    match registry.upsert(candidate).await {
        Ok(tag) => {
            report.accepted.push(tag.id);
            true
        }
        Err(err) => {
            let stop = matches!(err, TagError::Store(_));
            if stop {
                warn!("[tags][import] stop at row {}: {}", index, err);
                report.aborted = true;
            }
            report.rejected.push(ImportRejection {
                index,
                tagname,
                program,
                rejection: err.to_rejection(),
            });
            !stop
        }
    }
}
