//! Tag registry: authoritative in-memory index of a loaded project's tags.
//!
//! Invariants:
//! - `paths` maps every indexed scope-path to exactly one live tag id
//! - mutations persist through the store first; memory changes only on success
//! - a registry value exists only after a full load, so usage tracking can
//!   never run against a half-built index

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::adapters::storage::{StoreError, TagStore};
use crate::config::EngineConfig;
use crate::core::catalog;
use crate::core::grammar::{
    AddressError, AddressGrammar, LocatedAddress, ParsedAddress, ScopePath,
};
use crate::core::model::{DataType, Tag, TagDraft, TagId};
use crate::error::TagError;

/// Handle for callers that share one registry across tasks. The async mutex is
/// held across the store write, so validate-then-mutate never interleaves.
pub type SharedTagRegistry<S> = Arc<tokio::sync::Mutex<TagRegistry<S>>>;

/// Result of a successful validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagCheck {
    pub scope_path: ScopePath,
    pub address: ParsedAddress,
    pub located: Option<LocatedAddress>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub loaded: usize,
    /// Records that could not be read or failed the shape check.
    pub skipped: usize,
    /// Loaded records whose address no longer validates; indexed anyway.
    pub invalid: Vec<TagId>,
    /// Scope-paths claimed by more than one record; the last one read wins.
    pub duplicate_paths: Vec<ScopePath>,
}

#[derive(Clone, Debug)]
struct Entry {
    tag: Tag,
    scope_path: ScopePath,
}

pub struct TagRegistry<S: TagStore> {
    store: S,
    config: EngineConfig,
    grammar: AddressGrammar,
    tags: HashMap<TagId, Entry>,
    paths: HashMap<ScopePath, TagId>,
    last_load: LoadReport,
}

impl<S: TagStore> TagRegistry<S> {
    /// Load every record from `store` and build the indices.
    pub async fn open(store: S, config: EngineConfig) -> Result<Self, TagError> {
        let mut registry = Self {
            store,
            config,
            grammar: config.grammar(),
            tags: HashMap::new(),
            paths: HashMap::new(),
            last_load: LoadReport::default(),
        };
        registry.reload().await?;
        Ok(registry)
    }

    pub fn shared(self) -> SharedTagRegistry<S> {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Rebuild both indices from the store. Damaged records are skipped;
    /// colliding scope-paths resolve last-write-wins and are only reported.
    pub async fn reload(&mut self) -> Result<&LoadReport, TagError> {
        let records = self.store.iterate_all().await?;

        let mut report = LoadReport::default();
        let mut tags: HashMap<TagId, Entry> = HashMap::new();
        let mut paths: HashMap<ScopePath, TagId> = HashMap::new();

        for item in records {
            let raw = match item {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("[tags][load] skip unreadable record: {}", err);
                    report.skipped += 1;
                    continue;
                }
            };
            let tag: Tag = match serde_json::from_value(raw) {
                Ok(tag) => tag,
                Err(err) => {
                    warn!("[tags][load] skip malformed record: {}", err);
                    report.skipped += 1;
                    continue;
                }
            };

            let scope_path = match self.validate_tag(&tag) {
                Ok(check) => check.scope_path,
                Err(err) => {
                    warn!("[tags][load] tag {} loaded with invalid data: {}", tag.id, err);
                    report.invalid.push(tag.id);
                    fallback_scope_path(&self.grammar, &tag)
                }
            };

            if let Some(previous) = tags.remove(&tag.id) {
                if paths.get(&previous.scope_path) == Some(&tag.id) {
                    paths.remove(&previous.scope_path);
                }
            }
            if let Some(other) = paths.insert(scope_path.clone(), tag.id) {
                if other != tag.id {
                    warn!(
                        "[tags][load] scope path {} shared by {} and {}; keeping {}",
                        scope_path, other, tag.id, tag.id
                    );
                    report.duplicate_paths.push(scope_path.clone());
                }
            }
            tags.insert(tag.id, Entry { tag, scope_path });
        }

        report.loaded = tags.len();
        debug!(
            "[tags][load] vendor={} loaded={} skipped={} duplicates={}",
            self.config.vendor,
            report.loaded,
            report.skipped,
            report.duplicate_paths.len()
        );

        self.tags = tags;
        self.paths = paths;
        self.last_load = report;
        Ok(&self.last_load)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grammar(&self) -> &AddressGrammar {
        &self.grammar
    }

    pub fn last_load(&self) -> &LoadReport {
        &self.last_load
    }

    /// Full validation without touching the registry.
    pub fn validate(&self, candidate: &TagDraft) -> Result<TagCheck, TagError> {
        self.check_fields(
            &candidate.program,
            &candidate.tagname,
            candidate.datatype,
            &candidate.smp_address,
        )
    }

    fn validate_tag(&self, tag: &Tag) -> Result<TagCheck, TagError> {
        self.check_fields(&tag.program, &tag.tagname, tag.datatype, &tag.smp_address)
    }

    fn check_fields(
        &self,
        program: &str,
        tagname: &str,
        datatype: DataType,
        smp_address: &str,
    ) -> Result<TagCheck, TagError> {
        if !self.grammar.is_valid_program_name(program) {
            return Err(TagError::InvalidProgramName {
                program: program.to_string(),
            });
        }
        if !catalog::is_supported(self.config.vendor, datatype) {
            return Err(TagError::UnsupportedDatatype {
                vendor: self.config.vendor,
                datatype,
            });
        }

        let invalid = |source: AddressError| TagError::InvalidAddress {
            tagname: tagname.to_string(),
            source,
        };
        let address = self.grammar.parse(tagname).map_err(invalid)?;
        let located = self
            .grammar
            .parse_smp_address(smp_address)
            .map_err(|source| TagError::InvalidAddress {
                tagname: smp_address.to_string(),
                source,
            })?;
        let scope_path = self
            .grammar
            .scope_path(program, tagname, &address)
            .map_err(invalid)?;

        Ok(TagCheck {
            scope_path,
            address,
            located,
        })
    }

    /// True when the candidate's scope-path belongs to another tag.
    /// A candidate whose address does not validate has no path and is not a duplicate.
    pub fn is_duplicate(&self, candidate: &TagDraft) -> bool {
        match self.validate(candidate) {
            Ok(check) => self.conflicting_owner(&check.scope_path, candidate.id).is_some(),
            Err(_) => false,
        }
    }

    fn conflicting_owner(&self, scope_path: &ScopePath, own: Option<TagId>) -> Option<TagId> {
        self.paths
            .get(scope_path)
            .copied()
            .filter(|owner| Some(*owner) != own)
    }

    /// Validate, persist and index a candidate. Editing keeps the tag's usage.
    pub async fn upsert(&mut self, candidate: TagDraft) -> Result<Tag, TagError> {
        let check = self.validate(&candidate)?;
        if let Some(existing) = self.conflicting_owner(&check.scope_path, candidate.id) {
            return Err(TagError::DuplicateAddress {
                scope_path: check.scope_path,
                existing,
            });
        }

        let usage = candidate
            .id
            .and_then(|id| self.tags.get(&id))
            .map(|entry| entry.tag.usage.clone())
            .unwrap_or_default();
        let mut tag = candidate.into_tag();
        tag.usage = usage;
        tag.updated_at = Some(Utc::now());

        self.persist(&tag).await?;
        debug!(
            "[tags][upsert] id={} path={} datatype={}",
            tag.id, check.scope_path, tag.datatype
        );
        self.commit(tag.clone(), check.scope_path);
        Ok(tag)
    }

    /// Remove a tag. The removed record is returned so callers can warn about
    /// artifacts still listed in its usage.
    pub async fn delete(&mut self, id: TagId) -> Result<Tag, TagError> {
        if !self.tags.contains_key(&id) {
            return Err(TagError::NotFound { id });
        }
        self.store.remove(id).await?;

        let entry = self.tags.remove(&id).ok_or(TagError::NotFound { id })?;
        if self.paths.get(&entry.scope_path) == Some(&id) {
            self.paths.remove(&entry.scope_path);
        }
        debug!("[tags][delete] id={} path={}", id, entry.scope_path);
        Ok(entry.tag)
    }

    /// Add `referrer` to each tag's usage. Fails without changes if any id is unknown.
    pub async fn record_usage(&mut self, ids: &[TagId], referrer: &str) -> Result<(), TagError> {
        if let Some(missing) = ids.iter().find(|id| !self.tags.contains_key(*id)) {
            return Err(TagError::NotFound { id: *missing });
        }
        for id in ids {
            self.update_usage(*id, |usage| usage.insert(referrer.to_string()))
                .await?;
        }
        Ok(())
    }

    /// Drop `referrer` from each tag's usage. Unknown ids are skipped.
    pub async fn remove_usage(&mut self, ids: &[TagId], referrer: &str) -> Result<(), TagError> {
        for id in ids {
            if !self.tags.contains_key(id) {
                debug!("[tags][usage] skip unknown id={} referrer={}", id, referrer);
                continue;
            }
            self.update_usage(*id, |usage| usage.remove(referrer)).await?;
        }
        Ok(())
    }

    async fn update_usage(
        &mut self,
        id: TagId,
        change: impl FnOnce(&mut BTreeSet<String>) -> bool,
    ) -> Result<(), TagError> {
        let Some(entry) = self.tags.get(&id) else {
            return Err(TagError::NotFound { id });
        };
        let mut tag = entry.tag.clone();
        if !change(&mut tag.usage) {
            return Ok(());
        }
        self.persist(&tag).await?;
        if let Some(entry) = self.tags.get_mut(&id) {
            entry.tag = tag;
        }
        Ok(())
    }

    async fn persist(&self, tag: &Tag) -> Result<(), TagError> {
        let record = serde_json::to_value(tag).map_err(StoreError::from)?;
        self.store.set(tag.id, record).await?;
        Ok(())
    }

    fn commit(&mut self, tag: Tag, scope_path: ScopePath) {
        if let Some(previous) = self.tags.get(&tag.id) {
            if previous.scope_path != scope_path
                && self.paths.get(&previous.scope_path) == Some(&tag.id)
            {
                self.paths.remove(&previous.scope_path);
            }
        }
        self.paths.insert(scope_path.clone(), tag.id);
        self.tags.insert(tag.id, Entry { tag, scope_path });
    }

    pub fn count_loaded(&self) -> usize {
        self.tags.len()
    }

    pub async fn count_persisted(&self) -> Result<usize, TagError> {
        Ok(self.store.length().await?)
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id).map(|entry| &entry.tag)
    }

    pub fn scope_path_of(&self, id: TagId) -> Option<&ScopePath> {
        self.tags.get(&id).map(|entry| &entry.scope_path)
    }

    /// Tag currently owning the normalized address, if any.
    pub fn find_by_address(&self, program: &str, tagname: &str) -> Option<&Tag> {
        let address = self.grammar.parse(tagname).ok()?;
        let scope_path = self.grammar.scope_path(program, tagname, &address).ok()?;
        let id = self.paths.get(&scope_path)?;
        self.get(*id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values().map(|entry| &entry.tag)
    }

    pub fn referrers_of(&self, id: TagId) -> Option<&BTreeSet<String>> {
        self.get(id).map(|tag| &tag.usage)
    }

    /// Tags that list `referrer` in their usage, ordered by tagname.
    pub fn tags_used_by(&self, referrer: &str) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self
            .iter()
            .filter(|tag| tag.usage.contains(referrer))
            .collect();
        tags.sort_by(|a, b| a.tagname.cmp(&b.tagname).then(a.id.cmp(&b.id)));
        tags
    }
}

/// Scope-path for records whose address no longer parses: the plain trimmed,
/// lowercased join used for unstructured symbols.
fn fallback_scope_path(grammar: &AddressGrammar, tag: &Tag) -> ScopePath {
    let symbol = ParsedAddress::Symbol(tag.tagname.trim().to_string());
    grammar
        .scope_path(&tag.program, &tag.tagname, &symbol)
        .unwrap_or_else(|_| {
            ScopePath::from_raw(format!(
                "{}|{}",
                tag.program.trim().to_ascii_lowercase(),
                tag.tagname.trim().to_ascii_lowercase()
            ))
        })
}
