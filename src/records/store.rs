//! In-memory record store: corpus indexes plus the run's patch
//!
//! The corpus side is read-only and shared freely across pipeline threads.
//! The patch side (id allocator, created records, list overrides) sits
//! behind one mutex; every allocation, creation and override acquires that
//! single lock, which is what makes concurrent analysis safe.

use crate::core::error::{ForgeError, Result};
use crate::core::types::RecordId;
use crate::records::{EffectSet, Item, Record, Recipe, SelectionList};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Read-only view of the loaded archive, indexed by id.
///
/// Duplicate ids in the archive resolve last-record-wins, mirroring how the
/// host resolves overrides across its load order.
#[derive(Debug, Default)]
pub struct Corpus {
    items: AHashMap<RecordId, Item>,
    effect_sets: AHashMap<RecordId, EffectSet>,
    lists: BTreeMap<RecordId, SelectionList>,
    recipes: Vec<Recipe>,
    max_id: u64,
}

impl Corpus {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut corpus = Corpus::default();
        for record in records {
            corpus.max_id = corpus.max_id.max(record.id().0);
            match record {
                Record::Item(item) => {
                    corpus.items.insert(item.id, item);
                }
                Record::EffectSet(set) => {
                    corpus.effect_sets.insert(set.id, set);
                }
                Record::SelectionList(list) => {
                    corpus.lists.insert(list.id, list);
                }
                Record::Recipe(recipe) => {
                    corpus.recipes.retain(|r| r.id != recipe.id);
                    corpus.recipes.push(recipe);
                }
            }
        }
        corpus
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }
}

#[derive(Debug)]
struct Patch {
    next_id: u64,
    created: BTreeMap<RecordId, Record>,
    overrides: BTreeMap<RecordId, SelectionList>,
}

/// Everything a run produced: created records in creation order plus the
/// overridden lists. This is the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub created: Vec<Record>,
    pub overrides: Vec<SelectionList>,
}

pub struct RecordStore {
    corpus: Corpus,
    patch: Mutex<Patch>,
}

impl RecordStore {
    pub fn new(corpus: Corpus) -> Self {
        let next_id = corpus.max_id + 1;
        Self {
            corpus,
            patch: Mutex::new(Patch {
                next_id,
                created: BTreeMap::new(),
                overrides: BTreeMap::new(),
            }),
        }
    }

    /// Priority-resolved selection lists: corpus lists with any override
    /// applied on top.
    pub fn selection_lists(&self) -> Vec<SelectionList> {
        let patch = self.patch.lock().unwrap();
        self.corpus
            .lists
            .values()
            .map(|list| patch.overrides.get(&list.id).unwrap_or(list).clone())
            .collect()
    }

    pub fn resolve_item(&self, id: RecordId) -> Option<&Item> {
        self.corpus.items.get(&id)
    }

    pub fn resolve_effect_set(&self, id: RecordId) -> Option<&EffectSet> {
        self.corpus.effect_sets.get(&id)
    }

    /// Corpus-side list lookup; overrides do not shadow it because callers
    /// want the original flags and entry layout.
    pub fn resolve_list(&self, id: RecordId) -> Option<&SelectionList> {
        self.corpus.lists.get(&id)
    }

    /// Result ids of every recipe record
    pub fn constructable_results(&self) -> AHashSet<RecordId> {
        self.corpus.recipes.iter().map(|r| r.result).collect()
    }

    pub fn list_count(&self) -> usize {
        self.corpus.list_count()
    }

    /// Allocate the next id and register the record built from it, under a
    /// single lock acquisition.
    pub fn create(&self, build: impl FnOnce(RecordId) -> Record) -> RecordId {
        let mut patch = self.patch.lock().unwrap();
        let id = RecordId(patch.next_id);
        patch.next_id += 1;
        let record = build(id);
        debug_assert_eq!(record.id(), id);
        patch.created.insert(id, record);
        id
    }

    /// Mutate a record created earlier this run
    pub fn update_created_list(
        &self,
        id: RecordId,
        mutate: impl FnOnce(&mut SelectionList),
    ) -> Result<()> {
        let mut patch = self.patch.lock().unwrap();
        match patch.created.get_mut(&id) {
            Some(Record::SelectionList(list)) => {
                mutate(list);
                Ok(())
            }
            Some(_) => Err(ForgeError::NotASelectionList(id)),
            None => Err(ForgeError::RecordNotFound(id)),
        }
    }

    /// Obtain the mutable override copy of a corpus list and mutate it.
    ///
    /// The first call clones the corpus record into the patch; later calls
    /// keep mutating that same copy.
    pub fn override_list(
        &self,
        id: RecordId,
        mutate: impl FnOnce(&mut SelectionList),
    ) -> Result<()> {
        let mut patch = self.patch.lock().unwrap();
        if !patch.overrides.contains_key(&id) {
            let original = self
                .corpus
                .lists
                .get(&id)
                .ok_or(ForgeError::RecordNotFound(id))?;
            patch.overrides.insert(id, original.clone());
        }
        mutate(patch.overrides.get_mut(&id).unwrap());
        Ok(())
    }

    pub fn created_count(&self) -> usize {
        self.patch.lock().unwrap().created.len()
    }

    pub fn override_count(&self) -> usize {
        self.patch.lock().unwrap().overrides.len()
    }

    /// Consume the store, yielding the run's delta artifact.
    ///
    /// Created ids ascend in creation order, so iterating the map yields
    /// records exactly as they were made.
    pub fn into_delta(self) -> Delta {
        let patch = self.patch.into_inner().unwrap();
        Delta {
            created: patch.created.into_values().collect(),
            overrides: patch.overrides.into_values().collect(),
        }
    }
}
