//! Record data model for the corpus archive
//!
//! Corpus records are read-only inputs; generated records are appended to
//! the run's patch and serialized into the delta artifact. Collections use
//! BTree types so serialized output is stable across runs.

pub mod loader;
pub mod store;

use crate::core::types::{GearKind, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One opaque magic-effect entry inside an effect set; copied verbatim
/// when combinations are materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    pub effect: String,
    pub magnitude: f32,
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub duration: u32,
}

/// A bundle of magic effects attachable to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSet {
    pub id: RecordId,
    pub editor_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub entries: Vec<EffectEntry>,
    #[serde(default)]
    pub worn_restrictions: BTreeSet<String>,
    /// Item-locked enchantment that must not spread to random gear
    #[serde(default)]
    pub exclusive: bool,
}

impl EffectSet {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.editor_id)
    }
}

/// Base gear entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: RecordId,
    pub editor_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: GearKind,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub effect_set: Option<RecordId>,
    /// Aggregate enchantment magnitude, when the host tracks one
    #[serde(default)]
    pub effect_magnitude: Option<u32>,
    #[serde(default)]
    pub template: Option<RecordId>,
}

impl Item {
    pub fn is_enchanted(&self) -> bool {
        self.effect_set.is_some()
    }

    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Host-native auto-calculation flags carried by a selection list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFlags {
    pub calculate_from_all_levels: bool,
    pub calculate_for_each_item: bool,
    pub use_all: bool,
    pub special_loot: bool,
}

/// One weighted slot in a selection list; `target` may reference an item
/// or another list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub target: RecordId,
    pub level: u16,
    #[serde(default = "default_count")]
    pub count: u16,
}

fn default_count() -> u16 {
    1
}

/// Nested weighted list of item/list references used to pick loot at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionList {
    pub id: RecordId,
    pub editor_id: String,
    #[serde(default)]
    pub flags: ListFlags,
    pub entries: Vec<ListEntry>,
}

/// Marks its result item as constructable; backs the constructable-only
/// eligibility flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecordId,
    pub editor_id: String,
    pub result: RecordId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Item(Item),
    EffectSet(EffectSet),
    SelectionList(SelectionList),
    Recipe(Recipe),
}

impl Record {
    pub fn id(&self) -> RecordId {
        match self {
            Record::Item(r) => r.id,
            Record::EffectSet(r) => r.id,
            Record::SelectionList(r) => r.id,
            Record::Recipe(r) => r.id,
        }
    }
}
