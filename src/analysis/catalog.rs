//! Effect catalog: scan the corpus and level-index existing enchantments
//!
//! The catalog is built once per family pipeline during the parallel
//! analysis phase. It only reads the corpus side of the store, so two
//! catalogs can scan concurrently without coordination.

use crate::core::config::GeneralConfig;
use crate::core::error::{ForgeError, Result};
use crate::core::types::RecordId;
use crate::pipeline::GearFamily;
use crate::records::store::RecordStore;
use crate::records::ListEntry;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;

/// An item reference inside a selection list, bound to the entry that
/// carries its unlock level and template data.
#[derive(Debug, Clone)]
pub struct ResolvedOccurrence {
    pub list: RecordId,
    pub item: RecordId,
    pub entry: ListEntry,
}

/// One distinct `(level, magnitude, effect set)` assignment found in the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnchantment {
    pub level: u16,
    pub magnitude: Option<u32>,
    pub effect_set: RecordId,
}

/// Level-indexed view of every effect assignment a family's items carry
#[derive(Debug)]
pub struct EffectCatalog {
    pub unenchanted: Vec<ResolvedOccurrence>,
    pub enchanted: Vec<ResolvedOccurrence>,
    pub enchantments: Vec<ResolvedEnchantment>,
    /// Distinct occurrence level -> indices into `enchantments` with level <= it
    by_level: AHashMap<u16, Vec<usize>>,
    pub max_level: u16,
}

impl EffectCatalog {
    pub fn scan<F: GearFamily>(store: &RecordStore, general: &GeneralConfig) -> Result<Self> {
        let lists = store.selection_lists();
        if lists.is_empty() {
            return Err(ForgeError::EmptyCorpus);
        }

        let constructable = general
            .constructable_only
            .then(|| store.constructable_results());

        let mut occurrences = Vec::new();
        for list in &lists {
            for entry in &list.entries {
                let Some(item) = store.resolve_item(entry.target) else {
                    // Unresolved target or a nested list reference; either
                    // way the entry contributes nothing to this family.
                    tracing::trace!(reference = ?entry.target, list = ?list.id, "entry dropped");
                    continue;
                };
                if !F::is_member(item) {
                    continue;
                }
                if item.has_any_tag(&general.exclusion_keywords) {
                    tracing::debug!(item = %item.editor_id, "excluded by keyword");
                    continue;
                }
                if let Some(constructable) = &constructable {
                    if !constructable.contains(&item.id) {
                        tracing::debug!(item = %item.editor_id, "not constructable, skipped");
                        continue;
                    }
                }
                occurrences.push(ResolvedOccurrence {
                    list: list.id,
                    item: item.id,
                    entry: entry.clone(),
                });
            }
        }

        if occurrences.is_empty() {
            return Err(ForgeError::NoLevels(F::LABEL.to_string()));
        }
        let max_level = occurrences.iter().map(|o| o.entry.level).max().unwrap_or(0);

        let (enchanted, unenchanted): (Vec<_>, Vec<_>) = occurrences
            .into_iter()
            .partition(|occ| store.resolve_item(occ.item).is_some_and(|i| i.is_enchanted()));

        // Deduplicate (level, magnitude, effect set) tuples in scan order,
        // then resolve each into its effect set under the enchantment filter.
        let mut seen: AHashSet<(u16, Option<u32>, RecordId)> = AHashSet::new();
        let mut enchantments = Vec::new();
        for occ in &enchanted {
            let Some(item) = store.resolve_item(occ.item) else { continue };
            let Some(set_id) = item.effect_set else { continue };
            if !seen.insert((occ.entry.level, item.effect_magnitude, set_id)) {
                continue;
            }
            let Some(set) = store.resolve_effect_set(set_id) else {
                tracing::debug!(set = ?set_id, "effect set unresolved, dropped");
                continue;
            };
            if !general.effect_filter.allows(&set.editor_id, set.exclusive) {
                tracing::debug!(set = %set.editor_id, "effect set filtered out");
                continue;
            }
            enchantments.push(ResolvedEnchantment {
                level: occ.entry.level,
                magnitude: item.effect_magnitude,
                effect_set: set_id,
            });
        }

        // One index entry per distinct level actually present; lookups during
        // assembly always hit one of these keys.
        let levels: BTreeSet<u16> = unenchanted
            .iter()
            .chain(enchanted.iter())
            .map(|o| o.entry.level)
            .collect();
        let mut by_level: AHashMap<u16, Vec<usize>> = AHashMap::new();
        for &level in &levels {
            let available: Vec<usize> = enchantments
                .iter()
                .enumerate()
                .filter(|(_, e)| e.level <= level)
                .map(|(i, _)| i)
                .collect();
            by_level.insert(level, available);
        }

        Ok(Self {
            unenchanted,
            enchanted,
            enchantments,
            by_level,
            max_level,
        })
    }

    /// Enchantments unlockable at `level`. Empty when the corpus holds no
    /// enchanted items, which downstream treats as "skip this slot".
    pub fn available_at(&self, level: u16) -> &[usize] {
        self.by_level.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }
}
