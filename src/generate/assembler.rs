//! Weighted list assembly: top list, tier sub-lists, splice and retention
//!
//! Tier selection probability is expressed purely through entry repetition
//! in a flat top-level list: a tier with weight 80 contributes 80 copies of
//! its sub-list entry.

use crate::analysis::catalog::{EffectCatalog, ResolvedOccurrence};
use crate::core::config::{BaseRetention, ListFlagOverrides, RarityTier};
use crate::core::error::{ForgeError, Result};
use crate::generate::materializer::VariantMaterializer;
use crate::records::store::RecordStore;
use crate::records::{ListEntry, ListFlags, Record, SelectionList};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Default, Clone, Copy)]
pub struct AssemblyStats {
    pub variants: usize,
    pub lists_created: usize,
    pub slots_skipped: usize,
}

pub struct ListAssembler<'a> {
    store: &'a RecordStore,
    tiers: &'a [RarityTier],
    variations: usize,
    base_weight: u32,
    retention: BaseRetention,
    flag_overrides: &'a ListFlagOverrides,
}

impl<'a> ListAssembler<'a> {
    pub fn new(
        store: &'a RecordStore,
        tiers: &'a [RarityTier],
        variations: usize,
        base_weight: u32,
        retention: BaseRetention,
        flag_overrides: &'a ListFlagOverrides,
    ) -> Self {
        Self {
            store,
            tiers,
            variations,
            base_weight,
            retention,
            flag_overrides,
        }
    }

    /// Build the nested weighted structure for one base occurrence and
    /// splice it into the occurrence's source list.
    pub fn assemble(
        &self,
        occurrence: &ResolvedOccurrence,
        catalog: &EffectCatalog,
        materializer: &mut VariantMaterializer<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<AssemblyStats> {
        let base = self
            .store
            .resolve_item(occurrence.item)
            .ok_or(ForgeError::RecordNotFound(occurrence.item))?
            .clone();
        let source_flags = self
            .store
            .resolve_list(occurrence.list)
            .ok_or(ForgeError::RecordNotFound(occurrence.list))?
            .flags;
        let flags = self.overridden_flags(source_flags);

        let mut stats = AssemblyStats::default();
        let top_id = self.store.create(|id| {
            Record::SelectionList(SelectionList {
                id,
                editor_id: format!("LF_TOP_LIST_{}", base.editor_id),
                flags,
                entries: Vec::new(),
            })
        });
        stats.lists_created += 1;

        let mut top_entries: Vec<ListEntry> = Vec::new();
        for (tier_index, tier) in self.tiers.iter().enumerate() {
            let sub_id = self.store.create(|id| {
                Record::SelectionList(SelectionList {
                    id,
                    editor_id: format!("LF_SUB_LIST_{}_{}", tier.label, base.editor_id),
                    flags,
                    entries: Vec::new(),
                })
            });
            stats.lists_created += 1;

            let mut sub_entries: Vec<ListEntry> = Vec::new();
            for variation in 0..self.variations {
                if catalog.available_at(occurrence.entry.level).is_empty() {
                    tracing::debug!(
                        item = %base.editor_id,
                        tier = %tier.label,
                        level = occurrence.entry.level,
                        "no enchantments unlockable, slot skipped"
                    );
                    stats.slots_skipped += 1;
                    continue;
                }
                let variant = materializer.enchant_item(occurrence, tier_index, variation, rng)?;
                let mut entry = occurrence.entry.clone();
                entry.target = variant;
                sub_entries.push(entry);
                stats.variants += 1;
            }
            self.store
                .update_created_list(sub_id, |list| list.entries = sub_entries)?;

            for _ in 0..tier.weight {
                let mut entry = occurrence.entry.clone();
                entry.target = sub_id;
                top_entries.push(entry);
            }
        }

        if self.retention == BaseRetention::KeepOriginalReachable {
            // The original entry stays reachable next to the generated
            // variants, weighted one below its configured chance.
            for _ in 1..self.base_weight {
                top_entries.push(occurrence.entry.clone());
            }
        }
        self.store
            .update_created_list(top_id, |list| list.entries = top_entries)?;

        self.store.override_list(occurrence.list, |list| {
            for entry in list
                .entries
                .iter_mut()
                .filter(|entry| entry.target == occurrence.item)
            {
                entry.target = top_id;
            }
        })?;
        tracing::debug!(item = %base.editor_id, top = ?top_id, "occurrence spliced");

        Ok(stats)
    }

    fn overridden_flags(&self, mut flags: ListFlags) -> ListFlags {
        if self.flag_overrides.calculate_from_all_levels {
            flags.calculate_from_all_levels = false;
        }
        if self.flag_overrides.calculate_for_each_item {
            flags.calculate_for_each_item = false;
        }
        if self.flag_overrides.use_all {
            flags.use_all = false;
        }
        if self.flag_overrides.special_loot {
            flags.special_loot = false;
        }
        flags
    }
}
