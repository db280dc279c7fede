//! Variant materialization: new items and effect sets from sampled combinations
//!
//! At most one physical effect set exists per distinct tier+anchor-name
//! combination, however many items end up referencing it; the per-tier
//! `VariantCache` is what enforces that.

use crate::analysis::catalog::{ResolvedEnchantment, ResolvedOccurrence};
use crate::analysis::sampler::EnchantmentPool;
use crate::core::config::{RarityTier, DISALLOW_ENCHANTING_TAG};
use crate::core::error::{ForgeError, Result};
use crate::core::types::RecordId;
use crate::generate::naming::NameDeriver;
use crate::records::store::RecordStore;
use crate::records::{EffectEntry, EffectSet, Item, Record};
use ahash::AHashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Per tier: combination name -> materialized effect set, and the reverse
/// mapping back to the combination that produced it.
#[derive(Debug, Default)]
pub struct VariantCache {
    chosen: AHashMap<String, RecordId>,
    effects: AHashMap<RecordId, Vec<ResolvedEnchantment>>,
}

pub struct VariantMaterializer<'a> {
    store: &'a RecordStore,
    tiers: &'a [RarityTier],
    pools: &'a [EnchantmentPool],
    caches: Vec<VariantCache>,
    names: NameDeriver,
    editor_prefix: &'static str,
}

impl<'a> VariantMaterializer<'a> {
    pub fn new(
        store: &'a RecordStore,
        tiers: &'a [RarityTier],
        pools: &'a [EnchantmentPool],
        family_token: &'static str,
        fallback_name: &'static str,
        editor_prefix: &'static str,
    ) -> Self {
        let caches = tiers.iter().map(|_| VariantCache::default()).collect();
        Self {
            store,
            tiers,
            pools,
            caches,
            names: NameDeriver::new(family_token, fallback_name),
            editor_prefix,
        }
    }

    /// Materialize one variant of the occurrence's item for a tier.
    ///
    /// Zero-enchantment tiers produce a relabeled clone with no effect set
    /// attached; all others draw a combination from the tier's pool.
    pub fn enchant_item(
        &mut self,
        occurrence: &ResolvedOccurrence,
        tier_index: usize,
        variation: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<RecordId> {
        let item = self
            .store
            .resolve_item(occurrence.item)
            .ok_or(ForgeError::RecordNotFound(occurrence.item))?
            .clone();
        let base_name = match &item.name {
            Some(name) => name.clone(),
            None => self.names.derive(&item.editor_id),
        };
        let tier = &self.tiers[tier_index];

        if tier.enchantments == 0 {
            return Ok(self.relabel(&item, tier, &base_name));
        }

        let Some((set_id, combination)) = self.generate_enchantment(tier_index, rng) else {
            // Tier pool is empty; nothing to attach, keep the relabel.
            tracing::debug!(tier = %tier.label, "empty pool, variant gets no effect set");
            return Ok(self.relabel(&item, tier, &base_name));
        };

        let primary = self
            .store
            .resolve_effect_set(combination[0].effect_set)
            .map(|set| set.display_name().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let magnitude: u32 = combination.iter().filter_map(|e| e.magnitude).sum();

        let name = if tier.label.is_empty() {
            format!("{} of {}", base_name, primary)
        } else {
            format!("{} {} of {}", tier.label, base_name, primary)
        };
        let editor_id = format!(
            "{}{}_{}_of_{}",
            self.editor_prefix,
            tier.label.to_uppercase(),
            item.editor_id,
            primary
        );
        let mut tags = item.tags.clone();
        if tier.enchantments > 1 {
            // Compound variants must never be enchanted again on later runs.
            tags.insert(DISALLOW_ENCHANTING_TAG.to_string());
        }

        let variant_id = self.store.create(|id| {
            Record::Item(Item {
                id,
                editor_id,
                name: Some(name.clone()),
                kind: item.kind,
                tags,
                effect_set: Some(set_id),
                effect_magnitude: Some(magnitude),
                template: Some(item.id),
            })
        });
        tracing::debug!(variant = %name, variation, "materialized enchanted variant");
        Ok(variant_id)
    }

    fn relabel(&self, item: &Item, tier: &RarityTier, base_name: &str) -> RecordId {
        let name = if tier.label.is_empty() {
            base_name.to_string()
        } else {
            format!("{} {}", tier.label, base_name)
        };
        let variant_id = self.store.create(|id| {
            Record::Item(Item {
                id,
                editor_id: format!("{}{}", self.editor_prefix, item.editor_id),
                name: Some(name.clone()),
                ..item.clone()
            })
        });
        tracing::debug!(variant = %name, "materialized relabeled variant");
        variant_id
    }

    /// Pick a combination from the tier's pool and return the materialized
    /// effect set for it, creating it on first use.
    fn generate_enchantment(
        &mut self,
        tier_index: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<(RecordId, Vec<ResolvedEnchantment>)> {
        let pools = self.pools;
        let store = self.store;
        let pool: &EnchantmentPool = &pools[tier_index];
        if pool.is_empty() {
            return None;
        }
        let draw = if pool.len() > 1 {
            rng.gen_range(0..pool.len())
        } else {
            0
        };
        let (key, combination) = pool.iter().nth(draw)?;
        let tier = &self.tiers[tier_index];

        if let Some(&cached) = self.caches[tier_index].chosen.get(key) {
            tracing::debug!(key = %key, "reusing materialized effect set");
            let combination = self.caches[tier_index].effects[&cached].clone();
            return Some((cached, combination));
        }

        let anchor_set = store.resolve_effect_set(combination[0].effect_set)?;
        let entries: Vec<EffectEntry> = combination
            .iter()
            .filter_map(|member| store.resolve_effect_set(member.effect_set))
            .flat_map(|set| set.entries.iter().cloned())
            .collect();
        let name = if tier.label.is_empty() {
            anchor_set.display_name().to_string()
        } else {
            format!("{} {}", tier.label, anchor_set.display_name())
        };
        let editor_id = format!(
            "{}ENCH_{}_{}",
            self.editor_prefix,
            tier.label.to_uppercase(),
            anchor_set.editor_id
        );
        let worn_restrictions = anchor_set.worn_restrictions.clone();
        let exclusive = anchor_set.exclusive;

        let set_id = store.create(|id| {
            Record::EffectSet(EffectSet {
                id,
                editor_id,
                name: Some(name.clone()),
                entries,
                worn_restrictions,
                exclusive,
            })
        });
        tracing::debug!(key = %key, set = ?set_id, "materialized effect set");

        let cache = &mut self.caches[tier_index];
        cache.chosen.insert(key.clone(), set_id);
        cache.effects.insert(set_id, combination.clone());
        Some((set_id, combination.clone()))
    }
}
