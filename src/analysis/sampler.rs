//! Rarity tier sampling: anchored effect combinations per pool
//!
//! For every enchantment acting as an anchor, each tier gets one sampled
//! combination guaranteed to contain that anchor. Pools are BTreeMaps so
//! draw order during assembly is deterministic for a given seed.

use crate::analysis::catalog::{EffectCatalog, ResolvedEnchantment};
use crate::core::config::RarityTier;
use crate::records::store::RecordStore;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Per tier: canonical combination name -> the chosen combination.
/// Slot 0 of every combination is its anchor.
pub type EnchantmentPool = BTreeMap<String, Vec<ResolvedEnchantment>>;

/// Canonical pool key for a tier/anchor pairing
pub fn pool_key(label: &str, anchor_name: &str) -> String {
    if label.is_empty() {
        anchor_name.to_string()
    } else {
        format!("{} {}", label, anchor_name)
    }
}

/// Build one pool per tier from the catalog's enchantment set.
///
/// Insertion is idempotent: the first combination sampled for a key wins,
/// but the RNG is always advanced so the stream stays reproducible.
pub fn build_pools(
    store: &RecordStore,
    tiers: &[RarityTier],
    catalog: &EffectCatalog,
    rng: &mut ChaCha8Rng,
) -> Vec<EnchantmentPool> {
    let n = catalog.enchantments.len();
    let mut pools: Vec<EnchantmentPool> = vec![BTreeMap::new(); tiers.len()];

    for anchor in 0..n {
        for (tier_index, tier) in tiers.iter().enumerate() {
            let k = tier.enchantments.min(n);
            if k == 0 {
                continue;
            }
            let slots = sample_with_anchor(n, k, anchor, rng);

            let anchor_ench = &catalog.enchantments[anchor];
            let Some(anchor_set) = store.resolve_effect_set(anchor_ench.effect_set) else {
                continue;
            };
            let key = pool_key(&tier.label, anchor_set.display_name());
            pools[tier_index].entry(key).or_insert_with(|| {
                slots
                    .iter()
                    .map(|&i| catalog.enchantments[i].clone())
                    .collect()
            });
        }
    }

    pools
}

/// Partial sampling-without-replacement of `k` of `n` indices, with the
/// anchor forced into slot 0.
///
/// The slot array starts as the identity over `[0,k)`; every later index
/// gets a chance to displace a slot. If the anchor was not drawn, it
/// overwrites slot 0 outright, which skews whichever element sat there —
/// a known property of this draw that is kept intentionally.
fn sample_with_anchor(n: usize, k: usize, anchor: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    debug_assert!(k >= 1 && k <= n && anchor < n);
    let mut slots: Vec<usize> = (0..k).collect();
    for t in k..n {
        let m = rng.gen_range(0..=t);
        if m < k {
            slots[m] = t;
        }
    }
    match slots.iter().position(|&s| s == anchor) {
        Some(pos) => slots.swap(0, pos),
        None => slots[0] = anchor,
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GeneralConfig;
    use crate::core::types::{GearKind, RecordId};
    use crate::pipeline::Weapons;
    use crate::records::store::Corpus;
    use crate::records::{EffectEntry, EffectSet, Item, ListEntry, ListFlags, Record, SelectionList};
    use crate::analysis::catalog::EffectCatalog;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_combination_contains_anchor_at_slot_zero() {
        let mut rng = rng();
        for anchor in 0..6 {
            let slots = sample_with_anchor(6, 3, anchor, &mut rng);
            assert_eq!(slots[0], anchor);
        }
    }

    #[test]
    fn test_combination_entries_are_distinct() {
        let mut rng = rng();
        for anchor in 0..8 {
            let slots = sample_with_anchor(8, 4, anchor, &mut rng);
            let mut sorted = slots.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), slots.len(), "duplicates in {:?}", slots);
        }
    }

    #[test]
    fn test_single_element_pool_collapses_to_anchor() {
        let mut rng = rng();
        assert_eq!(sample_with_anchor(1, 1, 0, &mut rng), vec![0]);
    }

    proptest! {
        #[test]
        fn prop_sampled_combinations_are_valid(
            n in 1usize..40,
            k in 1usize..8,
            anchor_raw in 0usize..40,
            seed in 0u64..1000,
        ) {
            let k = k.min(n);
            let anchor = anchor_raw % n;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let slots = sample_with_anchor(n, k, anchor, &mut rng);

            prop_assert_eq!(slots.len(), k);
            prop_assert_eq!(slots[0], anchor);
            let mut sorted = slots.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), k);
            prop_assert!(slots.iter().all(|&s| s < n));
        }
    }

    fn fixture_store(effect_count: u64) -> RecordStore {
        let mut records = Vec::new();
        let mut entries = Vec::new();
        for i in 0..effect_count {
            let set_id = 100 + i;
            let item_id = 200 + i;
            records.push(Record::EffectSet(EffectSet {
                id: RecordId(set_id),
                editor_id: format!("EnchSet{}", i),
                name: Some(format!("Effect {}", i)),
                entries: vec![EffectEntry {
                    effect: format!("effect-{}", i),
                    magnitude: 1.0,
                    area: 0,
                    duration: 0,
                }],
                worn_restrictions: Default::default(),
                exclusive: false,
            }));
            records.push(Record::Item(Item {
                id: RecordId(item_id),
                editor_id: format!("Sword{}", i),
                name: None,
                kind: GearKind::Weapon,
                tags: Default::default(),
                effect_set: Some(RecordId(set_id)),
                effect_magnitude: Some(5),
                template: None,
            }));
            entries.push(ListEntry { target: RecordId(item_id), level: 1, count: 1 });
        }
        records.push(Record::SelectionList(SelectionList {
            id: RecordId(10),
            editor_id: "AllSwords".into(),
            flags: ListFlags::default(),
            entries,
        }));
        RecordStore::new(Corpus::from_records(records))
    }

    fn tier(label: &str, enchantments: usize, weight: u32) -> RarityTier {
        RarityTier { label: label.into(), enchantments, weight }
    }

    #[test]
    fn test_pools_hold_one_key_per_anchor() {
        let store = fixture_store(4);
        let general = GeneralConfig { constructable_only: false, ..Default::default() };
        let catalog = EffectCatalog::scan::<Weapons>(&store, &general).unwrap();
        let tiers = vec![tier("Magical", 1, 80), tier("Rare", 2, 13)];

        let pools = build_pools(&store, &tiers, &catalog, &mut rng());
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].len(), 4);
        assert_eq!(pools[1].len(), 4);
        assert!(pools[0].contains_key("Magical Effect 0"));
        assert!(pools[1].contains_key("Rare Effect 0"));
    }

    #[test]
    fn test_combination_size_clamps_to_pool_size() {
        let store = fixture_store(2);
        let general = GeneralConfig { constructable_only: false, ..Default::default() };
        let catalog = EffectCatalog::scan::<Weapons>(&store, &general).unwrap();
        let tiers = vec![tier("Legendary", 4, 2)];

        let pools = build_pools(&store, &tiers, &catalog, &mut rng());
        for combination in pools[0].values() {
            assert_eq!(combination.len(), 2);
        }
    }

    #[test]
    fn test_zero_count_tier_gets_no_pool_entries() {
        let store = fixture_store(3);
        let general = GeneralConfig { constructable_only: false, ..Default::default() };
        let catalog = EffectCatalog::scan::<Weapons>(&store, &general).unwrap();
        let tiers = vec![tier("Plain", 0, 50)];

        let pools = build_pools(&store, &tiers, &catalog, &mut rng());
        assert!(pools[0].is_empty());
    }

    #[test]
    fn test_first_writer_wins() {
        // Two enchanted items sharing one effect set at different magnitudes
        // produce two anchors with the same display name; the first sampled
        // combination must be kept.
        let mut records = vec![Record::EffectSet(EffectSet {
            id: RecordId(100),
            editor_id: "EnchFire".into(),
            name: Some("Fire".into()),
            entries: vec![EffectEntry { effect: "fire".into(), magnitude: 1.0, area: 0, duration: 0 }],
            worn_restrictions: Default::default(),
            exclusive: false,
        })];
        for (item_id, magnitude) in [(200u64, 5u32), (201, 9)] {
            records.push(Record::Item(Item {
                id: RecordId(item_id),
                editor_id: format!("Sword{}", item_id),
                name: None,
                kind: GearKind::Weapon,
                tags: Default::default(),
                effect_set: Some(RecordId(100)),
                effect_magnitude: Some(magnitude),
                template: None,
            }));
        }
        records.push(Record::SelectionList(SelectionList {
            id: RecordId(10),
            editor_id: "AllSwords".into(),
            flags: ListFlags::default(),
            entries: vec![
                ListEntry { target: RecordId(200), level: 1, count: 1 },
                ListEntry { target: RecordId(201), level: 1, count: 1 },
            ],
        }));
        let store = RecordStore::new(Corpus::from_records(records));
        let general = GeneralConfig { constructable_only: false, ..Default::default() };
        let catalog = EffectCatalog::scan::<Weapons>(&store, &general).unwrap();
        assert_eq!(catalog.enchantments.len(), 2);

        let tiers = vec![tier("Magical", 1, 80)];
        let pools = build_pools(&store, &tiers, &catalog, &mut rng());
        assert_eq!(pools[0].len(), 1);
        // First anchor in scan order wins the key.
        let combination = &pools[0]["Magical Fire"];
        assert_eq!(combination[0].magnitude, Some(5));
    }
}
