//! Family pipelines and run orchestration
//!
//! Analysis (catalog + sampling) for both families runs in parallel via
//! `rayon::join`; the join is the barrier before assembly, which mutates
//! shared store pages and therefore runs one family at a time.

use crate::analysis::catalog::EffectCatalog;
use crate::analysis::sampler::{build_pools, EnchantmentPool};
use crate::core::config::{Config, RarityTier};
use crate::core::error::{ForgeError, Result};
use crate::core::types::{family_seed, GearKind};
use crate::generate::assembler::{AssemblyStats, ListAssembler};
use crate::generate::materializer::VariantMaterializer;
use crate::records::store::RecordStore;
use crate::records::Item;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::marker::PhantomData;

/// Capability set an item family exposes to the generic engine: a
/// membership test plus the naming constants derivation and editor ids
/// need. Clone/rename/attach/tag are uniform over the record model, so one
/// engine serves every family.
pub trait GearFamily {
    /// Family discriminator: config table name and RNG seed salt
    const LABEL: &'static str;
    /// Display name when an item has no usable identifier
    const FALLBACK_NAME: &'static str;
    /// Type-name token stripped during name derivation
    const NOISE_TOKEN: &'static str;
    /// Prefix for generated editor ids
    const EDITOR_PREFIX: &'static str;

    fn is_member(item: &Item) -> bool;

    fn family_config(config: &Config) -> &crate::core::config::FamilyConfig;
}

pub struct Weapons;

impl GearFamily for Weapons {
    const LABEL: &'static str = "weapons";
    const FALLBACK_NAME: &'static str = "Weapon";
    const NOISE_TOKEN: &'static str = "Weapon";
    const EDITOR_PREFIX: &'static str = "LF_WEAP_";

    fn is_member(item: &Item) -> bool {
        item.kind == GearKind::Weapon
    }

    fn family_config(config: &Config) -> &crate::core::config::FamilyConfig {
        &config.weapons
    }
}

pub struct Armor;

impl GearFamily for Armor {
    const LABEL: &'static str = "armor";
    const FALLBACK_NAME: &'static str = "Armor";
    const NOISE_TOKEN: &'static str = "Armor";
    const EDITOR_PREFIX: &'static str = "LF_ARMO_";

    fn is_member(item: &Item) -> bool {
        item.kind == GearKind::Armor
    }

    fn family_config(config: &Config) -> &crate::core::config::FamilyConfig {
        &config.armor
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FamilyReport {
    pub occurrences: usize,
    pub variants: usize,
    pub lists_created: usize,
    pub slots_skipped: usize,
}

/// One family's generation state: catalog, pools and RNG stream.
///
/// All mutable engine state lives in this value and is passed by reference
/// into component calls; nothing is ambient.
pub struct FamilyPipeline<F: GearFamily> {
    tiers: Vec<RarityTier>,
    variations: usize,
    base_weight: u32,
    catalog: EffectCatalog,
    pools: Vec<EnchantmentPool>,
    rng: ChaCha8Rng,
    _family: PhantomData<F>,
}

impl<F: GearFamily> FamilyPipeline<F> {
    /// Analysis phase: scan the corpus and build the tier pools.
    ///
    /// Safe to run concurrently with other families — it only reads the
    /// corpus and writes this pipeline's own state.
    pub fn analyze(store: &RecordStore, config: &Config) -> Result<Self> {
        let family = F::family_config(config);
        let tiers = family.resolved_tiers(config.general.mode);
        let catalog = EffectCatalog::scan::<F>(store, &config.general)?;
        let mut rng = ChaCha8Rng::seed_from_u64(family_seed(config.seed, F::LABEL));
        let pools = build_pools(store, &tiers, &catalog, &mut rng);

        tracing::info!(
            family = F::LABEL,
            unenchanted = catalog.unenchanted.len(),
            enchanted = catalog.enchanted.len(),
            enchantments = catalog.enchantments.len(),
            max_level = catalog.max_level,
            "analysis complete"
        );
        Ok(Self {
            tiers,
            variations: family.variations(),
            base_weight: family.base_weight(),
            catalog,
            pools,
            rng,
            _family: PhantomData,
        })
    }

    /// Assembly phase: materialize variants and splice lists.
    ///
    /// Mutates shared store pages; the caller runs one family at a time.
    pub fn generate(&mut self, store: &RecordStore, config: &Config) -> Result<FamilyReport> {
        let mut materializer = VariantMaterializer::new(
            store,
            &self.tiers,
            &self.pools,
            F::NOISE_TOKEN,
            F::FALLBACK_NAME,
            F::EDITOR_PREFIX,
        );
        let assembler = ListAssembler::new(
            store,
            &self.tiers,
            self.variations,
            self.base_weight,
            config.general.base_retention,
            &config.general.list_flags,
        );

        let mut report = FamilyReport {
            occurrences: self.catalog.unenchanted.len(),
            ..FamilyReport::default()
        };
        for occurrence in &self.catalog.unenchanted {
            let stats: AssemblyStats =
                assembler.assemble(occurrence, &self.catalog, &mut materializer, &mut self.rng)?;
            report.variants += stats.variants;
            report.lists_created += stats.lists_created;
            report.slots_skipped += stats.slots_skipped;
        }

        tracing::info!(
            family = F::LABEL,
            occurrences = report.occurrences,
            variants = report.variants,
            lists = report.lists_created,
            skipped = report.slots_skipped,
            "generation complete"
        );
        Ok(report)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    pub weapons: FamilyReport,
    pub armor: FamilyReport,
}

/// Run the whole engine over a loaded store: parallel analysis, barrier,
/// then sequential assembly per family.
pub fn run(store: &RecordStore, config: &Config) -> Result<RunReport> {
    if store.list_count() == 0 {
        return Err(ForgeError::EmptyCorpus);
    }

    tracing::info!("analyzing corpus");
    let (weapons, armor) = rayon::join(
        || FamilyPipeline::<Weapons>::analyze(store, config),
        || FamilyPipeline::<Armor>::analyze(store, config),
    );
    let mut weapons = weapons?;
    let mut armor = armor?;

    tracing::info!("generating weapon variants");
    let weapon_report = weapons.generate(store, config)?;

    tracing::info!("generating armor variants");
    let armor_report = armor.generate(store, config)?;

    Ok(RunReport {
        weapons: weapon_report,
        armor: armor_report,
    })
}
