//! Run configuration loaded from a TOML file
//!
//! The whole surface is loaded once before analysis and immutable for the
//! run. `Config::validate` raises every fatal shape problem up front so a
//! bad file never reaches the pipelines.

use crate::core::error::{ForgeError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Tag applied to generated compound items so later runs never re-enchant them.
///
/// Must stay in the default exclusion keyword set.
pub const DISALLOW_ENCHANTING_TAG: &str = "disallow-enchanting";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for all tier sampling; each family derives its own stream from it
    pub seed: u64,
    pub general: GeneralConfig,
    pub weapons: FamilyConfig,
    pub armor: FamilyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Only process items that are the result of a recipe record
    pub constructable_only: bool,
    pub mode: GenerationMode,
    pub base_retention: BaseRetention,
    /// Items carrying any of these tags are never processed
    pub exclusion_keywords: BTreeSet<String>,
    pub list_flags: ListFlagOverrides,
    pub effect_filter: EffectFilter,
}

/// Which generation engine configuration to run.
///
/// `Distribute` is the consolidated form of the old single-tier path: it
/// resolves to one unlabeled tier `{ "", 1, 100 }` fed through the same
/// engine as `Rarities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    Rarities,
    Distribute,
}

/// What happens to the base item when its list slot is spliced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseRetention {
    /// The base item is only reachable through zero-enchantment tiers, if any
    DistributeOnly,
    /// Extra copies of the original entry keep the base item in the top list
    KeepOriginalReachable,
}

/// Host-native auto-calculation flags to clear on generated lists.
///
/// `true` means the engine's explicit weights govern selection for that
/// behavior instead of the host heuristic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListFlagOverrides {
    pub calculate_from_all_levels: bool,
    pub calculate_for_each_item: bool,
    pub use_all: bool,
    pub special_loot: bool,
}

/// Blacklist/whitelist over effect-set editor ids
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EffectFilter {
    pub mode: FilterMode,
    pub effects: BTreeSet<String>,
    /// Drop effect sets flagged as item-exclusive (lore-locked enchantments)
    pub exclude_restricted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    Blacklist,
    Whitelist,
}

impl EffectFilter {
    pub fn allows(&self, editor_id: &str, exclusive: bool) -> bool {
        if self.exclude_restricted && exclusive {
            return false;
        }
        match self.mode {
            FilterMode::Blacklist => !self.effects.contains(editor_id),
            FilterMode::Whitelist => self.effects.contains(editor_id),
        }
    }
}

/// Per-family generation settings.
///
/// Counts are signed on purpose: a negative value in the file must surface
/// as a configuration error, not a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    pub variations_per_item: i64,
    pub base_chance_weight: i64,
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    pub label: String,
    pub enchantments: i64,
    pub weight: i64,
}

/// A validated rarity tier as the engine consumes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityTier {
    pub label: String,
    /// Target enchantment count for sampled combinations
    pub enchantments: usize,
    /// Relative selection weight, expressed as entry repetition
    pub weight: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            general: GeneralConfig::default(),
            weapons: FamilyConfig::default(),
            armor: FamilyConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            constructable_only: true,
            mode: GenerationMode::Rarities,
            base_retention: BaseRetention::KeepOriginalReachable,
            exclusion_keywords: [DISALLOW_ENCHANTING_TAG, "artifact", "staff"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            list_flags: ListFlagOverrides::default(),
            effect_filter: EffectFilter::default(),
        }
    }
}

impl Default for ListFlagOverrides {
    fn default() -> Self {
        Self {
            calculate_from_all_levels: true,
            calculate_for_each_item: true,
            use_all: false,
            special_loot: false,
        }
    }
}

impl Default for EffectFilter {
    fn default() -> Self {
        Self {
            mode: FilterMode::Blacklist,
            effects: BTreeSet::new(),
            exclude_restricted: true,
        }
    }
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            variations_per_item: 8,
            base_chance_weight: 10,
            tiers: vec![
                TierConfig { label: "Magical".into(), enchantments: 1, weight: 80 },
                TierConfig { label: "Rare".into(), enchantments: 2, weight: 13 },
                TierConfig { label: "Epic".into(), enchantments: 3, weight: 5 },
                TierConfig { label: "Legendary".into(), enchantments: 4, weight: 2 },
            ],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the whole surface before any analysis starts
    pub fn validate(&self) -> Result<()> {
        self.weapons.validate("weapons", self.general.mode)?;
        self.armor.validate("armor", self.general.mode)?;
        Ok(())
    }
}

impl FamilyConfig {
    fn validate(&self, family: &str, mode: GenerationMode) -> Result<()> {
        if self.variations_per_item < 0 {
            return Err(ForgeError::Config(format!(
                "[{}] variations_per_item must be >= 0, got {}",
                family, self.variations_per_item
            )));
        }
        if self.base_chance_weight < 1 {
            return Err(ForgeError::Config(format!(
                "[{}] base_chance_weight must be >= 1, got {}",
                family, self.base_chance_weight
            )));
        }

        // Distribute mode supplies its own single tier; the list is unused.
        if mode == GenerationMode::Distribute {
            return Ok(());
        }

        if self.tiers.is_empty() {
            return Err(ForgeError::Config(format!("[{}] tier list is empty", family)));
        }
        let mut weight_sum = 0i64;
        for tier in &self.tiers {
            if tier.enchantments < 0 {
                return Err(ForgeError::Config(format!(
                    "[{}] tier '{}' has negative enchantment count {}",
                    family, tier.label, tier.enchantments
                )));
            }
            if tier.weight < 0 {
                return Err(ForgeError::Config(format!(
                    "[{}] tier '{}' has negative weight {}",
                    family, tier.label, tier.weight
                )));
            }
            weight_sum += tier.weight;
        }
        if weight_sum == 0 {
            return Err(ForgeError::Config(format!(
                "[{}] tier weights sum to zero; no tier could ever be selected",
                family
            )));
        }
        Ok(())
    }

    /// Tiers as the engine consumes them, after mode resolution
    pub fn resolved_tiers(&self, mode: GenerationMode) -> Vec<RarityTier> {
        match mode {
            GenerationMode::Rarities => self
                .tiers
                .iter()
                .map(|t| RarityTier {
                    label: t.label.clone(),
                    enchantments: t.enchantments as usize,
                    weight: t.weight as u32,
                })
                .collect(),
            GenerationMode::Distribute => vec![RarityTier {
                label: String::new(),
                enchantments: 1,
                weight: 100,
            }],
        }
    }

    pub fn variations(&self) -> usize {
        self.variations_per_item as usize
    }

    pub fn base_weight(&self) -> u32 {
        self.base_chance_weight as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
seed = 7

[general]
constructable_only = false
mode = "rarities"
base_retention = "distribute-only"
exclusion_keywords = ["artifact"]

[general.effect_filter]
mode = "whitelist"
effects = ["ench_fire"]
exclude_restricted = false

[weapons]
variations_per_item = 4
base_chance_weight = 5
tiers = [
    { label = "Magical", enchantments = 1, weight = 80 },
    { label = "Rare", enchantments = 2, weight = 13 },
]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        assert_eq!(config.seed, 7);
        assert!(!config.general.constructable_only);
        assert_eq!(config.general.base_retention, BaseRetention::DistributeOnly);
        assert_eq!(config.weapons.variations(), 4);
        assert_eq!(config.weapons.tiers.len(), 2);
        // Armor table absent: falls back to defaults
        assert_eq!(config.armor.tiers.len(), 4);
        assert!(config.general.effect_filter.allows("ench_fire", false));
        assert!(!config.general.effect_filter.allows("ench_frost", false));
    }

    #[test]
    fn test_negative_variation_count_rejected() {
        let mut config = Config::default();
        config.weapons.variations_per_item = -1;
        assert!(matches!(config.validate(), Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_empty_tier_list_rejected() {
        let mut config = Config::default();
        config.armor.tiers.clear();
        assert!(matches!(config.validate(), Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = Config::default();
        config.weapons.tiers[0].weight = -5;
        assert!(matches!(config.validate(), Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_zero_weight_sum_rejected() {
        let mut config = Config::default();
        for tier in &mut config.weapons.tiers {
            tier.weight = 0;
        }
        assert!(matches!(config.validate(), Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_distribute_mode_resolves_single_tier() {
        let config = Config::default();
        let tiers = config.weapons.resolved_tiers(GenerationMode::Distribute);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].label, "");
        assert_eq!(tiers[0].enchantments, 1);
        assert_eq!(tiers[0].weight, 100);
    }

    #[test]
    fn test_distribute_mode_ignores_empty_tier_list() {
        let mut config = Config::default();
        config.general.mode = GenerationMode::Distribute;
        config.weapons.tiers.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effect_filter_blacklist_and_restriction() {
        let filter = EffectFilter {
            mode: FilterMode::Blacklist,
            effects: ["ench_doom".to_owned()].into_iter().collect(),
            exclude_restricted: true,
        };
        assert!(filter.allows("ench_fire", false));
        assert!(!filter.allows("ench_doom", false));
        assert!(!filter.allows("ench_fire", true));
    }
}
