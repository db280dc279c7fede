pub mod catalog;
pub mod sampler;

pub use catalog::{EffectCatalog, ResolvedEnchantment, ResolvedOccurrence};
pub use sampler::EnchantmentPool;
