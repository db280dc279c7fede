//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Stable identifier for corpus and generated records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Which equipment family an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearKind {
    Weapon,
    Armor,
}

/// Derive a per-family RNG seed from the global seed.
///
/// Folds the family label into the seed with FNV-1a so each pipeline gets
/// an independent, reproducible stream regardless of thread scheduling.
pub fn family_seed(seed: u64, label: &str) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for b in label.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}
