//! Compound records and per-element bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use adit_core::ContentAddressable;

/// Per-element atom counts, keyed by element symbol.
///
/// Counts are signed: the implicit-hydrogen charge correction applied when
/// balancing half-reactions can push the `H` entry below zero transiently.
pub type ElementCounts = BTreeMap<String, i64>;

/// Add `from` into `into`, scaled by `coeff`.
pub fn add_counts(into: &mut ElementCounts, from: &ElementCounts, coeff: i64) {
    for (element, n) in from {
        *into.entry(element.clone()).or_insert(0) += n * coeff;
    }
}

/// Element-wise equality, treating absent entries as zero.
pub fn counts_balanced(left: &ElementCounts, right: &ElementCounts) -> bool {
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .all(|k| left.get(k).copied().unwrap_or(0) == right.get(k).copied().unwrap_or(0))
}

/// How a compound entered the network.
///
/// The role partitions the identity-key space: two compounds with the same
/// canonical notation but different roles get distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompoundRole {
    /// A fixed cofactor bound to a non-wildcard rule slot.
    Coreactant,
    /// A starting compound supplied by the caller (generation 0).
    Seed,
    /// A compound discovered during expansion.
    Predicted,
}

impl CompoundRole {
    /// The single-character tag prepended to identity keys of this role.
    pub fn key_prefix(self) -> char {
        match self {
            CompoundRole::Coreactant => 'X',
            CompoundRole::Seed => 'S',
            CompoundRole::Predicted => 'C',
        }
    }
}

impl std::fmt::Display for CompoundRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompoundRole::Coreactant => "coreactant",
            CompoundRole::Seed => "seed",
            CompoundRole::Predicted => "predicted",
        };
        write!(f, "{s}")
    }
}

/// A compound record owned by the network store.
///
/// Records are created once, on first discovery, and only ever extended
/// afterward: the back-reference sets accumulate, nothing else changes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Compound {
    /// Role-prefixed content hash of the canonical notation.
    pub id: String,
    /// Canonical structural notation as produced by the structure engine.
    pub notation: String,
    pub role: CompoundRole,
    /// Generation of first discovery; seeds and coreactants are 0.
    pub generation: u32,
    pub atom_counts: ElementCounts,
    pub formula: String,
    /// Net formal charge.
    pub charge: i32,
    /// Whether this compound is still eligible to seed future rule applications.
    pub expandable: bool,
    /// Ids of reactions producing this compound.
    pub produced_by: BTreeSet<String>,
    /// Ids of reactions consuming this compound.
    pub consumed_by: BTreeSet<String>,
}

impl ContentAddressable for Compound {
    fn content_key(&self) -> String {
        self.id.clone()
    }
}
