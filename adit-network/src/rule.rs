//! Transformation rules and the coreactant dictionary.

use std::collections::BTreeMap;

use adit_core::{AditError, Result};

use crate::compound::{Compound, CompoundRole};
use crate::identity::IdentityHasher;
use crate::structure::StructureEngine;

/// The conventional wildcard token in rule files.
pub const WILDCARD_TOKEN: &str = "Any";

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One position in a rule's reactant or product pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    /// An open position, bound at application time to the compound under
    /// expansion. Every wildcard in one rule binds the same compound.
    Wildcard,
    /// A fixed position resolved through the coreactant dictionary.
    Coreactant(String),
}

impl Slot {
    /// Parse a role token from a rule file.
    pub fn from_token(token: &str) -> Slot {
        if token == WILDCARD_TOKEN {
            Slot::Wildcard
        } else {
            Slot::Coreactant(token.to_string())
        }
    }
}

/// A transformation rule: slot patterns for both sides plus the transform
/// text the structure engine executes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionRule {
    pub name: String,
    pub reactants: Vec<Slot>,
    pub products: Vec<Slot>,
    pub transform: String,
}

impl ReactionRule {
    /// Number of wildcard positions on the reactant side.
    pub fn wildcard_reactants(&self) -> usize {
        self.reactants
            .iter()
            .filter(|s| matches!(s, Slot::Wildcard))
            .count()
    }

    /// All fixed coreactant tokens referenced by either side.
    pub fn coreactant_tokens(&self) -> impl Iterator<Item = &str> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .filter_map(|slot| match slot {
                Slot::Coreactant(token) => Some(token.as_str()),
                Slot::Wildcard => None,
            })
    }
}

// ---------------------------------------------------------------------------
// Coreactant dictionary
// ---------------------------------------------------------------------------

/// A resolved coreactant: its network record plus the parsed structure handed
/// to the engine when the token appears in a reactant slot.
#[derive(Debug, Clone)]
pub struct CoreactantEntry<M> {
    pub compound: Compound,
    pub mol: M,
}

/// Token → resolved coreactant mapping, loaded once before expansion and
/// immutable afterward.
#[derive(Debug, Clone, Default)]
pub struct CoreactantSet<M> {
    entries: BTreeMap<String, CoreactantEntry<M>>,
}

impl<M> CoreactantSet<M> {
    pub fn new() -> Self {
        CoreactantSet {
            entries: BTreeMap::new(),
        }
    }

    /// Resolve `(token, notation)` pairs into records through the engine.
    ///
    /// Coreactants must parse: a failure here is a configuration error, not a
    /// per-candidate one.
    pub fn build<E>(pairs: &[(String, String)], engine: &E, hasher: &IdentityHasher) -> Result<Self>
    where
        E: StructureEngine<Mol = M>,
    {
        let mut set = CoreactantSet::new();
        for (token, notation) in pairs {
            let mol = engine
                .parse(notation)
                .map_err(|e| AditError::InvalidInput(format!("coreactant {token}: {e}")))?;
            let canonical = engine.canonical(&mol)?;
            let compound = Compound {
                id: hasher.compound_key(CompoundRole::Coreactant, &canonical),
                notation: canonical,
                role: CompoundRole::Coreactant,
                generation: 0,
                atom_counts: engine.atom_counts(&mol)?,
                formula: engine.formula(&mol)?,
                charge: engine.formal_charge(&mol)?,
                expandable: false,
                produced_by: Default::default(),
                consumed_by: Default::default(),
            };
            set.insert(token.clone(), compound, mol);
        }
        Ok(set)
    }

    pub fn insert(&mut self, token: String, compound: Compound, mol: M) {
        self.entries.insert(token, CoreactantEntry { compound, mol });
    }

    pub fn get(&self, token: &str) -> Option<&CoreactantEntry<M>> {
        self.entries.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// The coreactant records, in token order.
    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.entries.values().map(|e| &e.compound)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_token_parses_to_wildcard() {
        assert_eq!(Slot::from_token("Any"), Slot::Wildcard);
        assert_eq!(Slot::from_token("ATP"), Slot::Coreactant("ATP".into()));
    }

    #[test]
    fn coreactant_tokens_cover_both_sides() {
        let rule = ReactionRule {
            name: "phosphate-transfer".into(),
            reactants: vec![Slot::Coreactant("ATP".into()), Slot::Wildcard],
            products: vec![Slot::Coreactant("ADP".into()), Slot::Wildcard],
            transform: "t".into(),
        };
        let tokens: Vec<&str> = rule.coreactant_tokens().collect();
        assert_eq!(tokens, vec!["ATP", "ADP"]);
        assert_eq!(rule.wildcard_reactants(), 1);
    }
}
