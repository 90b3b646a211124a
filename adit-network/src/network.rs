//! The shared compound/reaction graph store and the delta merge protocol.
//!
//! The store is the single piece of mutable shared state in an expansion run.
//! Workers never touch it; they produce [`ExpansionDelta`]s that the
//! orchestrator folds in sequentially. The merge is commutative and
//! associative — insert-if-absent for records, set union for operator names
//! and back-references — so the final store content does not depend on chunk
//! size, completion order, or worker count.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use adit_core::{AditError, Result, Summarizable};

use crate::apply::ApplyStats;
use crate::compound::Compound;
use crate::reaction::Reaction;

/// Compounds and reactions discovered by one unit of work, prior to merging.
#[derive(Debug, Clone, Default)]
pub struct ExpansionDelta {
    pub compounds: BTreeMap<String, Compound>,
    pub reactions: BTreeMap<String, Reaction>,
    pub stats: ApplyStats,
}

impl ExpansionDelta {
    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty() && self.reactions.is_empty()
    }

    /// Fold another delta into this one.
    ///
    /// Worker-local counterpart of [`ReactionNetwork::absorb`]: first record
    /// wins for compounds, operator sets union for duplicate reactions. No
    /// integrity checking happens here; that is the store's job.
    pub fn merge(&mut self, other: ExpansionDelta) {
        for (id, compound) in other.compounds {
            self.compounds.entry(id).or_insert(compound);
        }
        for (id, reaction) in other.reactions {
            match self.reactions.entry(id) {
                Entry::Occupied(mut e) => {
                    e.get_mut().operators.extend(reaction.operators);
                }
                Entry::Vacant(v) => {
                    v.insert(reaction);
                }
            }
        }
        self.stats.absorb(&other.stats);
    }
}

/// Counts of records newly inserted by one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub compounds_added: usize,
    pub reactions_added: usize,
}

/// The accumulating compound/reaction graph.
///
/// Records are arena entries keyed by identity; cross-references between
/// compounds and reactions are always ids, never pointers.
#[derive(Debug, Clone, Default)]
pub struct ReactionNetwork {
    pub compounds: BTreeMap<String, Compound>,
    pub reactions: BTreeMap<String, Reaction>,
}

impl ReactionNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compound_count(&self) -> usize {
        self.compounds.len()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    pub fn get_compound(&self, id: &str) -> Option<&Compound> {
        self.compounds.get(id)
    }

    pub fn get_reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.get(id)
    }

    /// Insert a compound, idempotently.
    ///
    /// A record already present is left structurally untouched; only its
    /// back-reference sets are unioned with the incoming ones. The generation
    /// of first discovery therefore sticks. Returns whether the record was new.
    pub fn add_compound(&mut self, compound: Compound) -> bool {
        match self.compounds.entry(compound.id.clone()) {
            Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                existing.produced_by.extend(compound.produced_by);
                existing.consumed_by.extend(compound.consumed_by);
                false
            }
            Entry::Vacant(v) => {
                v.insert(compound);
                true
            }
        }
    }

    /// Insert a reaction, idempotently, wiring compound back-references.
    ///
    /// A record already present under the same id must carry identical
    /// participant lists — the identity key is derived from them — and only
    /// its operator set is unioned. A mismatch means two different reactions
    /// hashed to one key, which is corruption, not a mergeable state.
    /// Returns whether the record was new.
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<bool> {
        if let Some(existing) = self.reactions.get_mut(&reaction.id) {
            if existing.reactants != reaction.reactants || existing.products != reaction.products {
                return Err(AditError::Integrity(format!(
                    "reaction {} merged with conflicting participant lists",
                    reaction.id
                )));
            }
            existing.operators.extend(reaction.operators);
            return Ok(false);
        }

        for entry in &reaction.reactants {
            let compound = self.compounds.get_mut(&entry.compound_id).ok_or_else(|| {
                AditError::Integrity(format!(
                    "reaction {} references unknown reactant {}",
                    reaction.id, entry.compound_id
                ))
            })?;
            compound.consumed_by.insert(reaction.id.clone());
        }
        for entry in &reaction.products {
            let compound = self.compounds.get_mut(&entry.compound_id).ok_or_else(|| {
                AditError::Integrity(format!(
                    "reaction {} references unknown product {}",
                    reaction.id, entry.compound_id
                ))
            })?;
            compound.produced_by.insert(reaction.id.clone());
        }
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(true)
    }

    /// Fold a worker delta into the store: compounds first, then reactions.
    pub fn absorb(&mut self, delta: ExpansionDelta) -> Result<MergeOutcome> {
        let mut outcome = MergeOutcome::default();
        for (_, compound) in delta.compounds {
            if self.add_compound(compound) {
                outcome.compounds_added += 1;
            }
        }
        for (_, reaction) in delta.reactions {
            if self.add_reaction(reaction)? {
                outcome.reactions_added += 1;
            }
        }
        Ok(outcome)
    }

    /// The expandable compounds of a generation, in id order.
    pub fn frontier(&self, generation: u32) -> Vec<&Compound> {
        self.compounds
            .values()
            .filter(|c| c.expandable && c.generation == generation)
            .collect()
    }
}

impl Summarizable for ReactionNetwork {
    fn summary(&self) -> String {
        format!(
            "{} compounds, {} reactions",
            self.compounds.len(),
            self.reactions.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::CompoundRole;
    use crate::reaction::StoichEntry;
    use std::collections::BTreeSet;

    fn compound(id: &str, generation: u32, expandable: bool) -> Compound {
        Compound {
            id: id.to_string(),
            notation: format!("mol-{id}"),
            role: CompoundRole::Predicted,
            generation,
            atom_counts: Default::default(),
            formula: String::new(),
            charge: 0,
            expandable,
            produced_by: BTreeSet::new(),
            consumed_by: BTreeSet::new(),
        }
    }

    fn reaction(id: &str, reactant: &str, product: &str, operator: &str) -> Reaction {
        Reaction {
            id: id.to_string(),
            reactants: vec![StoichEntry {
                coeff: 1,
                compound_id: reactant.to_string(),
            }],
            products: vec![StoichEntry {
                coeff: 1,
                compound_id: product.to_string(),
            }],
            operators: BTreeSet::from([operator.to_string()]),
            text: String::new(),
        }
    }

    #[test]
    fn compound_insert_is_idempotent() {
        let mut network = ReactionNetwork::new();
        assert!(network.add_compound(compound("Ca", 1, true)));

        // Re-insert at a later generation: first discovery sticks.
        let mut later = compound("Ca", 3, true);
        later.produced_by.insert("R1".into());
        assert!(!network.add_compound(later));

        let stored = network.get_compound("Ca").unwrap();
        assert_eq!(stored.generation, 1);
        assert!(stored.produced_by.contains("R1"));
    }

    #[test]
    fn reaction_backrefs_are_wired_on_insert() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        network.add_compound(compound("Cb", 1, true));
        assert!(network.add_reaction(reaction("R1", "Ca", "Cb", "op-a")).unwrap());

        assert!(network.get_compound("Ca").unwrap().consumed_by.contains("R1"));
        assert!(network.get_compound("Cb").unwrap().produced_by.contains("R1"));
    }

    #[test]
    fn duplicate_reaction_unions_operators() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        network.add_compound(compound("Cb", 1, true));
        network.add_reaction(reaction("R1", "Ca", "Cb", "op-a")).unwrap();
        let added = network.add_reaction(reaction("R1", "Ca", "Cb", "op-b")).unwrap();
        assert!(!added);

        let ops = &network.get_reaction("R1").unwrap().operators;
        assert_eq!(ops.len(), 2);
        assert!(ops.contains("op-a") && ops.contains("op-b"));
    }

    #[test]
    fn conflicting_reaction_lists_are_fatal() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        network.add_compound(compound("Cb", 1, true));
        network.add_compound(compound("Cc", 1, true));
        network.add_reaction(reaction("R1", "Ca", "Cb", "op-a")).unwrap();

        let conflicting = reaction("R1", "Ca", "Cc", "op-a");
        let err = network.add_reaction(conflicting).unwrap_err();
        assert!(matches!(err, AditError::Integrity(_)));
    }

    #[test]
    fn reaction_with_unknown_participant_is_fatal() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        let err = network.add_reaction(reaction("R1", "Ca", "Cmissing", "op")).unwrap_err();
        assert!(matches!(err, AditError::Integrity(_)));
    }

    #[test]
    fn frontier_filters_on_generation_and_flag() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        network.add_compound(compound("Cb", 1, true));
        network.add_compound(compound("Cc", 1, false));
        network.add_compound(compound("Cd", 2, true));

        let ids: Vec<&str> = network.frontier(1).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Cb"]);
    }

    #[test]
    fn summary_reports_record_counts() {
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca", 0, true));
        assert_eq!(network.summary(), "1 compounds, 0 reactions");
    }

    #[test]
    fn delta_merge_unions_operators() {
        let mut a = ExpansionDelta::default();
        a.compounds.insert("Cx".into(), compound("Cx", 1, true));
        a.reactions.insert("R1".into(), reaction("R1", "Ca", "Cx", "op-a"));

        let mut b = ExpansionDelta::default();
        b.compounds.insert("Cx".into(), compound("Cx", 1, true));
        b.reactions.insert("R1".into(), reaction("R1", "Ca", "Cx", "op-b"));

        a.merge(b);
        assert_eq!(a.compounds.len(), 1);
        assert_eq!(a.reactions.len(), 1);
        assert_eq!(a.reactions["R1"].operators.len(), 2);
    }
}
