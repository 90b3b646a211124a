//! Identifier reconciliation after re-canonicalization.
//!
//! A stricter canonicalization pass (typically on the way to persistent
//! storage) can assign a compound a different content hash than the one used
//! during expansion. Before such a record is persisted its id must change,
//! and every reaction that references the old id has to be rewritten so
//! nothing is left pointing at a dangling identifier.

use adit_core::{AditError, Result};

use crate::network::ReactionNetwork;

/// Rewrite a compound's id and every reaction entry that references it.
///
/// Reactions are found through the compound's own back-reference sets; a
/// back-reference naming a reaction absent from the store means there is
/// nothing to fix and is skipped. Reaction ids and equation text are not
/// re-derived — they remain the handles under which the reactions were
/// discovered. Renaming onto an id that already exists merges the two
/// records' back-references. A no-op when `new_id == old_id`.
pub fn rename_compound(network: &mut ReactionNetwork, old_id: &str, new_id: &str) -> Result<()> {
    if old_id == new_id {
        return Ok(());
    }

    let mut compound = network
        .compounds
        .remove(old_id)
        .ok_or_else(|| AditError::InvalidInput(format!("unknown compound id {old_id}")))?;

    for rxn_id in &compound.produced_by {
        if let Some(rxn) = network.reactions.get_mut(rxn_id) {
            for entry in &mut rxn.products {
                if entry.compound_id == old_id {
                    entry.compound_id = new_id.to_string();
                }
            }
        }
    }
    for rxn_id in &compound.consumed_by {
        if let Some(rxn) = network.reactions.get_mut(rxn_id) {
            for entry in &mut rxn.reactants {
                if entry.compound_id == old_id {
                    entry.compound_id = new_id.to_string();
                }
            }
        }
    }

    compound.id = new_id.to_string();
    network.add_compound(compound);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound::{Compound, CompoundRole};
    use crate::reaction::{Reaction, StoichEntry};
    use std::collections::BTreeSet;

    fn compound(id: &str) -> Compound {
        Compound {
            id: id.to_string(),
            notation: format!("mol-{id}"),
            role: CompoundRole::Predicted,
            generation: 1,
            atom_counts: Default::default(),
            formula: String::new(),
            charge: 0,
            expandable: true,
            produced_by: BTreeSet::new(),
            consumed_by: BTreeSet::new(),
        }
    }

    fn network_with_chain() -> ReactionNetwork {
        // Ca -> Cb -> Cc, so Cb is both produced and consumed.
        let mut network = ReactionNetwork::new();
        network.add_compound(compound("Ca"));
        network.add_compound(compound("Cb"));
        network.add_compound(compound("Cc"));
        for (id, from, to) in [("R1", "Ca", "Cb"), ("R2", "Cb", "Cc")] {
            network
                .add_reaction(Reaction {
                    id: id.to_string(),
                    reactants: vec![StoichEntry {
                        coeff: 1,
                        compound_id: from.to_string(),
                    }],
                    products: vec![StoichEntry {
                        coeff: 1,
                        compound_id: to.to_string(),
                    }],
                    operators: BTreeSet::new(),
                    text: String::new(),
                })
                .unwrap();
        }
        network
    }

    #[test]
    fn rename_rewrites_both_directions() {
        let mut network = network_with_chain();
        rename_compound(&mut network, "Cb", "Cb2").unwrap();

        assert!(network.get_compound("Cb").is_none());
        let renamed = network.get_compound("Cb2").unwrap();
        assert_eq!(renamed.produced_by, BTreeSet::from(["R1".to_string()]));
        assert_eq!(renamed.consumed_by, BTreeSet::from(["R2".to_string()]));

        // No reaction anywhere still references the old id.
        for rxn in network.reactions.values() {
            assert!(!rxn.references("Cb"));
        }
        assert_eq!(
            network.get_reaction("R1").unwrap().products[0].compound_id,
            "Cb2"
        );
        assert_eq!(
            network.get_reaction("R2").unwrap().reactants[0].compound_id,
            "Cb2"
        );
    }

    #[test]
    fn rename_to_same_id_is_a_noop() {
        let mut network = network_with_chain();
        let before = network.clone();
        rename_compound(&mut network, "Cb", "Cb").unwrap();
        assert_eq!(network.compounds, before.compounds);
        assert_eq!(network.reactions, before.reactions);
    }

    #[test]
    fn rename_unknown_compound_is_an_error() {
        let mut network = network_with_chain();
        assert!(rename_compound(&mut network, "Cmissing", "Cx").is_err());
    }

    #[test]
    fn stale_backreference_is_skipped() {
        let mut network = network_with_chain();
        network
            .compounds
            .get_mut("Cb")
            .unwrap()
            .produced_by
            .insert("Rgone".to_string());

        rename_compound(&mut network, "Cb", "Cb2").unwrap();
        assert!(network.get_compound("Cb2").is_some());
    }

    #[test]
    fn rename_onto_existing_id_merges_backrefs() {
        let mut network = network_with_chain();
        network.add_compound(compound("Cmerged"));
        rename_compound(&mut network, "Cb", "Cmerged").unwrap();

        let merged = network.get_compound("Cmerged").unwrap();
        assert!(merged.produced_by.contains("R1"));
        assert!(merged.consumed_by.contains("R2"));
    }
}
