//! Reaction records.

use std::collections::BTreeSet;

use adit_core::ContentAddressable;

/// One side entry of a reaction: stoichiometric coefficient plus compound id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoichEntry {
    pub coeff: u32,
    pub compound_id: String,
}

/// A reaction record owned by the network store.
///
/// Entry lists are kept sorted by compound id, which makes them directly
/// comparable across independently constructed records with the same identity
/// key. The operator set records every rule that independently produced this
/// exact reaction; it is union-merged, never overwritten.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reaction {
    /// Content hash of the sorted `(coeff, id)` multiset of both sides.
    pub id: String,
    pub reactants: Vec<StoichEntry>,
    pub products: Vec<StoichEntry>,
    /// Names of the rules that produced this reaction.
    pub operators: BTreeSet<String>,
    /// Human-readable equation over structural notations.
    pub text: String,
}

impl Reaction {
    /// Whether either side references the given compound id.
    pub fn references(&self, compound_id: &str) -> bool {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .any(|e| e.compound_id == compound_id)
    }
}

impl ContentAddressable for Reaction {
    fn content_key(&self) -> String {
        self.id.clone()
    }
}

/// Format an equation string from `(coeff, notation)` pairs.
///
/// Entries are emitted in the order given; callers pass them sorted by
/// compound id so the text is stable across discovery order.
pub fn equation_text(reactants: &[(u32, &str)], products: &[(u32, &str)]) -> String {
    fn side(entries: &[(u32, &str)]) -> String {
        entries
            .iter()
            .map(|(coeff, notation)| format!("({coeff}) {notation}"))
            .collect::<Vec<_>>()
            .join(" + ")
    }
    format!("{} => {}", side(reactants), side(products))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equation_text_format() {
        let text = equation_text(&[(1, "CCO"), (2, "O")], &[(1, "CC=O")]);
        assert_eq!(text, "(1) CCO + (2) O => (1) CC=O");
    }

    #[test]
    fn references_checks_both_sides() {
        let rxn = Reaction {
            id: "R1".into(),
            reactants: vec![StoichEntry {
                coeff: 1,
                compound_id: "Ca".into(),
            }],
            products: vec![StoichEntry {
                coeff: 1,
                compound_id: "Cb".into(),
            }],
            operators: BTreeSet::new(),
            text: String::new(),
        };
        assert!(rxn.references("Ca"));
        assert!(rxn.references("Cb"));
        assert!(!rxn.references("Cc"));
        assert_eq!(rxn.content_key(), "R1");
    }
}
