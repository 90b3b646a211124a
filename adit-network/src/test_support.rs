//! Table-driven structure engine and fixtures for tests and benches.
//!
//! [`ToyEngine`] satisfies [`StructureEngine`] from lookup tables alone:
//! notations are their own structures, transforms are keyed by reactant
//! tuple, and atom counts come from a registry. Everything is deterministic,
//! which makes it the right backend for exercising the expansion machinery
//! without a chemistry toolkit.

use std::collections::{BTreeMap, BTreeSet};

use adit_core::{AditError, Result};

use crate::compound::{Compound, CompoundRole, ElementCounts};
use crate::identity::IdentityHasher;
use crate::rule::{CoreactantSet, ReactionRule, Slot};
use crate::structure::StructureEngine;

/// Pyruvate-like seed used by both fixtures.
pub const SEED: &str = "CCC(=O)C(=O)O";
/// ATP coreactant notation.
pub const ATP: &str = "Nc1ncnc2c1ncn2C1OC(COP(=O)(O)OP(=O)(O)OP(=O)(O)O)C(O)C1O";
/// ADP coreactant notation.
pub const ADP: &str = "Nc1ncnc2c1ncn2C1OC(COP(=O)(O)OP(=O)(O)O)C(O)C1O";

/// A deterministic, table-driven structure backend.
#[derive(Debug, Clone, Default)]
pub struct ToyEngine {
    transforms: BTreeMap<(String, Vec<String>), Vec<Vec<String>>>,
    atoms: BTreeMap<String, ElementCounts>,
    charges: BTreeMap<String, i32>,
    canonical: BTreeMap<String, String>,
    variants: BTreeMap<String, Vec<String>>,
    invalid: BTreeSet<String>,
}

impl ToyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compound's atom counts and formal charge.
    pub fn with_compound(mut self, notation: &str, atoms: &[(&str, i64)], charge: i32) -> Self {
        self.atoms.insert(
            notation.to_string(),
            atoms.iter().map(|(e, n)| (e.to_string(), *n)).collect(),
        );
        if charge != 0 {
            self.charges.insert(notation.to_string(), charge);
        }
        self
    }

    /// Map a raw spelling onto its canonical notation.
    pub fn with_canonical(mut self, raw: &str, canonical: &str) -> Self {
        self.canonical.insert(raw.to_string(), canonical.to_string());
        self
    }

    /// Register the product tuples a transform yields for a reactant tuple.
    pub fn with_transform(
        mut self,
        transform: &str,
        reactants: &[&str],
        products: &[&[&str]],
    ) -> Self {
        let key = (
            transform.to_string(),
            reactants.iter().map(|r| self.canon_of(r)).collect(),
        );
        let tuples = products
            .iter()
            .map(|tuple| tuple.iter().map(|p| p.to_string()).collect())
            .collect();
        self.transforms.insert(key, tuples);
        self
    }

    /// Register the stereoisomer variants enumerated for a product.
    pub fn with_variants(mut self, notation: &str, variants: &[&str]) -> Self {
        self.variants.insert(
            notation.to_string(),
            variants.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Mark a notation as unparsable.
    pub fn with_invalid(mut self, notation: &str) -> Self {
        self.invalid.insert(notation.to_string());
        self
    }

    fn canon_of(&self, notation: &str) -> String {
        self.canonical
            .get(notation)
            .cloned()
            .unwrap_or_else(|| notation.to_string())
    }
}

fn atomic_mass(symbol: &str) -> f64 {
    match symbol {
        "H" => 1.00783,
        "C" => 12.0,
        "N" => 14.00307,
        "O" => 15.99491,
        "P" => 30.97376,
        "S" => 31.97207,
        _ => 0.0,
    }
}

/// Hill-order formula: C first, then H, then the rest alphabetically.
fn formula_from_counts(counts: &ElementCounts) -> String {
    let mut formula = String::new();
    let mut push = |symbol: &str, count: i64| {
        if count <= 0 {
            return;
        }
        formula.push_str(symbol);
        if count > 1 {
            formula.push_str(&count.to_string());
        }
    };
    if let Some(&c) = counts.get("C") {
        push("C", c);
        if let Some(&h) = counts.get("H") {
            push("H", h);
        }
    }
    for (symbol, &count) in counts {
        if symbol == "C" || (symbol == "H" && counts.contains_key("C")) {
            continue;
        }
        push(symbol, count);
    }
    formula
}

impl StructureEngine for ToyEngine {
    type Mol = String;

    fn parse(&self, notation: &str) -> Result<String> {
        if notation.is_empty() || self.invalid.contains(notation) {
            return Err(AditError::Engine(format!("unparsable notation {notation}")));
        }
        Ok(notation.to_string())
    }

    fn canonical(&self, mol: &String) -> Result<String> {
        if self.invalid.contains(mol) {
            return Err(AditError::Engine(format!("unprocessable structure {mol}")));
        }
        Ok(self.canon_of(mol))
    }

    fn apply_transform(
        &self,
        transform: &str,
        reactants: &[String],
        limit: usize,
    ) -> Result<Vec<Vec<String>>> {
        let key = (
            transform.to_string(),
            reactants.iter().map(|r| self.canon_of(r)).collect(),
        );
        let mut sets = self.transforms.get(&key).cloned().unwrap_or_default();
        sets.truncate(limit);
        Ok(sets)
    }

    fn atom_counts(&self, mol: &String) -> Result<ElementCounts> {
        self.atoms
            .get(&self.canon_of(mol))
            .cloned()
            .ok_or_else(|| AditError::Engine(format!("no atom table for {mol}")))
    }

    fn formula(&self, mol: &String) -> Result<String> {
        Ok(formula_from_counts(&self.atom_counts(mol)?))
    }

    fn exact_mass(&self, mol: &String) -> Result<f64> {
        Ok(self
            .atom_counts(mol)?
            .iter()
            .map(|(symbol, count)| atomic_mass(symbol) * *count as f64)
            .sum())
    }

    fn formal_charge(&self, mol: &String) -> Result<i32> {
        Ok(self.charges.get(&self.canon_of(mol)).copied().unwrap_or(0))
    }

    fn matches_pattern(&self, mol: &String, pattern: &str) -> Result<bool> {
        Ok(mol.contains(pattern))
    }

    fn stereo_variants(&self, mol: &String) -> Result<Vec<String>> {
        Ok(self
            .variants
            .get(&self.canon_of(mol))
            .cloned()
            .unwrap_or_else(|| vec![mol.clone()]))
    }
}

/// Build a generation-0 seed record from the engine's tables.
pub fn seed_record(engine: &ToyEngine, hasher: &IdentityHasher, notation: &str) -> Compound {
    let (atom_counts, formula, charge) = match engine.parse(notation) {
        Ok(mol) => (
            engine.atom_counts(&mol).unwrap_or_default(),
            engine.formula(&mol).unwrap_or_default(),
            engine.formal_charge(&mol).unwrap_or(0),
        ),
        Err(_) => (ElementCounts::new(), String::new(), 0),
    };
    Compound {
        id: hasher.compound_key(CompoundRole::Seed, notation),
        notation: notation.to_string(),
        role: CompoundRole::Seed,
        generation: 0,
        atom_counts,
        formula,
        charge,
        expandable: true,
        produced_by: Default::default(),
        consumed_by: Default::default(),
    }
}

/// Single-rule, single-seed fixture: the seed cleaves into lactaldehyde-like
/// `A` plus carbon monoxide. `A` carries one unassigned center, so variant
/// enumeration splits it into two isomers sharing the co-product.
///
/// Expected counts for one generation: 2 compounds / 1 reaction, or
/// 3 compounds / 2 reactions with variant enumeration on.
pub fn lyase_fixture() -> (
    ToyEngine,
    IdentityHasher,
    Vec<ReactionRule>,
    CoreactantSet<String>,
    Compound,
) {
    const A: &str = "CC(O)C=O";
    const A_R: &str = "C[C@H](O)C=O";
    const A_S: &str = "C[C@@H](O)C=O";
    const B: &str = "[C-]#[O+]";

    let a_atoms: &[(&str, i64)] = &[("C", 3), ("H", 6), ("O", 2)];
    let engine = ToyEngine::new()
        .with_compound(SEED, &[("C", 4), ("H", 6), ("O", 3)], 0)
        .with_compound(A, a_atoms, 0)
        .with_compound(A_R, a_atoms, 0)
        .with_compound(A_S, a_atoms, 0)
        .with_compound(B, &[("C", 1), ("O", 1)], 0)
        .with_transform("carbonyl-lyase", &[SEED], &[&[A, B]])
        .with_variants(A, &[A_R, A_S]);

    let hasher = IdentityHasher::passthrough();
    let rules = vec![ReactionRule {
        name: "carbonyl-lyase".into(),
        reactants: vec![Slot::Wildcard],
        products: vec![Slot::Wildcard, Slot::Wildcard],
        transform: "carbonyl-lyase".into(),
    }];
    let coreactants = CoreactantSet::new();
    let seed = seed_record(&engine, &hasher, SEED);
    (engine, hasher, rules, coreactants, seed)
}

/// ATP/ADP phosphate-transfer fixture over the same seed.
///
/// The seed phosphorylates at three sites; each mono-phosphorylated product
/// phosphorylates at the two remaining sites, with one route pair collapsing
/// to a shared structure. Two generations therefore reach 10 compounds
/// (seed, ATP, ADP, 3 singles, 4 doubles) connected by 9 reactions.
pub fn phosphorylation_fixture() -> (
    ToyEngine,
    IdentityHasher,
    Vec<ReactionRule>,
    CoreactantSet<String>,
    Compound,
) {
    const PA: &str = "CCC(=O)C(=O)OP(=O)(O)O";
    const PB: &str = "CC=C(OP(=O)(O)O)C(=O)O";
    const PC: &str = "CCC(OP(=O)(O)O)=C(O)O";
    const PAB: &str = "CC=C(OP(=O)(O)O)C(=O)OP(=O)(O)O";
    const PAC: &str = "CCC(OP(=O)(O)O)=C(O)OP(=O)(O)O";
    const PBC: &str = "CC=C(OP(=O)(O)O)C(O)(O)OP(=O)(O)O";
    const PCB: &str = "OC(=O)C(OP(=O)(O)O)=CCOP(=O)(O)O";

    let single: &[(&str, i64)] = &[("C", 4), ("H", 7), ("O", 6), ("P", 1)];
    let double: &[(&str, i64)] = &[("C", 4), ("H", 8), ("O", 9), ("P", 2)];

    let engine = ToyEngine::new()
        .with_compound(SEED, &[("C", 4), ("H", 6), ("O", 3)], 0)
        .with_compound(
            ATP,
            &[("C", 10), ("H", 16), ("N", 5), ("O", 13), ("P", 3)],
            0,
        )
        .with_compound(
            ADP,
            &[("C", 10), ("H", 15), ("N", 5), ("O", 10), ("P", 2)],
            0,
        )
        .with_compound(PA, single, 0)
        .with_compound(PB, single, 0)
        .with_compound(PC, single, 0)
        .with_compound(PAB, double, 0)
        .with_compound(PAC, double, 0)
        .with_compound(PBC, double, 0)
        .with_compound(PCB, double, 0)
        .with_transform(
            "phosphate-transfer",
            &[ATP, SEED],
            &[&[ADP, PA], &[ADP, PB], &[ADP, PC]],
        )
        .with_transform("phosphate-transfer", &[ATP, PA], &[&[ADP, PAB], &[ADP, PAC]])
        .with_transform("phosphate-transfer", &[ATP, PB], &[&[ADP, PAB], &[ADP, PBC]])
        .with_transform("phosphate-transfer", &[ATP, PC], &[&[ADP, PAC], &[ADP, PCB]]);

    let hasher = IdentityHasher::passthrough();
    let rules = vec![ReactionRule {
        name: "phosphate-transfer".into(),
        reactants: vec![Slot::Coreactant("ATP".into()), Slot::Wildcard],
        products: vec![Slot::Coreactant("ADP".into()), Slot::Wildcard],
        transform: "phosphate-transfer".into(),
    }];
    let coreactants = CoreactantSet::build(
        &[
            ("ATP".to_string(), ATP.to_string()),
            ("ADP".to_string(), ADP.to_string()),
        ],
        &engine,
        &hasher,
    )
    .expect("fixture coreactants resolve");
    let seed = seed_record(&engine, &hasher, SEED);
    (engine, hasher, rules, coreactants, seed)
}
