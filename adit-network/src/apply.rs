//! Rule application: one rule, one bound candidate, one local delta.
//!
//! Applying a rule resolves its reactant slots (wildcards bind the candidate,
//! fixed slots come from the coreactant dictionary), executes the transform,
//! and screens every candidate product tuple: products that fail to
//! canonicalize or come out disconnected drop the tuple, tuples that leave a
//! reactant unchanged are degenerate, and tuples that do not conserve atoms
//! element-for-element are rejected. Anything chemical that goes wrong is
//! contained at the scope of a single candidate; nothing here aborts a batch.
//!
//! `apply_rule` is referentially transparent: repeated calls with the same
//! rule, candidate, and generation produce deltas that merge to a no-op.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::compound::{add_counts, counts_balanced, Compound, CompoundRole, ElementCounts};
use crate::expand::ExpansionConfig;
use crate::identity::IdentityHasher;
use crate::network::ExpansionDelta;
use crate::reaction::{equation_text, Reaction, StoichEntry};
use crate::rule::{CoreactantSet, ReactionRule, Slot};
use crate::structure::StructureEngine;

/// Counters for screened-out candidates, reported per generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Candidate product tuples examined.
    pub tuples: u64,
    /// Tuples accepted into the delta.
    pub accepted: u64,
    /// Whole rule applications abandoned (unparsable candidate, transform
    /// failure, unresolvable slot).
    pub failed_applications: u64,
    /// Tuples dropped because a product failed to canonicalize, was
    /// disconnected, or had the wrong arity.
    pub invalid_products: u64,
    /// Tuples rejected because a reactant survived unchanged on the product side.
    pub self_maps: u64,
    /// Tuples rejected by the element conservation check.
    pub unbalanced: u64,
}

impl ApplyStats {
    pub fn absorb(&mut self, other: &ApplyStats) {
        self.tuples += other.tuples;
        self.accepted += other.accepted;
        self.failed_applications += other.failed_applications;
        self.invalid_products += other.invalid_products;
        self.self_maps += other.self_maps;
        self.unbalanced += other.unbalanced;
    }

    /// Total tuples screened out.
    pub fn rejected(&self) -> u64 {
        self.invalid_products + self.self_maps + self.unbalanced
    }
}

/// Apply one rule to one candidate compound bound into its wildcard slots.
///
/// Newly discovered compounds are stamped with `generation`. The returned
/// delta is self-deduplicated: a reaction found twice within this call
/// carries the rule name once, and a product seen twice is one record.
pub fn apply_rule<E: StructureEngine>(
    engine: &E,
    hasher: &IdentityHasher,
    coreactants: &CoreactantSet<E::Mol>,
    rule: &ReactionRule,
    candidate: &Compound,
    generation: u32,
    config: &ExpansionConfig,
) -> ExpansionDelta {
    let mut delta = ExpansionDelta::default();

    let mol = match prepare_candidate(engine, candidate, config) {
        Ok(mol) => mol,
        Err(e) => {
            debug!(rule = %rule.name, candidate = %candidate.id, error = %e, "candidate preparation failed");
            delta.stats.failed_applications += 1;
            return delta;
        }
    };

    // Resolve every reactant slot to a concrete structure and record. The
    // guard set carries structure-level (predicted-role) keys for wildcard
    // slots so that a candidate reproduced unchanged on the product side is
    // recognized whatever role the candidate record itself carries.
    let mut reactant_mols: Vec<E::Mol> = Vec::with_capacity(rule.reactants.len());
    let mut reactant_occurrences: Vec<(&str, &str, &ElementCounts, i32)> = Vec::new();
    let mut guard_ids: BTreeSet<String> = BTreeSet::new();
    for slot in &rule.reactants {
        match slot {
            Slot::Wildcard => {
                reactant_mols.push(mol.clone());
                reactant_occurrences.push((
                    &candidate.id,
                    &candidate.notation,
                    &candidate.atom_counts,
                    candidate.charge,
                ));
                guard_ids.insert(hasher.compound_key(CompoundRole::Predicted, &candidate.notation));
            }
            Slot::Coreactant(token) => match coreactants.get(token) {
                Some(entry) => {
                    reactant_mols.push(entry.mol.clone());
                    reactant_occurrences.push((
                        &entry.compound.id,
                        &entry.compound.notation,
                        &entry.compound.atom_counts,
                        entry.compound.charge,
                    ));
                    guard_ids.insert(entry.compound.id.clone());
                }
                None => {
                    debug!(rule = %rule.name, token = %token, "unresolved coreactant token");
                    delta.stats.failed_applications += 1;
                    return delta;
                }
            },
        }
    }

    let (reactant_entries, reactant_atoms) = fold_half(&reactant_occurrences);

    let product_sets =
        match engine.apply_transform(&rule.transform, &reactant_mols, config.max_product_sets) {
            Ok(sets) => sets,
            Err(e) => {
                debug!(rule = %rule.name, candidate = %candidate.id, error = %e, "transform failed");
                delta.stats.failed_applications += 1;
                return delta;
            }
        };

    for set in product_sets {
        let tuples = if config.stereo_variants {
            variant_tuples(engine, set, config.max_product_sets)
        } else {
            vec![set]
        };

        for tuple in tuples {
            delta.stats.tuples += 1;

            let half = product_half(
                engine,
                hasher,
                coreactants,
                rule,
                &delta.compounds,
                &tuple,
                generation,
                config,
            );
            let Some((novel, product_entries, product_atoms)) = half else {
                delta.stats.invalid_products += 1;
                continue;
            };

            // Degenerate: the rule fired but a reactant came through unchanged.
            if product_entries
                .iter()
                .any(|(_, id, _)| guard_ids.contains(id.as_str()))
            {
                delta.stats.self_maps += 1;
                continue;
            }

            if !counts_balanced(&reactant_atoms, &product_atoms) {
                delta.stats.unbalanced += 1;
                continue;
            }

            for (id, compound) in novel {
                delta.compounds.entry(id).or_insert(compound);
            }

            let rxn_id = hasher.reaction_key(&id_refs(&reactant_entries), &id_refs(&product_entries));
            match delta.reactions.entry(rxn_id.clone()) {
                Entry::Occupied(mut e) => {
                    e.get_mut().operators.insert(rule.name.clone());
                }
                Entry::Vacant(v) => {
                    let text = equation_text(
                        &notation_refs(&reactant_entries),
                        &notation_refs(&product_entries),
                    );
                    v.insert(Reaction {
                        id: rxn_id,
                        reactants: to_stoich(&reactant_entries),
                        products: to_stoich(&product_entries),
                        operators: BTreeSet::from([rule.name.clone()]),
                        text,
                    });
                }
            }
            delta.stats.accepted += 1;
        }
    }

    delta
}

/// Parse the candidate and apply the configured preparation steps.
fn prepare_candidate<E: StructureEngine>(
    engine: &E,
    candidate: &Compound,
    config: &ExpansionConfig,
) -> adit_core::Result<E::Mol> {
    let mol = engine.parse(&candidate.notation)?;
    let mol = engine.remove_hydrogens(&mol)?;
    let mol = if config.kekulize {
        engine.kekulized(&mol)?
    } else {
        mol
    };
    if config.explicit_hydrogens {
        engine.add_hydrogens(&mol)
    } else {
        Ok(mol)
    }
}

/// Expand a product tuple through per-product stereoisomer variants.
///
/// Cartesian product over each position's variants, truncated at `limit`.
/// An engine failure on a single product falls back to the product itself.
fn variant_tuples<E: StructureEngine>(
    engine: &E,
    tuple: Vec<E::Mol>,
    limit: usize,
) -> Vec<Vec<E::Mol>> {
    let mut result: Vec<Vec<E::Mol>> = vec![Vec::with_capacity(tuple.len())];
    for mol in tuple {
        let variants = match engine.stereo_variants(&mol) {
            Ok(v) if !v.is_empty() => v,
            _ => vec![mol.clone()],
        };
        let mut next = Vec::with_capacity(result.len().saturating_mul(variants.len()));
        'outer: for prefix in &result {
            for variant in &variants {
                if next.len() >= limit {
                    debug!(limit, "stereo variant enumeration truncated");
                    break 'outer;
                }
                let mut extended = prefix.clone();
                extended.push(variant.clone());
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

/// Build the product half-reaction for one candidate tuple.
///
/// Returns `None` when the tuple is unusable: wrong arity, an unresolvable
/// fixed slot, or a wildcard product that fails canonicalization or is
/// disconnected. Novel predicted compounds are returned separately; they
/// only enter the delta if the tuple as a whole is accepted.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn product_half<E: StructureEngine>(
    engine: &E,
    hasher: &IdentityHasher,
    coreactants: &CoreactantSet<E::Mol>,
    rule: &ReactionRule,
    seen: &BTreeMap<String, Compound>,
    mols: &[E::Mol],
    generation: u32,
    config: &ExpansionConfig,
) -> Option<(
    BTreeMap<String, Compound>,
    Vec<(u32, String, String)>,
    ElementCounts,
)> {
    if mols.len() != rule.products.len() {
        return None;
    }

    let mut novel: BTreeMap<String, Compound> = BTreeMap::new();
    let mut occurrences: Vec<(String, String, ElementCounts, i32)> = Vec::new();
    for (mol, slot) in mols.iter().zip(rule.products.iter()) {
        match slot {
            Slot::Coreactant(token) => {
                let entry = coreactants.get(token)?;
                occurrences.push((
                    entry.compound.id.clone(),
                    entry.compound.notation.clone(),
                    entry.compound.atom_counts.clone(),
                    entry.compound.charge,
                ));
            }
            Slot::Wildcard => {
                let compound = gen_product(engine, hasher, seen, &novel, mol, generation, config)?;
                occurrences.push((
                    compound.id.clone(),
                    compound.notation.clone(),
                    compound.atom_counts.clone(),
                    compound.charge,
                ));
                if compound.role == CompoundRole::Predicted {
                    novel.entry(compound.id.clone()).or_insert(compound);
                }
            }
        }
    }

    let occ_refs: Vec<(&str, &str, &ElementCounts, i32)> = occurrences
        .iter()
        .map(|(id, notation, counts, charge)| (id.as_str(), notation.as_str(), counts, *charge))
        .collect();
    let (entries, atoms) = fold_half(&occ_refs);
    Some((novel, entries, atoms))
}

/// Canonicalize a wildcard product into a compound record.
///
/// Engine failures and disconnected canonical forms yield `None`; the caller
/// drops the enclosing tuple. Already-seen ids reuse the existing record so
/// the generation of first discovery sticks.
fn gen_product<E: StructureEngine>(
    engine: &E,
    hasher: &IdentityHasher,
    seen: &BTreeMap<String, Compound>,
    staged: &BTreeMap<String, Compound>,
    mol: &E::Mol,
    generation: u32,
    config: &ExpansionConfig,
) -> Option<Compound> {
    let mol = if config.explicit_hydrogens {
        engine.remove_hydrogens(mol).ok()?
    } else {
        mol.clone()
    };
    let notation = engine.canonical(&mol).ok()?;
    if notation.contains('.') {
        // Disconnected / salt form: this product is unusable.
        return None;
    }
    let id = hasher.compound_key(CompoundRole::Predicted, &notation);
    if let Some(existing) = seen.get(&id).or_else(|| staged.get(&id)) {
        return Some(existing.clone());
    }

    let atom_counts = engine.atom_counts(&mol).ok()?;
    let formula = engine.formula(&mol).ok()?;
    let charge = engine.formal_charge(&mol).ok()?;
    Some(Compound {
        id,
        notation,
        role: CompoundRole::Predicted,
        generation,
        atom_counts,
        formula,
        charge,
        expandable: true,
        produced_by: Default::default(),
        consumed_by: Default::default(),
    })
}

/// Fold per-occurrence records into stoichiometric entries and the aggregate,
/// charge-corrected atom vector of one half-reaction.
///
/// Entries come out sorted by compound id. The net formal charge of the side
/// is absorbed into the implicit hydrogen count, matching how protonation
/// states shift hydrogens without changing heavy atoms.
fn fold_half(
    occurrences: &[(&str, &str, &ElementCounts, i32)],
) -> (Vec<(u32, String, String)>, ElementCounts) {
    let mut counter: BTreeMap<&str, (u32, &str)> = BTreeMap::new();
    let mut atoms = ElementCounts::new();
    let mut charge_correction: i64 = 0;
    for &(id, notation, counts, charge) in occurrences {
        counter.entry(id).or_insert((0, notation)).0 += 1;
        add_counts(&mut atoms, counts, 1);
        charge_correction += i64::from(charge);
    }
    if charge_correction != 0 {
        *atoms.entry("H".to_string()).or_insert(0) -= charge_correction;
    }
    let entries = counter
        .into_iter()
        .map(|(id, (coeff, notation))| (coeff, id.to_string(), notation.to_string()))
        .collect();
    (entries, atoms)
}

fn id_refs(entries: &[(u32, String, String)]) -> Vec<(u32, &str)> {
    entries.iter().map(|(coeff, id, _)| (*coeff, id.as_str())).collect()
}

fn notation_refs(entries: &[(u32, String, String)]) -> Vec<(u32, &str)> {
    entries
        .iter()
        .map(|(coeff, _, notation)| (*coeff, notation.as_str()))
        .collect()
}

fn to_stoich(entries: &[(u32, String, String)]) -> Vec<StoichEntry> {
    entries
        .iter()
        .map(|(coeff, id, _)| StoichEntry {
            coeff: *coeff,
            compound_id: id.clone(),
        })
        .collect()
}
