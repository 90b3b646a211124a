//! Deterministic flat-file dumps of the network.
//!
//! Tables are sorted, line-oriented, and tab-separated so runs can be diffed
//! directly; two stores with equal content serialize byte-for-byte equal.
//! Writers never clobber an existing file: a `_new` suffix is appended to the
//! stem until the path is free.

use std::fs;
use std::path::{Path, PathBuf};

use adit_core::Result;

use crate::network::ReactionNetwork;

/// Render the compound table.
pub fn compound_table(network: &ReactionNetwork) -> String {
    let mut out = String::from("id\trole\tgeneration\tformula\tcharge\texpandable\tnotation\n");
    for compound in network.compounds.values() {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            compound.id,
            compound.role,
            compound.generation,
            compound.formula,
            compound.charge,
            compound.expandable,
            compound.notation,
        ));
    }
    out
}

/// Render the reaction table.
pub fn reaction_table(network: &ReactionNetwork) -> String {
    fn side(entries: &[crate::reaction::StoichEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("({}) {}", e.coeff, e.compound_id))
            .collect::<Vec<_>>()
            .join(" + ")
    }

    let mut out = String::from("id\toperators\treactants\tproducts\tequation\n");
    for rxn in network.reactions.values() {
        let operators: Vec<&str> = rxn.operators.iter().map(String::as_str).collect();
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            rxn.id,
            operators.join(";"),
            side(&rxn.reactants),
            side(&rxn.products),
            rxn.text,
        ));
    }
    out
}

/// Return a path that does not collide with an existing file, appending
/// `_new` to the stem as often as needed.
pub fn prevent_overwrite(path: impl AsRef<Path>) -> PathBuf {
    let mut path = path.as_ref().to_path_buf();
    while path.exists() {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let renamed = match path.extension() {
            Some(ext) => format!("{stem}_new.{}", ext.to_string_lossy()),
            None => format!("{stem}_new"),
        };
        path.set_file_name(renamed);
    }
    path
}

/// Write the compound table, returning the path actually written.
pub fn write_compound_table(network: &ReactionNetwork, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = prevent_overwrite(path);
    fs::write(&path, compound_table(network))?;
    Ok(path)
}

/// Write the reaction table, returning the path actually written.
pub fn write_reaction_table(network: &ReactionNetwork, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = prevent_overwrite(path);
    fs::write(&path, reaction_table(network))?;
    Ok(path)
}
