//! Tab-separated loaders for rules, coreactants, and seed compounds.
//!
//! File problems here are configuration failures: they happen before any
//! expansion starts and abort the run, in contrast to the per-candidate
//! failures swallowed during expansion.
//!
//! Formats, one record per line, `#`-prefixed lines and blanks skipped:
//!
//! - rules:       `name ⇥ reactant roles ⇥ transform ⇥ product roles`
//!   where roles are `;`-separated tokens, `Any` marking a wildcard slot
//! - coreactants: `token ⇥ notation`
//! - seeds:       `notation` or `id ⇥ notation` (last field wins)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use adit_core::{AditError, Result};

use crate::compound::{Compound, CompoundRole};
use crate::identity::IdentityHasher;
use crate::network::ReactionNetwork;
use crate::rule::{CoreactantSet, ReactionRule, Slot};
use crate::structure::StructureEngine;

fn data_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let file = File::open(path).map_err(|e| {
        AditError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| {
            AditError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: line {}: {}", path.display(), line_num + 1, e),
            ))
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((line_num + 1, trimmed.to_string()));
    }
    Ok(lines)
}

/// Parse one rule line: `name ⇥ reactant roles ⇥ transform ⇥ product roles`.
pub fn parse_rule_line(line: &str) -> Result<ReactionRule> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        return Err(AditError::Parse(format!(
            "expected 4 tab-separated fields in rule line, got {}",
            fields.len()
        )));
    }

    let parse_roles = |roles: &str| -> Result<Vec<Slot>> {
        let slots: Vec<Slot> = roles
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Slot::from_token)
            .collect();
        if slots.is_empty() {
            return Err(AditError::Parse("empty role list in rule line".into()));
        }
        Ok(slots)
    };

    let rule = ReactionRule {
        name: fields[0].trim().to_string(),
        reactants: parse_roles(fields[1])?,
        transform: fields[2].trim().to_string(),
        products: parse_roles(fields[3])?,
    };
    if rule.name.is_empty() || rule.transform.is_empty() {
        return Err(AditError::Parse("rule name and transform must be non-empty".into()));
    }
    if rule.wildcard_reactants() == 0 {
        return Err(AditError::Parse(format!(
            "rule {} has no wildcard reactant slot",
            rule.name
        )));
    }
    Ok(rule)
}

/// Load a rule file.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<ReactionRule>> {
    let path = path.as_ref();
    data_lines(path)?
        .into_iter()
        .map(|(line_num, line)| {
            parse_rule_line(&line).map_err(|e| {
                AditError::Parse(format!("{}: line {}: {}", path.display(), line_num, e))
            })
        })
        .collect()
}

/// Parse one coreactant line: `token ⇥ notation`.
pub fn parse_coreactant_line(line: &str) -> Result<(String, String)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 2 {
        return Err(AditError::Parse(format!(
            "expected 2 tab-separated fields in coreactant line, got {}",
            fields.len()
        )));
    }
    let token = fields[0].trim();
    let notation = fields[1].trim();
    if token.is_empty() || notation.is_empty() {
        return Err(AditError::Parse(
            "coreactant token and notation must be non-empty".into(),
        ));
    }
    Ok((token.to_string(), notation.to_string()))
}

/// Load `(token, notation)` pairs from a coreactant file.
pub fn load_coreactant_pairs(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    data_lines(path)?
        .into_iter()
        .map(|(line_num, line)| {
            parse_coreactant_line(&line).map_err(|e| {
                AditError::Parse(format!("{}: line {}: {}", path.display(), line_num, e))
            })
        })
        .collect()
}

/// Load seed notations. Lines may carry a leading id column; the notation is
/// the last field either way.
pub fn load_seed_notations(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    Ok(data_lines(path)?
        .into_iter()
        .filter_map(|(_, line)| {
            line.split('\t')
                .next_back()
                .map(|field| field.trim().to_string())
        })
        .filter(|n| !n.is_empty())
        .collect())
}

/// Canonicalize seed notations through the engine and insert them as
/// generation-0, expandable seed compounds. Seeds must parse; a failure is a
/// configuration error. Returns how many records were newly inserted.
pub fn seed_network<E: StructureEngine>(
    network: &mut ReactionNetwork,
    engine: &E,
    hasher: &IdentityHasher,
    notations: &[String],
) -> Result<usize> {
    let mut added = 0;
    for notation in notations {
        let mol = engine
            .parse(notation)
            .map_err(|e| AditError::InvalidInput(format!("seed {notation}: {e}")))?;
        let canonical = engine.canonical(&mol)?;
        let compound = Compound {
            id: hasher.compound_key(CompoundRole::Seed, &canonical),
            notation: canonical,
            role: CompoundRole::Seed,
            generation: 0,
            atom_counts: engine.atom_counts(&mol)?,
            formula: engine.formula(&mol)?,
            charge: engine.formal_charge(&mol)?,
            expandable: true,
            produced_by: Default::default(),
            consumed_by: Default::default(),
        };
        if network.add_compound(compound) {
            added += 1;
        }
    }
    Ok(added)
}

/// Register every coreactant record into the store so reactions can reference
/// them from the first generation on.
pub fn register_coreactants<M>(network: &mut ReactionNetwork, coreactants: &CoreactantSet<M>) {
    for compound in coreactants.compounds() {
        network.add_compound(compound.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ToyEngine;
    use std::io::Write;

    #[test]
    fn parse_rule_line_roundtrip() {
        let rule = parse_rule_line("phosphate-transfer\tATP;Any\tsome>>transform\tADP;Any").unwrap();
        assert_eq!(rule.name, "phosphate-transfer");
        assert_eq!(
            rule.reactants,
            vec![Slot::Coreactant("ATP".into()), Slot::Wildcard]
        );
        assert_eq!(
            rule.products,
            vec![Slot::Coreactant("ADP".into()), Slot::Wildcard]
        );
        assert_eq!(rule.transform, "some>>transform");
    }

    #[test]
    fn rule_line_without_wildcard_fails() {
        assert!(parse_rule_line("r\tATP\tt\tADP").is_err());
    }

    #[test]
    fn rule_line_with_wrong_arity_fails() {
        assert!(parse_rule_line("r\tAny\tt").is_err());
    }

    #[test]
    fn load_rules_skips_comments_and_reports_line_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# rule library").unwrap();
        writeln!(file, "a\tAny\tt1\tAny").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "b\tATP;Any\tt2\tADP;Any").unwrap();
        file.flush().unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].name, "b");
    }

    #[test]
    fn malformed_rule_file_is_fatal_with_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tAny\tt1\tAny").unwrap();
        writeln!(file, "broken line with no tabs").unwrap();
        file.flush().unwrap();

        let err = load_rules(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "missing line context: {msg}");
    }

    #[test]
    fn coreactant_pairs_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ATP\tOP(=O)(O)OP(=O)(O)O").unwrap();
        file.flush().unwrap();

        let pairs = load_coreactant_pairs(file.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "ATP");
    }

    #[test]
    fn seed_notations_accept_optional_id_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pyr\tCCC(=O)C(=O)O").unwrap();
        writeln!(file, "CCO").unwrap();
        file.flush().unwrap();

        let seeds = load_seed_notations(file.path()).unwrap();
        assert_eq!(seeds, vec!["CCC(=O)C(=O)O".to_string(), "CCO".to_string()]);
    }

    #[test]
    fn missing_file_is_an_io_error_with_path() {
        let err = load_rules("/nonexistent/rules.tsv").unwrap_err();
        assert!(matches!(err, AditError::Io(_)));
        assert!(err.to_string().contains("rules.tsv"));
    }

    #[test]
    fn seeding_inserts_canonical_generation_zero_records() {
        let engine = ToyEngine::new()
            .with_compound("CCO", &[("C", 2), ("H", 6), ("O", 1)], 0)
            .with_canonical("OCC", "CCO");
        let hasher = IdentityHasher::passthrough();
        let mut network = ReactionNetwork::new();

        let added = seed_network(
            &mut network,
            &engine,
            &hasher,
            &["OCC".to_string(), "CCO".to_string()],
        )
        .unwrap();

        // Both spellings canonicalize to the same compound.
        assert_eq!(added, 1);
        assert_eq!(network.compound_count(), 1);
        let seed = network.compounds.values().next().unwrap();
        assert_eq!(seed.notation, "CCO");
        assert_eq!(seed.generation, 0);
        assert!(seed.expandable);
        assert_eq!(seed.role, CompoundRole::Seed);
    }

    #[test]
    fn unparsable_seed_is_fatal() {
        let engine = ToyEngine::new().with_invalid("junk");
        let hasher = IdentityHasher::passthrough();
        let mut network = ReactionNetwork::new();
        let err = seed_network(&mut network, &engine, &hasher, &["junk".to_string()]).unwrap_err();
        assert!(matches!(err, AditError::InvalidInput(_)));
    }
}
