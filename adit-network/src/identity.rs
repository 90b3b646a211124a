//! Content-addressed identity keys for compounds and reactions.
//!
//! Compound keys hash the normalized canonical notation, prefixed with a role
//! tag so coreactants, seeds, and predictions occupy disjoint key spaces.
//! Reaction keys hash the sorted `(coeff, compound-id)` multiset of both
//! sides, so any two reactions connecting the same compounds with the same
//! stoichiometry collapse to one record no matter which rule found them.

use adit_core::hash::sha256_str;

use crate::compound::CompoundRole;

/// Notation normalization applied before a compound is hashed.
///
/// Normalization is a property of the run, injected once when the hasher is
/// constructed, so every worker derives keys from the same configuration.
pub trait Normalize: Send + Sync {
    fn normalize(&self, notation: &str) -> String;
}

/// No-op normalization: hash the canonical notation as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Normalize for Passthrough {
    fn normalize(&self, notation: &str) -> String {
        notation.to_string()
    }
}

/// Textual charge neutralization over canonical notations.
///
/// Rewrites charged-atom spellings to their neutral forms so protonation
/// states collapse to one identity. The default table covers the common
/// cases (alkoxides/carboxylates, thiolates, protonated and deprotonated
/// nitrogens); engines whose canonical output is already neutral can use
/// [`Passthrough`] instead.
#[derive(Debug, Clone)]
pub struct ChargeNeutralizer {
    templates: Vec<(String, String)>,
}

impl ChargeNeutralizer {
    pub fn new() -> Self {
        let templates = [
            ("[O-]", "O"),
            ("[S-]", "S"),
            ("[NH3+]", "N"),
            ("[NH2+]", "N"),
            ("[NH+]", "N"),
            ("[N-]", "N"),
            ("[nH+]", "n"),
            ("[n-]", "[nH]"),
        ];
        Self::with_templates(
            templates
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }

    /// Build a neutralizer with a caller-supplied rewrite table.
    pub fn with_templates(templates: Vec<(String, String)>) -> Self {
        ChargeNeutralizer { templates }
    }
}

impl Default for ChargeNeutralizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalize for ChargeNeutralizer {
    fn normalize(&self, notation: &str) -> String {
        let mut out = notation.to_string();
        for (from, to) in &self.templates {
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }
}

/// Derives identity keys for compounds and reactions.
pub struct IdentityHasher {
    normalizer: Box<dyn Normalize>,
}

impl IdentityHasher {
    /// Build a hasher with the given normalization strategy.
    pub fn new(normalizer: Box<dyn Normalize>) -> Self {
        IdentityHasher { normalizer }
    }

    /// Hasher that does not normalize notations.
    pub fn passthrough() -> Self {
        Self::new(Box::new(Passthrough))
    }

    /// The identity key for a compound: role tag + SHA-256 of the normalized
    /// canonical notation.
    pub fn compound_key(&self, role: CompoundRole, notation: &str) -> String {
        let normalized = self.normalizer.normalize(notation);
        format!("{}{}", role.key_prefix(), sha256_str(&normalized))
    }

    /// The identity key for a reaction over `(coeff, compound-id)` entries.
    ///
    /// Both sides are sorted internally, so the key is independent of the
    /// order in which participants were assembled.
    pub fn reaction_key(&self, reactants: &[(u32, &str)], products: &[(u32, &str)]) -> String {
        fn side(entries: &[(u32, &str)]) -> String {
            let mut parts: Vec<String> = entries
                .iter()
                .map(|(coeff, id)| format!("({coeff}) {id}"))
                .collect();
            parts.sort();
            parts.join(" + ")
        }
        let text = format!("{} => {}", side(reactants), side(products));
        format!("R{}", sha256_str(&text))
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new(Box::new(ChargeNeutralizer::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_key_is_stable() {
        let hasher = IdentityHasher::passthrough();
        let a = hasher.compound_key(CompoundRole::Predicted, "CCO");
        let b = hasher.compound_key(CompoundRole::Predicted, "CCO");
        assert_eq!(a, b);
        assert_eq!(a.len(), 65);
    }

    #[test]
    fn roles_partition_the_key_space() {
        let hasher = IdentityHasher::passthrough();
        let predicted = hasher.compound_key(CompoundRole::Predicted, "CCO");
        let coreactant = hasher.compound_key(CompoundRole::Coreactant, "CCO");
        let seed = hasher.compound_key(CompoundRole::Seed, "CCO");
        assert_ne!(predicted, coreactant);
        assert_ne!(predicted, seed);
        // Same hash body, different tag.
        assert_eq!(predicted[1..], coreactant[1..]);
    }

    #[test]
    fn neutralizer_collapses_protonation_states() {
        let hasher = IdentityHasher::default();
        let charged = hasher.compound_key(CompoundRole::Predicted, "CC[O-]");
        let neutral = hasher.compound_key(CompoundRole::Predicted, "CCO");
        assert_eq!(charged, neutral);
    }

    #[test]
    fn injected_templates_override_defaults() {
        let hasher = IdentityHasher::new(Box::new(ChargeNeutralizer::with_templates(vec![])));
        let charged = hasher.compound_key(CompoundRole::Predicted, "CC[O-]");
        let neutral = hasher.compound_key(CompoundRole::Predicted, "CCO");
        assert_ne!(charged, neutral);
    }

    #[test]
    fn reaction_key_is_order_independent() {
        let hasher = IdentityHasher::passthrough();
        let a = hasher.reaction_key(&[(1, "Xatp"), (1, "Cseed")], &[(1, "Xadp"), (1, "Cprod")]);
        let b = hasher.reaction_key(&[(1, "Cseed"), (1, "Xatp")], &[(1, "Cprod"), (1, "Xadp")]);
        assert_eq!(a, b);
        assert!(a.starts_with('R'));
    }

    #[test]
    fn reaction_key_sees_stoichiometry() {
        let hasher = IdentityHasher::passthrough();
        let once = hasher.reaction_key(&[(1, "Ca")], &[(1, "Cb")]);
        let twice = hasher.reaction_key(&[(2, "Ca")], &[(1, "Cb")]);
        assert_ne!(once, twice);
    }

    #[test]
    fn sides_are_not_interchangeable() {
        let hasher = IdentityHasher::passthrough();
        let forward = hasher.reaction_key(&[(1, "Ca")], &[(1, "Cb")]);
        let backward = hasher.reaction_key(&[(1, "Cb")], &[(1, "Ca")]);
        assert_ne!(forward, backward);
    }
}
