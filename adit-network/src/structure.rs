//! The seam to the molecular structure engine.
//!
//! Everything chemical — parsing notations, canonical forms, executing a
//! transform against a tuple of reactants, element counting — is delegated
//! through this trait. The expansion machinery never inspects structures
//! itself, so any backend that can satisfy this contract (an RDKit binding, a
//! native toolkit, a fixture table in tests) plugs in unchanged.

use adit_core::Result;

use crate::compound::ElementCounts;

/// A molecular structure backend.
///
/// Engine failures are reported as errors and are always recoverable at the
/// scope of a single candidate: callers drop the offending candidate and move
/// on rather than aborting a batch.
pub trait StructureEngine: Send + Sync {
    /// Parsed structure handle. Cheap to clone.
    type Mol: Clone + Send + Sync;

    /// Parse a structural notation.
    fn parse(&self, notation: &str) -> Result<Self::Mol>;

    /// The canonical notation for a structure. Two structures with equal
    /// canonical notations are the same compound.
    fn canonical(&self, mol: &Self::Mol) -> Result<String>;

    /// Execute a transform against an ordered reactant tuple, returning
    /// candidate product tuples. Implementations must stop enumerating after
    /// `limit` tuples; runaway rules are bounded only by this cap.
    fn apply_transform(
        &self,
        transform: &str,
        reactants: &[Self::Mol],
        limit: usize,
    ) -> Result<Vec<Vec<Self::Mol>>>;

    /// Per-element atom counts, including implicit hydrogens.
    fn atom_counts(&self, mol: &Self::Mol) -> Result<ElementCounts>;

    /// Molecular formula.
    fn formula(&self, mol: &Self::Mol) -> Result<String>;

    /// Monoisotopic mass.
    fn exact_mass(&self, mol: &Self::Mol) -> Result<f64>;

    /// Net formal charge.
    fn formal_charge(&self, mol: &Self::Mol) -> Result<i32>;

    /// Whether the structure matches a substructure pattern.
    fn matches_pattern(&self, mol: &Self::Mol, pattern: &str) -> Result<bool>;

    /// Strip explicit hydrogens. Engines without an explicit-hydrogen model
    /// return the structure unchanged.
    fn remove_hydrogens(&self, mol: &Self::Mol) -> Result<Self::Mol> {
        Ok(mol.clone())
    }

    /// Add explicit hydrogens. See [`StructureEngine::remove_hydrogens`].
    fn add_hydrogens(&self, mol: &Self::Mol) -> Result<Self::Mol> {
        Ok(mol.clone())
    }

    /// Kekulized form of the structure, where the engine distinguishes one.
    fn kekulized(&self, mol: &Self::Mol) -> Result<Self::Mol> {
        Ok(mol.clone())
    }

    /// Stereoisomer expansion of a product structure.
    ///
    /// Returns the set of variants to enumerate in place of `mol` when
    /// stereoisomer expansion is enabled; the enumeration policy (which
    /// centers, how many) is entirely the engine's. The default is no
    /// expansion: the structure stands for itself.
    fn stereo_variants(&self, mol: &Self::Mol) -> Result<Vec<Self::Mol>> {
        Ok(vec![mol.clone()])
    }
}
