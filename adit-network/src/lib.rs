//! Rule-driven expansion of chemical reaction networks.
//!
//! Starting from a set of seed compounds, `adit-network` repeatedly applies a
//! library of transformation rules to discover new compounds and the reactions
//! that connect them, producing a growing compound/reaction graph across
//! discrete generations. Molecular structure handling (parsing, canonical
//! forms, transform execution) is delegated to a [`StructureEngine`]
//! implementation supplied by the caller; everything in this crate is
//! deterministic given the engine's outputs, regardless of worker count.
//!
//! The main pieces:
//!
//! - [`StructureEngine`] — the seam to the molecular structure backend
//! - [`IdentityHasher`] — content-addressed compound and reaction keys
//! - [`apply::apply_rule`] — one rule × one candidate → a local delta
//! - [`Expander`] — drives whole generations and merges worker deltas
//! - [`ReactionNetwork`] — the accumulating compound/reaction store
//!
//! # Example
//!
//! ```
//! use adit_network::{CompoundRole, IdentityHasher};
//!
//! let hasher = IdentityHasher::default();
//! let key = hasher.compound_key(CompoundRole::Predicted, "CCO");
//! assert!(key.starts_with('C'));
//! // The same structure under a different role partitions differently.
//! assert_ne!(key, hasher.compound_key(CompoundRole::Coreactant, "CCO"));
//! ```

pub mod apply;
pub mod compound;
pub mod expand;
pub mod export;
pub mod identity;
pub mod load;
pub mod network;
pub mod reaction;
pub mod reconcile;
pub mod rule;
pub mod structure;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use apply::{apply_rule, ApplyStats};
pub use compound::{Compound, CompoundRole, ElementCounts};
pub use expand::{Expander, ExpansionConfig, ExpansionReport, GenerationReport};
pub use identity::{ChargeNeutralizer, IdentityHasher, Normalize, Passthrough};
pub use network::{ExpansionDelta, MergeOutcome, ReactionNetwork};
pub use reaction::{Reaction, StoichEntry};
pub use reconcile::rename_compound;
pub use rule::{CoreactantSet, ReactionRule, Slot};
pub use structure::StructureEngine;
