//! Generation-by-generation expansion over a rule library.
//!
//! One generation crosses the current frontier with every rule, processes the
//! resulting work items in chunks (optionally on a worker pool), and folds the
//! per-chunk deltas into the store sequentially. Workers are pure functions
//! over immutable inputs; the orchestrator is the only writer. Because the
//! merge is commutative and associative, the final store content is the same
//! for any worker count, chunk size, or completion order — parallelism only
//! changes timing.

use tracing::{debug, info};

use adit_core::{AditError, Result};

use crate::apply::{apply_rule, ApplyStats};
use crate::compound::Compound;
use crate::identity::IdentityHasher;
use crate::network::{ExpansionDelta, ReactionNetwork};
use crate::rule::{CoreactantSet, ReactionRule};
use crate::structure::StructureEngine;

/// Knobs for one expansion run.
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    /// Highest generation to create. Expansion of generation `g` runs only
    /// while `g + 1` does not exceed this.
    pub max_generations: u32,
    /// Worker count for chunk processing. `1` means fully sequential.
    pub workers: usize,
    /// Work items per chunk; derived from the item count when `None`.
    pub chunk_size: Option<usize>,
    /// Run candidates with explicit hydrogens through the engine.
    pub explicit_hydrogens: bool,
    /// Kekulize candidates before applying transforms.
    pub kekulize: bool,
    /// Enumerate stereoisomer variants of products.
    pub stereo_variants: bool,
    /// Cap on candidate product tuples per rule application.
    pub max_product_sets: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        ExpansionConfig {
            max_generations: 1,
            workers: 1,
            chunk_size: None,
            explicit_hydrogens: false,
            kekulize: false,
            stereo_variants: false,
            max_product_sets: 10_000,
        }
    }
}

/// What one generation added, with the screening counters.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub generation: u32,
    pub work_items: usize,
    pub compounds_added: usize,
    pub reactions_added: usize,
    pub stats: ApplyStats,
}

/// Aggregated result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct ExpansionReport {
    pub generations: Vec<GenerationReport>,
}

impl ExpansionReport {
    pub fn compounds_added(&self) -> usize {
        self.generations.iter().map(|g| g.compounds_added).sum()
    }

    pub fn reactions_added(&self) -> usize {
        self.generations.iter().map(|g| g.reactions_added).sum()
    }
}

/// Drives expansion of a [`ReactionNetwork`] against a rule library.
pub struct Expander<'a, E: StructureEngine> {
    engine: &'a E,
    hasher: &'a IdentityHasher,
    rules: &'a [ReactionRule],
    coreactants: &'a CoreactantSet<E::Mol>,
    config: ExpansionConfig,
}

impl<'a, E: StructureEngine> std::fmt::Debug for Expander<'a, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expander")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, E: StructureEngine> Expander<'a, E> {
    /// Build an expander, validating the configuration up front: every fixed
    /// slot of every rule must resolve in the coreactant dictionary, and every
    /// rule must have at least one wildcard reactant to bind.
    pub fn new(
        engine: &'a E,
        hasher: &'a IdentityHasher,
        rules: &'a [ReactionRule],
        coreactants: &'a CoreactantSet<E::Mol>,
        config: ExpansionConfig,
    ) -> Result<Self> {
        if config.workers == 0 {
            return Err(AditError::InvalidInput("worker count must be at least 1".into()));
        }
        for rule in rules {
            if rule.wildcard_reactants() == 0 {
                return Err(AditError::InvalidInput(format!(
                    "rule {} has no wildcard reactant slot",
                    rule.name
                )));
            }
            for token in rule.coreactant_tokens() {
                if !coreactants.contains(token) {
                    return Err(AditError::InvalidInput(format!(
                        "rule {} references unknown coreactant {token}",
                        rule.name
                    )));
                }
            }
        }
        Ok(Expander {
            engine,
            hasher,
            rules,
            coreactants,
            config,
        })
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Expand generation after generation until the frontier empties or the
    /// generation cap is reached.
    pub fn run(&self, network: &mut ReactionNetwork) -> Result<ExpansionReport> {
        let mut report = ExpansionReport::default();
        for generation in 0..self.config.max_generations {
            let gen_report = self.expand_generation(network, generation)?;
            let exhausted = gen_report.work_items == 0;
            report.generations.push(gen_report);
            if exhausted {
                break;
            }
        }
        Ok(report)
    }

    /// Expand one generation: frontier × rules, chunked, merged.
    ///
    /// Compounds discovered here are stamped `generation + 1` and form the
    /// next frontier. The store is untouched until every chunk has finished;
    /// an abort before the fold loses nothing but unmerged work.
    pub fn expand_generation(
        &self,
        network: &mut ReactionNetwork,
        generation: u32,
    ) -> Result<GenerationReport> {
        let frontier: Vec<Compound> = network
            .frontier(generation)
            .into_iter()
            .cloned()
            .collect();
        let items: Vec<(usize, usize)> = (0..frontier.len())
            .flat_map(|c| (0..self.rules.len()).map(move |r| (c, r)))
            .collect();

        let mut report = GenerationReport {
            generation,
            work_items: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            debug!(generation, "empty frontier, nothing to expand");
            return Ok(report);
        }

        let chunk_size = self
            .config
            .chunk_size
            .unwrap_or_else(|| (items.len() / (self.config.workers * 4)).max(1));
        let deltas = self.process_chunks(generation, &frontier, &items, chunk_size);

        for delta in deltas {
            report.stats.absorb(&delta.stats);
            let outcome = network.absorb(delta)?;
            report.compounds_added += outcome.compounds_added;
            report.reactions_added += outcome.reactions_added;
        }

        info!(
            generation,
            work_items = report.work_items,
            compounds_added = report.compounds_added,
            reactions_added = report.reactions_added,
            rejected = report.stats.rejected(),
            failed = report.stats.failed_applications,
            "generation merged"
        );
        Ok(report)
    }

    /// Process work-item chunks into deltas, in chunk order.
    #[cfg(feature = "parallel")]
    fn process_chunks(
        &self,
        generation: u32,
        frontier: &[Compound],
        items: &[(usize, usize)],
        chunk_size: usize,
    ) -> Vec<ExpansionDelta> {
        if self.config.workers > 1 {
            use rayon::prelude::*;
            // A dedicated pool honors the configured worker count without
            // reconfiguring the global one.
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| {
                        items
                            .par_chunks(chunk_size)
                            .map(|chunk| self.process_chunk(generation, frontier, chunk))
                            .collect()
                    });
                }
                Err(e) => {
                    debug!(error = %e, "worker pool unavailable, falling back to sequential");
                }
            }
        }
        items
            .chunks(chunk_size)
            .map(|chunk| self.process_chunk(generation, frontier, chunk))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn process_chunks(
        &self,
        generation: u32,
        frontier: &[Compound],
        items: &[(usize, usize)],
        chunk_size: usize,
    ) -> Vec<ExpansionDelta> {
        items
            .chunks(chunk_size)
            .map(|chunk| self.process_chunk(generation, frontier, chunk))
            .collect()
    }

    /// Run one chunk of (compound, rule) items, folding duplicates locally.
    fn process_chunk(
        &self,
        generation: u32,
        frontier: &[Compound],
        items: &[(usize, usize)],
    ) -> ExpansionDelta {
        let mut delta = ExpansionDelta::default();
        for &(compound_idx, rule_idx) in items {
            let item_delta = apply_rule(
                self.engine,
                self.hasher,
                self.coreactants,
                &self.rules[rule_idx],
                &frontier[compound_idx],
                generation + 1,
                &self.config,
            );
            delta.merge(item_delta);
        }
        delta
    }
}
