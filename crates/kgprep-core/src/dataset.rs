//! End-to-end preparation: ratings and knowledge graph in, model inputs out.
//!
//! The rating path (split) and the graph path (build, sample) are
//! independent; both draw from the one generator created per run, ratings
//! first.

use crate::loader::{load_ratings, load_triples};
use crate::sampling::{NeighborSampler, SampledAdjacency};
use crate::split::{split_ratings, DatasetSplit};
use crate::{
    count_entities, count_relations, count_users, KnowledgeGraph, PrepConfig, Rating, Result,
    Triple,
};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::fmt;
use tracing::{debug, info};

/// Everything the downstream recommender consumes.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Distinct users in the rating file.
    pub user_count: usize,
    /// Distinct entities in the knowledge graph.
    pub entity_count: usize,
    /// Distinct relations in the knowledge graph.
    pub relation_count: usize,
    /// Train/eval/test ratings.
    pub split: DatasetSplit,
    /// Fixed-width neighbor samples.
    pub adjacency: SampledAdjacency,
}

impl PreparedData {
    /// One-line description of sizes.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PreparedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users={} entities={} relations={} train={} eval={} test={} adj={}x{}",
            self.user_count,
            self.entity_count,
            self.relation_count,
            self.split.train.len(),
            self.split.eval.len(),
            self.split.test.len(),
            self.adjacency.entity_count(),
            self.adjacency.sample_size(),
        )
    }
}

/// Generator for a run: seeded when `seed` is given, entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> XorShiftRng {
    match seed {
        Some(seed) => XorShiftRng::seed_from_u64(seed),
        None => XorShiftRng::from_entropy(),
    }
}

/// Prepare in-memory ratings and triples.
pub fn prepare<R: Rng + ?Sized>(
    ratings: &[Rating],
    triples: &[Triple],
    config: &PrepConfig,
    rng: &mut R,
) -> Result<PreparedData> {
    config.validate()?;

    let user_count = count_users(ratings);
    let split = split_ratings(ratings, config.ratios(), rng)?;

    let entity_count = count_entities(triples);
    let relation_count = count_relations(triples);
    let kg = KnowledgeGraph::from_triples_with_count(triples, entity_count);
    kg.check_contiguous();

    let sampler =
        NeighborSampler::new(config.neighbor_sample_size).with_isolated_policy(config.isolated_entity);
    debug!(
        k = sampler.neighbor_sample_size(),
        isolated = ?sampler.isolated_policy(),
        "sampling neighbors"
    );
    let adjacency = sampler.sample(&kg, entity_count, rng)?;

    let data = PreparedData {
        user_count,
        entity_count,
        relation_count,
        split,
        adjacency,
    };
    info!(summary = %data, "data loaded");
    Ok(data)
}

/// Load the configured dataset from disk and prepare it.
pub fn load_data(config: &PrepConfig) -> Result<PreparedData> {
    config.validate()?;
    let files = config.files();
    let ratings = load_ratings(&files, config.use_cache)?;
    let triples = load_triples(&files, config.use_cache)?;
    let mut rng = make_rng(config.seed);
    prepare(&ratings, &triples, config, &mut rng)
}
