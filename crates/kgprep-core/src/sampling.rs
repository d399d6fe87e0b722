//! Fixed-width neighbor sampling for KGCN-style receptive fields.
//!
//! Every entity gets exactly `neighbor_sample_size` (entity, relation) pairs
//! drawn from its neighbor list, so the downstream model can gather
//! neighborhoods with dense tensor indexing.
//!
//! # Policy
//!
//! | Degree `d` vs sample size `k` | Draw |
//! |-------------------------------|------|
//! | `d >= k` | `k` distinct positions, without replacement |
//! | `0 < d < k` | `k` positions with replacement |
//! | `d == 0` | [`IsolatedEntityPolicy`] decides |

use crate::{EntityId, Error, KnowledgeGraph, RelationId, Result};
use ndarray::Array2;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do with an entity that has no recorded edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolatedEntityPolicy {
    /// Abort with [`Error::IsolatedEntity`].
    #[default]
    Fail,
    /// Fill the row with entity 0 / relation 0.
    Sentinel,
}

impl IsolatedEntityPolicy {
    /// Entity id written by [`IsolatedEntityPolicy::Sentinel`].
    pub const SENTINEL_ENTITY: EntityId = 0;
    /// Relation id written by [`IsolatedEntityPolicy::Sentinel`].
    pub const SENTINEL_RELATION: RelationId = 0;
}

impl std::str::FromStr for IsolatedEntityPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail" => Ok(Self::Fail),
            "sentinel" => Ok(Self::Sentinel),
            other => Err(Error::Config(format!(
                "unknown isolated entity policy {other:?} (expected \"fail\" or \"sentinel\")"
            ))),
        }
    }
}

/// Sampled neighborhoods: two parallel `[entity_count, k]` arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledAdjacency {
    /// `entities[[e, j]]` = j-th sampled neighbor of entity `e`.
    pub entities: Array2<EntityId>,
    /// `relations[[e, j]]` = relation joining `e` to `entities[[e, j]]`.
    pub relations: Array2<RelationId>,
    /// Entities filled by the sentinel policy.
    pub sentinel_rows: Vec<EntityId>,
}

impl SampledAdjacency {
    /// Number of rows (entities).
    pub fn entity_count(&self) -> usize {
        self.entities.nrows()
    }

    /// Number of columns (neighbor sample size).
    pub fn sample_size(&self) -> usize {
        self.entities.ncols()
    }

    /// Sampled `(neighbor, relation)` pairs of `entity`, in sampled order.
    pub fn row(&self, entity: EntityId) -> Vec<(EntityId, RelationId)> {
        let e = entity as usize;
        if e >= self.entity_count() {
            return Vec::new();
        }
        self.entities
            .row(e)
            .iter()
            .zip(self.relations.row(e).iter())
            .map(|(&n, &r)| (n, r))
            .collect()
    }
}

/// Draws fixed-width neighborhoods from a [`KnowledgeGraph`].
///
/// # Example
///
/// ```rust
/// use kgprep_core::{KnowledgeGraph, NeighborSampler, Triple};
/// use rand::SeedableRng;
/// use rand_xorshift::XorShiftRng;
///
/// let kg = KnowledgeGraph::from_triples(&[Triple::new(0, 5, 1)]);
/// let mut rng = XorShiftRng::seed_from_u64(42);
///
/// let adj = NeighborSampler::new(3).sample(&kg, 2, &mut rng).unwrap();
///
/// assert_eq!(adj.row(0), vec![(1, 5); 3]);
/// assert_eq!(adj.row(1), vec![(0, 5); 3]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborSampler {
    neighbor_sample_size: usize,
    isolated: IsolatedEntityPolicy,
}

impl NeighborSampler {
    /// Sampler drawing `neighbor_sample_size` neighbors per entity.
    pub const fn new(neighbor_sample_size: usize) -> Self {
        Self {
            neighbor_sample_size,
            isolated: IsolatedEntityPolicy::Fail,
        }
    }

    /// Set the isolated-entity policy.
    pub const fn with_isolated_policy(mut self, policy: IsolatedEntityPolicy) -> Self {
        self.isolated = policy;
        self
    }

    /// Neighbors drawn per entity.
    pub const fn neighbor_sample_size(&self) -> usize {
        self.neighbor_sample_size
    }

    /// Active isolated-entity policy.
    pub const fn isolated_policy(&self) -> IsolatedEntityPolicy {
        self.isolated
    }

    /// Sample every entity in `0..entity_count`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        kg: &KnowledgeGraph,
        entity_count: usize,
        rng: &mut R,
    ) -> Result<SampledAdjacency> {
        let k = self.neighbor_sample_size;
        if k == 0 {
            return Err(Error::Config(
                "neighbor_sample_size must be at least 1".to_string(),
            ));
        }
        info!(entity_count, k, "constructing adjacency matrix");

        let mut entities = Array2::<EntityId>::zeros((entity_count, k));
        let mut relations = Array2::<RelationId>::zeros((entity_count, k));
        let mut sentinel_rows = Vec::new();

        for e in 0..entity_count {
            let entity = e as EntityId;
            let neighbors = kg.neighbors(entity);

            if neighbors.is_empty() {
                match self.isolated {
                    IsolatedEntityPolicy::Fail => return Err(Error::IsolatedEntity { entity }),
                    IsolatedEntityPolicy::Sentinel => {
                        entities
                            .row_mut(e)
                            .fill(IsolatedEntityPolicy::SENTINEL_ENTITY);
                        relations
                            .row_mut(e)
                            .fill(IsolatedEntityPolicy::SENTINEL_RELATION);
                        sentinel_rows.push(entity);
                        continue;
                    }
                }
            }

            let picks = sample_positions(neighbors.len(), k, rng);
            for (j, &pos) in picks.iter().enumerate() {
                let (neighbor, relation) = neighbors[pos];
                entities[[e, j]] = neighbor;
                relations[[e, j]] = relation;
            }
        }

        if !sentinel_rows.is_empty() {
            warn!(
                count = sentinel_rows.len(),
                "entities without neighbors filled with sentinel (0, 0)"
            );
        }
        debug!(rows = entity_count, cols = k, "adjacency matrix sampled");

        Ok(SampledAdjacency {
            entities,
            relations,
            sentinel_rows,
        })
    }
}

/// Positions into a neighbor list of length `degree` (must be > 0).
fn sample_positions<R: Rng + ?Sized>(degree: usize, k: usize, rng: &mut R) -> Vec<usize> {
    if degree >= k {
        index::sample(rng, degree, k).into_vec()
    } else {
        (0..k).map(|_| rng.gen_range(0..degree)).collect()
    }
}

/// Sample `neighbor_sample_size` neighbors for each entity in `0..entity_count`
/// with the default [`IsolatedEntityPolicy::Fail`] policy.
pub fn sample_neighbors<R: Rng + ?Sized>(
    kg: &KnowledgeGraph,
    entity_count: usize,
    neighbor_sample_size: usize,
    rng: &mut R,
) -> Result<SampledAdjacency> {
    NeighborSampler::new(neighbor_sample_size).sample(kg, entity_count, rng)
}
