#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

//! Input preparation for knowledge-graph-aware recommenders.
//!
//! KGCN-style models need three things before training:
//!
//! - user-item ratings partitioned into train, eval and test
//! - an undirected view of the knowledge graph
//! - a fixed-width neighborhood per entity (neighbor ids plus relation ids)
//!
//! # Pipeline
//!
//! ```text
//! ratings_final.txt --> split_ratings ------------------> (train, eval, test)
//! kg_final.txt -------> KnowledgeGraph::from_triples --> NeighborSampler --> (adj_entity, adj_relation)
//! ```
//!
//! The two paths share nothing except the random generator, which is always
//! passed in explicitly.
//!
//! # Example
//!
//! ```rust
//! use kgprep_core::{KnowledgeGraph, NeighborSampler, Triple};
//! use kgprep_core::split::{split_ratings, SplitRatios};
//! use kgprep_core::Rating;
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//!
//! let mut rng = XorShiftRng::seed_from_u64(42);
//!
//! let ratings: Vec<Rating> = (0..10).map(|i| Rating::new(0, i, 1)).collect();
//! let split = split_ratings(&ratings, SplitRatios::default(), &mut rng).unwrap();
//! assert_eq!(split.train.len(), 6);
//!
//! let triples = [Triple::new(0, 0, 1), Triple::new(1, 1, 2)];
//! let kg = KnowledgeGraph::from_triples(&triples);
//! let adj = NeighborSampler::new(4).sample(&kg, 3, &mut rng).unwrap();
//! assert_eq!(adj.entities.dim(), (3, 4));
//! ```

pub mod config;
pub mod dataset;
mod error;
mod graph;
pub mod loader;
pub mod sampling;
pub mod split;
mod triple;

pub use config::PrepConfig;
pub use dataset::{load_data, make_rng, prepare, PreparedData};
pub use error::{Error, Result};
pub use graph::{Edge, KnowledgeGraph, KnowledgeGraphStats};
pub use sampling::{sample_neighbors, IsolatedEntityPolicy, NeighborSampler, SampledAdjacency};
pub use split::{split_ratings, DatasetSplit, SplitRatios};
pub use triple::{
    count_entities, count_items, count_relations, count_users, EntityId, Rating, RelationId,
    Triple,
};

// Re-export ndarray so callers can name the output arrays.
pub use ndarray;
