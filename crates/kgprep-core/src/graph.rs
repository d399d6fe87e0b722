use crate::{count_entities, EntityId, RelationId, Triple};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// One recorded edge: the neighbor at the other end and the relation joining them.
pub type Edge = (EntityId, RelationId);

/// Undirected adjacency over knowledge-graph entities.
///
/// Ids in `0..entity_count` live in a dense table, so an id in that range
/// that never appears in a triple still has an (empty) neighbor list. Ids at
/// or above `entity_count` (sparse id spaces) are kept in a side map and
/// never grow the table. Every triple `(h, r, t)` contributes `h -> (t, r)`
/// and `t -> (h, r)`. Duplicate triples are kept as duplicate edges, and
/// neighbor lists keep triple order.
///
/// # Example
///
/// ```rust
/// use kgprep_core::{KnowledgeGraph, Triple};
///
/// let kg = KnowledgeGraph::from_triples(&[Triple::new(1, 5, 2)]);
///
/// assert_eq!(kg.neighbors(1), &[(2, 5)]);
/// assert_eq!(kg.neighbors(2), &[(1, 5)]);
/// assert!(kg.neighbors(0).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// `adjacency[e]` = edges of entity `e`, for `e < entity_count`.
    adjacency: Vec<Vec<Edge>>,

    /// Edges of entities whose id is past the dense table.
    out_of_range: HashMap<EntityId, Vec<Edge>>,

    /// Number of triples the graph was built from.
    triple_count: usize,

    /// Distinct relation ids.
    relations: HashSet<RelationId>,
}

/// Summary statistics of a [`KnowledgeGraph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnowledgeGraphStats {
    /// Distinct entities appearing in at least one triple.
    pub entity_count: usize,
    /// Distinct relation ids.
    pub relation_count: usize,
    /// Triples the graph was built from.
    pub triple_count: usize,
    /// Slots in the dense table (never more than the entity count it was built with).
    pub num_slots: usize,
    /// Dense slots with no recorded edge.
    pub isolated_count: usize,
    /// Entities stored outside the dense table.
    pub out_of_range_count: usize,
    /// Mean degree over connected entities.
    pub avg_degree: f64,
    /// Largest neighbor list.
    pub max_degree: usize,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a dense table of `entity_count` slots.
    pub fn with_entity_count(entity_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); entity_count],
            ..Self::default()
        }
    }

    /// Build the symmetric adjacency from triples.
    ///
    /// The dense table is sized to the number of distinct entities.
    pub fn from_triples(triples: &[Triple]) -> Self {
        Self::from_triples_with_count(triples, count_entities(triples))
    }

    /// Build the symmetric adjacency with a dense table of `entity_count` slots.
    pub fn from_triples_with_count(triples: &[Triple], entity_count: usize) -> Self {
        info!(
            triples = triples.len(),
            entity_count, "constructing knowledge graph"
        );
        let mut kg = Self::with_entity_count(entity_count);
        for triple in triples {
            kg.add_triple(*triple);
        }
        debug!(
            slots = kg.num_slots(),
            out_of_range = kg.out_of_range.len(),
            edges = kg.edge_count(),
            relations = kg.relations.len(),
            "knowledge graph built"
        );
        kg
    }

    /// Append both directions of a triple.
    pub fn add_triple(&mut self, triple: Triple) {
        let Triple {
            head,
            relation,
            tail,
        } = triple;
        self.edges_mut(head).push((tail, relation));
        self.edges_mut(tail).push((head, relation));
        self.relations.insert(relation);
        self.triple_count += 1;
    }

    fn edges_mut(&mut self, entity: EntityId) -> &mut Vec<Edge> {
        let slot = entity as usize;
        if slot < self.adjacency.len() {
            &mut self.adjacency[slot]
        } else {
            self.out_of_range.entry(entity).or_default()
        }
    }

    /// Edges of `entity` in insertion order; empty when it has none.
    pub fn neighbors(&self, entity: EntityId) -> &[Edge] {
        match self.adjacency.get(entity as usize) {
            Some(edges) => edges,
            None => self
                .out_of_range
                .get(&entity)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Number of edges recorded for `entity`.
    pub fn degree(&self, entity: EntityId) -> usize {
        self.neighbors(entity).len()
    }

    /// True when `entity` has at least one edge.
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.degree(entity) > 0
    }

    /// Size of the dense table.
    pub fn num_slots(&self) -> usize {
        self.adjacency.len()
    }

    /// Total directed edges stored (twice the triple count).
    pub fn edge_count(&self) -> usize {
        self.edge_lists().map(Vec::len).sum()
    }

    /// Triples the graph was built from.
    pub fn triple_count(&self) -> usize {
        self.triple_count
    }

    /// Entities with at least one edge.
    pub fn entity_count(&self) -> usize {
        self.adjacency.iter().filter(|n| !n.is_empty()).count() + self.out_of_range.len()
    }

    /// Distinct relation ids.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    fn edge_lists(&self) -> impl Iterator<Item = &Vec<Edge>> + '_ {
        self.adjacency.iter().chain(self.out_of_range.values())
    }

    /// Iterate `(entity, edges)` over every dense slot, including empty ones,
    /// then over out-of-range entities in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &[Edge])> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .map(|(e, edges)| (e as EntityId, edges.as_slice()))
            .chain(
                self.out_of_range
                    .iter()
                    .map(|(&e, edges)| (e, edges.as_slice())),
            )
    }

    /// Ids in `0..entity_count` that have no edge.
    pub fn isolated_entities(&self, entity_count: usize) -> Vec<EntityId> {
        (0..entity_count as EntityId)
            .filter(|&e| !self.contains_entity(e))
            .collect()
    }

    /// Warn when entity ids do not form the contiguous range `0..num_slots`.
    ///
    /// Sampling only visits `0..entity_count`, so entities above that range
    /// are skipped and ids below it without edges hit the isolated-entity
    /// policy.
    pub fn check_contiguous(&self) -> bool {
        let gaps = self.adjacency.iter().filter(|n| n.is_empty()).count();
        let out_of_range = self.out_of_range.len();
        let contiguous = gaps == 0 && out_of_range == 0;
        if !contiguous {
            warn!(
                slots = self.num_slots(),
                gaps, out_of_range, "entity ids are not contiguous from 0"
            );
        }
        contiguous
    }

    /// Compute summary statistics.
    pub fn stats(&self) -> KnowledgeGraphStats {
        let entity_count = self.entity_count();
        let edges = self.edge_count();
        KnowledgeGraphStats {
            entity_count,
            relation_count: self.relations.len(),
            triple_count: self.triple_count,
            num_slots: self.num_slots(),
            isolated_count: self.adjacency.iter().filter(|n| n.is_empty()).count(),
            out_of_range_count: self.out_of_range.len(),
            avg_degree: if entity_count > 0 {
                edges as f64 / entity_count as f64
            } else {
                0.0
            },
            max_degree: self.edge_lists().map(Vec::len).max().unwrap_or(0),
        }
    }
}

impl FromIterator<Triple> for KnowledgeGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let triples: Vec<Triple> = iter.into_iter().collect();
        Self::from_triples(&triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_triple_is_symmetric() {
        let kg = KnowledgeGraph::from_triples(&[Triple::new(1, 5, 2)]);

        assert_eq!(kg.neighbors(1), &[(2, 5)]);
        assert_eq!(kg.neighbors(2), &[(1, 5)]);
        assert!(kg.neighbors(0).is_empty());
        assert!(kg.neighbors(3).is_empty());
        assert_eq!(kg.entity_count(), 2);
        assert_eq!(kg.num_slots(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let kg = KnowledgeGraph::from_triples(&[
            Triple::new(0, 1, 1),
            Triple::new(2, 0, 0),
            Triple::new(0, 3, 3),
        ]);
        assert_eq!(kg.neighbors(0), &[(1, 1), (2, 0), (3, 3)]);
    }

    #[test]
    fn test_duplicates_not_deduplicated() {
        let kg = KnowledgeGraph::from_triples(&[Triple::new(0, 1, 1), Triple::new(0, 1, 1)]);
        assert_eq!(kg.neighbors(0), &[(1, 1), (1, 1)]);
        assert_eq!(kg.neighbors(1), &[(0, 1), (0, 1)]);
        assert_eq!(kg.triple_count(), 2);
        assert_eq!(kg.edge_count(), 4);
    }

    #[test]
    fn test_self_loop_recorded_in_both_directions() {
        let kg = KnowledgeGraph::from_triples(&[Triple::new(4, 2, 4)]);
        assert_eq!(kg.neighbors(4), &[(4, 2), (4, 2)]);
        assert_eq!(kg.entity_count(), 1);
    }

    #[test]
    fn test_empty_graph() {
        let kg = KnowledgeGraph::from_triples(&[]);
        assert_eq!(kg.num_slots(), 0);
        assert!(kg.neighbors(0).is_empty());
        let stats = kg.stats();
        assert_eq!(stats.entity_count, 0);
        assert_eq!(stats.max_degree, 0);
        assert!(stats.avg_degree.abs() < f64::EPSILON);
    }

    #[test]
    fn test_isolated_entities_and_contiguity() {
        let kg = KnowledgeGraph::from_triples(&[Triple::new(0, 0, 2)]);
        assert_eq!(kg.isolated_entities(3), vec![1]);
        assert!(!kg.check_contiguous());

        let kg = KnowledgeGraph::from_triples(&[Triple::new(0, 0, 1), Triple::new(1, 0, 2)]);
        assert!(kg.check_contiguous());
    }

    #[test]
    fn test_sparse_ids_keep_table_within_entity_count() {
        let triples = [Triple::new(0, 0, 1), Triple::new(1, 0, 60_000_000)];
        let kg = KnowledgeGraph::from_triples(&triples);

        assert_eq!(kg.entity_count(), 3);
        assert!(kg.num_slots() <= count_entities(&triples));
        assert_eq!(kg.neighbors(1), &[(0, 0), (60_000_000, 0)]);
        assert_eq!(kg.neighbors(60_000_000), &[(1, 0)]);
        assert_eq!(kg.edge_count(), 4);

        let stats = kg.stats();
        assert_eq!(stats.num_slots, 3);
        assert_eq!(stats.isolated_count, 1);
        assert_eq!(stats.out_of_range_count, 1);
    }

    #[test]
    fn test_max_id_does_not_allocate_up_to_it() {
        let kg = KnowledgeGraph::from_triples_with_count(&[Triple::new(0, 3, u32::MAX)], 2);
        assert_eq!(kg.num_slots(), 2);
        assert_eq!(kg.neighbors(0), &[(u32::MAX, 3)]);
        assert_eq!(kg.neighbors(u32::MAX), &[(0, 3)]);
        assert_eq!(kg.isolated_entities(2), vec![1]);
    }

    #[test]
    fn test_iter_visits_every_slot() {
        let kg = KnowledgeGraph::from_triples(&[Triple::new(0, 1, 2)]);
        let mut degrees: Vec<(EntityId, usize)> = kg.iter().map(|(e, n)| (e, n.len())).collect();
        degrees.sort_unstable();
        assert_eq!(degrees, vec![(0, 1), (1, 0), (2, 1)]);
    }

    #[test]
    fn test_stats() {
        let kg: KnowledgeGraph = vec![
            Triple::new(0, 0, 1),
            Triple::new(0, 1, 2),
            Triple::new(0, 1, 3),
        ]
        .into_iter()
        .collect();
        let stats = kg.stats();
        assert_eq!(stats.entity_count, 4);
        assert_eq!(stats.relation_count, 2);
        assert_eq!(kg.relation_count(), 2);
        assert_eq!(stats.triple_count, 3);
        assert_eq!(stats.max_degree, 3);
        assert_eq!(stats.isolated_count, 0);
        assert!((stats.avg_degree - 1.5).abs() < 1e-9);
    }
}
