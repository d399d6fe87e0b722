//! Knowledge-graph triples and rating records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Integer id of a knowledge-graph entity.
pub type EntityId = u32;

/// Integer id of a relation (edge type).
pub type RelationId = u32;

/// A (head, relation, tail) edge record.
///
/// # Example
///
/// ```rust
/// use kgprep_core::Triple;
///
/// let triple = Triple::new(1, 5, 2);
/// assert_eq!(triple.head, 1);
/// assert_eq!(triple.relation, 5);
/// assert_eq!(triple.tail, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Head entity.
    pub head: EntityId,
    /// Relation id.
    pub relation: RelationId,
    /// Tail entity.
    pub tail: EntityId,
}

impl Triple {
    /// Create a new triple.
    pub const fn new(head: EntityId, relation: RelationId, tail: EntityId) -> Self {
        Self {
            head,
            relation,
            tail,
        }
    }

    /// True when head and tail are the same entity.
    pub const fn is_self_loop(&self) -> bool {
        self.head == self.tail
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.head, self.relation, self.tail)
    }
}

/// A (user, item, label) interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rating {
    /// User id.
    pub user: u32,
    /// Item id.
    pub item: u32,
    /// Interaction label (1 = positive, 0 = negative).
    pub label: i32,
}

impl Rating {
    /// Create a new rating record.
    pub const fn new(user: u32, item: u32, label: i32) -> Self {
        Self { user, item, label }
    }
}

/// Number of distinct ids appearing as head or tail.
pub fn count_entities(triples: &[Triple]) -> usize {
    let mut seen: HashSet<EntityId> = HashSet::with_capacity(triples.len());
    for t in triples {
        seen.insert(t.head);
        seen.insert(t.tail);
    }
    seen.len()
}

/// Number of distinct relation ids.
pub fn count_relations(triples: &[Triple]) -> usize {
    triples
        .iter()
        .map(|t| t.relation)
        .collect::<HashSet<RelationId>>()
        .len()
}

/// Number of distinct users in a rating set.
pub fn count_users(ratings: &[Rating]) -> usize {
    ratings
        .iter()
        .map(|r| r.user)
        .collect::<HashSet<u32>>()
        .len()
}

/// Number of distinct items in a rating set.
pub fn count_items(ratings: &[Rating]) -> usize {
    ratings
        .iter()
        .map(|r| r.item)
        .collect::<HashSet<u32>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_entities_uses_heads_and_tails() {
        let triples = vec![Triple::new(0, 0, 1), Triple::new(1, 1, 2), Triple::new(2, 0, 0)];
        assert_eq!(count_entities(&triples), 3);
        assert_eq!(count_relations(&triples), 2);
    }

    #[test]
    fn test_count_entities_sparse_ids() {
        let triples = vec![Triple::new(10, 3, 40), Triple::new(40, 3, 10)];
        assert_eq!(count_entities(&triples), 2);
        assert_eq!(count_relations(&triples), 1);
    }

    #[test]
    fn test_counts_empty() {
        assert_eq!(count_entities(&[]), 0);
        assert_eq!(count_relations(&[]), 0);
        assert_eq!(count_users(&[]), 0);
    }

    #[test]
    fn test_count_users_and_items() {
        let ratings = vec![
            Rating::new(0, 10, 1),
            Rating::new(0, 11, 0),
            Rating::new(3, 10, 1),
        ];
        assert_eq!(count_users(&ratings), 2);
        assert_eq!(count_items(&ratings), 2);
    }

    #[test]
    fn test_triple_display() {
        let t = Triple::new(1, 5, 2);
        assert_eq!(t.to_string(), "1 --[5]--> 2");
        assert!(!t.is_self_loop());
        assert!(Triple::new(4, 0, 4).is_self_loop());
    }
}
