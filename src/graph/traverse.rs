//! Breadth-first path-finding between entities.
//!
//! The search treats the graph as undirected: a triple can be walked from
//! subject to object or from object to subject. A single visited set is
//! shared by the whole search, so each intermediate entity is expanded at
//! most once, through the first path that reaches it. Later paths through
//! an already-visited entity are not explored. That keeps the search linear
//! in the size of the graph at the cost of completeness.

use std::collections::{HashSet, VecDeque};

use crate::entity::EntityId;

use super::index::KnowledgeGraph;
use super::{Triple, TripleId};

/// A walk from a source entity to a target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPath {
    /// Triples in walking order.
    pub triples: Vec<TripleId>,
    /// Entities in walking order, source first and target last.
    pub entities: Vec<EntityId>,
}

impl EntityPath {
    /// The zero-hop path from an entity to itself.
    pub fn trivial(entity: EntityId) -> Self {
        Self {
            triples: Vec::new(),
            entities: vec![entity],
        }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

/// Triples touching `entity`, each paired with the endpoint on the other side.
///
/// A self-loop pairs the triple with `entity` itself.
pub fn neighbors<'a>(graph: &'a KnowledgeGraph, entity: &str) -> Vec<(&'a Triple, &'a EntityId)> {
    graph
        .triples_touching(entity)
        .into_iter()
        .filter_map(|t| t.other_end(entity).map(|other| (t, other)))
        .collect()
}

/// Find paths of at most `max_depth` hops from `source` to `target`.
///
/// - Unknown endpoints yield no paths.
/// - `source == target` yields a single trivial path.
/// - Every time the search reaches `target` a path is recorded. The target
///   itself is never expanded, so paths never pass through it.
/// - Paths come out in BFS order: their lengths never decrease.
pub fn find_entity_paths(
    graph: &KnowledgeGraph,
    source: &str,
    target: &str,
    max_depth: usize,
) -> Vec<EntityPath> {
    let (Some(source), Some(target)) = (graph.entity(source), graph.entity(target)) else {
        return Vec::new();
    };
    if source.id == target.id {
        return vec![EntityPath::trivial(source.id.clone())];
    }

    let mut paths = Vec::new();
    let mut visited: HashSet<&EntityId> = HashSet::new();
    visited.insert(&source.id);

    let mut queue: VecDeque<EntityPath> = VecDeque::new();
    queue.push_back(EntityPath::trivial(source.id.clone()));

    while let Some(path) = queue.pop_front() {
        if path.len() >= max_depth {
            continue;
        }
        let Some(node) = path.entities.last() else {
            continue;
        };

        for (triple, next) in neighbors(graph, node.as_str()) {
            if *next == target.id {
                paths.push(extend(&path, triple, next));
                continue;
            }
            if visited.insert(next) {
                queue.push_back(extend(&path, triple, next));
            }
        }
    }

    tracing::debug!(
        source = %source.id,
        target = %target.id,
        max_depth,
        found = paths.len(),
        "path search finished"
    );
    paths
}

fn extend(path: &EntityPath, triple: &Triple, next: &EntityId) -> EntityPath {
    let mut extended = path.clone();
    extended.triples.push(triple.id.clone());
    extended.entities.push(next.clone());
    extended
}
