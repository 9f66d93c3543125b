//! Knowledge graph: entities, relations and the triples connecting them.
//!
//! - [`Triple`]: a (subject, relation, object) edge with a confidence score.
//!   Its id is derived from its endpoints, so a graph holds at most one
//!   triple per combination.
//! - [`KnowledgeGraph`](index::KnowledgeGraph): the owning container with
//!   subject/object/relation/type indices.
//! - [`traverse`]: undirected BFS path-finding.
//! - [`codec`]: JSON snapshots.
//!
//! Triples refer to entities and relations by id. The graph's maps are the
//! arena that owns them, so one entity can take part in any number of
//! triples without being copied.

pub mod codec;
pub mod index;
pub mod traverse;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::relation::{Relation, RelationId};

pub use crate::id::TripleId;
pub use index::{GraphStats, KnowledgeGraph, MergeStats};

/// A (subject, relation, object) edge in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// Derived id: `"{subject}_{relation}_{object}"`.
    pub id: TripleId,
    pub subject: EntityId,
    pub relation: RelationId,
    pub object: EntityId,
    /// Asserted certainty in [0.0, 1.0], independent of any query.
    pub confidence: f32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Triple {
    /// Create a triple between two entities. Confidence is clamped to [0, 1].
    pub fn new(subject: &Entity, relation: &Relation, object: &Entity, confidence: f32) -> Self {
        Self::from_ids(
            subject.id.clone(),
            relation.id.clone(),
            object.id.clone(),
            confidence,
        )
    }

    /// Create a triple from raw ids, without checking that they exist anywhere.
    pub fn from_ids(
        subject: impl Into<EntityId>,
        relation: impl Into<RelationId>,
        object: impl Into<EntityId>,
        confidence: f32,
    ) -> Self {
        let subject = subject.into();
        let relation = relation.into();
        let object = object.into();
        Self {
            id: Self::derive_id(&subject, &relation, &object),
            subject,
            relation,
            object,
            confidence: clamp_confidence(confidence),
            properties: BTreeMap::new(),
        }
    }

    /// The id a triple with these endpoints has.
    pub fn derive_id(subject: &EntityId, relation: &RelationId, object: &EntityId) -> TripleId {
        TripleId::new(format!("{subject}_{relation}_{object}"))
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether `entity` is the subject or the object of this triple.
    pub fn touches(&self, entity: &str) -> bool {
        self.subject.as_str() == entity || self.object.as_str() == entity
    }

    /// The endpoint opposite to `entity`, if `entity` is an endpoint.
    pub fn other_end(&self, entity: &str) -> Option<&EntityId> {
        if self.subject.as_str() == entity {
            Some(&self.object)
        } else if self.object.as_str() == entity {
            Some(&self.subject)
        } else {
            None
        }
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::relation::RelationType;

    #[test]
    fn id_is_derived_from_endpoints() {
        let bj = Entity::new("e1", "北京", EntityType::Location);
        let cn = Entity::new("e3", "中国", EntityType::Location);
        let loc = Relation::new("r1", "位于", RelationType::LocatedIn);
        let t = Triple::new(&bj, &loc, &cn, 1.0);
        assert_eq!(t.id.as_str(), "e1_r1_e3");
        assert_eq!(Triple::from_ids("e1", "r1", "e3", 0.2).id, t.id);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Triple::from_ids("a", "r", "b", 1.7).confidence, 1.0);
        assert_eq!(Triple::from_ids("a", "r", "b", -0.3).confidence, 0.0);
        assert_eq!(Triple::from_ids("a", "r", "b", f32::NAN).confidence, 0.0);
        assert!((Triple::from_ids("a", "r", "b", 0.8).confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoints() {
        let t = Triple::from_ids("a", "r", "b", 1.0);
        assert!(t.touches("a"));
        assert!(t.touches("b"));
        assert!(!t.touches("r"));
        assert_eq!(t.other_end("a").map(EntityId::as_str), Some("b"));
        assert_eq!(t.other_end("b").map(EntityId::as_str), Some("a"));
        assert_eq!(t.other_end("c"), None);
    }
}
