//! In-memory knowledge graph with subject/object/relation/type indices.
//!
//! The graph owns every entity, relation and triple in ordered maps and keeps
//! five derived indices in step with them:
//!
//! - subject index: entity id → ids of triples with that subject
//! - object index: entity id → ids of triples with that object
//! - relation index: relation id → ids of triples using that relation
//! - entity type index: [`EntityType`] → entity ids
//! - relation type index: [`RelationType`] → relation ids
//!
//! Every triple's endpoints and relation are present in the owning maps, and
//! no index bucket names anything that is not. Removing an entity or relation
//! removes every triple that references it. There is no internal locking:
//! mutation needs `&mut self`, so callers that share a graph across threads
//! wrap it in a lock (see [`KnowledgeBase`](crate::engine::KnowledgeBase)).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::GraphError;
use crate::relation::{Relation, RelationId, RelationType};

use super::{Triple, TripleId};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Counts reported by [`KnowledgeGraph::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added_entities: usize,
    pub added_relations: usize,
    /// New triples plus colliding triples that replaced an existing one.
    pub added_triples: usize,
}

/// Summary counts for a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub name: String,
    pub entity_count: usize,
    pub relation_count: usize,
    pub triple_count: usize,
    pub entities_by_type: BTreeMap<EntityType, usize>,
    pub relations_by_type: BTreeMap<RelationType, usize>,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph \"{}\"", self.name)?;
        writeln!(f, "  entities:   {}", self.entity_count)?;
        for (t, n) in &self.entities_by_type {
            writeln!(f, "    {:<14}{n}", t.as_str())?;
        }
        writeln!(f, "  relations:  {}", self.relation_count)?;
        for (t, n) in &self.relations_by_type {
            writeln!(f, "    {:<14}{n}", t.as_str())?;
        }
        writeln!(f, "  triples:    {}", self.triple_count)?;
        Ok(())
    }
}

/// Conflict strategy for [`KnowledgeGraph::merge`]: replace when the incoming
/// triple is strictly more confident than the existing one.
pub fn prefer_higher_confidence(incoming: &Triple, existing: &Triple) -> bool {
    incoming.confidence > existing.confidence
}

/// Indexed in-memory container of entities, relations and triples.
#[derive(Clone, Default)]
pub struct KnowledgeGraph {
    name: String,
    entities: BTreeMap<EntityId, Entity>,
    relations: BTreeMap<RelationId, Relation>,
    triples: BTreeMap<TripleId, Triple>,
    subject_index: HashMap<EntityId, BTreeSet<TripleId>>,
    object_index: HashMap<EntityId, BTreeSet<TripleId>>,
    relation_index: HashMap<RelationId, BTreeSet<TripleId>>,
    entity_type_index: HashMap<EntityType, BTreeSet<EntityId>>,
    relation_type_index: HashMap<RelationType, BTreeSet<RelationId>>,
}

impl KnowledgeGraph {
    /// Create an empty graph named "default".
    pub fn new() -> Self {
        Self::named("default")
    }

    /// Create an empty graph with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add an entity. Rejects empty and already-present ids, and embeddings
    /// with NaN or infinite components, without mutating.
    pub fn add_entity(&mut self, entity: Entity) -> GraphResult<()> {
        if entity.id.is_empty() {
            return Err(GraphError::EmptyId { kind: "entity" });
        }
        if entity
            .vector
            .as_deref()
            .is_some_and(|v| v.iter().any(|x| !x.is_finite()))
        {
            return Err(GraphError::NonFiniteVector {
                id: entity.id.to_string(),
            });
        }
        if self.entities.contains_key(&entity.id) {
            tracing::debug!(id = %entity.id, "rejected duplicate entity");
            return Err(GraphError::DuplicateEntity {
                id: entity.id.to_string(),
            });
        }
        self.entity_type_index
            .entry(entity.entity_type)
            .or_default()
            .insert(entity.id.clone());
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Add a relation. Rejects empty and already-present ids without mutating.
    pub fn add_relation(&mut self, relation: Relation) -> GraphResult<()> {
        if relation.id.is_empty() {
            return Err(GraphError::EmptyId { kind: "relation" });
        }
        if self.relations.contains_key(&relation.id) {
            tracing::debug!(id = %relation.id, "rejected duplicate relation");
            return Err(GraphError::DuplicateRelation {
                id: relation.id.to_string(),
            });
        }
        self.relation_type_index
            .entry(relation.relation_type)
            .or_default()
            .insert(relation.id.clone());
        self.relations.insert(relation.id.clone(), relation);
        Ok(())
    }

    /// Add a triple whose subject, relation and object are already in the graph.
    ///
    /// The id is re-derived from the endpoints before insertion. A triple
    /// with the same endpoints is rejected as a duplicate even if its
    /// confidence or properties differ.
    pub fn add_triple(&mut self, mut triple: Triple) -> GraphResult<TripleId> {
        triple.id = Triple::derive_id(&triple.subject, &triple.relation, &triple.object);
        self.validate_triple(&triple)?;
        if self.triples.contains_key(&triple.id) {
            tracing::debug!(id = %triple.id, "rejected duplicate triple");
            return Err(GraphError::DuplicateTriple {
                id: triple.id.to_string(),
            });
        }

        let id = triple.id.clone();
        self.subject_index
            .entry(triple.subject.clone())
            .or_default()
            .insert(id.clone());
        self.object_index
            .entry(triple.object.clone())
            .or_default()
            .insert(id.clone());
        self.relation_index
            .entry(triple.relation.clone())
            .or_default()
            .insert(id.clone());
        self.triples.insert(id.clone(), triple);
        Ok(id)
    }

    /// Build and add a triple from ids that must already resolve in this graph.
    pub fn add_triple_by_ids(
        &mut self,
        subject: &str,
        relation: &str,
        object: &str,
        confidence: f32,
    ) -> GraphResult<TripleId> {
        self.add_triple(Triple::from_ids(subject, relation, object, confidence))
    }

    /// Check that a triple's subject, relation and object are all present.
    pub fn validate_triple(&self, triple: &Triple) -> GraphResult<()> {
        let invalid = |role: &'static str, id: &str| GraphError::InvalidReference {
            triple_id: triple.id.to_string(),
            role,
            id: id.to_string(),
        };
        if !self.entities.contains_key(&triple.subject) {
            return Err(invalid("subject", triple.subject.as_str()));
        }
        if !self.relations.contains_key(&triple.relation) {
            return Err(invalid("relation", triple.relation.as_str()));
        }
        if !self.entities.contains_key(&triple.object) {
            return Err(invalid("object", triple.object.as_str()));
        }
        Ok(())
    }

    /// Remove an entity and every triple that has it as subject or object.
    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        if !self.entities.contains_key(id) {
            return None;
        }
        let doomed: Vec<TripleId> = self.touching_ids(id).into_iter().cloned().collect();
        for triple_id in &doomed {
            self.remove_triple(triple_id.as_str());
        }
        let entity = self.entities.remove(id)?;
        detach(&mut self.entity_type_index, &entity.entity_type, &entity.id);
        tracing::debug!(id, cascaded = doomed.len(), "removed entity");
        Some(entity)
    }

    /// Remove a relation and every triple that uses it.
    pub fn remove_relation(&mut self, id: &str) -> Option<Relation> {
        if !self.relations.contains_key(id) {
            return None;
        }
        let doomed: Vec<TripleId> = bucket(&self.relation_index, id).cloned().collect();
        for triple_id in &doomed {
            self.remove_triple(triple_id.as_str());
        }
        let relation = self.relations.remove(id)?;
        detach(
            &mut self.relation_type_index,
            &relation.relation_type,
            &relation.id,
        );
        tracing::debug!(id, cascaded = doomed.len(), "removed relation");
        Some(relation)
    }

    /// Remove a single triple. Entities and relations are left in place.
    pub fn remove_triple(&mut self, id: &str) -> Option<Triple> {
        let triple = self.triples.remove(id)?;
        detach(&mut self.subject_index, &triple.subject, &triple.id);
        detach(&mut self.object_index, &triple.object, &triple.id);
        detach(&mut self.relation_index, &triple.relation, &triple.id);
        Some(triple)
    }

    /// Set a property on an entity. Returns `false` if the entity is absent.
    pub fn set_entity_property(&mut self, id: &str, key: &str, value: &str) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.set_property(key, value);
                true
            }
            None => false,
        }
    }

    /// Set a property on a relation. Returns `false` if the relation is absent.
    pub fn set_relation_property(&mut self, id: &str, key: &str, value: &str) -> bool {
        match self.relations.get_mut(id) {
            Some(relation) => {
                relation.set_property(key, value);
                true
            }
            None => false,
        }
    }

    /// Set a property on a triple. Returns `false` if the triple is absent.
    pub fn set_triple_property(&mut self, id: &str, key: &str, value: &str) -> bool {
        match self.triples.get_mut(id) {
            Some(triple) => {
                triple.properties.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Point lookups
    // -----------------------------------------------------------------------

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn relation(&self, id: &str) -> Option<&Relation> {
        self.relations.get(id)
    }

    pub fn triple(&self, id: &str) -> Option<&Triple> {
        self.triples.get(id)
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn contains_relation(&self, id: &str) -> bool {
        self.relations.contains_key(id)
    }

    pub fn contains_triple(&self, id: &str) -> bool {
        self.triples.contains_key(id)
    }

    /// The triple with exactly these endpoints, if any.
    ///
    /// Derived ids collide when ids contain `_`, so the endpoints of the
    /// stored triple are checked as well.
    pub fn find_triple(&self, subject: &str, relation: &str, object: &str) -> Option<&Triple> {
        self.triples
            .get(format!("{subject}_{relation}_{object}").as_str())
            .filter(|t| {
                t.subject.as_str() == subject
                    && t.relation.as_str() == relation
                    && t.object.as_str() == object
            })
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    pub fn find_entities_by_name(&self, name: &str) -> Vec<&Entity> {
        self.entities.values().filter(|e| e.name == name).collect()
    }

    pub fn find_entities_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entity_type_index
            .get(&entity_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
            .collect()
    }

    pub fn find_relations_by_name(&self, name: &str) -> Vec<&Relation> {
        self.relations.values().filter(|r| r.name == name).collect()
    }

    pub fn find_relations_by_type(&self, relation_type: RelationType) -> Vec<&Relation> {
        self.relation_type_index
            .get(&relation_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relations.get(id))
            .collect()
    }

    pub fn find_triples_by_subject(&self, subject: &str) -> Vec<&Triple> {
        self.resolve_ids(bucket(&self.subject_index, subject))
    }

    pub fn find_triples_by_object(&self, object: &str) -> Vec<&Triple> {
        self.resolve_ids(bucket(&self.object_index, object))
    }

    pub fn find_triples_by_relation(&self, relation: &str) -> Vec<&Triple> {
        self.resolve_ids(bucket(&self.relation_index, relation))
    }

    pub fn find_triples_by_subject_and_relation(
        &self,
        subject: &str,
        relation: &str,
    ) -> Vec<&Triple> {
        self.smaller_bucket_filtered(
            bucket_len(&self.subject_index, subject),
            || bucket(&self.subject_index, subject),
            bucket_len(&self.relation_index, relation),
            || bucket(&self.relation_index, relation),
            |t| t.subject.as_str() == subject && t.relation.as_str() == relation,
        )
    }

    pub fn find_triples_by_relation_and_object(
        &self,
        relation: &str,
        object: &str,
    ) -> Vec<&Triple> {
        self.smaller_bucket_filtered(
            bucket_len(&self.relation_index, relation),
            || bucket(&self.relation_index, relation),
            bucket_len(&self.object_index, object),
            || bucket(&self.object_index, object),
            |t| t.relation.as_str() == relation && t.object.as_str() == object,
        )
    }

    pub fn find_triples_by_subject_and_object(&self, subject: &str, object: &str) -> Vec<&Triple> {
        self.smaller_bucket_filtered(
            bucket_len(&self.subject_index, subject),
            || bucket(&self.subject_index, subject),
            bucket_len(&self.object_index, object),
            || bucket(&self.object_index, object),
            |t| t.subject.as_str() == subject && t.object.as_str() == object,
        )
    }

    /// Every triple with `entity` as subject or object, each listed once, in id order.
    pub fn triples_touching(&self, entity: &str) -> Vec<&Triple> {
        self.resolve_ids(self.touching_ids(entity).into_iter())
    }

    // -----------------------------------------------------------------------
    // Mention resolution
    // -----------------------------------------------------------------------

    /// Resolve a free-text mention to an entity: exact id, then exact name,
    /// then case-insensitive name. Name ties go to the smallest id.
    pub fn resolve_entity(&self, mention: &str) -> Option<&Entity> {
        let mention = mention.trim();
        if mention.is_empty() {
            return None;
        }
        if let Some(entity) = self.entities.get(mention) {
            return Some(entity);
        }
        let folded = mention.to_lowercase();
        self.entities
            .values()
            .find(|e| e.name == mention)
            .or_else(|| self.entities.values().find(|e| e.name.to_lowercase() == folded))
    }

    /// Resolve a free-text mention to a relation, with the same precedence as
    /// [`resolve_entity`](Self::resolve_entity).
    pub fn resolve_relation(&self, mention: &str) -> Option<&Relation> {
        let mention = mention.trim();
        if mention.is_empty() {
            return None;
        }
        if let Some(relation) = self.relations.get(mention) {
            return Some(relation);
        }
        let folded = mention.to_lowercase();
        self.relations
            .values()
            .find(|r| r.name == mention)
            .or_else(|| self.relations.values().find(|r| r.name.to_lowercase() == folded))
    }

    /// Entities ranked by cosine similarity between their embedding and `query`.
    ///
    /// Entities without an embedding, or with one of a different length, are skipped.
    pub fn nearest_entities(&self, query: &[f32], top_k: usize) -> Vec<(&Entity, f32)> {
        let query_norm = norm(query);
        if query.is_empty() || query_norm == 0.0 {
            return Vec::new();
        }
        let mut scored: Vec<(&Entity, f32)> = self
            .entities
            .values()
            .filter_map(|e| {
                let v = e.vector.as_deref()?;
                if v.len() != query.len() {
                    return None;
                }
                let n = norm(v);
                if n == 0.0 {
                    return None;
                }
                let dot: f32 = v.iter().zip(query).map(|(a, b)| a * b).sum();
                Some((e, dot / (n * query_norm)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored
    }

    // -----------------------------------------------------------------------
    // Whole-graph operations
    // -----------------------------------------------------------------------

    /// Merge another graph into this one.
    ///
    /// Entities and relations with new ids are copied. A triple whose id
    /// already exists is passed to `resolve(incoming, existing)`: `true`
    /// replaces the existing triple, `false` keeps it.
    pub fn merge<F>(&mut self, other: &KnowledgeGraph, mut resolve: F) -> MergeStats
    where
        F: FnMut(&Triple, &Triple) -> bool,
    {
        let mut stats = MergeStats::default();

        for entity in other.entities.values() {
            if !self.entities.contains_key(&entity.id) && self.add_entity(entity.clone()).is_ok() {
                stats.added_entities += 1;
            }
        }
        for relation in other.relations.values() {
            if !self.relations.contains_key(&relation.id)
                && self.add_relation(relation.clone()).is_ok()
            {
                stats.added_relations += 1;
            }
        }

        for triple in other.triples.values() {
            let replace = self
                .triples
                .get(&triple.id)
                .map(|existing| resolve(triple, existing));
            match replace {
                Some(false) => {}
                Some(true) => {
                    let previous = self.remove_triple(triple.id.as_str());
                    match self.add_triple(triple.clone()) {
                        Ok(_) => stats.added_triples += 1,
                        Err(err) => {
                            tracing::warn!(%err, id = %triple.id, "merge: replacement rejected, restoring");
                            if let Some(previous) = previous {
                                self.add_triple(previous).ok();
                            }
                        }
                    }
                }
                None => {
                    if self.add_triple(triple.clone()).is_ok() {
                        stats.added_triples += 1;
                    }
                }
            }
        }

        tracing::debug!(
            from = %other.name,
            into = %self.name,
            entities = stats.added_entities,
            relations = stats.added_relations,
            triples = stats.added_triples,
            "merged graph"
        );
        stats
    }

    /// Merge keeping every existing triple on id collision.
    pub fn merge_keep_existing(&mut self, other: &KnowledgeGraph) -> MergeStats {
        self.merge(other, |_, _| false)
    }

    /// Copy a subset of the graph.
    ///
    /// With `include_connected`, the seed set is first closed over one hop in
    /// either direction. A triple is copied only when both of its endpoints
    /// end up in the closed set; its relation comes with it. Seeds that are
    /// not in the graph are ignored.
    pub fn extract_subgraph<I, S>(&self, entity_ids: I, include_connected: bool) -> KnowledgeGraph
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keep: BTreeSet<EntityId> = entity_ids
            .into_iter()
            .filter_map(|id| self.entities.get_key_value(id.as_ref()).map(|(k, _)| k.clone()))
            .collect();

        if include_connected {
            let seeds: Vec<EntityId> = keep.iter().cloned().collect();
            for seed in &seeds {
                for triple in self.triples_touching(seed.as_str()) {
                    keep.insert(triple.subject.clone());
                    keep.insert(triple.object.clone());
                }
            }
        }

        let mut sub = KnowledgeGraph::named(format!("{}_subgraph", self.name));
        for id in &keep {
            if let Some(entity) = self.entities.get(id) {
                sub.add_entity(entity.clone()).ok();
            }
        }
        for id in &keep {
            for triple in self.find_triples_by_subject(id.as_str()) {
                if !keep.contains(&triple.object) {
                    continue;
                }
                if !sub.contains_relation(triple.relation.as_str()) {
                    if let Some(relation) = self.relations.get(&triple.relation) {
                        sub.add_relation(relation.clone()).ok();
                    }
                }
                if let Err(err) = sub.add_triple(triple.clone()) {
                    tracing::debug!(%err, "subgraph: triple skipped");
                }
            }
        }
        sub
    }

    /// Remove everything, keeping the name.
    pub fn clear(&mut self) {
        *self = KnowledgeGraph::named(std::mem::take(&mut self.name));
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All relations in id order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// All triples in id order.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.values()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            name: self.name.clone(),
            entity_count: self.entities.len(),
            relation_count: self.relations.len(),
            triple_count: self.triples.len(),
            entities_by_type: self
                .entity_type_index
                .iter()
                .map(|(t, ids)| (*t, ids.len()))
                .collect(),
            relations_by_type: self
                .relation_type_index
                .iter()
                .map(|(t, ids)| (*t, ids.len()))
                .collect(),
        }
    }

    /// Describe every way the derived indices disagree with the owning maps.
    ///
    /// Empty when the graph is consistent.
    pub fn index_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for triple in self.triples.values() {
            if let Err(err) = self.validate_triple(triple) {
                problems.push(err.to_string());
            }
            let checks = [
                ("subject", bucket(&self.subject_index, triple.subject.as_str()).any(|id| *id == triple.id)),
                ("object", bucket(&self.object_index, triple.object.as_str()).any(|id| *id == triple.id)),
                ("relation", bucket(&self.relation_index, triple.relation.as_str()).any(|id| *id == triple.id)),
            ];
            for (index, present) in checks {
                if !present {
                    problems.push(format!("triple {} missing from {index} index", triple.id));
                }
            }
        }

        let triple_buckets = [
            ("subject", &self.subject_index, true),
            ("object", &self.object_index, false),
        ];
        for (index, map, is_subject) in triple_buckets {
            for (entity, ids) in map {
                if ids.is_empty() {
                    problems.push(format!("empty {index} bucket for {entity}"));
                }
                for id in ids {
                    let ok = self.triples.get(id).is_some_and(|t| {
                        if is_subject { &t.subject == entity } else { &t.object == entity }
                    });
                    if !ok {
                        problems.push(format!("{index} index lists stale triple {id} under {entity}"));
                    }
                }
            }
        }
        for (relation, ids) in &self.relation_index {
            if ids.is_empty() {
                problems.push(format!("empty relation bucket for {relation}"));
            }
            for id in ids {
                if !self.triples.get(id).is_some_and(|t| &t.relation == relation) {
                    problems.push(format!("relation index lists stale triple {id} under {relation}"));
                }
            }
        }

        for (t, ids) in &self.entity_type_index {
            for id in ids {
                if !self.entities.get(id).is_some_and(|e| e.entity_type == *t) {
                    problems.push(format!("entity type index lists stale entity {id} under {t}"));
                }
            }
        }
        for entity in self.entities.values() {
            if !self
                .entity_type_index
                .get(&entity.entity_type)
                .is_some_and(|ids| ids.contains(&entity.id))
            {
                problems.push(format!("entity {} missing from type index", entity.id));
            }
        }
        for (t, ids) in &self.relation_type_index {
            for id in ids {
                if !self.relations.get(id).is_some_and(|r| r.relation_type == *t) {
                    problems.push(format!("relation type index lists stale relation {id} under {t}"));
                }
            }
        }
        for relation in self.relations.values() {
            if !self
                .relation_type_index
                .get(&relation.relation_type)
                .is_some_and(|ids| ids.contains(&relation.id))
            {
                problems.push(format!("relation {} missing from type index", relation.id));
            }
        }

        problems
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn touching_ids<'a>(&'a self, entity: &str) -> Vec<&'a TripleId> {
        let mut ids: BTreeSet<&TripleId> = bucket(&self.subject_index, entity).collect();
        ids.extend(bucket(&self.object_index, entity));
        ids.into_iter().collect()
    }

    fn resolve_ids<'a>(&'a self, ids: impl Iterator<Item = &'a TripleId>) -> Vec<&'a Triple> {
        ids.filter_map(|id| self.triples.get(id)).collect()
    }

    fn smaller_bucket_filtered<'a, A, B>(
        &'a self,
        len_a: usize,
        a: impl FnOnce() -> A,
        len_b: usize,
        b: impl FnOnce() -> B,
        keep: impl Fn(&Triple) -> bool,
    ) -> Vec<&'a Triple>
    where
        A: Iterator<Item = &'a TripleId>,
        B: Iterator<Item = &'a TripleId>,
    {
        let candidates: Vec<&TripleId> = if len_a <= len_b {
            a().collect()
        } else {
            b().collect()
        };
        candidates
            .into_iter()
            .filter_map(|id| self.triples.get(id))
            .filter(|t| keep(*t))
            .collect()
    }
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("name", &self.name)
            .field("entities", &self.entity_count())
            .field("relations", &self.relation_count())
            .field("triples", &self.triple_count())
            .finish()
    }
}

fn bucket<'a, K, V>(index: &'a HashMap<K, BTreeSet<V>>, key: &str) -> impl Iterator<Item = &'a V> + 'a
where
    K: Hash + Eq + std::borrow::Borrow<str>,
{
    index.get(key).into_iter().flatten()
}

fn bucket_len<K, V>(index: &HashMap<K, BTreeSet<V>>, key: &str) -> usize
where
    K: Hash + Eq + std::borrow::Borrow<str>,
{
    index.get(key).map_or(0, BTreeSet::len)
}

/// Remove `value` from the bucket at `key`, dropping the bucket once empty.
fn detach<K, V>(index: &mut HashMap<K, BTreeSet<V>>, key: &K, value: &V)
where
    K: Hash + Eq,
    V: Ord,
{
    if let Some(ids) = index.get_mut(key) {
        ids.remove(value);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
