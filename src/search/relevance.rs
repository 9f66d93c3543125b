//! Query/triple relevance scoring.

use crate::graph::{KnowledgeGraph, Triple};
use crate::query::QueryIntent;

const SUBJECT_WEIGHT: f32 = 0.4;
const OBJECT_WEIGHT: f32 = 0.3;
const RELATION_WEIGHT: f32 = 0.3;
const ATTRIBUTE_WEIGHT: f32 = 0.2;

/// Score how well `triple` matches `intent`, in [0, 1].
///
/// | condition                                           | weight |
/// |-----------------------------------------------------|--------|
/// | subject name equals an entity mention               | 0.4    |
/// | object name equals an entity mention                | 0.3    |
/// | relation name equals a relation mention             | 0.3    |
/// | relation name contains an attribute mention         | 0.2    |
///
/// The weights can sum past 1; the total is clamped.
pub fn calculate_relevance(graph: &KnowledgeGraph, triple: &Triple, intent: &QueryIntent) -> f32 {
    let subject = graph.entity(triple.subject.as_str()).map(|e| e.name.as_str());
    let object = graph.entity(triple.object.as_str()).map(|e| e.name.as_str());
    let relation = graph.relation(triple.relation.as_str()).map(|r| r.name.as_str());

    let mut score = 0.0f32;
    if subject.is_some_and(|name| equals_any(&intent.entities, name)) {
        score += SUBJECT_WEIGHT;
    }
    if object.is_some_and(|name| equals_any(&intent.entities, name)) {
        score += OBJECT_WEIGHT;
    }
    if relation.is_some_and(|name| equals_any(&intent.relations, name)) {
        score += RELATION_WEIGHT;
    }
    if relation.is_some_and(|name| {
        intent
            .attributes
            .iter()
            .any(|a| !a.is_empty() && name.contains(a.as_str()))
    }) {
        score += ATTRIBUTE_WEIGHT;
    }
    score.clamp(0.0, 1.0)
}

fn equals_any(mentions: &[String], name: &str) -> bool {
    mentions.iter().any(|m| m == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityType};
    use crate::query::QueryType;
    use crate::relation::{Relation, RelationType};

    fn graph() -> KnowledgeGraph {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(Entity::new("e1", "北京", EntityType::Location))
            .unwrap();
        kg.add_entity(Entity::new("e3", "中国", EntityType::Location))
            .unwrap();
        kg.add_relation(Relation::new("r2", "首都", RelationType::CapitalOf))
            .unwrap();
        kg.add_triple_by_ids("e1", "r2", "e3", 0.8).unwrap();
        kg
    }

    fn intent(entities: &[&str], relations: &[&str], attributes: &[&str]) -> QueryIntent {
        QueryIntent {
            entities: entities.iter().map(|s| s.to_string()).collect(),
            relations: relations.iter().map(|s| s.to_string()).collect(),
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            ..QueryIntent::new(QueryType::Fact)
        }
    }

    #[test]
    fn weights_add_up_per_condition() {
        let kg = graph();
        let t = kg.triple("e1_r2_e3").unwrap();
        let score = |i: &QueryIntent| calculate_relevance(&kg, t, i);
        assert_eq!(score(&intent(&[], &[], &[])), 0.0);
        assert!((score(&intent(&["北京"], &[], &[])) - 0.4).abs() < 1e-6);
        assert!((score(&intent(&["中国"], &[], &[])) - 0.3).abs() < 1e-6);
        assert!((score(&intent(&["北京", "中国"], &[], &[])) - 0.7).abs() < 1e-6);
        assert!((score(&intent(&[], &["首都"], &[])) - 0.3).abs() < 1e-6);
        assert!((score(&intent(&[], &[], &["首"])) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn total_is_clamped_to_one() {
        let kg = graph();
        let t = kg.triple("e1_r2_e3").unwrap();
        let all = intent(&["北京", "中国"], &["首都"], &["首都"]);
        assert_eq!(calculate_relevance(&kg, t, &all), 1.0);
    }

    #[test]
    fn names_must_match_exactly() {
        let kg = graph();
        let t = kg.triple("e1_r2_e3").unwrap();
        assert_eq!(calculate_relevance(&kg, t, &intent(&["北"], &["首"], &[])), 0.0);
        assert_eq!(calculate_relevance(&kg, t, &intent(&[], &[], &[""])), 0.0);
    }
}
