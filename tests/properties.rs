//! Property tests for graph consistency, pagination and ranking bounds.

use kgqa::entity::{Entity, EntityType};
use kgqa::graph::KnowledgeGraph;
use kgqa::graph::traverse::find_entity_paths;
use kgqa::query::{QueryIntent, QueryType};
use kgqa::relation::{Relation, RelationType};
use kgqa::search::{GraphSearcher, SearchParams, calculate_relevance};
use proptest::prelude::*;

const ENTITIES: usize = 8;
const RELATIONS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    AddEntity(usize),
    AddTriple(usize, usize, usize, f32),
    RemoveTriple(usize, usize, usize),
    RemoveEntity(usize),
    RemoveRelation(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ENTITIES).prop_map(Op::AddEntity),
        (0..ENTITIES, 0..RELATIONS, 0..ENTITIES, 0.0f32..=1.0)
            .prop_map(|(s, r, o, c)| Op::AddTriple(s, r, o, c)),
        (0..ENTITIES, 0..RELATIONS, 0..ENTITIES).prop_map(|(s, r, o)| Op::RemoveTriple(s, r, o)),
        (0..ENTITIES).prop_map(Op::RemoveEntity),
        (0..RELATIONS).prop_map(Op::RemoveRelation),
    ]
}

fn entity_id(i: usize) -> String {
    format!("e{i}")
}

fn relation_id(i: usize) -> String {
    format!("r{i}")
}

fn full_graph() -> KnowledgeGraph {
    let mut kg = KnowledgeGraph::named("prop");
    for i in 0..ENTITIES {
        let ty = if i % 2 == 0 { EntityType::Location } else { EntityType::Concept };
        kg.add_entity(Entity::new(entity_id(i), format!("n{i}"), ty))
            .unwrap();
    }
    for i in 0..RELATIONS {
        kg.add_relation(Relation::new(relation_id(i), format!("rel{i}"), RelationType::RelatedTo))
            .unwrap();
    }
    kg
}

fn apply(kg: &mut KnowledgeGraph, op: &Op) {
    // Errors (duplicates, dangling references) are expected outcomes here.
    match *op {
        Op::AddEntity(i) => {
            let _ = kg.add_entity(Entity::new(entity_id(i), format!("n{i}"), EntityType::Unknown));
        }
        Op::AddTriple(s, r, o, c) => {
            let _ = kg.add_triple_by_ids(&entity_id(s), &relation_id(r), &entity_id(o), c);
        }
        Op::RemoveTriple(s, r, o) => {
            kg.remove_triple(&format!("e{s}_r{r}_e{o}"));
        }
        Op::RemoveEntity(i) => {
            kg.remove_entity(&entity_id(i));
        }
        Op::RemoveRelation(i) => {
            kg.remove_relation(&relation_id(i));
        }
    }
}

fn edges_strategy() -> impl Strategy<Value = Vec<(usize, usize, usize)>> {
    prop::collection::vec((0..ENTITIES, 0..RELATIONS, 0..ENTITIES), 0..24)
}

fn graph_with_edges(edges: &[(usize, usize, usize)]) -> KnowledgeGraph {
    let mut kg = full_graph();
    for &(s, r, o) in edges {
        let _ = kg.add_triple_by_ids(&entity_id(s), &relation_id(r), &entity_id(o), 1.0);
    }
    kg
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn indices_stay_consistent_under_mutation(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut kg = full_graph();
        for op in &ops {
            apply(&mut kg, op);
            let problems = kg.index_violations();
            prop_assert!(problems.is_empty(), "after {:?}: {:?}", op, problems);
        }
        for t in kg.triples() {
            prop_assert!(kg.contains_entity(t.subject.as_str()));
            prop_assert!(kg.contains_relation(t.relation.as_str()));
            prop_assert!(kg.contains_entity(t.object.as_str()));
        }
    }

    #[test]
    fn pagination_slices_the_full_ranking(
        edges in edges_strategy(),
        hub in 0..ENTITIES,
        offset in 0usize..12,
        max_results in 0usize..12,
    ) {
        let kg = graph_with_edges(&edges);
        let searcher = GraphSearcher::new(&kg);
        let hub = entity_id(hub);

        let all = searcher.search_by_entity(&hub, &SearchParams::default().with_max_results(usize::MAX));
        let page = searcher.search_by_entity(
            &hub,
            &SearchParams::default().with_offset(offset).with_max_results(max_results),
        );

        let n = all.len();
        prop_assert_eq!(page.len(), max_results.min(n.saturating_sub(offset)));
        prop_assert_eq!(page.total_matches, page.len());
        let expected: Vec<&str> = all.triple_ids().into_iter().skip(offset).take(max_results).collect();
        prop_assert_eq!(page.triple_ids(), expected);
    }

    #[test]
    fn bounded_paths_are_simple(
        edges in edges_strategy(),
        source in 0..ENTITIES,
        target in 0..ENTITIES,
        max_depth in 0usize..5,
    ) {
        let kg = graph_with_edges(&edges);
        let source_id = entity_id(source);
        let target_id = entity_id(target);
        let paths = find_entity_paths(&kg, &source_id, &target_id, max_depth);
        let mut last_len = 0;
        for path in &paths {
            if source != target {
                prop_assert!(path.len() <= max_depth);
            }
            prop_assert!(path.len() >= last_len);
            last_len = path.len();
            prop_assert_eq!(path.entities.len(), path.triples.len() + 1);
            prop_assert_eq!(path.entities.first().map(|e| e.as_str()), Some(source_id.as_str()));
            prop_assert_eq!(path.entities.last().map(|e| e.as_str()), Some(target_id.as_str()));
            let mut seen = std::collections::HashSet::new();
            prop_assert!(path.entities.iter().all(|e| seen.insert(e)));
        }
    }

    #[test]
    fn relevance_is_a_unit_score(
        edges in edges_strategy(),
        entities in prop::collection::vec(prop_oneof![
            (0..ENTITIES).prop_map(|i| format!("n{i}")),
            "[a-z]{1,4}",
        ], 0..4),
        relations in prop::collection::vec((0..RELATIONS).prop_map(|i| format!("rel{i}")), 0..3),
        attributes in prop::collection::vec("[a-z]{1,4}", 0..3),
    ) {
        let kg = graph_with_edges(&edges);
        let mut intent = QueryIntent::new(QueryType::Relation);
        intent.entities = entities;
        intent.relations = relations;
        intent.attributes = attributes;
        for triple in kg.triples() {
            let score = calculate_relevance(&kg, triple, &intent);
            prop_assert!((0.0..=1.0).contains(&score), "{} scored {}", triple.id, score);
        }
    }
}
