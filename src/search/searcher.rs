//! Strategy dispatch, sub-queries and post-processing.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use crate::entity::{Entity, EntityType};
use crate::graph::traverse::{self, EntityPath};
use crate::graph::{KnowledgeGraph, Triple};
use crate::query::parser::LIST_TYPE;
use crate::query::{QueryParseResult, QueryType};
use crate::relation::{Relation, RelationType};

use super::relevance::calculate_relevance;
use super::{
    FILTER_ENTITY_TYPE, FILTER_RELATION_TYPE, META_MATCHED_BY, META_PATH_INDEX, META_PATH_LENGTH,
    SearchParams, SearchResult, SearchResultItem, SearchStrategy, TripleLabels,
};

/// Read-only searcher over one graph.
///
/// The strategy given to [`with_strategy`](Self::with_strategy) is only a
/// default: [`search_with`](Self::search_with) takes the strategy per call,
/// so one searcher can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct GraphSearcher<'g> {
    graph: &'g KnowledgeGraph,
    strategy: SearchStrategy,
    relation_path_depth: usize,
    path_max_depth: usize,
}

impl<'g> GraphSearcher<'g> {
    /// Hop limit for relation queries under exact match.
    pub const DEFAULT_RELATION_PATH_DEPTH: usize = 2;
    /// Hop limit for the path-finding strategy.
    pub const DEFAULT_PATH_MAX_DEPTH: usize = 3;

    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            strategy: SearchStrategy::default(),
            relation_path_depth: Self::DEFAULT_RELATION_PATH_DEPTH,
            path_max_depth: Self::DEFAULT_PATH_MAX_DEPTH,
        }
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_relation_path_depth(mut self, depth: usize) -> Self {
        self.relation_path_depth = depth;
        self
    }

    pub fn with_path_max_depth(mut self, depth: usize) -> Self {
        self.path_max_depth = depth;
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn graph(&self) -> &'g KnowledgeGraph {
        self.graph
    }

    /// Search with the default strategy.
    pub fn search(&self, parsed: &QueryParseResult, params: &SearchParams) -> SearchResult {
        self.search_with(self.strategy, parsed, params)
    }

    /// Search with an explicit strategy.
    pub fn search_with(
        &self,
        strategy: SearchStrategy,
        parsed: &QueryParseResult,
        params: &SearchParams,
    ) -> SearchResult {
        let started = Instant::now();
        let raw = self.dispatch(strategy, parsed);
        tracing::debug!(
            strategy = %strategy,
            query_type = %parsed.intent.query_type,
            raw = raw.len(),
            "search dispatched"
        );
        self.finish(raw, params, strategy, started)
    }

    /// Every triple touching `entity` (id or name), each with relevance 1.0.
    pub fn search_by_entity(&self, entity: &str, params: &SearchParams) -> SearchResult {
        let started = Instant::now();
        let raw = match self.graph.resolve_entity(entity) {
            Some(e) => self
                .graph
                .triples_touching(e.id.as_str())
                .into_iter()
                .map(|t| self.item(t, 1.0, matched_by("entity")))
                .collect(),
            None => Vec::new(),
        };
        self.finish(raw, params, SearchStrategy::ExactMatch, started)
    }

    /// Every triple using `relation` (id or name), each with relevance 1.0.
    pub fn search_by_relation(&self, relation: &str, params: &SearchParams) -> SearchResult {
        let started = Instant::now();
        let raw = match self.graph.resolve_relation(relation) {
            Some(r) => self
                .graph
                .find_triples_by_relation(r.id.as_str())
                .into_iter()
                .map(|t| self.item(t, 1.0, matched_by("relation")))
                .collect(),
            None => Vec::new(),
        };
        self.finish(raw, params, SearchStrategy::ExactMatch, started)
    }

    /// Paths between two entities (ids or names), flattened to one item per
    /// triple per path. Items on a path of length `n` score `1 / n`.
    pub fn find_path(
        &self,
        source: &str,
        target: &str,
        max_depth: usize,
        params: &SearchParams,
    ) -> SearchResult {
        let started = Instant::now();
        let raw = match (
            self.graph.resolve_entity(source),
            self.graph.resolve_entity(target),
        ) {
            (Some(s), Some(t)) => self.path_items(s, t, max_depth),
            _ => Vec::new(),
        };
        self.finish(raw, params, SearchStrategy::PathFinding, started)
    }

    /// BFS paths between two entities (ids or names). Empty if either is unknown.
    pub fn find_entity_paths(&self, source: &str, target: &str, max_depth: usize) -> Vec<EntityPath> {
        match (
            self.graph.resolve_entity(source),
            self.graph.resolve_entity(target),
        ) {
            (Some(s), Some(t)) => {
                traverse::find_entity_paths(self.graph, s.id.as_str(), t.id.as_str(), max_depth)
            }
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn dispatch(&self, strategy: SearchStrategy, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        match strategy {
            SearchStrategy::ExactMatch => self.exact_match(parsed),
            SearchStrategy::SemanticSearch => self.semantic(parsed),
            SearchStrategy::PathFinding => self.path_finding(parsed),
            SearchStrategy::Hybrid => match parsed.intent.query_type {
                QueryType::Relation | QueryType::Comparison => self.path_finding(parsed),
                QueryType::Definition | QueryType::Open => self.semantic(parsed),
                _ => self.exact_match(parsed),
            },
        }
    }

    fn semantic(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        tracing::debug!("semantic search has no model behind it; using exact match");
        self.exact_match(parsed)
    }

    fn path_finding(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        match (self.entity_at(parsed, 0), self.entity_at(parsed, 1)) {
            (Some(s), Some(t)) => self.path_items(s, t, self.path_max_depth),
            _ => self.exact_match(parsed),
        }
    }

    fn exact_match(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        match parsed.intent.query_type {
            QueryType::Entity => self.entity_query(parsed),
            QueryType::Relation => self.relation_query(parsed),
            QueryType::Attribute => self.attribute_query(parsed),
            QueryType::List => self.list_query(parsed),
            QueryType::Fact => self.fact_query(parsed),
            QueryType::Definition
            | QueryType::Comparison
            | QueryType::Open
            | QueryType::Unknown => self.generic_query(parsed),
        }
    }

    // -----------------------------------------------------------------------
    // Exact-match sub-queries
    // -----------------------------------------------------------------------

    fn entity_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        let Some(entity) = self.entity_at(parsed, 0) else {
            return Vec::new();
        };
        self.graph
            .triples_touching(entity.id.as_str())
            .into_iter()
            .map(|t| self.scored(t, parsed, "entity"))
            .collect()
    }

    fn relation_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        match (self.entity_at(parsed, 0), self.entity_at(parsed, 1)) {
            (Some(s), Some(t)) => self.path_items(s, t, self.relation_path_depth),
            _ => Vec::new(),
        }
    }

    fn attribute_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        let Some(entity) = self.entity_at(parsed, 0) else {
            return Vec::new();
        };
        let attributes = &parsed.intent.attributes;
        self.graph
            .triples_touching(entity.id.as_str())
            .into_iter()
            .filter(|t| {
                self.relation_of(t).is_some_and(|r| {
                    r.relation_type == RelationType::HasProperty
                        || attributes
                            .iter()
                            .any(|a| !a.is_empty() && r.name.contains(a.as_str()))
                })
            })
            .map(|t| self.scored(t, parsed, "attribute"))
            .collect()
    }

    fn list_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        let Some(entity) = self.entity_at(parsed, 0) else {
            return Vec::new();
        };
        let list_type = parsed.intent.parameter(LIST_TYPE).unwrap_or_default();
        let member_type = list_type
            .parse::<EntityType>()
            .unwrap_or(EntityType::Unknown);
        self.graph
            .triples_touching(entity.id.as_str())
            .into_iter()
            .filter(|t| {
                if list_type.is_empty() {
                    return true;
                }
                let member_matches = member_type != EntityType::Unknown
                    && t.other_end(entity.id.as_str())
                        .and_then(|id| self.graph.entity(id.as_str()))
                        .is_some_and(|e| e.entity_type == member_type);
                member_matches
                    || self
                        .relation_of(t)
                        .is_some_and(|r| r.name.contains(list_type))
            })
            .map(|t| self.scored(t, parsed, "list"))
            .collect()
    }

    fn fact_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        match (self.entity_at(parsed, 0), self.entity_at(parsed, 1)) {
            (Some(s), Some(o)) => self
                .graph
                .find_triples_by_subject_and_object(s.id.as_str(), o.id.as_str())
                .into_iter()
                .map(|t| self.item(t, 1.0, matched_by("fact")))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Union of the triples touching each entity mention and the triples
    /// using each relation mention, each triple once.
    fn generic_query(&self, parsed: &QueryParseResult) -> Vec<SearchResultItem> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        let by_entity = (0..parsed.intent.entities.len())
            .filter_map(|i| self.entity_at(parsed, i))
            .flat_map(|e| self.graph.triples_touching(e.id.as_str()));
        let by_relation = (0..parsed.intent.relations.len())
            .filter_map(|i| self.relation_at(parsed, i))
            .flat_map(|r| self.graph.find_triples_by_relation(r.id.as_str()));

        for triple in by_entity.chain(by_relation) {
            if seen.insert(&triple.id) {
                items.push(self.scored(triple, parsed, "generic"));
            }
        }
        items
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn path_items(&self, source: &Entity, target: &Entity, max_depth: usize) -> Vec<SearchResultItem> {
        let paths =
            traverse::find_entity_paths(self.graph, source.id.as_str(), target.id.as_str(), max_depth);
        let mut items = Vec::new();
        for (index, path) in paths.iter().enumerate() {
            if path.is_empty() {
                continue;
            }
            let relevance = 1.0 / path.len() as f32;
            for triple_id in &path.triples {
                let Some(triple) = self.graph.triple(triple_id.as_str()) else {
                    continue;
                };
                let mut metadata = matched_by("path");
                metadata.insert(META_PATH_INDEX.to_string(), index.to_string());
                metadata.insert(META_PATH_LENGTH.to_string(), path.len().to_string());
                items.push(self.item(triple, relevance, metadata));
            }
        }
        items
    }

    /// The `index`-th entity mention: its linked id when linking found one,
    /// otherwise the graph's own resolution of the mention text.
    fn entity_at(&self, parsed: &QueryParseResult, index: usize) -> Option<&'g Entity> {
        if let Some(entity) = parsed
            .linked_entity_id(index)
            .and_then(|id| self.graph.entity(id.as_str()))
        {
            return Some(entity);
        }
        self.graph.resolve_entity(parsed.intent.entities.get(index)?)
    }

    fn relation_at(&self, parsed: &QueryParseResult, index: usize) -> Option<&'g Relation> {
        if let Some(relation) = parsed
            .linked_relations
            .get(index)
            .and_then(|l| l.relation_id.as_ref())
            .and_then(|id| self.graph.relation(id.as_str()))
        {
            return Some(relation);
        }
        self.graph.resolve_relation(parsed.intent.relations.get(index)?)
    }

    fn relation_of(&self, triple: &Triple) -> Option<&'g Relation> {
        self.graph.relation(triple.relation.as_str())
    }

    fn scored(&self, triple: &Triple, parsed: &QueryParseResult, source: &str) -> SearchResultItem {
        let relevance = calculate_relevance(self.graph, triple, &parsed.intent);
        self.item(triple, relevance, matched_by(source))
    }

    fn item(&self, triple: &Triple, relevance: f32, metadata: BTreeMap<String, String>) -> SearchResultItem {
        let name_of = |id: &str| {
            self.graph
                .entity(id)
                .map_or_else(|| id.to_string(), |e| e.name.clone())
        };
        let labels = TripleLabels {
            subject: name_of(triple.subject.as_str()),
            relation: self
                .relation_of(triple)
                .map_or_else(|| triple.relation.to_string(), |r| r.name.clone()),
            object: name_of(triple.object.as_str()),
        };
        SearchResultItem {
            triple: triple.clone(),
            labels,
            relevance_score: relevance,
            confidence_score: triple.confidence,
            metadata,
        }
    }

    /// A filter value that names no known type matches nothing.
    fn passes_filters(&self, triple: &Triple, params: &SearchParams) -> bool {
        if let Some(value) = params.filters.get(FILTER_RELATION_TYPE) {
            let Some(wanted) = RelationType::lookup(value) else {
                tracing::debug!(%value, "unrecognized relation_type filter");
                return false;
            };
            if !self.relation_of(triple).is_some_and(|r| r.relation_type == wanted) {
                return false;
            }
        }
        if let Some(value) = params.filters.get(FILTER_ENTITY_TYPE) {
            let Some(wanted) = EntityType::lookup(value) else {
                tracing::debug!(%value, "unrecognized entity_type filter");
                return false;
            };
            let is_wanted = |id: &str| {
                self.graph
                    .entity(id)
                    .is_some_and(|e| e.entity_type == wanted)
            };
            if !is_wanted(triple.subject.as_str()) && !is_wanted(triple.object.as_str()) {
                return false;
            }
        }
        true
    }

    /// Filters, confidence floor, stable sort by relevance, offset, limit.
    fn finish(
        &self,
        raw: Vec<SearchResultItem>,
        params: &SearchParams,
        strategy: SearchStrategy,
        started: Instant,
    ) -> SearchResult {
        let mut ranked: Vec<SearchResultItem> = raw
            .into_iter()
            .filter(|item| self.passes_filters(&item.triple, params))
            .filter(|item| item.confidence_score >= params.min_confidence)
            .collect();
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        let mut items: Vec<SearchResultItem> = ranked
            .into_iter()
            .skip(params.offset)
            .take(params.max_results)
            .collect();
        for item in &mut items {
            if !params.include_properties {
                item.triple.properties.clear();
            }
            if !params.include_meta {
                item.metadata.clear();
            }
        }

        SearchResult {
            total_matches: items.len(),
            items,
            execution_time: started.elapsed(),
            search_strategy: strategy.as_str().to_string(),
        }
    }
}

fn matched_by(source: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(META_MATCHED_BY.to_string(), source.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryIntent, QueryParser};

    /// 北京 -位于-> 中国, 上海 -位于-> 中国, 北京 -首都-> 中国,
    /// 长江 -流经-> 上海, 长江 -位于-> 中国, 中国 -长度-> 长江 (property edge).
    fn atlas() -> KnowledgeGraph {
        let mut kg = KnowledgeGraph::named("atlas");
        for (id, name, ty) in [
            ("e1", "北京", EntityType::Location),
            ("e2", "上海", EntityType::Location),
            ("e3", "中国", EntityType::Location),
            ("e4", "长江", EntityType::River),
            ("e5", "6300公里", EntityType::Concept),
        ] {
            kg.add_entity(Entity::new(id, name, ty)).unwrap();
        }
        kg.add_relation(Relation::new("r1", "位于", RelationType::LocatedIn))
            .unwrap();
        kg.add_relation(Relation::new("r2", "首都", RelationType::CapitalOf))
            .unwrap();
        kg.add_relation(Relation::new("r3", "流经", RelationType::FlowsThrough))
            .unwrap();
        kg.add_relation(Relation::new("r4", "长度", RelationType::HasProperty))
            .unwrap();
        kg.add_triple_by_ids("e1", "r1", "e3", 1.0).unwrap();
        kg.add_triple_by_ids("e2", "r1", "e3", 0.9).unwrap();
        kg.add_triple_by_ids("e1", "r2", "e3", 0.8).unwrap();
        kg.add_triple_by_ids("e4", "r3", "e2", 0.7).unwrap();
        kg.add_triple_by_ids("e4", "r1", "e3", 0.6).unwrap();
        kg.add_triple_by_ids("e4", "r4", "e5", 0.95).unwrap();
        kg
    }

    fn ask(kg: &KnowledgeGraph, strategy: SearchStrategy, text: &str) -> SearchResult {
        let parsed = QueryParser::new().parse(text);
        GraphSearcher::new(kg).search_with(strategy, &parsed, &SearchParams::default())
    }

    #[test]
    fn search_by_entity_single_triple_has_full_relevance() {
        let mut kg = KnowledgeGraph::new();
        kg.add_entity(Entity::new("e1", "北京", EntityType::Location))
            .unwrap();
        kg.add_entity(Entity::new("e3", "中国", EntityType::Location))
            .unwrap();
        kg.add_relation(Relation::new("r1", "位于", RelationType::LocatedIn))
            .unwrap();
        kg.add_triple_by_ids("e1", "r1", "e3", 1.0).unwrap();

        let result = GraphSearcher::new(&kg).search_by_entity("e1", &SearchParams::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.items[0].relevance_score, 1.0);
        assert_eq!(result.items[0].labels.to_string(), "北京 --位于--> 中国");
        assert_eq!(result.search_strategy, "EXACT_MATCH");
    }

    #[test]
    fn search_by_entity_accepts_names_and_rejects_unknowns() {
        let kg = atlas();
        let s = GraphSearcher::new(&kg);
        assert_eq!(s.search_by_entity("北京", &SearchParams::default()).len(), 2);
        assert!(s.search_by_entity("火星", &SearchParams::default()).is_empty());
    }

    #[test]
    fn search_by_relation() {
        let kg = atlas();
        let s = GraphSearcher::new(&kg);
        let result = s.search_by_relation("位于", &SearchParams::default());
        assert_eq!(result.len(), 3);
        assert!(result.items.iter().all(|i| i.relevance_score == 1.0));
        assert!(s.search_by_relation("r99", &SearchParams::default()).is_empty());
    }

    #[test]
    fn three_hop_chain_path() {
        let mut kg = KnowledgeGraph::new();
        for id in ["a", "b", "c", "d"] {
            kg.add_entity(Entity::new(id, id.to_uppercase(), EntityType::Concept))
                .unwrap();
        }
        kg.add_relation(Relation::new("r", "r", RelationType::RelatedTo))
            .unwrap();
        kg.add_triple_by_ids("a", "r", "b", 1.0).unwrap();
        kg.add_triple_by_ids("b", "r", "c", 1.0).unwrap();
        kg.add_triple_by_ids("c", "r", "d", 1.0).unwrap();

        let result = GraphSearcher::new(&kg).find_path("a", "d", 3, &SearchParams::default());
        assert_eq!(result.len(), 3);
        for item in &result.items {
            assert!((item.relevance_score - 1.0 / 3.0).abs() < 1e-6);
            assert_eq!(item.metadata[META_PATH_INDEX], "0");
            assert_eq!(item.metadata[META_PATH_LENGTH], "3");
        }
        assert_eq!(result.search_strategy, "PATH_FINDING");
        assert!(
            GraphSearcher::new(&kg)
                .find_path("a", "d", 2, &SearchParams::default())
                .is_empty()
        );
    }

    #[test]
    fn find_path_to_self_has_no_items_but_one_trivial_path() {
        let kg = atlas();
        let s = GraphSearcher::new(&kg);
        assert!(s.find_path("北京", "北京", 3, &SearchParams::default()).is_empty());
        assert_eq!(s.find_entity_paths("北京", "e1", 3).len(), 1);
    }

    #[test]
    fn entity_query_ranks_subject_matches_first() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "中国是谁");
        // 中国 is only ever the object: every hit scores 0.3.
        assert_eq!(result.len(), 4);
        assert!(result.items.iter().all(|i| (i.relevance_score - 0.3).abs() < 1e-6));

        let result = ask(&kg, SearchStrategy::ExactMatch, "介绍一下北京");
        assert_eq!(result.len(), 2);
        assert!((result.items[0].relevance_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn relation_query_walks_paths() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "北京和中国是什么关系");
        assert_eq!(result.len(), 2);
        let ids = result.triple_ids();
        assert!(ids.contains(&"e1_r1_e3"));
        assert!(ids.contains(&"e1_r2_e3"));
        assert!(result.items.iter().all(|i| i.relevance_score == 1.0));
    }

    #[test]
    fn relation_query_depth_is_bounded() {
        let kg = atlas();
        // 北京 - 中国 - 上海 is 2 hops; 北京 - 长江 needs 2 as well.
        let result = ask(&kg, SearchStrategy::ExactMatch, "北京和长江是什么关系");
        assert!(!result.is_empty());
        assert!(result.items.iter().all(|i| i.metadata[META_PATH_LENGTH] == "2"));
        let deep = GraphSearcher::new(&kg).with_relation_path_depth(1);
        let parsed = QueryParser::new().parse("北京和长江是什么关系");
        assert!(deep.search(&parsed, &SearchParams::default()).is_empty());
    }

    #[test]
    fn attribute_query_keeps_property_edges_and_name_hits() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "长江的长度是多少");
        assert_eq!(result.triple_ids(), ["e4_r4_e5"]);
        assert!((result.items[0].relevance_score - 0.6).abs() < 1e-6);

        let result = ask(&kg, SearchStrategy::ExactMatch, "北京的首都是什么");
        assert_eq!(result.triple_ids(), ["e1_r2_e3"]);
    }

    #[test]
    fn list_query_filters_by_member_type() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "上海有哪些河流");
        assert_eq!(result.triple_ids(), ["e4_r3_e2"]);

        let result = ask(&kg, SearchStrategy::ExactMatch, "中国有哪些地点");
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn fact_query_forces_full_relevance() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "北京是不是中国的首都");
        assert_eq!(result.len(), 2);
        assert!(result.items.iter().all(|i| i.relevance_score == 1.0));
        assert!(ask(&kg, SearchStrategy::ExactMatch, "中国是不是北京").is_empty());
    }

    #[test]
    fn generic_query_unions_and_dedupes() {
        let kg = atlas();
        let intent = QueryIntent {
            entities: vec!["北京".into(), "中国".into()],
            relations: vec!["首都".into()],
            ..QueryIntent::new(QueryType::Unknown)
        };
        let parsed = QueryParseResult::from_intent(intent);
        let result = GraphSearcher::new(&kg).search(&parsed, &SearchParams::default());
        // Every triple touching 北京 or 中国, once each.
        assert_eq!(result.len(), 4);
        assert_eq!(result.items[0].triple.id.as_str(), "e1_r2_e3");
        assert_eq!(result.items[0].relevance_score, 1.0);
    }

    #[test]
    fn unresolvable_queries_are_empty() {
        let kg = atlas();
        for strategy in SearchStrategy::ALL {
            let r = ask(&kg, strategy, "火星是谁");
            assert!(r.is_empty());
            assert_eq!(r.total_matches, 0);
            assert_eq!(r.search_strategy, strategy.as_str());
        }
    }

    #[test]
    fn semantic_search_matches_exact_match() {
        let kg = atlas();
        for q in ["介绍一下北京", "长江的长度是多少", "北京和中国是什么关系"] {
            assert_eq!(
                ask(&kg, SearchStrategy::SemanticSearch, q).items,
                ask(&kg, SearchStrategy::ExactMatch, q).items
            );
        }
    }

    #[test]
    fn path_finding_uses_its_own_depth_and_falls_back() {
        let kg = atlas();
        let parsed = QueryParser::new().parse("北京和长江哪个更大");
        let searcher = GraphSearcher::new(&kg).with_strategy(SearchStrategy::PathFinding);
        let result = searcher.search(&parsed, &SearchParams::default());
        assert!(!result.is_empty());
        assert!(result.items.iter().all(|i| i.metadata.contains_key(META_PATH_INDEX)));

        // One entity only: exact match takes over.
        let single = ask(&kg, SearchStrategy::PathFinding, "介绍一下北京");
        assert_eq!(single.len(), 2);
        assert_eq!(single.search_strategy, "PATH_FINDING");
    }

    #[test]
    fn hybrid_routes_by_query_type() {
        let kg = atlas();
        let comparison = ask(&kg, SearchStrategy::Hybrid, "北京和上海哪个更大");
        assert!(comparison.items.iter().all(|i| i.metadata.contains_key(META_PATH_INDEX)));
        assert!(!comparison.is_empty());

        let exact = ask(&kg, SearchStrategy::ExactMatch, "北京和上海哪个更大");
        assert!(exact.items.iter().all(|i| !i.metadata.contains_key(META_PATH_INDEX)));

        let entity = ask(&kg, SearchStrategy::Hybrid, "介绍一下北京");
        assert_eq!(entity.items, ask(&kg, SearchStrategy::ExactMatch, "介绍一下北京").items);
        assert_eq!(entity.search_strategy, "HYBRID");
    }

    #[test]
    fn pagination_and_confidence_floor() {
        let kg = atlas();
        let parsed = QueryParser::new().parse("中国是谁");
        let s = GraphSearcher::new(&kg);

        let all = s.search(&parsed, &SearchParams::default());
        assert_eq!(all.len(), 4);

        let page = s.search(&parsed, &SearchParams::default().with_offset(1).with_max_results(2));
        assert_eq!(page.total_matches, 2);
        assert_eq!(page.items, all.items[1..3].to_vec());

        let past_end = s.search(&parsed, &SearchParams::default().with_offset(10));
        assert!(past_end.is_empty());

        let confident = s.search(&parsed, &SearchParams::default().with_min_confidence(0.85));
        assert!(confident.items.iter().all(|i| i.confidence_score >= 0.85));
        assert_eq!(confident.len(), 2);
    }

    #[test]
    fn sort_is_stable_for_equal_relevance() {
        let kg = atlas();
        let result = ask(&kg, SearchStrategy::ExactMatch, "中国是谁");
        // Equal scores keep the graph's id order.
        assert_eq!(
            result.triple_ids(),
            ["e1_r1_e3", "e1_r2_e3", "e2_r1_e3", "e4_r1_e3"]
        );
    }

    #[test]
    fn filters_restrict_by_relation_and_entity_type() {
        let kg = atlas();
        let parsed = QueryParser::new().parse("中国是谁");
        let s = GraphSearcher::new(&kg);

        let capitals = s.search(
            &parsed,
            &SearchParams::default().with_filter(FILTER_RELATION_TYPE, "capital_of"),
        );
        assert_eq!(capitals.triple_ids(), ["e1_r2_e3"]);

        let rivers = s.search(
            &parsed,
            &SearchParams::default().with_filter(FILTER_ENTITY_TYPE, "河流"),
        );
        assert_eq!(rivers.triple_ids(), ["e4_r1_e3"]);

        let ignored = s.search(&parsed, &SearchParams::default().with_filter("colour", "red"));
        assert_eq!(ignored.len(), 4);
    }

    #[test]
    fn unrecognized_filter_value_matches_nothing() {
        let mut kg = atlas();
        kg.add_entity(Entity::new("x1", "某地", EntityType::Unknown))
            .unwrap();
        kg.add_relation(Relation::new("rx", "某关系", RelationType::Unknown))
            .unwrap();
        kg.add_triple_by_ids("x1", "rx", "e3", 1.0).unwrap();
        let parsed = QueryParser::new().parse("中国是谁");
        let s = GraphSearcher::new(&kg);

        let typo = s.search(
            &parsed,
            &SearchParams::default().with_filter(FILTER_RELATION_TYPE, "captial_of"),
        );
        assert!(typo.is_empty());
        let typo = s.search(
            &parsed,
            &SearchParams::default().with_filter(FILTER_ENTITY_TYPE, "rivr"),
        );
        assert!(typo.is_empty());

        let unknown = s.search(
            &parsed,
            &SearchParams::default().with_filter(FILTER_RELATION_TYPE, "unknown"),
        );
        assert_eq!(unknown.triple_ids(), ["x1_rx_e3"]);
    }

    #[test]
    fn properties_and_metadata_can_be_stripped() {
        let mut kg = atlas();
        assert!(kg.set_triple_property("e1_r2_e3", "since", "1949"));
        let parsed = QueryParser::new().parse("介绍一下北京");
        let s = GraphSearcher::new(&kg);

        let full = s.search(&parsed, &SearchParams::default());
        assert!(full.items.iter().any(|i| !i.triple.properties.is_empty()));
        assert!(full.items.iter().all(|i| !i.metadata.is_empty()));

        let bare = s.search(
            &parsed,
            &SearchParams {
                include_properties: false,
                include_meta: false,
                ..SearchParams::default()
            },
        );
        assert!(bare.items.iter().all(|i| i.triple.properties.is_empty()));
        assert!(bare.items.iter().all(|i| i.metadata.is_empty()));
    }

    #[test]
    fn linked_ids_take_precedence_over_mention_text() {
        let kg = atlas();
        let parser = QueryParser::new();
        let mut parsed = parser.parse("介绍一下北京");
        parser.link(&mut parsed, &kg);
        // Point the link somewhere else; the searcher must follow the link.
        parsed.linked_entities[0].entity_id = Some("e4".into());
        let result = GraphSearcher::new(&kg).search(&parsed, &SearchParams::default());
        assert_eq!(result.len(), 3);
        assert!(result.items.iter().all(|i| i.triple.touches("e4")));
    }
}
