//! Answering parsed queries against a [`KnowledgeGraph`](crate::graph::KnowledgeGraph).
//!
//! [`GraphSearcher`] maps a [`QueryParseResult`](crate::query::QueryParseResult)
//! to ranked triples. The retrieval algorithm is picked by a
//! [`SearchStrategy`]; ranking, filtering and pagination are shared by all
//! strategies and controlled by [`SearchParams`].

pub mod relevance;
pub mod searcher;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::graph::Triple;

pub use relevance::calculate_relevance;
pub use searcher::GraphSearcher;

/// Filter key: the triple's relation must be of this [`RelationType`](crate::relation::RelationType).
pub const FILTER_RELATION_TYPE: &str = "relation_type";
/// Filter key: the subject or the object must be of this [`EntityType`](crate::entity::EntityType).
pub const FILTER_ENTITY_TYPE: &str = "entity_type";

/// Metadata key: index of the path an item came from.
pub const META_PATH_INDEX: &str = "path_index";
/// Metadata key: hop count of the path an item came from.
pub const META_PATH_LENGTH: &str = "path_length";
/// Metadata key: the sub-query that produced an item.
pub const META_MATCHED_BY: &str = "matched_by";

/// Retrieval algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Dispatch on the query type to a direct index lookup.
    #[default]
    ExactMatch,
    /// Embedding search. Currently answers exactly like [`ExactMatch`](Self::ExactMatch).
    SemanticSearch,
    /// BFS between the first two mentioned entities.
    PathFinding,
    /// Pick one of the above from the query type.
    Hybrid,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 4] = [
        SearchStrategy::ExactMatch,
        SearchStrategy::SemanticSearch,
        SearchStrategy::PathFinding,
        SearchStrategy::Hybrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchStrategy::ExactMatch => "EXACT_MATCH",
            SearchStrategy::SemanticSearch => "SEMANTIC_SEARCH",
            SearchStrategy::PathFinding => "PATH_FINDING",
            SearchStrategy::Hybrid => "HYBRID",
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = EngineError;

    /// Case-insensitive; `-` and spaces count as `_`. `exact`, `semantic`
    /// and `path` are accepted as short forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "exact_match" | "exact" => Ok(SearchStrategy::ExactMatch),
            "semantic_search" | "semantic" => Ok(SearchStrategy::SemanticSearch),
            "path_finding" | "path" => Ok(SearchStrategy::PathFinding),
            "hybrid" => Ok(SearchStrategy::Hybrid),
            _ => Err(EngineError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Ranking, filtering and pagination knobs for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub max_results: usize,
    pub offset: usize,
    /// Items whose triple confidence is below this are dropped.
    pub min_confidence: f32,
    /// When false, returned triples carry no properties.
    pub include_properties: bool,
    /// When false, returned items carry no metadata.
    pub include_meta: bool,
    /// Recognized keys: [`FILTER_RELATION_TYPE`], [`FILTER_ENTITY_TYPE`].
    /// Other keys are ignored.
    pub filters: BTreeMap<String, String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_results: 10,
            offset: 0,
            min_confidence: 0.0,
            include_properties: true,
            include_meta: true,
            filters: BTreeMap::new(),
        }
    }
}

impl SearchParams {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// Display names of a triple's endpoints and relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleLabels {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl std::fmt::Display for TripleLabels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --{}--> {}", self.subject, self.relation, self.object)
    }
}

/// One ranked triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub triple: Triple,
    pub labels: TripleLabels,
    /// How well the triple matches the query, in [0, 1].
    pub relevance_score: f32,
    /// The triple's own confidence.
    pub confidence_score: f32,
    pub metadata: BTreeMap<String, String>,
}

/// The outcome of one search. Empty when nothing matched or the query
/// could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<SearchResultItem>,
    /// Number of items after pagination.
    pub total_matches: usize,
    pub execution_time: Duration,
    pub search_strategy: String,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Ids of the returned triples, in rank order.
    pub fn triple_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.triple.id.as_str()).collect()
    }
}
