//! Natural-language queries: classification and mention extraction.
//!
//! [`QueryParser`](parser::QueryParser) turns free text into a
//! [`QueryParseResult`]: the normalized text, a [`QueryIntent`] (query type
//! plus entity/relation/attribute mentions) and a confidence score. The
//! intent drives [`GraphSearcher`](crate::search::GraphSearcher).
//!
//! Classification is rule-based: an ordered cue table picks the
//! [`QueryType`], then a per-type pattern captures the mentions. A query
//! that matches nothing is not an error; it comes back as
//! [`QueryType::Unknown`] with whatever tokens survived stop-word removal.

pub mod parser;
mod patterns;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::relation::RelationId;

pub use parser::{ParserOptions, QueryParser};

/// What kind of answer a query is after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// "X是谁": everything known about one entity.
    Entity,
    /// "X和Y是什么关系": how two entities are connected.
    Relation,
    /// "X的Y是多少": one property of an entity.
    Attribute,
    /// "什么是X": what an entity is.
    Definition,
    /// "X有哪些Y": members related to an entity.
    List,
    /// "X是不是Y": a yes/no check between two entities.
    Fact,
    /// "X和Y哪个更大": two entities side by side.
    Comparison,
    /// Open-ended question with no recognized shape.
    Open,
    #[default]
    Unknown,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Entity => "ENTITY",
            QueryType::Relation => "RELATION",
            QueryType::Attribute => "ATTRIBUTE",
            QueryType::Definition => "DEFINITION",
            QueryType::List => "LIST",
            QueryType::Fact => "FACT",
            QueryType::Comparison => "COMPARISON",
            QueryType::Open => "OPEN",
            QueryType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub query_type: QueryType,
    /// Entity mentions, in the order they appear.
    pub entities: Vec<String>,
    /// Relation mentions.
    pub relations: Vec<String>,
    /// Attribute mentions (e.g. "长度" in "长江的长度是多少").
    pub attributes: Vec<String>,
    /// Extra slots, e.g. `list_type` for list queries.
    pub parameters: BTreeMap<String, String>,
}

impl QueryIntent {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            ..Default::default()
        }
    }

    /// Whether no mention of any kind was extracted.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty() && self.attributes.is_empty()
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// An entity mention, with the graph entity it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub mention: String,
    pub entity_id: Option<EntityId>,
}

/// A relation mention, with the graph relation it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedRelation {
    pub mention: String,
    pub relation_id: Option<RelationId>,
}

/// Everything [`QueryParser::parse`] produces for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParseResult {
    pub original_query: String,
    pub normalized_query: String,
    pub intent: QueryIntent,
    /// Parser confidence in [0, 1].
    pub confidence: f32,
    /// One entry per entity mention. Unresolved until [`QueryParser::link`] runs.
    pub linked_entities: Vec<LinkedEntity>,
    /// One entry per relation mention. Unresolved until [`QueryParser::link`] runs.
    pub linked_relations: Vec<LinkedRelation>,
}

impl QueryParseResult {
    /// A parse result built directly from an intent, for callers that
    /// construct intents themselves instead of parsing text.
    pub fn from_intent(intent: QueryIntent) -> Self {
        let confidence = parser::intent_confidence(&intent);
        let linked_entities = parser::placeholder_entities(&intent);
        let linked_relations = parser::placeholder_relations(&intent);
        Self {
            original_query: String::new(),
            normalized_query: String::new(),
            intent,
            confidence,
            linked_entities,
            linked_relations,
        }
    }

    /// The resolved id of the `index`-th entity mention, if linking found one.
    pub fn linked_entity_id(&self, index: usize) -> Option<&EntityId> {
        self.linked_entities.get(index)?.entity_id.as_ref()
    }
}
