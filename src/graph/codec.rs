//! JSON snapshots of a [`KnowledgeGraph`].
//!
//! A snapshot lists the graph's name, entities, relations and triples. Loading
//! replays every row through the graph's own `add_*` methods, so a snapshot
//! that violates an invariant (dangling reference, duplicate id) is rejected
//! instead of producing an inconsistent graph.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::error::GraphError;
use crate::relation::{Relation, RelationId};

use super::Triple;
use super::index::{GraphResult, KnowledgeGraph};

/// Snapshot format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Serializable form of a whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub format_version: u32,
    pub name: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub triples: Vec<TripleRow>,
}

/// A triple as stored in a snapshot. The id is not stored; it is re-derived on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleRow {
    pub subject: EntityId,
    pub relation: RelationId,
    pub object: EntityId,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub properties: std::collections::BTreeMap<String, String>,
}

fn full_confidence() -> f32 {
    1.0
}

impl From<&Triple> for TripleRow {
    fn from(t: &Triple) -> Self {
        Self {
            subject: t.subject.clone(),
            relation: t.relation.clone(),
            object: t.object.clone(),
            confidence: t.confidence,
            properties: t.properties.clone(),
        }
    }
}

impl From<TripleRow> for Triple {
    fn from(row: TripleRow) -> Self {
        let mut triple = Triple::from_ids(row.subject, row.relation, row.object, row.confidence);
        triple.properties = row.properties;
        triple
    }
}

impl GraphSnapshot {
    /// Capture the current contents of a graph.
    pub fn capture(graph: &KnowledgeGraph) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: graph.name().to_string(),
            entities: graph.entities().cloned().collect(),
            relations: graph.relations().cloned().collect(),
            triples: graph.triples().map(TripleRow::from).collect(),
        }
    }

    /// Rebuild a graph, validating every row.
    pub fn restore(self) -> GraphResult<KnowledgeGraph> {
        if self.format_version != FORMAT_VERSION {
            return Err(GraphError::UnsupportedFormat {
                version: self.format_version,
            });
        }
        let mut graph = KnowledgeGraph::named(self.name);
        for entity in self.entities {
            graph.add_entity(entity)?;
        }
        for relation in self.relations {
            graph.add_relation(relation)?;
        }
        for row in self.triples {
            graph.add_triple(row.into())?;
        }
        Ok(graph)
    }
}

impl KnowledgeGraph {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(&GraphSnapshot::capture(self)).map_err(|e| {
            GraphError::Serialization {
                message: e.to_string(),
            }
        })
    }

    /// Parse a JSON snapshot.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).map_err(|e| GraphError::Serialization {
                message: e.to_string(),
            })?;
        snapshot.restore()
    }

    /// Write a JSON snapshot to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> GraphResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| GraphError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(
            path = %path.display(),
            entities = self.entity_count(),
            triples = self.triple_count(),
            "saved graph"
        );
        Ok(())
    }

    /// Read a JSON snapshot from `path`.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let graph = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            entities = graph.entity_count(),
            triples = graph.triple_count(),
            "loaded graph"
        );
        Ok(graph)
    }
}
