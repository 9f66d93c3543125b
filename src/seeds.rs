//! Seed packs: TOML-defined graph contents.
//!
//! A seed pack declares entities, relations and triples. Triple endpoints may
//! name an entity or relation by id or by name; they are resolved against the
//! graph at apply time, so a pack can extend a graph that already holds the
//! entities it refers to. One pack, `china-geography`, is bundled into the
//! binary.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::entity::{Entity, EntityType};
use crate::error::{GraphError, SeedError};
use crate::graph::{KnowledgeGraph, Triple};
use crate::relation::{Relation, RelationType};

pub type SeedResult<T> = std::result::Result<T, SeedError>;

const CHINA_GEOGRAPHY_TOML: &str = include_str!("../data/seeds/china-geography.toml");

/// Ids of the packs compiled into the binary.
pub const BUNDLED: &[&str] = &["china-geography"];

/// A parsed seed pack.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPack {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entities: Vec<SeedEntity>,
    #[serde(default)]
    pub relations: Vec<SeedRelation>,
    #[serde(default)]
    pub triples: Vec<SeedTriple>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntity {
    pub id: String,
    pub name: String,
    /// Canonical type name or Chinese label; anything else is `UNKNOWN`.
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRelation {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub relation_type: String,
    /// Overrides the type's default inverse name.
    #[serde(default)]
    pub inverse_name: Option<String>,
    /// Overrides the type's default symmetry.
    #[serde(default)]
    pub symmetric: Option<bool>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A triple in a seed pack. Endpoints are ids or names.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedTriple {
    pub subject: String,
    pub relation: String,
    pub object: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_confidence() -> f32 {
    1.0
}

/// What [`SeedPack::apply`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub name: String,
    pub entities_added: usize,
    pub relations_added: usize,
    pub triples_added: usize,
    /// Rows whose id (or derived triple id) was already in the graph.
    pub duplicates_skipped: usize,
    /// Triples naming an entity or relation the graph does not have.
    pub unresolved_skipped: usize,
    /// Rows rejected for any other reason, such as an empty id.
    pub invalid_skipped: usize,
}

impl SeedReport {
    pub fn skipped(&self) -> usize {
        self.duplicates_skipped + self.unresolved_skipped + self.invalid_skipped
    }
}

impl std::fmt::Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seed \"{}\": +{} entities, +{} relations, +{} triples ({} skipped)",
            self.name,
            self.entities_added,
            self.relations_added,
            self.triples_added,
            self.skipped()
        )
    }
}

impl SeedPack {
    pub fn parse(toml_str: &str) -> SeedResult<Self> {
        toml::from_str(toml_str).map_err(|e| SeedError::Parse {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> SeedResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SeedError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// A pack compiled into the binary, by id. See [`BUNDLED`].
    pub fn bundled(id: &str) -> Option<SeedResult<Self>> {
        match id {
            "china-geography" => Some(Self::parse(CHINA_GEOGRAPHY_TOML)),
            _ => None,
        }
    }

    /// Add the pack's contents to `graph`: entities, then relations, then
    /// triples. Rows the graph rejects are skipped and counted.
    pub fn apply(&self, graph: &mut KnowledgeGraph) -> SeedReport {
        let mut report = SeedReport {
            name: self.name.clone(),
            ..Default::default()
        };

        for row in &self.entities {
            let entity_type = row
                .entity_type
                .parse::<EntityType>()
                .unwrap_or(EntityType::Unknown);
            let mut entity = Entity::new(row.id.as_str(), row.name.as_str(), entity_type);
            entity.properties = row.properties.clone();
            match graph.add_entity(entity) {
                Ok(()) => report.entities_added += 1,
                Err(e) => count_rejection(&mut report, &e),
            }
        }

        for row in &self.relations {
            let relation_type = row
                .relation_type
                .parse::<RelationType>()
                .unwrap_or(RelationType::Unknown);
            let mut relation = Relation::new(row.id.as_str(), row.name.as_str(), relation_type);
            if let Some(inverse) = &row.inverse_name {
                relation.inverse_name = inverse.clone();
            }
            if let Some(symmetric) = row.symmetric {
                relation.symmetric = symmetric;
            }
            relation.properties = row.properties.clone();
            match graph.add_relation(relation) {
                Ok(()) => report.relations_added += 1,
                Err(e) => count_rejection(&mut report, &e),
            }
        }

        for row in &self.triples {
            let resolved = (
                graph.resolve_entity(&row.subject).map(|e| e.id.clone()),
                graph.resolve_relation(&row.relation).map(|r| r.id.clone()),
                graph.resolve_entity(&row.object).map(|e| e.id.clone()),
            );
            let (Some(subject), Some(relation), Some(object)) = resolved else {
                tracing::warn!(
                    seed = %self.name,
                    subject = %row.subject,
                    relation = %row.relation,
                    object = %row.object,
                    "seed triple references unknown entity or relation, skipping"
                );
                report.unresolved_skipped += 1;
                continue;
            };
            let mut triple = Triple::from_ids(subject, relation, object, row.confidence);
            triple.properties = row.properties.clone();
            match graph.add_triple(triple) {
                Ok(_) => report.triples_added += 1,
                Err(e) => count_rejection(&mut report, &e),
            }
        }

        tracing::info!(
            seed = %report.name,
            entities = report.entities_added,
            relations = report.relations_added,
            triples = report.triples_added,
            skipped = report.skipped(),
            "applied seed pack"
        );
        report
    }
}

fn count_rejection(report: &mut SeedReport, error: &GraphError) {
    match error {
        GraphError::DuplicateEntity { .. }
        | GraphError::DuplicateRelation { .. }
        | GraphError::DuplicateTriple { .. } => report.duplicates_skipped += 1,
        GraphError::InvalidReference { .. } => report.unresolved_skipped += 1,
        _ => report.invalid_skipped += 1,
    }
}
