//! Entities: the nodes of the knowledge graph.
//!
//! An [`Entity`] has a stable id, a display name, a coarse [`EntityType`],
//! an optional dense embedding and free-form string properties. Identity is
//! the id alone: two entities with the same id compare equal even when their
//! names or properties differ.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::id::EntityId;

/// Coarse classification of an entity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Time,
    Event,
    Concept,
    Product,
    River,
    Mountain,
    #[default]
    Unknown,
}

impl EntityType {
    /// Every variant, in declaration order.
    pub const ALL: [EntityType; 10] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Time,
        EntityType::Event,
        EntityType::Concept,
        EntityType::Product,
        EntityType::River,
        EntityType::Mountain,
        EntityType::Unknown,
    ];

    /// Canonical upper-case name, as used in snapshots and seed packs.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Location => "LOCATION",
            EntityType::Time => "TIME",
            EntityType::Event => "EVENT",
            EntityType::Concept => "CONCEPT",
            EntityType::Product => "PRODUCT",
            EntityType::River => "RIVER",
            EntityType::Mountain => "MOUNTAIN",
            EntityType::Unknown => "UNKNOWN",
        }
    }

    /// Chinese category word, used to match list queries such as "有哪些河流".
    pub fn label_zh(self) -> &'static str {
        match self {
            EntityType::Person => "人物",
            EntityType::Organization => "组织",
            EntityType::Location => "地点",
            EntityType::Time => "时间",
            EntityType::Event => "事件",
            EntityType::Concept => "概念",
            EntityType::Product => "产品",
            EntityType::River => "河流",
            EntityType::Mountain => "山脉",
            EntityType::Unknown => "未知",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EntityType {
    /// Case-insensitive match on the canonical name or the Chinese label.
    /// `None` when nothing matches.
    pub fn lookup(s: &str) -> Option<Self> {
        let s = s.trim();
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.label_zh() == s)
    }
}

impl FromStr for EntityType {
    type Err = Infallible;

    /// Like [`EntityType::lookup`], but anything unrecognized becomes
    /// [`EntityType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EntityType::lookup(s).unwrap_or(EntityType::Unknown))
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Optional dense embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type,
            vector: None,
            properties: BTreeMap::new(),
        }
    }

    /// Attach a dense embedding.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Insert or replace a property, returning the previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.id, self.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_id() {
        let a = Entity::new("e1", "北京", EntityType::Location);
        let b = Entity::new("e1", "Beijing", EntityType::Unknown).with_property("k", "v");
        let c = Entity::new("e2", "北京", EntityType::Location);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn entity_type_parsing() {
        assert_eq!("person".parse::<EntityType>().unwrap(), EntityType::Person);
        assert_eq!("RIVER".parse::<EntityType>().unwrap(), EntityType::River);
        assert_eq!("河流".parse::<EntityType>().unwrap(), EntityType::River);
        assert_eq!("spaceship".parse::<EntityType>().unwrap(), EntityType::Unknown);
    }

    #[test]
    fn properties() {
        let mut e = Entity::new("e1", "长江", EntityType::River).with_property("length_km", "6300");
        assert_eq!(e.property("length_km"), Some("6300"));
        assert_eq!(e.set_property("length_km", "6397"), Some("6300".to_string()));
        assert_eq!(e.property("length_km"), Some("6397"));
        assert_eq!(e.property("source"), None);
    }

    #[test]
    fn serde_uses_canonical_type_name() {
        let e = Entity::new("e1", "泰山", EntityType::Mountain);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"MOUNTAIN\""));
        assert!(!json.contains("vector"));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entity_type, EntityType::Mountain);
        assert_eq!(back.name, "泰山");
    }
}
