//! Relations: typed, named edge labels.
//!
//! A [`Relation`] is shared by every triple that uses it. Constructing one
//! from a known [`RelationType`] fills in a default inverse name, and only
//! [`RelationType::RelatedTo`] is symmetric by default.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::id::RelationId;

/// Closed set of relation kinds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    IsA,
    PartOf,
    LocatedIn,
    BornIn,
    WorksFor,
    CreatedBy,
    HasProperty,
    BelongsTo,
    RelatedTo,
    FlowsThrough,
    FriendOf,
    LocatedNear,
    LocatedOn,
    LocatedAt,
    CapitalOf,
    Custom,
    #[default]
    Unknown,
}

impl RelationType {
    /// Every variant, in declaration order.
    pub const ALL: [RelationType; 17] = [
        RelationType::IsA,
        RelationType::PartOf,
        RelationType::LocatedIn,
        RelationType::BornIn,
        RelationType::WorksFor,
        RelationType::CreatedBy,
        RelationType::HasProperty,
        RelationType::BelongsTo,
        RelationType::RelatedTo,
        RelationType::FlowsThrough,
        RelationType::FriendOf,
        RelationType::LocatedNear,
        RelationType::LocatedOn,
        RelationType::LocatedAt,
        RelationType::CapitalOf,
        RelationType::Custom,
        RelationType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::IsA => "IS_A",
            RelationType::PartOf => "PART_OF",
            RelationType::LocatedIn => "LOCATED_IN",
            RelationType::BornIn => "BORN_IN",
            RelationType::WorksFor => "WORKS_FOR",
            RelationType::CreatedBy => "CREATED_BY",
            RelationType::HasProperty => "HAS_PROPERTY",
            RelationType::BelongsTo => "BELONGS_TO",
            RelationType::RelatedTo => "RELATED_TO",
            RelationType::FlowsThrough => "FLOWS_THROUGH",
            RelationType::FriendOf => "FRIEND_OF",
            RelationType::LocatedNear => "LOCATED_NEAR",
            RelationType::LocatedOn => "LOCATED_ON",
            RelationType::LocatedAt => "LOCATED_AT",
            RelationType::CapitalOf => "CAPITAL_OF",
            RelationType::Custom => "CUSTOM",
            RelationType::Unknown => "UNKNOWN",
        }
    }

    /// Chinese predicate word for this kind of relation.
    pub fn label_zh(self) -> &'static str {
        match self {
            RelationType::IsA => "是",
            RelationType::PartOf => "部分",
            RelationType::LocatedIn => "位于",
            RelationType::BornIn => "出生于",
            RelationType::WorksFor => "工作于",
            RelationType::CreatedBy => "创建者",
            RelationType::HasProperty => "属性",
            RelationType::BelongsTo => "属于",
            RelationType::RelatedTo => "相关",
            RelationType::FlowsThrough => "流经",
            RelationType::FriendOf => "朋友",
            RelationType::LocatedNear => "邻近",
            RelationType::LocatedOn => "坐落于",
            RelationType::LocatedAt => "地处",
            RelationType::CapitalOf => "首都",
            RelationType::Custom => "自定义",
            RelationType::Unknown => "未知",
        }
    }

    /// Inverse name filled in by [`Relation::new`]. Empty for `Custom` and `Unknown`.
    pub fn default_inverse_name(self) -> &'static str {
        match self {
            RelationType::IsA => "has_instance",
            RelationType::PartOf => "has_part",
            RelationType::LocatedIn => "contains",
            RelationType::BornIn => "birthplace_of",
            RelationType::WorksFor => "employs",
            RelationType::CreatedBy => "creator_of",
            RelationType::HasProperty => "property_of",
            RelationType::BelongsTo => "owns",
            RelationType::RelatedTo => "related_to",
            RelationType::FlowsThrough => "traversed_by",
            RelationType::FriendOf => "friend_of",
            RelationType::LocatedNear => "located_near",
            RelationType::LocatedOn => "location_of",
            RelationType::LocatedAt => "site_of",
            RelationType::CapitalOf => "has_capital",
            RelationType::Custom | RelationType::Unknown => "",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RelationType {
    /// Case-insensitive match on the canonical name or the Chinese label;
    /// `-` and ` ` are accepted in place of `_`. `None` when nothing matches.
    pub fn lookup(s: &str) -> Option<Self> {
        let normalized = s.trim().replace(['-', ' '], "_");
        RelationType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized) || t.label_zh() == s.trim())
    }
}

impl FromStr for RelationType {
    type Err = Infallible;

    /// Like [`RelationType::lookup`], with [`RelationType::Unknown`] as the fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RelationType::lookup(s).unwrap_or(RelationType::Unknown))
    }
}

/// A named, typed edge label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub name: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default)]
    pub inverse_name: String,
    #[serde(default)]
    pub symmetric: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Relation {
    pub fn new(
        id: impl Into<RelationId>,
        name: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            relation_type,
            inverse_name: relation_type.default_inverse_name().to_string(),
            symmetric: relation_type == RelationType::RelatedTo,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_inverse_name(mut self, inverse_name: impl Into<String>) -> Self {
        self.inverse_name = inverse_name.into();
        self
    }

    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Relation {}

impl std::hash::Hash for Relation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.id, self.relation_type)
    }
}
