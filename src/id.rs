//! String identifiers for entities, relations and triples.
//!
//! Ids are opaque strings assigned by whoever produces the graph data. The
//! newtypes keep an entity id from being passed where a relation id is
//! expected, while `Borrow<str>` keeps map lookups by `&str` cheap.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of an [`Entity`](crate::entity::Entity).
    EntityId
);

string_id!(
    /// Identifier of a [`Relation`](crate::relation::Relation).
    RelationId
);

string_id!(
    /// Identifier of a [`Triple`](crate::graph::Triple), derived from its endpoints.
    TripleId
);
