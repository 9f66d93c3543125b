//! Rich diagnostic error types for kgqa.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Lookups that find nothing are not errors:
//! they return `None` or an empty collection. Only rejected mutations, I/O and
//! malformed input surface here.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for kgqa.
#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("{kind} id must not be empty")]
    #[diagnostic(
        code(kgqa::graph::empty_id),
        help("Every entity and relation needs a non-empty, unique id before it can be added.")
    )]
    EmptyId { kind: &'static str },

    #[error("duplicate entity: {id}")]
    #[diagnostic(
        code(kgqa::graph::duplicate_entity),
        help("An entity with this id already exists. The existing entity was kept unchanged.")
    )]
    DuplicateEntity { id: String },

    #[error("duplicate relation: {id}")]
    #[diagnostic(
        code(kgqa::graph::duplicate_relation),
        help("A relation with this id already exists. The existing relation was kept unchanged.")
    )]
    DuplicateRelation { id: String },

    #[error("entity {id} has a non-finite embedding component")]
    #[diagnostic(
        code(kgqa::graph::non_finite_vector),
        help("Embedding vectors must contain only finite numbers. NaN and infinity cannot be stored in a JSON snapshot.")
    )]
    NonFiniteVector { id: String },

    #[error("duplicate triple: {id}")]
    #[diagnostic(
        code(kgqa::graph::duplicate_triple),
        help(
            "A triple with the same (subject, relation, object) already exists. \
             Triple ids are derived from their endpoints, so confidence and properties \
             cannot be updated by re-inserting. Remove the old triple first."
        )
    )]
    DuplicateTriple { id: String },

    #[error("triple {triple_id} references unknown {role} \"{id}\"")]
    #[diagnostic(
        code(kgqa::graph::invalid_reference),
        help(
            "Subjects, objects and relations must be added to the graph before any \
             triple that references them."
        )
    )]
    InvalidReference {
        triple_id: String,
        role: &'static str,
        id: String,
    },

    #[error("I/O error on {path}")]
    #[diagnostic(
        code(kgqa::graph::io),
        help("Check that the file exists, the directory is writable, and the disk is not full.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(kgqa::graph::serde),
        help("The graph snapshot is not valid JSON or does not match the snapshot schema.")
    )]
    Serialization { message: String },

    #[error("unsupported snapshot format version {version}")]
    #[diagnostic(
        code(kgqa::graph::format_version),
        help("This build reads snapshot format version 1. Re-export the graph with a matching build.")
    )]
    UnsupportedFormat { version: u32 },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(kgqa::config::read), help("Ensure the file exists and is readable."))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file: {path}")]
    #[diagnostic(
        code(kgqa::config::write),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {message}")]
    #[diagnostic(
        code(kgqa::config::parse),
        help("Check the TOML syntax. Valid sections are [search] and [parser].")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(kgqa::config::invalid), help("{message}"))]
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Seed errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("failed to read seed file: {path}")]
    #[diagnostic(code(kgqa::seed::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed pack: {message}")]
    #[diagnostic(
        code(kgqa::seed::parse),
        help(
            "A seed pack is TOML with a top-level `name` and [[entities]], \
             [[relations]] and [[triples]] tables."
        )
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("unknown entity: \"{mention}\"")]
    #[diagnostic(
        code(kgqa::engine::unknown_entity),
        help("Use an entity id or its exact name. `kgqa info` shows what the graph contains.")
    )]
    UnknownEntity { mention: String },

    #[error("unknown search strategy: \"{name}\"")]
    #[diagnostic(
        code(kgqa::engine::unknown_strategy),
        help("Valid strategies are: exact_match, semantic_search, path_finding, hybrid.")
    )]
    UnknownStrategy { name: String },
}

/// Convenience alias for functions returning kgqa results.
pub type KgResult<T> = std::result::Result<T, KgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_converts_to_kg_error() {
        let err = GraphError::DuplicateEntity { id: "e1".into() };
        let kg: KgError = err.into();
        assert!(matches!(kg, KgError::Graph(GraphError::DuplicateEntity { .. })));
    }

    #[test]
    fn config_error_converts_to_kg_error() {
        let err = ConfigError::Invalid {
            message: "max_results must be > 0".into(),
        };
        let kg: KgError = err.into();
        assert!(matches!(kg, KgError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_reference_message_names_role_and_id() {
        let err = GraphError::InvalidReference {
            triple_id: "e1_r1_e9".into(),
            role: "object",
            id: "e9".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("object"));
        assert!(msg.contains("e9"));
        assert!(msg.contains("e1_r1_e9"));
    }
}
