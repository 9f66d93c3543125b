// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # kgqa
//!
//! An in-memory knowledge graph with a rule-based Chinese question parser
//! and a strategy-driven graph searcher.
//!
//! ## Architecture
//!
//! - **Knowledge graph** (`graph`): entities, relations and triples in ordered
//!   maps, with subject/object/relation/type indices, BFS path-finding and a
//!   JSON snapshot codec
//! - **Query parser** (`query`): ordered cue table → query type, per-type
//!   capture patterns → entity/relation/attribute mentions
//! - **Searcher** (`search`): exact-match, path-finding and hybrid retrieval
//!   with shared ranking and pagination
//! - **Knowledge base** (`engine`): a lock-guarded graph plus parser and
//!   search defaults from `config`
//! - **Seed packs** (`seeds`): TOML graph contents, one bundled
//!
//! ## Library usage
//!
//! ```no_run
//! use kgqa::config::KgConfig;
//! use kgqa::engine::KnowledgeBase;
//! use kgqa::seeds::SeedPack;
//!
//! let kb = KnowledgeBase::new(KgConfig::default()).unwrap();
//! let pack = SeedPack::bundled("china-geography").unwrap().unwrap();
//! kb.apply_seed(&pack);
//!
//! let answer = kb.ask("北京和中国是什么关系");
//! for item in &answer.result.items {
//!     println!("{} ({:.2})", item.labels, item.relevance_score);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod graph;
pub mod id;
pub mod query;
pub mod relation;
pub mod search;
pub mod seeds;
