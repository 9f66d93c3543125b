//! The knowledge base: a shared graph plus the parser and searcher that answer questions over it.

use std::path::Path;
use std::sync::RwLock;

use crate::config::KgConfig;
use crate::error::{EngineError, KgResult};
use crate::graph::KnowledgeGraph;
use crate::graph::index::GraphStats;
use crate::query::{QueryParseResult, QueryParser};
use crate::search::{GraphSearcher, SearchParams, SearchResult, SearchStrategy};
use crate::seeds::{SeedPack, SeedReport};

/// A graph guarded by a reader/writer lock, with a configured parser and
/// search defaults.
///
/// Any number of [`ask`](Self::ask) calls run concurrently under the read
/// lock. Mutation through [`write`](Self::write) is exclusive.
pub struct KnowledgeBase {
    graph: RwLock<KnowledgeGraph>,
    parser: QueryParser,
    config: KgConfig,
}

/// A parsed question and what the graph had to say about it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub parsed: QueryParseResult,
    pub result: SearchResult,
}

/// One path between two entities, by display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPath {
    /// Entity names, source first.
    pub entities: Vec<String>,
    /// Relation names; `relations[i]` joins `entities[i]` and `entities[i + 1]`.
    pub relations: Vec<String>,
}

impl std::fmt::Display for LabeledPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entities = self.entities.iter();
        if let Some(first) = entities.next() {
            write!(f, "{first}")?;
        }
        for (relation, entity) in self.relations.iter().zip(entities) {
            write!(f, " -{relation}- {entity}")?;
        }
        Ok(())
    }
}

impl KnowledgeBase {
    /// An empty knowledge base.
    pub fn new(config: KgConfig) -> KgResult<Self> {
        Self::with_graph(KnowledgeGraph::new(), config)
    }

    /// Wrap an existing graph.
    pub fn with_graph(graph: KnowledgeGraph, config: KgConfig) -> KgResult<Self> {
        config.validate()?;
        tracing::info!(
            graph = graph.name(),
            entities = graph.entity_count(),
            triples = graph.triple_count(),
            strategy = %config.search.strategy,
            "knowledge base ready"
        );
        Ok(Self {
            parser: QueryParser::with_options(config.parser_options()),
            graph: RwLock::new(graph),
            config,
        })
    }

    /// Load a JSON snapshot.
    pub fn load(path: &Path, config: KgConfig) -> KgResult<Self> {
        let graph = KnowledgeGraph::load(path)?;
        Self::with_graph(graph, config)
    }

    /// Write a JSON snapshot.
    pub fn save(&self, path: &Path) -> KgResult<()> {
        self.read(|g| g.save(path))?;
        Ok(())
    }

    pub fn config(&self) -> &KgConfig {
        &self.config
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    /// Run `f` with shared access to the graph.
    pub fn read<R>(&self, f: impl FnOnce(&KnowledgeGraph) -> R) -> R {
        let graph = self.graph.read().expect("graph lock poisoned");
        f(&graph)
    }

    /// Run `f` with exclusive access to the graph.
    pub fn write<R>(&self, f: impl FnOnce(&mut KnowledgeGraph) -> R) -> R {
        let mut graph = self.graph.write().expect("graph lock poisoned");
        f(&mut graph)
    }

    /// Consume the knowledge base and return its graph.
    pub fn into_graph(self) -> KnowledgeGraph {
        self.graph.into_inner().expect("graph lock poisoned")
    }

    pub fn apply_seed(&self, pack: &SeedPack) -> SeedReport {
        self.write(|g| pack.apply(g))
    }

    /// Answer a question with the configured strategy and parameters.
    pub fn ask(&self, text: &str) -> Answer {
        self.ask_with(text, self.config.search.strategy, &self.config.search_params())
    }

    /// Parse, link and search under one read lock.
    pub fn ask_with(&self, text: &str, strategy: SearchStrategy, params: &SearchParams) -> Answer {
        self.read(|graph| {
            let mut parsed = self.parser.parse(text);
            self.parser.link(&mut parsed, graph);
            let result = self.searcher(graph).search_with(strategy, &parsed, params);
            tracing::debug!(
                query = text,
                strategy = %strategy,
                matches = result.total_matches,
                elapsed_us = result.execution_time.as_micros() as u64,
                "answered query"
            );
            Answer { parsed, result }
        })
    }

    /// Paths between two entities given by id or name. `max_depth` defaults
    /// to the configured `path_max_depth`.
    pub fn paths(&self, from: &str, to: &str, max_depth: Option<usize>) -> KgResult<Vec<LabeledPath>> {
        let max_depth = max_depth.unwrap_or(self.config.search.path_max_depth);
        self.read(|graph| {
            for mention in [from, to] {
                if graph.resolve_entity(mention).is_none() {
                    return Err(EngineError::UnknownEntity {
                        mention: mention.to_string(),
                    }
                    .into());
                }
            }
            let paths = self.searcher(graph).find_entity_paths(from, to, max_depth);
            Ok(paths
                .iter()
                .map(|path| LabeledPath {
                    entities: path
                        .entities
                        .iter()
                        .map(|id| {
                            graph
                                .entity(id.as_str())
                                .map_or_else(|| id.to_string(), |e| e.name.clone())
                        })
                        .collect(),
                    relations: path
                        .triples
                        .iter()
                        .filter_map(|id| graph.triple(id.as_str()))
                        .map(|t| {
                            graph
                                .relation(t.relation.as_str())
                                .map_or_else(|| t.relation.to_string(), |r| r.name.clone())
                        })
                        .collect(),
                })
                .collect())
        })
    }

    pub fn info(&self) -> KnowledgeBaseInfo {
        KnowledgeBaseInfo {
            stats: self.read(KnowledgeGraph::stats),
            strategy: self.config.search.strategy,
            max_results: self.config.search.max_results,
            path_max_depth: self.config.search.path_max_depth,
        }
    }

    fn searcher<'g>(&self, graph: &'g KnowledgeGraph) -> GraphSearcher<'g> {
        GraphSearcher::new(graph)
            .with_strategy(self.config.search.strategy)
            .with_relation_path_depth(self.config.search.relation_path_depth)
            .with_path_max_depth(self.config.search.path_max_depth)
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (entities, triples) = self.read(|g| (g.entity_count(), g.triple_count()));
        f.debug_struct("KnowledgeBase")
            .field("entities", &entities)
            .field("triples", &triples)
            .field("strategy", &self.config.search.strategy)
            .finish()
    }
}

/// Snapshot of a knowledge base for `kgqa info`.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseInfo {
    pub stats: GraphStats,
    pub strategy: SearchStrategy,
    pub max_results: usize,
    pub path_max_depth: usize,
}

impl std::fmt::Display for KnowledgeBaseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "kgqa knowledge base")?;
        write!(f, "{}", self.stats)?;
        writeln!(f, "  strategy:   {}", self.strategy)?;
        writeln!(f, "  max results: {}", self.max_results)?;
        writeln!(f, "  path depth: {}", self.path_max_depth)?;
        Ok(())
    }
}
