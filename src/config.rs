//! TOML configuration for searching and parsing.
//!
//! ```toml
//! [search]
//! strategy = "hybrid"
//! max_results = 20
//! min_confidence = 0.5
//!
//! [parser]
//! extra_stop_words = ["一下"]
//! ```
//!
//! Every field has a default, so an empty file is a valid config.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::query::ParserOptions;
use crate::search::{GraphSearcher, SearchParams, SearchStrategy};

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KgConfig {
    pub search: SearchConfig,
    pub parser: ParserConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default strategy for `ask`.
    pub strategy: SearchStrategy,
    pub max_results: usize,
    pub offset: usize,
    pub min_confidence: f32,
    pub include_properties: bool,
    pub include_meta: bool,
    /// Hop limit for relation queries under exact match.
    pub relation_path_depth: usize,
    /// Hop limit for the path-finding strategy and `kgqa path`.
    pub path_max_depth: usize,
    /// Result filters; see [`SearchParams::filters`].
    pub filters: BTreeMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let params = SearchParams::default();
        Self {
            strategy: SearchStrategy::default(),
            max_results: params.max_results,
            offset: params.offset,
            min_confidence: params.min_confidence,
            include_properties: params.include_properties,
            include_meta: params.include_meta,
            relation_path_depth: GraphSearcher::DEFAULT_RELATION_PATH_DEPTH,
            path_max_depth: GraphSearcher::DEFAULT_PATH_MAX_DEPTH,
            filters: params.filters,
        }
    }
}

/// `[parser]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub extra_stop_words: Vec<String>,
    pub min_token_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let options = ParserOptions::default();
        Self {
            extra_stop_words: options.extra_stop_words,
            min_token_chars: options.min_token_chars,
        }
    }
}

impl KgConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write the config as TOML.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Reject values no search could honor.
    pub fn validate(&self) -> ConfigResult<()> {
        let min = self.search.min_confidence;
        if !(0.0..=1.0).contains(&min) {
            return Err(ConfigError::Invalid {
                message: format!("search.min_confidence must be within [0, 1], got {min}"),
            });
        }
        if self.search.relation_path_depth == 0 || self.search.path_max_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "search.relation_path_depth and search.path_max_depth must be at least 1"
                    .into(),
            });
        }
        Ok(())
    }

    /// Default search parameters.
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            max_results: self.search.max_results,
            offset: self.search.offset,
            min_confidence: self.search.min_confidence,
            include_properties: self.search.include_properties,
            include_meta: self.search.include_meta,
            filters: self.search.filters.clone(),
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            extra_stop_words: self.parser.extra_stop_words.clone(),
            min_token_chars: self.parser.min_token_chars,
        }
    }
}
