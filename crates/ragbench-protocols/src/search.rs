//! Search request and result types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RetrievalError;
use crate::types::Metadata;

/// Filter key carrying the raw statement for the custom strategy.
pub const CUSTOM_SQL_KEY: &str = "custom_sql";

/// Filter key skipped by keyword search and applied by semantic search.
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    Keyword,
    Semantic,
    Hybrid,
    Custom,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 4] = [Self::Keyword, Self::Semantic, Self::Hybrid, Self::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            "custom" => Ok(Self::Custom),
            other => Err(RetrievalError::UnsupportedStrategy(other.to_string())),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_score_threshold() -> f32 {
    0.7
}

/// A retrieval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub strategy: SearchStrategy,
    /// Equality predicates. See [`CUSTOM_SQL_KEY`] and [`USER_ID_KEY`].
    #[serde(default)]
    pub filters: Metadata,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Accepted for compatibility; results are not filtered by it.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Logical name to physical table overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_mapping: Option<BTreeMap<String, String>>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, strategy: SearchStrategy) -> Self {
        Self {
            text: text.into(),
            strategy,
            filters: Metadata::new(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            table_mapping: None,
        }
    }

    pub fn keyword(text: impl Into<String>) -> Self {
        Self::new(text, SearchStrategy::Keyword)
    }

    pub fn semantic(text: impl Into<String>) -> Self {
        Self::new(text, SearchStrategy::Semantic)
    }

    pub fn hybrid(text: impl Into<String>) -> Self {
        Self::new(text, SearchStrategy::Hybrid)
    }

    /// Raw pass-through query; the statement travels in the filters.
    pub fn custom(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self::new(sql.clone(), SearchStrategy::Custom).with_filter(CUSTOM_SQL_KEY, sql)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_table_mapping(mut self, mapping: BTreeMap<String, String>) -> Self {
        self.table_mapping = Some(mapping);
        self
    }

    pub fn custom_sql(&self) -> Option<&str> {
        self.filters.get(CUSTOM_SQL_KEY).and_then(Value::as_str)
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Backend or table the hit came from.
    pub source: String,
}

impl SearchResult {
    pub fn new(
        id: impl Into<String>,
        score: f32,
        content: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            score,
            content: content.into(),
            metadata: Metadata::new(),
            source: source.into(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
