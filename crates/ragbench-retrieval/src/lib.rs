//! Flexible retrieval for ragbench experiments.
//!
//! Works against table schemas discovered at runtime:
//!
//! - **keyword**: `LIKE` across every textual column, word-overlap scoring
//! - **semantic**: vector search with content hydration, keyword fallback
//!   when the vector backend is unavailable
//! - **hybrid**: weighted fusion of semantic and keyword scores
//! - **custom**: caller-supplied SQL on a read-only connection

mod analyzer;
mod engine;
mod fusion;
mod keyword;

pub use analyzer::{AnalysisReport, DEFAULT_STRATEGIES, SearchAnalyzer, StrategyStats};
pub use engine::{FlexibleRetrievalEngine, SearchExplanation};
pub use fusion::weighted_fusion;
pub use keyword::{
    KeywordStatement, TableSkip, build_keyword_statement, extract_content, word_overlap,
};
