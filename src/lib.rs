//! # ragbench
//!
//! Experiment workbench for retrieval-augmented generation research. Each
//! experiment owns an isolated relational namespace, a vector collection and
//! a blob directory; the orchestrator keeps them in step and the retrieval
//! engine searches across whatever schema the experiment's template created.
//!
//! ```no_run
//! # async fn demo() -> Result<(), ragbench::WorkbenchError> {
//! use ragbench::{Config, SearchQuery, Workbench};
//!
//! let workbench = Workbench::from_config(&Config::default()).await?;
//! workbench
//!     .orchestrator()
//!     .create("exp1", "alice", "baseline", "basic_rag")
//!     .await?;
//! let results = workbench
//!     .search(Some("exp1"), &SearchQuery::keyword("machine learning"))
//!     .await?;
//! # let _ = results;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod logging;
mod workbench;

pub use error::WorkbenchError;
pub use workbench::{IngestReport, Workbench};

pub use ragbench_config::{Config, ConfigLoader};
pub use ragbench_lifecycle::{ExperimentOrchestrator, ExperimentSession};
pub use ragbench_protocols::{SearchQuery, SearchResult, SearchStrategy};
pub use ragbench_retrieval::FlexibleRetrievalEngine;
