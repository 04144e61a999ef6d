//! Experiment lifecycle for ragbench.
//!
//! An experiment spans three independent backends: a relational namespace,
//! a vector collection and a blob directory. The [`ExperimentOrchestrator`]
//! drives them in a fixed order (relational, vector, blob) and reports a
//! per-backend outcome for every operation.
//!
//! There is no atomicity across backends. A failure in one backend never
//! stops the others, and the descriptor always reflects what succeeded.

pub mod descriptor_store;
pub mod orchestrator;
pub mod outcome;
pub mod retry;
pub mod session;

pub use descriptor_store::{DescriptorStore, FileDescriptorStore, MemoryDescriptorStore};
pub use orchestrator::{ExperimentOrchestrator, BLOB_SUBDIRS};
pub use outcome::{
    BackendOutcome, BackupReport, CreateReport, DeleteReport, ExperimentInfo, ExperimentListing,
    HealthReport, OutcomeMap, StatusReport,
};
pub use retry::RetryPolicy;
pub use session::ExperimentSession;
