//! CLI definitions for ragbench.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ragbench::SearchStrategy;

/// ragbench CLI.
#[derive(Parser)]
#[command(name = "ragbench")]
#[command(about = "Experiment workbench for retrieval-augmented generation research")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "ragbench.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create an experiment in every backend
    Create {
        /// Experiment name
        name: String,

        #[arg(short, long, default_value = "")]
        researcher: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Schema template
        #[arg(short, long, default_value = "basic_rag")]
        template: String,
    },

    /// Delete an experiment from every backend
    Delete {
        name: String,

        /// Required; deletion is irreversible
        #[arg(long)]
        force: bool,
    },

    /// List experiments with per-backend existence
    List,

    /// Make an experiment the default for search
    Switch { name: String },

    /// Show the active experiment
    Current,

    /// Descriptor plus table row counts
    Info { name: String },

    /// Append a note to an experiment
    Note { name: String, text: String },

    /// Back up an experiment's data
    Backup {
        name: String,

        /// Destination directory (default: lifecycle.backup_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check every backend
    Health,

    /// Active experiment, counts and health
    Status,

    /// Namespaces with no descriptor
    Orphans,

    /// Template management commands
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Store chunk texts and index their embeddings
    Ingest {
        /// Owning document id
        #[arg(short, long)]
        document: i64,

        /// Chunk texts, in sequence order
        #[arg(required = true)]
        chunks: Vec<String>,

        /// Experiment (default: the active one)
        #[arg(short, long)]
        experiment: Option<String>,
    },

    /// Search an experiment
    Search {
        /// Query text
        text: Option<String>,

        /// keyword, semantic, hybrid or custom
        #[arg(short, long, default_value = "hybrid")]
        strategy: SearchStrategy,

        /// Experiment (default: the active one)
        #[arg(short, long)]
        experiment: Option<String>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Read-only SQL for the custom strategy
        #[arg(long)]
        sql: Option<String>,

        /// Describe the plan instead of running it
        #[arg(long)]
        explain: bool,
    },

    /// Time a query set across strategies
    Analyze {
        /// Queries to run
        #[arg(required = true)]
        queries: Vec<String>,

        #[arg(short, long)]
        experiment: Option<String>,

        /// Comma-separated (default: semantic,keyword,hybrid)
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<SearchStrategy>,
    },
}

#[derive(Subcommand)]
pub(crate) enum TemplateAction {
    /// List template names
    List,

    /// Print a template's DDL
    Show { name: String },
}
