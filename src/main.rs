//! ragbench command-line entry point.

mod cli;

use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use ragbench::{Config, ConfigLoader, SearchQuery, Workbench};
use ragbench_schema::TemplateRegistry;

use cli::{Cli, Commands, TemplateAction};

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        ConfigLoader::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    ragbench::logging::init(&config.logging)?;
    if !cli.config.exists() {
        warn!("{} not found, using defaults", cli.config.display());
    }

    let workbench = Workbench::from_config(&config).await?;
    run(cli.command, &workbench).await
}

async fn run(command: Commands, workbench: &Workbench) -> anyhow::Result<()> {
    let orchestrator = workbench.orchestrator();

    match command {
        Commands::Create {
            name,
            researcher,
            description,
            template,
        } => {
            let report = orchestrator
                .create(&name, &researcher, &description, &template)
                .await?;
            if !report.all_succeeded() {
                warn!(experiment = %name, "Created with backend failures");
            }
            print_json(&report)
        }
        Commands::Delete { name, force } => {
            let report = orchestrator.delete(&name, force).await?;
            print_json(&report)
        }
        Commands::List => {
            for listing in orchestrator.list().await? {
                let marker = if listing.active { "*" } else { " " };
                let flags: Vec<String> = listing
                    .exists
                    .iter()
                    .map(|(kind, exists)| format!("{}={}", kind, exists))
                    .collect();
                println!(
                    "{} {:<24} {:<16} {:<16} {}",
                    marker,
                    listing.name,
                    listing.researcher,
                    listing.template_name,
                    flags.join(" ")
                );
            }
            Ok(())
        }
        Commands::Switch { name } => {
            let descriptor = orchestrator.switch_experiment(&name).await?;
            info!(experiment = %descriptor.name, "Switched");
            println!("{}", descriptor.name);
            Ok(())
        }
        Commands::Current => {
            match orchestrator.active_experiment().await? {
                Some(descriptor) => print_json(&descriptor)?,
                None => println!("no active experiment"),
            }
            Ok(())
        }
        Commands::Info { name } => print_json(&orchestrator.experiment_info(&name).await?),
        Commands::Note { name, text } => {
            let descriptor = orchestrator.add_note(&name, &text).await?;
            println!("{} notes", descriptor.notes.len());
            Ok(())
        }
        Commands::Backup { name, output } => {
            let report = orchestrator.backup(&name, output.as_deref()).await?;
            print_json(&report)
        }
        Commands::Health => print_json(&orchestrator.health_check().await),
        Commands::Status => print_json(&orchestrator.status().await?),
        Commands::Orphans => {
            for namespace in orchestrator.orphaned_namespaces().await? {
                println!("{}", namespace);
            }
            Ok(())
        }
        Commands::Template { action } => {
            let templates = orchestrator.templates();
            match action {
                TemplateAction::List => {
                    for name in templates.list().await? {
                        println!("{}", name);
                    }
                }
                TemplateAction::Show { name } => println!("{}", templates.render_ddl(&name).await?),
            }
            Ok(())
        }
        Commands::Ingest {
            document,
            chunks,
            experiment,
        } => {
            let chunks: Vec<&str> = chunks.iter().map(String::as_str).collect();
            let report = workbench
                .ingest_chunks(experiment.as_deref(), document, &chunks)
                .await?;
            info!(chunks = report.chunk_ids.len(), vectors = report.vectors, "Ingested");
            print_json(&report)
        }
        Commands::Search {
            text,
            strategy,
            experiment,
            top_k,
            sql,
            explain,
        } => {
            let mut query = match (sql, text) {
                (Some(sql), _) => SearchQuery::custom(sql),
                (None, Some(text)) => SearchQuery::new(text, strategy),
                (None, None) => bail!("search needs query text or --sql"),
            };
            query = query.with_top_k(top_k.unwrap_or(workbench.config().retrieval.default_top_k));

            if explain {
                return print_json(&workbench.explain(experiment.as_deref(), &query).await?);
            }
            print_json(&workbench.search(experiment.as_deref(), &query).await?)
        }
        Commands::Analyze {
            queries,
            experiment,
            strategies,
        } => {
            let queries: Vec<&str> = queries.iter().map(String::as_str).collect();
            let report = workbench
                .analyze(experiment.as_deref(), &queries, &strategies)
                .await?;
            print!("{}", report.report());
            Ok(())
        }
    }
}

