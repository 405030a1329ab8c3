// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod extension;
pub mod fs;
pub mod generate;
pub mod logging;
pub mod plugin;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{load_and_validate, ProjectConfig};
use crate::dag::{resolve_plugins, Batches};
use crate::engine::CancellationToken;
use crate::extension::Extensions;
use crate::fs::DiskWriter;
use crate::generate::{load_ancestry, GenerationContext, PlainRenderer};
use crate::plugin::PluginRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - plugin resolution into batches
/// - extension instantiation
/// - site generation
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Generate {
            config,
            ancestry,
            concurrency,
        } => run_generate(&config, &ancestry, concurrency).await,
        Command::Plugins { config } => {
            let project = load_and_validate(&config)?;
            let registry = PluginRegistry::builtin()?;
            let batches = resolve_project_plugins(&project, &registry)?;
            print_batches(&batches);
            Ok(())
        }
    }
}

async fn run_generate(
    config_path: &Path,
    ancestry_path: &Path,
    concurrency: Option<usize>,
) -> Result<()> {
    let mut project = load_and_validate(config_path)?;
    if let Some(n) = concurrency {
        project.set_concurrency(n);
    }
    let project = Arc::new(project);

    let registry = PluginRegistry::builtin()?;
    let batches = resolve_project_plugins(&project, &registry)?;
    let extensions = Extensions::instantiate(&batches, &registry, Arc::clone(&project))?;

    let ancestry = load_ancestry(ancestry_path)?;
    info!(entities = ancestry.len(), "loaded ancestry");

    let writer = DiskWriter::new(project.output_directory());
    let ctx = Arc::new(GenerationContext::new(
        Arc::clone(&project),
        Arc::new(ancestry),
        Arc::new(PlainRenderer),
        Arc::new(writer),
        Arc::new(extensions),
    ));

    // Ctrl-C → cancel the run; in-flight jobs finish, nothing new starts.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling generation");
            cancel.cancel();
        });
    }

    generate::generate(ctx, &cancel).await?;
    Ok(())
}

fn resolve_project_plugins(project: &ProjectConfig, registry: &PluginRegistry) -> Result<Batches> {
    let selected = project.selected_plugins();
    debug!(?selected, "resolving selected plugins");
    let batches = resolve_plugins(&selected, registry)?;
    Ok(batches)
}

/// `plugins` output: one line per batch.
fn print_batches(batches: &Batches) {
    println!("pedigree plugins");
    if batches.is_empty() {
        println!("  (no plugins selected)");
        return;
    }
    for (index, batch) in batches.iter().enumerate() {
        let ids: Vec<&str> = batch.iter().map(|id| id.as_str()).collect();
        println!("  batch {}: {}", index, ids.join(", "));
    }
}
