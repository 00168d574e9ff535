// Copyright (c) 2025 - Cowboy AI, Inc.
//! neptune-stack command line
//!
//! Declares the application stack from configuration and synthesizes,
//! inspects, checks or diffs it.
//!
//! Configuration comes from `--config FILE` (JSON, any subset of fields)
//! with `NEPTUNE_*` environment variables applied on top. Log verbosity is
//! controlled through `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use neptune_stack::{
    analyze, build_stack, plan, synthesize, DependencyGraph, EdgeKind, StackConfig, Template,
};

#[derive(Parser)]
#[command(name = "neptune-stack")]
#[command(about = "Declare, check and synthesize the Neptune application stack.")]
struct CommandLine {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the synthesized template
    Synth {
        /// Destination file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the dependency waves and edges
    Graph,
    /// Run the structural checks and the reachability analysis
    Check,
    /// Show what changes against a previously deployed template
    Diff {
        /// The deployed template
        #[arg(long)]
        previous: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<StackConfig> {
    let config = match path {
        Some(path) => StackConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => StackConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid environment override")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = CommandLine::parse();
    let config = load_config(cli.config.as_ref())?;
    let app = build_stack(&config).context("Failed to declare the stack")?;

    match cli.command {
        Commands::Synth { output } => {
            let template = synthesize(&app.stack).context("Failed to synthesize")?;
            let json = template.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Template written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Graph => {
            let graph = DependencyGraph::build(&app.stack).context("Invalid resource graph")?;
            for (index, wave) in graph.waves().iter().enumerate() {
                let ids: Vec<&str> = wave.iter().map(|id| id.as_str()).collect();
                println!("wave {}: {}", index, ids.join(", "));
            }
            for edge in graph.edges() {
                let kind = match edge.kind {
                    EdgeKind::Reference => "ref",
                    EdgeKind::Explicit => "depends-on",
                };
                println!("{} -> {} ({})", edge.from, edge.to, kind);
            }
        }
        Commands::Check => {
            DependencyGraph::build(&app.stack).context("Invalid resource graph")?;
            app.validate().context("Structural check failed")?;
            // Findings are logged as warnings by the analysis itself
            let findings = analyze(&app.stack);
            println!(
                "{} resources checked, {} finding(s)",
                app.stack.len(),
                findings.len()
            );
        }
        Commands::Diff { previous } => {
            let raw = std::fs::read_to_string(&previous)
                .with_context(|| format!("Failed to read {}", previous.display()))?;
            let deployed = Template::from_json(&raw).context("Invalid deployed template")?;
            let desired = synthesize(&app.stack).context("Failed to synthesize")?;
            let changes = plan(Some(&deployed), &desired);
            if changes.is_empty() {
                println!("No changes");
                return Ok(());
            }
            for change in &changes.changes {
                println!("{}", change);
            }
            for output in &changes.changed_outputs {
                println!("output {} changes", output);
            }
        }
    }

    Ok(())
}
