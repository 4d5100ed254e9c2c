//! Graft - Entry Point
//!
//! Offline tooling for `graft.toml`: validates the object graph without
//! building anything, and lists what is configured.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `graft check` | Interpolate, resolve references, reject cycles, print build order |
//! | `graft describe` | List every configured entry per tier |

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use graft_domain::value_objects::Tier;
use graft_infrastructure::config::{AppConfig, ConfigLoader};
use graft_infrastructure::graph::{ConfigTree, DependencyGraph};
use graft_infrastructure::logging::init_logging;

/// Command line interface for Graft
#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(about = "Graft - Declarative three-tier component registry")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate references, cycles and placeholders; print the build order
    Check,

    /// List every configured entry per tier
    Describe {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    let tree = load_tree(&config)?;
    match cli.command {
        Command::Check => check(&tree),
        Command::Describe { json } => describe(&tree, json),
    }
}

fn load_tree(config: &AppConfig) -> anyhow::Result<ConfigTree> {
    let env = config.env_table()?;
    let tree = ConfigTree::load(&config.graph_value(), &env)
        .context("Invalid object graph configuration")?;
    Ok(tree)
}

fn check(tree: &ConfigTree) -> anyhow::Result<()> {
    let graph = DependencyGraph::build(tree).context("Invalid reference graph")?;

    println!("{} entries, build order:", tree.len());
    for (position, name) in graph.build_order().iter().enumerate() {
        let tier = tree.get(name).map_or("?".to_string(), |node| node.tier().to_string());
        println!("{:>4}. {name} ({tier})", position + 1);
    }
    Ok(())
}

fn describe(tree: &ConfigTree, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&tree.describe())?);
        return Ok(());
    }

    for tier in Tier::ALL {
        let nodes: Vec<_> = tree.tier_nodes(tier).collect();
        if nodes.is_empty() {
            continue;
        }
        println!("[{}]", tier.section());
        for node in nodes {
            let summary = node.summary();
            let eager = if summary.eager { " eager" } else { "" };
            println!("  {} <- {}{eager}", summary.name, summary.constructor);
            for reference in &summary.references {
                println!("      -> {reference}");
            }
        }
    }
    Ok(())
}
