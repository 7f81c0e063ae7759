// CLI command implementations

pub mod index;
pub mod languages;
pub mod query;
pub mod serve;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::debug;

use symdex::config::Config;
use symdex::index::Symbol;
use symdex::indexer::Indexer;

/// Output format for query commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Resolve the project directory and open its index
pub fn open_project(project: &str) -> Result<Arc<Indexer>> {
    let root: PathBuf = std::fs::canonicalize(project)
        .with_context(|| format!("project directory not found: {}", project))?;

    let config = Config::from_project_dir(&root);
    debug!("Opening index for {}", root.display());

    Ok(Arc::new(Indexer::open(root, config)))
}

pub fn print_symbols(symbols: &[Symbol], format: OutputFormat, empty_message: &str) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(symbols)?),
        OutputFormat::Text if symbols.is_empty() => println!("{}", empty_message),
        OutputFormat::Text => {
            for symbol in symbols {
                let scope = symbol
                    .scope
                    .as_deref()
                    .map(|s| format!(" in {}", s))
                    .unwrap_or_default();
                println!(
                    "  {}:{} - {} ({}){}",
                    symbol.file, symbol.line, symbol.name, symbol.kind, scope
                );
                if let Some(signature) = &symbol.signature {
                    println!("      {}", signature);
                }
            }
        }
    }

    Ok(())
}
