use anyhow::{Context, Result};
use tracing::info;

use super::open_project;
use symdex::indexer::watcher::start_watcher;

pub async fn index_project(project: String, force: bool, watch: bool) -> Result<()> {
    info!("Indexing project: {}", project);

    let indexer = open_project(&project)?;
    let should_watch = watch || indexer.config().indexing.watch;

    println!("Project: {}", indexer.root().display());
    println!("Index: {}", indexer.index_path().display());
    println!("Languages: {}", indexer.registry().languages().join(", "));
    println!("Force: {}", force);

    let stats = indexer
        .spawn_build(force)
        .await
        .context("index build task failed")?
        .context("index build failed")?;

    println!("\nIndexing complete in {:.2}s", stats.duration_seconds);
    println!("  Files indexed: {}", stats.files_indexed);
    println!("  Files skipped: {}", stats.files_skipped);
    println!("  Symbols found: {}", stats.symbols_found);
    println!("  Errors: {}", stats.errors);

    let summary = indexer.summary();
    println!("  Total symbols: {} ({} unique names)", summary.total_symbols, summary.unique_symbols);
    println!("  Total files: {}", summary.files_indexed);

    if should_watch {
        println!("\nWatching for changes. Press Ctrl+C to stop.");
        start_watcher(indexer).await?;
    } else {
        println!("\nRun with --watch to keep the index up to date.");
    }

    Ok(())
}
