use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use super::open_project;
use symdex::index::store::IndexStore;

pub fn show_stats(project: String, verbose: bool) -> Result<()> {
    let indexer = open_project(&project)?;
    let summary = indexer.summary();

    println!("Project: {}", indexer.root().display());
    println!("\nIndex Statistics:");
    match summary.last_indexed {
        Some(at) => println!("  Last indexed: {}", at.to_rfc3339()),
        None => println!("  Last indexed: never"),
    }
    println!("  Files indexed: {}", summary.files_indexed);
    println!("  Total symbols: {}", summary.total_symbols);
    println!("  Unique symbols: {}", summary.unique_symbols);

    if let Some(size) = index_size_kb(indexer.index_path()) {
        println!("  Index size: {:.1} KB", size);
    }

    if verbose {
        let store = indexer.store();

        println!("\nDetailed Statistics:");
        print_breakdown("Symbols by kind", symbols_by_kind(&store));
        print_breakdown("Symbols by language", symbols_by_language(&store));
    }

    Ok(())
}

fn print_breakdown(title: &str, counts: Vec<(String, usize)>) {
    if counts.is_empty() {
        return;
    }

    println!("  {}:", title);
    for (key, count) in counts {
        println!("    {}: {}", key, count);
    }
}

fn index_size_kb(path: &Path) -> Option<f64> {
    std::fs::metadata(path).ok().map(|m| m.len() as f64 / 1024.0)
}

/// Counts sorted by descending count, then key
fn sorted_counts(counts: BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn symbols_by_kind(store: &IndexStore) -> Vec<(String, usize)> {
    let mut counts = BTreeMap::new();
    for symbol in store.iter_symbols() {
        *counts.entry(symbol.kind.to_string()).or_insert(0) += 1;
    }
    sorted_counts(counts)
}

fn symbols_by_language(store: &IndexStore) -> Vec<(String, usize)> {
    let mut counts = BTreeMap::new();
    for symbol in store.iter_symbols() {
        *counts.entry(symbol.language.clone()).or_insert(0) += 1;
    }
    sorted_counts(counts)
}
