use anyhow::Result;

use super::{open_project, print_symbols, OutputFormat};
use symdex::query::{FindSource, QueryEngine};

pub fn search(project: String, query: String, kind: Option<String>, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let indexer = open_project(&project)?;
    let limit = limit.unwrap_or(indexer.config().query.default_limit);

    let results = QueryEngine::new(&indexer).search_symbols(&query, kind.as_deref(), limit)?;

    if format == OutputFormat::Text && !results.is_empty() {
        println!("Found {} symbols matching '{}':", results.len(), query);
    }
    print_symbols(&results, format, &format!("No symbols found matching '{}'", query))
}

pub fn file(project: String, path: String, format: OutputFormat) -> Result<()> {
    let indexer = open_project(&project)?;
    let results = QueryEngine::new(&indexer).file_symbols(&path);

    if format == OutputFormat::Text && !results.is_empty() {
        println!("{} symbols in {}:", results.len(), path);
    }
    print_symbols(&results, format, &format!("No symbols indexed for {}", path))
}

pub fn references(project: String, name: String, format: OutputFormat) -> Result<()> {
    let indexer = open_project(&project)?;
    let results = QueryEngine::new(&indexer).symbol_references(&name);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text if results.is_empty() => println!("No references recorded for '{}'", name),
        OutputFormat::Text => {
            println!("Found {} references to '{}':", results.len(), name);
            for reference in results {
                println!(
                    "  {}:{}:{} - {}",
                    reference.file,
                    reference.line,
                    reference.column,
                    reference.ref_type.as_str()
                );
            }
        }
    }

    Ok(())
}

pub fn find(project: String, name: String, language: String, format: OutputFormat) -> Result<()> {
    let indexer = open_project(&project)?;
    let found = QueryEngine::new(&indexer).find_symbols(&name, &language)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found.source {
        FindSource::Index => {
            println!("Found {} indexed symbols for '{}':", found.symbols.len(), name);
            print_symbols(&found.symbols, format, "")?;
        }
        FindSource::Text if found.matches.is_empty() => {
            println!("No {} matches for '{}'", language, name);
        }
        FindSource::Text => {
            println!("Found {} text matches for '{}':", found.matches.len(), name);
            for m in &found.matches {
                println!("  {}:{} - {}", m.file, m.line, m.preview);
            }
        }
    }

    Ok(())
}
