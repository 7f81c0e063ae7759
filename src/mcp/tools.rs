// MCP tool handlers

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::index::Symbol;
use crate::indexer::Indexer;
use crate::query::{FindSource, QueryEngine};

pub type Args = Map<String, Value>;

/// Malformed tool arguments; reported as a JSON-RPC invalid-params error
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidArguments(pub String);

fn required_str<'a>(args: &'a Args, key: &str) -> Result<&'a str> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(InvalidArguments(format!("'{}' must be a string", key)).into()),
        None => Err(InvalidArguments(format!("missing '{}'", key)).into()),
    }
}

fn optional_str<'a>(args: &'a Args, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(InvalidArguments(format!("'{}' must be a string", key)).into()),
    }
}

fn optional_bool(args: &Args, key: &str) -> Result<Option<bool>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(InvalidArguments(format!("'{}' must be a boolean", key)).into()),
    }
}

fn optional_usize(args: &Args, key: &str) -> Result<Option<usize>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| InvalidArguments(format!("'{}' must be a non-negative integer", key)).into()),
    }
}

/// Run a store query on a blocking worker; a build holds the write lock for
/// its whole duration.
async fn blocking_query<T, F>(indexer: &Arc<Indexer>, query: F) -> Result<T>
where
    F: FnOnce(QueryEngine<'_>) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let indexer = Arc::clone(indexer);
    let result = tokio::task::spawn_blocking(move || query(QueryEngine::new(&indexer))).await?;
    Ok(result?)
}

fn text_content(text: String) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })
}

fn symbol_line(symbol: &Symbol) -> String {
    let mut line = format!("  {}:{} - {} ({})", symbol.file, symbol.line, symbol.name, symbol.kind);
    if let Some(signature) = &symbol.signature {
        line.push_str(&format!(" `{}`", signature));
    }
    line
}

/// Start a build in the background and return at once
pub async fn build_index(indexer: &Arc<Indexer>, args: &Args) -> Result<Value> {
    let force = optional_bool(args, "force")?.unwrap_or(false);

    if indexer.is_building() {
        warn!("Build requested while another is running; it will queue");
    }

    let handle = indexer.spawn_build(force);
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(stats)) => info!("Background build finished: {} files indexed", stats.files_indexed),
            Ok(Err(e)) => warn!("Background build failed: {}", e),
            Err(e) => warn!("Background build task failed: {}", e),
        }
    });

    Ok(text_content(format!(
        "Index build started (force: {}). Poll index_stats for progress.",
        force
    )))
}

pub async fn index_stats(indexer: &Arc<Indexer>, _args: &Args) -> Result<Value> {
    let summary = indexer.summary();
    Ok(text_content(serde_json::to_string_pretty(&summary)?))
}

pub async fn search_symbols(indexer: &Arc<Indexer>, args: &Args) -> Result<Value> {
    let query = required_str(args, "query")?;
    let kind = optional_str(args, "kind")?;
    let limit = optional_usize(args, "limit")?.unwrap_or(indexer.config().query.default_limit);

    let results = {
        let query = query.to_string();
        let kind = kind.map(str::to_string);
        blocking_query(indexer, move |engine| engine.search_symbols(&query, kind.as_deref(), limit)).await?
    };

    let mut text = Vec::new();
    if results.is_empty() {
        text.push(format!("No symbols found matching '{}'", query));
    } else {
        text.push(format!("Found {} symbols matching '{}':", results.len(), query));
        text.extend(results.iter().map(symbol_line));
    }

    Ok(text_content(text.join("\n")))
}

pub async fn file_symbols(indexer: &Arc<Indexer>, args: &Args) -> Result<Value> {
    let path = required_str(args, "path")?;
    let results = {
        let path = path.to_string();
        blocking_query(indexer, move |engine| Ok(engine.file_symbols(&path))).await?
    };

    let mut text = Vec::new();
    if results.is_empty() {
        text.push(format!("No symbols indexed for {}", path));
    } else {
        text.push(format!("{} symbols in {}:", results.len(), path));
        text.extend(results.iter().map(symbol_line));
    }

    Ok(text_content(text.join("\n")))
}

pub async fn symbol_references(indexer: &Arc<Indexer>, args: &Args) -> Result<Value> {
    let name = required_str(args, "name")?;
    let results = {
        let name = name.to_string();
        blocking_query(indexer, move |engine| Ok(engine.symbol_references(&name))).await?
    };

    let mut text = Vec::new();
    if results.is_empty() {
        text.push(format!("No references recorded for '{}'", name));
    } else {
        text.push(format!("Found {} references to '{}':", results.len(), name));
        for reference in &results {
            text.push(format!(
                "  {}:{}:{} - {}",
                reference.file,
                reference.line,
                reference.column,
                reference.ref_type.as_str()
            ));
        }
    }

    Ok(text_content(text.join("\n")))
}

pub async fn find_symbols(indexer: &Arc<Indexer>, args: &Args) -> Result<Value> {
    let name = required_str(args, "name")?;
    let language = optional_str(args, "language")?.unwrap_or("python");

    let found = {
        let name = name.to_string();
        let language = language.to_string();
        blocking_query(indexer, move |engine| engine.find_symbols(&name, &language)).await?
    };

    let mut text = Vec::new();
    match found.source {
        FindSource::Index => {
            text.push(format!("Found {} indexed symbols for '{}':", found.symbols.len(), name));
            text.extend(found.symbols.iter().map(symbol_line));
        }
        FindSource::Text if found.matches.is_empty() => {
            text.push(format!("No {} matches for '{}'", language, name));
        }
        FindSource::Text => {
            text.push(format!("Found {} text matches for '{}':", found.matches.len(), name));
            for m in &found.matches {
                text.push(format!("  {}:{} - {}", m.file, m.line, m.preview));
            }
        }
    }

    Ok(text_content(text.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::IndexError;
    use std::fs;
    use tempfile::tempdir;

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn text_of(value: &Value) -> &str {
        value["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_queries_answer_while_building() {
        let dir = tempdir().unwrap();
        for i in 0..30 {
            fs::write(dir.path().join(format!("m{:02}.py", i)), format!("def helper_{i}():\n    pass\n")).unwrap();
        }
        fs::write(dir.path().join("a.py"), "import os\ndef foo():\n    pass\n").unwrap();

        let indexer = Arc::new(Indexer::open(dir.path(), Config::default()));
        indexer.spawn_build(false).await.unwrap().unwrap();

        let rebuild = indexer.spawn_build(true);
        let search_args = args(json!({"query": "foo"}));
        let file_args = args(json!({"path": "a.py"}));
        let stats_args = Args::new();
        let (found, in_file, stats) = tokio::join!(
            search_symbols(&indexer, &search_args),
            file_symbols(&indexer, &file_args),
            index_stats(&indexer, &stats_args),
        );
        rebuild.await.unwrap().unwrap();

        assert_eq!(text_of(&found.unwrap()).lines().next(), Some("Found 1 symbols matching 'foo':"));
        assert!(text_of(&in_file.unwrap()).starts_with("2 symbols in a.py:"));
        assert!(text_of(&stats.unwrap()).contains("\"total_symbols\": 32"));
        assert!(!indexer.is_building());
    }

    #[tokio::test]
    async fn test_query_errors_propagate() {
        let dir = tempdir().unwrap();
        let indexer = Arc::new(Indexer::open(dir.path(), Config::default()));

        let err = search_symbols(&indexer, &args(json!({"query": "x", "limit": 0})))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<IndexError>(), Some(IndexError::QueryInput(_))));

        let err = find_symbols(&indexer, &args(json!({"name": 3}))).await.unwrap_err();
        assert!(err.downcast_ref::<InvalidArguments>().is_some());
    }
}
