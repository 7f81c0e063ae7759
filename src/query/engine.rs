// Query execution engine

use serde::Serialize;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::index::store::IndexStore;
use crate::index::{Reference, Symbol, SymbolKind};
use crate::indexer::Indexer;
use crate::query::text::{search_text, TextMatch};

/// Where a [`FindResult`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindSource {
    Index,
    Text,
}

/// Answer of [`QueryEngine::find_symbols`]: indexed symbols, or text matches
/// when the index had nothing for the language.
#[derive(Debug, Clone, Serialize)]
pub struct FindResult {
    pub source: FindSource,
    pub symbols: Vec<Symbol>,
    pub matches: Vec<TextMatch>,
}

/// Query engine over one indexer's store. Every query holds the store's
/// read lock for its duration.
pub struct QueryEngine<'a> {
    indexer: &'a Indexer,
}

impl<'a> QueryEngine<'a> {
    pub fn new(indexer: &'a Indexer) -> Self {
        Self { indexer }
    }

    /// Case-insensitive substring search over symbol names, in name order,
    /// optionally restricted to one kind, stopping at `limit` results.
    pub fn search_symbols(&self, query: &str, kind: Option<&str>, limit: usize) -> Result<Vec<Symbol>> {
        if limit == 0 {
            return Err(IndexError::QueryInput("limit must be greater than 0".to_string()));
        }
        let kind = kind.map(str::parse::<SymbolKind>).transpose()?;

        let store = self.indexer.store();
        Ok(search_symbols(&store, query, kind, limit))
    }

    /// Symbols declared in exactly `path` (workspace-relative)
    pub fn file_symbols(&self, path: &str) -> Vec<Symbol> {
        let path = normalize_path(path);
        let store = self.indexer.store();
        file_symbols(&store, &path)
    }

    pub fn symbol_references(&self, name: &str) -> Vec<Reference> {
        self.indexer.store().references_to(name).to_vec()
    }

    /// Look `name` up in the index for an indexed language, falling back to a
    /// text search of the workspace when that finds nothing or the language
    /// has no extractor.
    pub fn find_symbols(&self, name: &str, language: &str) -> Result<FindResult> {
        if name.is_empty() {
            return Err(IndexError::QueryInput("symbol name must not be empty".to_string()));
        }

        match self.indexer.registry().for_language(language) {
            Ok(extractor) => {
                let limit = self.indexer.config().query.default_limit;
                let store = self.indexer.store();
                let symbols: Vec<Symbol> = store
                    .iter_symbols()
                    .filter(|s| s.language == extractor.language() && contains_ignore_case(&s.name, name))
                    .take(limit)
                    .cloned()
                    .collect();

                if !symbols.is_empty() {
                    return Ok(FindResult {
                        source: FindSource::Index,
                        symbols,
                        matches: Vec::new(),
                    });
                }
                debug!("No indexed {} symbols for '{}', searching text", language, name);
            }
            Err(IndexError::UnsupportedLanguage(_)) => {
                debug!("{} is not indexed, searching text for '{}'", language, name);
            }
            Err(e) => return Err(e),
        }

        let matches = search_text(self.indexer.root(), self.indexer.config(), name, language)?;
        Ok(FindResult {
            source: FindSource::Text,
            symbols: Vec::new(),
            matches,
        })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}

/// Search over a store; see [`QueryEngine::search_symbols`].
pub fn search_symbols(store: &IndexStore, query: &str, kind: Option<SymbolKind>, limit: usize) -> Vec<Symbol> {
    let needle = query.to_lowercase();
    let mut results = Vec::new();

    if limit == 0 {
        return results;
    }

    for (name, entries) in store.symbols() {
        if !name.to_lowercase().contains(&needle) {
            continue;
        }

        for symbol in entries {
            if kind.map_or(false, |k| symbol.kind != k) {
                continue;
            }

            results.push(symbol.clone());
            if results.len() == limit {
                return results;
            }
        }
    }

    results
}

/// Linear scan for symbols whose file is exactly `path`
pub fn file_symbols(store: &IndexStore, path: &str) -> Vec<Symbol> {
    store
        .iter_symbols()
        .filter(|symbol| symbol.file == path)
        .cloned()
        .collect()
}
