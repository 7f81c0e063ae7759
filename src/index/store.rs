// In-memory symbol store and its JSON persistence

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Reference, Symbol};
use crate::error::{IndexError, Result};

/// The index aggregate: symbols by name, fingerprints by file, references by
/// name and the time of the last completed build.
///
/// Name keys iterate in lexicographic order; records under one name keep
/// their discovery order. The serialized form is the whole state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStore {
    #[serde(default)]
    last_indexed: Option<DateTime<Utc>>,
    #[serde(default)]
    files: BTreeMap<String, String>,
    #[serde(default)]
    symbols: BTreeMap<String, Vec<Symbol>>,
    #[serde(default)]
    references: BTreeMap<String, Vec<Reference>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted index. A missing document is an empty store, a
    /// malformed one is logged and also yields an empty store.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(store)) => {
                info!(
                    "Index loaded from {} ({} symbols, {} files)",
                    path.display(),
                    store.total_symbols(),
                    store.file_count()
                );
                store
            }
            Ok(None) => {
                debug!("No index at {}, starting empty", path.display());
                Self::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable index: {}", e);
                Self::new()
            }
        }
    }

    /// Like [`IndexStore::load`] but reports why loading failed.
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IndexError::PersistenceRead {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let mut store: IndexStore =
            serde_json::from_str(&content).map_err(|e| IndexError::PersistenceRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let dropped = store.repair();
        if dropped > 0 {
            warn!("Dropped {} inconsistent symbol records from {}", dropped, path.display());
        }

        Ok(Some(store))
    }

    /// Write the index as pretty JSON through a temporary file and a rename,
    /// so readers never observe a half-written document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source: io::Error| IndexError::PersistenceWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::Other, e)))?;

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        fs::write(tmp_path, json).map_err(write_err)?;
        fs::rename(tmp_path, path).map_err(write_err)?;

        info!("Index saved to {}", path.display());
        Ok(())
    }

    pub fn last_indexed(&self) -> Option<DateTime<Utc>> {
        self.last_indexed
    }

    /// Fingerprint recorded at the last successful extraction of `path`
    pub fn fingerprint(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn symbols(&self) -> &BTreeMap<String, Vec<Symbol>> {
        &self.symbols
    }

    pub fn symbols_named(&self, name: &str) -> &[Symbol] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn references_to(&self, name: &str) -> &[Reference] {
        self.references.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All symbols in store iteration order
    pub fn iter_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().flatten()
    }

    pub fn total_symbols(&self) -> usize {
        self.symbols.values().map(Vec::len).sum()
    }

    pub fn unique_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Insert one symbol under its own name. Returns false for an empty name
    /// or when a symbol with the same identity is already stored.
    pub(crate) fn insert_symbol(&mut self, symbol: Symbol) -> bool {
        if symbol.name.is_empty() {
            return false;
        }

        let entries = self.symbols.entry(symbol.name.clone()).or_default();
        if entries.iter().any(|existing| existing.key() == symbol.key()) {
            return false;
        }

        entries.push(symbol);
        true
    }

    pub(crate) fn add_reference(&mut self, reference: Reference) {
        self.references
            .entry(reference.symbol.clone())
            .or_default()
            .push(reference);
    }

    /// Replace everything known about `path` with a fresh extraction result.
    /// Returns how many symbols were inserted.
    pub(crate) fn replace_file(&mut self, path: &str, fingerprint: String, symbols: Vec<Symbol>) -> usize {
        self.purge_file_entries(path);

        let mut inserted = 0;
        for symbol in symbols {
            if self.insert_symbol(symbol) {
                inserted += 1;
            }
        }

        self.files.insert(path.to_string(), fingerprint);
        inserted
    }

    /// Forget a file entirely: its fingerprint, symbols and references.
    pub(crate) fn remove_file(&mut self, path: &str) -> usize {
        self.files.remove(path);
        self.purge_file_entries(path)
    }

    /// Evict every indexed file not in `keep`. Returns the evicted paths.
    pub(crate) fn retain_files(&mut self, keep: &HashSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .files
            .keys()
            .filter(|path| !keep.contains(*path))
            .cloned()
            .collect();

        for path in &stale {
            self.remove_file(path);
        }

        stale
    }

    pub(crate) fn mark_indexed(&mut self, at: DateTime<Utc>) {
        self.last_indexed = Some(at);
    }

    fn purge_file_entries(&mut self, path: &str) -> usize {
        let mut removed = 0;

        self.symbols.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|symbol| symbol.file != path);
            removed += before - entries.len();
            !entries.is_empty()
        });

        self.references.retain(|_, entries| {
            entries.retain(|reference| reference.file != path);
            !entries.is_empty()
        });

        removed
    }

    /// Enforce the keying and identity invariants on loaded data.
    fn repair(&mut self) -> usize {
        let mut dropped = 0;

        for (name, entries) in self.symbols.iter_mut() {
            let mut seen = HashSet::new();
            let before = entries.len();
            entries.retain(|symbol| {
                symbol.name == *name
                    && seen.insert((symbol.kind, symbol.file.clone(), symbol.line))
            });
            dropped += before - entries.len();
        }
        self.symbols.retain(|_, entries| !entries.is_empty());

        for (name, entries) in self.references.iter_mut() {
            let before = entries.len();
            entries.retain(|reference| reference.symbol == *name);
            dropped += before - entries.len();
        }
        self.references.retain(|_, entries| !entries.is_empty());

        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RefType, SymbolKind};
    use tempfile::tempdir;

    fn symbol(name: &str, kind: SymbolKind, file: &str, line: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            file: file.to_string(),
            line,
            column: 0,
            end_line: None,
            scope: None,
            language: "python".to_string(),
            signature: None,
            docstring: None,
        }
    }

    fn reference(name: &str, file: &str, line: usize) -> Reference {
        Reference {
            symbol: name.to_string(),
            file: file.to_string(),
            line,
            column: 0,
            ref_type: RefType::Read,
            context: None,
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_identity() {
        let mut store = IndexStore::new();
        assert!(store.insert_symbol(symbol("foo", SymbolKind::Function, "a.py", 2)));
        assert!(!store.insert_symbol(symbol("foo", SymbolKind::Function, "a.py", 2)));
        assert!(store.insert_symbol(symbol("foo", SymbolKind::Function, "b.py", 2)));
        assert!(store.insert_symbol(symbol("foo", SymbolKind::Variable, "a.py", 2)));
        assert!(!store.insert_symbol(symbol("", SymbolKind::Variable, "a.py", 3)));

        assert_eq!(store.symbols_named("foo").len(), 3);
        assert_eq!(store.unique_symbols(), 1);
    }

    #[test]
    fn test_replace_file_discards_stale_entries() {
        let mut store = IndexStore::new();
        store.replace_file(
            "a.py",
            "h1".to_string(),
            vec![
                symbol("foo", SymbolKind::Function, "a.py", 2),
                symbol("os", SymbolKind::Import, "a.py", 1),
            ],
        );
        store.replace_file("b.py", "h2".to_string(), vec![symbol("foo", SymbolKind::Function, "b.py", 5)]);
        store.add_reference(reference("foo", "a.py", 7));
        store.add_reference(reference("foo", "b.py", 9));

        let inserted = store.replace_file("a.py", "h3".to_string(), vec![symbol("os", SymbolKind::Import, "a.py", 1)]);

        assert_eq!(inserted, 1);
        assert_eq!(store.fingerprint("a.py"), Some("h3"));
        assert_eq!(store.symbols_named("foo").len(), 1);
        assert_eq!(store.symbols_named("foo")[0].file, "b.py");
        assert_eq!(store.references_to("foo").len(), 1);
        assert_eq!(store.references_to("foo")[0].file, "b.py");
    }

    #[test]
    fn test_retain_files_evicts_missing() {
        let mut store = IndexStore::new();
        store.replace_file("a.py", "h1".to_string(), vec![symbol("foo", SymbolKind::Function, "a.py", 1)]);
        store.replace_file("gone.py", "h2".to_string(), vec![symbol("bar", SymbolKind::Function, "gone.py", 1)]);

        let keep: HashSet<String> = ["a.py".to_string()].into_iter().collect();
        let evicted = store.retain_files(&keep);

        assert_eq!(evicted, vec!["gone.py".to_string()]);
        assert!(store.fingerprint("gone.py").is_none());
        assert!(store.symbols_named("bar").is_empty());
        assert_eq!(store.total_symbols(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".symdex.json");

        let mut store = IndexStore::new();
        let mut foo = symbol("foo", SymbolKind::Function, "a.py", 2);
        foo.end_line = Some(4);
        foo.signature = Some("def foo(a, b)".to_string());
        foo.docstring = Some("Adds.".to_string());
        store.replace_file("a.py", "h1".to_string(), vec![foo]);
        store.add_reference(reference("foo", "a.py", 10));
        store.mark_indexed(Utc::now());

        store.save(&path).unwrap();
        let loaded = IndexStore::load(&path);

        assert_eq!(loaded, store);
        assert_eq!(loaded.last_indexed(), store.last_indexed());
    }

    #[test]
    fn test_missing_document_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(IndexStore::try_load(&path).unwrap().is_none());
        assert_eq!(IndexStore::load(&path), IndexStore::new());
    }

    #[test]
    fn test_malformed_document_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".symdex.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            IndexStore::try_load(&path),
            Err(IndexError::PersistenceRead { .. })
        ));
        assert_eq!(IndexStore::load(&path), IndexStore::new());
    }

    #[test]
    fn test_load_drops_misfiled_symbols() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".symdex.json");
        fs::write(
            &path,
            r#"{
                "last_indexed": null,
                "files": {"a.py": "h"},
                "symbols": {
                    "foo": [
                        {"name": "foo", "kind": "function", "file": "a.py", "line": 1},
                        {"name": "bar", "kind": "function", "file": "a.py", "line": 5},
                        {"name": "foo", "kind": "function", "file": "a.py", "line": 1}
                    ]
                }
            }"#,
        )
        .unwrap();

        let store = IndexStore::load(&path);
        assert_eq!(store.total_symbols(), 1);
        assert!(store.symbols_named("bar").is_empty());
        assert!(store.last_indexed().is_none());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory where the document should go makes the rename fail.
        let path = dir.path().join("blocked");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), "x").unwrap();

        let result = IndexStore::new().save(&path);
        assert!(matches!(result, Err(IndexError::PersistenceWrite { .. })));
    }
}
