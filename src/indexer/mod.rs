// Workspace indexing and file watching

pub mod parser;
pub mod watcher;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{IndexError, Result};
use crate::index::fingerprint::{classify, fingerprint, FileState};
use crate::index::store::IndexStore;
use crate::index::{Reference, Symbol};
use parser::ExtractorRegistry;

/// Counters reported by one build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildStats {
    pub files_indexed: usize,
    pub symbols_found: usize,
    pub files_skipped: usize,
    pub errors: usize,
    pub duration_seconds: f64,
}

/// Snapshot of the index for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub last_indexed: Option<DateTime<Utc>>,
    pub total_symbols: usize,
    pub unique_symbols: usize,
    pub files_indexed: usize,
    pub building: bool,
    pub last_build: Option<BuildStats>,
}

#[derive(Debug, Clone, Default)]
struct StoreCounts {
    last_indexed: Option<DateTime<Utc>>,
    total_symbols: usize,
    unique_symbols: usize,
    files_indexed: usize,
}

impl StoreCounts {
    fn of(store: &IndexStore) -> Self {
        Self {
            last_indexed: store.last_indexed(),
            total_symbols: store.total_symbols(),
            unique_symbols: store.unique_symbols(),
            files_indexed: store.file_count(),
        }
    }
}

/// A file selected for this build
struct Candidate {
    relative: String,
    path: PathBuf,
}

enum FileOutcome {
    Clean,
    Extracted { fingerprint: String, symbols: Vec<Symbol> },
    Failed(IndexError),
}

/// Owns the index of one workspace and coordinates builds against it.
///
/// Builds serialize on a mutex and hold the store's write lock while they
/// run; queries share its read lock.
pub struct Indexer {
    root: PathBuf,
    config: Config,
    registry: ExtractorRegistry,
    index_path: PathBuf,
    store: OnceCell<RwLock<IndexStore>>,
    build_lock: Mutex<()>,
    pending_builds: AtomicUsize,
    last_build: RwLock<Option<BuildStats>>,
    counts: RwLock<StoreCounts>,
}

impl Indexer {
    /// Create an indexer for `root`. The persisted index is loaded on first use.
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Self {
        let root = root.into();
        let index_path = root.join(&config.indexing.index_file);
        let registry = ExtractorRegistry::for_languages(&config.enabled_languages());

        debug!(
            "Indexer for {} with languages [{}]",
            root.display(),
            registry.languages().join(", ")
        );

        Self {
            root,
            config,
            registry,
            index_path,
            store: OnceCell::new(),
            build_lock: Mutex::new(()),
            pending_builds: AtomicUsize::new(0),
            last_build: RwLock::new(None),
            counts: RwLock::new(StoreCounts::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    fn store_lock(&self) -> &RwLock<IndexStore> {
        self.store.get_or_init(|| {
            let store = IndexStore::load(&self.index_path);
            *self.counts.write() = StoreCounts::of(&store);
            RwLock::new(store)
        })
    }

    /// Shared read access to the store; blocks while a build is running.
    pub fn store(&self) -> RwLockReadGuard<'_, IndexStore> {
        self.store_lock().read()
    }

    /// Scan the workspace and bring the index up to date.
    pub fn build(&self, force: bool) -> Result<BuildStats> {
        self.pending_builds.fetch_add(1, Ordering::SeqCst);
        self.build_reserved(force)
    }

    /// Run a build on a blocking worker and return immediately.
    pub fn spawn_build(self: &Arc<Self>, force: bool) -> tokio::task::JoinHandle<Result<BuildStats>> {
        self.pending_builds.fetch_add(1, Ordering::SeqCst);
        let indexer = Arc::clone(self);
        tokio::task::spawn_blocking(move || indexer.build_reserved(force))
    }

    /// True while a build is running or queued
    pub fn is_building(&self) -> bool {
        self.pending_builds.load(Ordering::SeqCst) > 0
    }

    fn build_reserved(&self, force: bool) -> Result<BuildStats> {
        let result = {
            let _guard = self.build_lock.lock();
            self.run_build(force)
        };

        match &result {
            Ok(stats) => *self.last_build.write() = Some(stats.clone()),
            Err(e) => error!("Index build failed: {}", e),
        }

        self.pending_builds.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn run_build(&self, force: bool) -> Result<BuildStats> {
        let started = Instant::now();
        info!("Building index for {} (force: {})", self.root.display(), force);

        let mut store = self.store_lock().write();
        let candidates = self.enumerate()?;
        debug!("{} candidate files", candidates.len());

        let outcomes = self.process(&candidates, &store, force);

        let mut stats = BuildStats::default();
        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                FileOutcome::Clean => stats.files_skipped += 1,
                FileOutcome::Extracted { fingerprint, symbols } => {
                    let found = symbols.len();
                    let inserted = store.replace_file(&candidate.relative, fingerprint, symbols);
                    if inserted < found {
                        debug!("{}: {} duplicate symbols dropped", candidate.relative, found - inserted);
                    }
                    stats.symbols_found += inserted;
                    stats.files_indexed += 1;
                }
                FileOutcome::Failed(e) => {
                    if e.is_per_file() {
                        warn!("{}", e);
                    } else {
                        error!("{}: {}", candidate.relative, e);
                    }
                    stats.errors += 1;
                }
            }
        }

        let keep: HashSet<String> = candidates.iter().map(|c| c.relative.clone()).collect();
        let evicted = store.retain_files(&keep);
        if !evicted.is_empty() {
            info!("Evicted {} files no longer in the workspace", evicted.len());
            for path in &evicted {
                debug!("Evicted {}", path);
            }
        }

        store.mark_indexed(Utc::now());
        stats.duration_seconds = started.elapsed().as_secs_f64();

        if let Err(e) = store.save(&self.index_path) {
            error!("{}", e);
        }

        *self.counts.write() = StoreCounts::of(&store);

        info!(
            "Index build complete: {} indexed, {} skipped, {} errors, {} symbols in {:.2}s",
            stats.files_indexed, stats.files_skipped, stats.errors, stats.symbols_found, stats.duration_seconds
        );

        Ok(stats)
    }

    /// Candidate files in sorted walk order, ignored paths pruned
    fn enumerate(&self) -> Result<Vec<Candidate>> {
        let workspace_err = |message: String| IndexError::Workspace {
            path: self.root.clone(),
            message,
        };

        if !self.root.is_dir() {
            return Err(workspace_err("not a readable directory".to_string()));
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || workspace_path(&self.root, entry.path())
                        .map(|relative| !self.config.is_ignored(&relative))
                        .unwrap_or(false)
            });

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(workspace_err(e.to_string())),
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(relative) = workspace_path(&self.root, entry.path()) else {
                continue;
            };

            if self.registry.is_candidate(&relative) {
                candidates.push(Candidate {
                    relative,
                    path: entry.into_path(),
                });
            }
        }

        Ok(candidates)
    }

    /// Fingerprint and extract every candidate, in parallel when a pool is available.
    fn process(&self, candidates: &[Candidate], store: &IndexStore, force: bool) -> Vec<FileOutcome> {
        let work = |candidate: &Candidate| {
            self.process_file(candidate, store.fingerprint(&candidate.relative), force)
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.performance.threads)
            .build()
        {
            Ok(pool) => pool.install(|| candidates.par_iter().map(work).collect()),
            Err(e) => {
                warn!("Extracting sequentially, thread pool unavailable: {}", e);
                candidates.iter().map(work).collect()
            }
        }
    }

    fn process_file(&self, candidate: &Candidate, stored: Option<&str>, force: bool) -> FileOutcome {
        let bytes = match fs::read(&candidate.path) {
            Ok(bytes) => bytes,
            Err(source) => {
                return FileOutcome::Failed(IndexError::FileRead {
                    path: candidate.relative.clone(),
                    source,
                })
            }
        };

        let fresh = fingerprint(&bytes);
        if classify(stored, &fresh, force) == FileState::Clean {
            return FileOutcome::Clean;
        }

        let source = match std::str::from_utf8(&bytes) {
            Ok(source) => source,
            Err(e) => {
                return FileOutcome::Failed(IndexError::Parse {
                    path: candidate.relative.clone(),
                    message: format!("not valid UTF-8: {}", e),
                })
            }
        };

        match self.registry.extract(source, &candidate.relative) {
            Ok(symbols) => {
                debug!("Extracted {} symbols from {}", symbols.len(), candidate.relative);
                FileOutcome::Extracted {
                    fingerprint: fresh,
                    symbols,
                }
            }
            Err(e) => FileOutcome::Failed(e),
        }
    }

    /// Append a reference record. It lives until its file is re-extracted
    /// or evicted, and is persisted with the next build.
    pub fn record_reference(&self, reference: Reference) {
        self.store_lock().write().add_reference(reference);
    }

    /// Current counters. Does not wait for a running build; its figures are
    /// then those of the previous one.
    pub fn summary(&self) -> IndexSummary {
        let counts = match self.store_lock().try_read() {
            Some(store) => StoreCounts::of(&store),
            None => self.counts.read().clone(),
        };

        IndexSummary {
            last_indexed: counts.last_indexed,
            total_symbols: counts.total_symbols,
            unique_symbols: counts.unique_symbols,
            files_indexed: counts.files_indexed,
            building: self.is_building(),
            last_build: self.last_build.read().clone(),
        }
    }
}

/// Workspace-relative path with forward slashes
fn workspace_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RefType, SymbolKind};
    use tempfile::{tempdir, TempDir};

    fn workspace() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "import os\ndef foo():\n    pass\n").unwrap();
        fs::write(dir.path().join("b.py"), "class Bar:\n    pass\n").unwrap();
        dir
    }

    #[test]
    fn test_forced_build_scenario() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());

        let stats = indexer.build(true).unwrap();
        assert_eq!(stats.files_indexed, 2);
        assert_eq!(stats.symbols_found, 3);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.errors, 0);

        let store = indexer.store();
        let foo = store.symbols_named("foo");
        assert_eq!(foo.len(), 1);
        assert_eq!(foo[0].kind, SymbolKind::Function);
        assert_eq!(foo[0].file, "a.py");
        assert_eq!(foo[0].line, 2);
        assert!(store.last_indexed().is_some());
        assert!(dir.path().join(".symdex.json").exists());
    }

    #[test]
    fn test_unchanged_rebuild_is_idempotent() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());

        indexer.build(false).unwrap();
        let (symbols, files) = {
            let store = indexer.store();
            (store.symbols().clone(), store.files().clone())
        };

        let stats = indexer.build(false).unwrap();
        assert_eq!(stats.files_indexed, 0);
        assert_eq!(stats.files_skipped, 2);

        let store = indexer.store();
        assert_eq!(store.symbols(), &symbols);
        assert_eq!(store.files(), &files);
    }

    #[test]
    fn test_force_reextracts_everything() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());

        indexer.build(false).unwrap();
        let stats = indexer.build(true).unwrap();
        assert_eq!(stats.files_indexed, 2);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(indexer.store().total_symbols(), 3);
    }

    #[test]
    fn test_removed_function_disappears() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());
        indexer.build(true).unwrap();

        fs::write(dir.path().join("a.py"), "import os\n").unwrap();
        let stats = indexer.build(false).unwrap();

        assert_eq!(stats.files_indexed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert!(indexer.store().symbols_named("foo").is_empty());
        assert_eq!(indexer.store().symbols_named("os").len(), 1);
    }

    #[test]
    fn test_parse_failure_keeps_previous_entries() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());
        indexer.build(true).unwrap();
        let before = indexer.store().fingerprint("a.py").map(str::to_string);

        fs::write(dir.path().join("a.py"), "def broken(:\n    pass\n").unwrap();
        let stats = indexer.build(false).unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.files_indexed, 0);
        let store = indexer.store();
        assert_eq!(store.symbols_named("foo").len(), 1);
        assert_eq!(store.symbols_named("Bar").len(), 1);
        assert_eq!(store.fingerprint("a.py").map(str::to_string), before);
        assert!(store.last_indexed().is_some());
    }

    #[test]
    fn test_unreadable_sources_count_as_errors() {
        let dir = workspace();
        fs::write(dir.path().join("latin.py"), b"name = '\xe9'\n").unwrap();
        fs::write(dir.path().join("bad.py"), "class :\n").unwrap();
        let indexer = Indexer::open(dir.path(), Config::default());

        let stats = indexer.build(false).unwrap();
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.files_indexed, 2);
        assert!(indexer.store().fingerprint("latin.py").is_none());
    }

    #[test]
    fn test_ignored_paths_are_not_counted() {
        let dir = workspace();
        for ignored in ["venv", "__pycache__", "build", "node_modules/pkg"] {
            let sub = dir.path().join(ignored);
            fs::create_dir_all(&sub).unwrap();
            fs::write(sub.join("hidden.py"), "def hidden():\n    pass\n").unwrap();
        }
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/util.py"), "VALUE = 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "def nope():\n").unwrap();

        let indexer = Indexer::open(dir.path(), Config::default());
        let stats = indexer.build(false).unwrap();

        assert_eq!(stats.files_indexed, 3);
        assert_eq!(stats.files_skipped, 0);
        let store = indexer.store();
        assert!(store.symbols_named("hidden").is_empty());
        assert_eq!(store.symbols_named("VALUE")[0].file, "pkg/util.py");
    }

    #[test]
    fn test_deleted_files_are_evicted() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());
        indexer.build(false).unwrap();

        fs::remove_file(dir.path().join("b.py")).unwrap();
        let stats = indexer.build(false).unwrap();

        assert_eq!(stats.files_skipped, 1);
        let store = indexer.store();
        assert!(store.symbols_named("Bar").is_empty());
        assert!(store.fingerprint("b.py").is_none());
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn test_index_persists_across_handles() {
        let dir = workspace();
        Indexer::open(dir.path(), Config::default()).build(false).unwrap();

        let reopened = Indexer::open(dir.path(), Config::default());
        assert_eq!(reopened.store().total_symbols(), 3);

        let stats = reopened.build(false).unwrap();
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(stats.files_indexed, 0);
    }

    #[test]
    fn test_missing_workspace_fails() {
        let dir = tempdir().unwrap();
        let indexer = Indexer::open(dir.path().join("nope"), Config::default());

        assert!(matches!(indexer.build(false), Err(IndexError::Workspace { .. })));
        assert!(indexer.store().last_indexed().is_none());
        assert!(indexer.summary().last_build.is_none());
    }

    #[test]
    fn test_language_filter() {
        let dir = workspace();
        fs::write(dir.path().join("lib.rs"), "pub fn helper() {}\n").unwrap();

        let mut config = Config::default();
        config.languages.enabled = vec!["python".to_string()];
        let indexer = Indexer::open(dir.path(), config);
        let stats = indexer.build(false).unwrap();

        assert_eq!(stats.files_indexed, 2);
        assert!(indexer.store().symbols_named("helper").is_empty());

        let both = Indexer::open(dir.path(), Config::default());
        both.build(true).unwrap();
        assert_eq!(both.store().symbols_named("helper")[0].language, "rust");
    }

    #[test]
    fn test_references_follow_their_file() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());
        indexer.build(false).unwrap();

        indexer.record_reference(Reference {
            symbol: "foo".to_string(),
            file: "b.py".to_string(),
            line: 2,
            column: 4,
            ref_type: RefType::Call,
            context: None,
        });
        assert_eq!(indexer.store().references_to("foo").len(), 1);

        fs::write(dir.path().join("b.py"), "class Bar:\n    x = 1\n").unwrap();
        indexer.build(false).unwrap();
        assert!(indexer.store().references_to("foo").is_empty());
    }

    #[test]
    fn test_summary() {
        let dir = workspace();
        let indexer = Indexer::open(dir.path(), Config::default());

        let empty = indexer.summary();
        assert_eq!(empty.total_symbols, 0);
        assert!(empty.last_indexed.is_none());
        assert!(!empty.building);

        indexer.build(false).unwrap();
        let summary = indexer.summary();
        assert_eq!(summary.total_symbols, 3);
        assert_eq!(summary.unique_symbols, 3);
        assert_eq!(summary.files_indexed, 2);
        assert_eq!(summary.last_build.map(|s| s.files_indexed), Some(2));
    }

    #[test]
    fn test_concurrent_builds_serialize() {
        let dir = tempdir().unwrap();
        let files = 40;
        for i in 0..files {
            let source = format!("import os\ndef f{i}():\n    pass\nclass C{i}:\n    pass\n");
            fs::write(dir.path().join(format!("m{:02}.py", i)), source).unwrap();
        }
        let indexer = Indexer::open(dir.path(), Config::default());

        let stats: Vec<BuildStats> = std::thread::scope(|scope| {
            let indexer = &indexer;
            let builds: Vec<_> = (0..4)
                .map(|i| scope.spawn(move || indexer.build(i % 2 == 0).unwrap()))
                .collect();

            let reader = scope.spawn(move || {
                for _ in 0..50 {
                    let store = indexer.store();
                    let os = store.symbols_named("os").len();
                    assert!(os == 0 || os == files, "partial build visible: {} of {}", os, files);
                    assert_eq!(store.total_symbols(), os * 3);
                }
            });

            reader.join().unwrap();
            builds.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        for build in &stats {
            assert_eq!(build.errors, 0);
            assert_eq!(build.files_indexed + build.files_skipped, files);
            if build.files_indexed > 0 {
                assert_eq!(build.files_indexed, files);
                assert_eq!(build.symbols_found, files * 3);
            }
        }
        assert!(stats.iter().filter(|build| build.files_indexed == files).count() >= 2);

        let store = indexer.store();
        assert_eq!(store.symbols_named("os").len(), files);
        assert_eq!(store.total_symbols(), files * 3);
        assert_eq!(store.file_count(), files);
        drop(store);

        assert!(!indexer.is_building());
        assert!(indexer.summary().last_build.is_some());
    }

    #[tokio::test]
    async fn test_spawn_build() {
        let dir = workspace();
        let indexer = Arc::new(Indexer::open(dir.path(), Config::default()));

        let handle = indexer.spawn_build(true);
        let stats = handle.await.unwrap().unwrap();

        assert_eq!(stats.files_indexed, 2);
        assert!(!indexer.is_building());
        assert!(indexer.summary().last_indexed.is_some());
    }
}
