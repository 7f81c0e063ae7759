// File watcher for incremental re-indexing

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::indexer::{workspace_path, Indexer};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the workspace and runs a non-forced build after relevant changes.
///
/// Events arriving within the debounce window of each other are coalesced
/// into a single build.
pub struct FileWatcher {
    indexer: Arc<Indexer>,
    debounce: Duration,
}

impl FileWatcher {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self {
            indexer,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Watch until the event stream closes
    pub async fn watch(&self) -> Result<()> {
        let root = self.indexer.root().to_path_buf();
        info!("Starting file watcher for: {}", root.display());

        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        debug!("Watcher channel closed");
                    }
                }
                Err(e) => error!("File watch error: {}", e),
            },
            NotifyConfig::default(),
        )
        .context("failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;

        info!("File watcher started. Monitoring for changes...");

        while let Some(event) = rx.recv().await {
            if !self.is_relevant(&event) {
                continue;
            }
            debug!("Change detected: {:?}", event.paths);

            // Coalesce the burst that usually follows a save
            loop {
                match tokio::time::timeout(self.debounce, rx.recv()).await {
                    Ok(Some(next)) => debug!("Coalescing {:?}", next.paths),
                    Ok(None) | Err(_) => break,
                }
            }

            self.rebuild().await;
        }

        Ok(())
    }

    async fn rebuild(&self) {
        match self.indexer.spawn_build(false).await {
            Ok(Ok(stats)) => info!(
                "Re-indexed after change: {} indexed, {} errors",
                stats.files_indexed, stats.errors
            ),
            Ok(Err(e)) => warn!("Re-index failed: {}", e),
            Err(e) => error!("Re-index task failed: {}", e),
        }
    }

    /// Create, modify and remove events on candidate, non-ignored files.
    /// Removed paths no longer exist, so only their names are checked.
    fn is_relevant(&self, event: &Event) -> bool {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                event.paths.iter().any(|path| self.is_candidate(path))
            }
            _ => false,
        }
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let Some(relative) = workspace_path(self.indexer.root(), path) else {
            return false;
        };

        self.indexer.registry().is_candidate(&relative) && !self.indexer.config().is_ignored(&relative)
    }
}

/// Watch the indexer's workspace, blocking until the watcher stops
pub async fn start_watcher(indexer: Arc<Indexer>) -> Result<()> {
    FileWatcher::new(indexer).watch().await
}
