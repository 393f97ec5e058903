// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system supervision for dev-time regeneration.
//!
//! [`WatchSupervisor`] owns one recursive watcher per configured directory.
//! Every watcher feeds the same channel; a single pump task filters events and
//! forwards the accepted ones to the shared [`DebounceController`].
//!
//! # Features
//!
//! - Partial failure isolation: a directory that cannot be watched is logged
//!   and skipped, the others are still supervised
//! - Suffix filtering (`.ts` by default) plus optional ignore globs
//! - Events under the declaration output directory or an emission staging
//!   directory are always discarded
//! - Idempotent teardown tied to the hosting server's shutdown event

use crate::debounce::DebounceController;
use crate::error::{TypegenError, TypegenResult};
use crate::mode::TYPEGEN_OUT_DIR;
use crate::options::PluginConfig;
use crate::report;
use crate::server::{wait_closed, ServerHandle};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Decides which file-system events count as source changes.
#[derive(Debug, Clone)]
pub struct EventFilter {
    extensions: Vec<String>,
    ignore: Option<GlobSet>,
    cwd: PathBuf,
    out_dir: PathBuf,
}

impl EventFilter {
    /// Builds the filter for a plugin configuration.
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            ignore: build_ignore_globs(&config.ignore),
            cwd: config.cwd().to_path_buf(),
            out_dir: config.out_dir_path(),
        }
    }

    /// Returns true if a change to `path` should trigger a regeneration.
    pub fn accepts_path(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            return false;
        }
        if path.starts_with(&self.out_dir) || self.is_staging(path) {
            return false;
        }
        if let Some(globs) = &self.ignore {
            let rel = path.strip_prefix(&self.cwd).unwrap_or(path);
            let rel = rel.to_string_lossy().replace('\\', "/");
            if globs.is_match(&rel) {
                return false;
            }
        }
        true
    }

    // Per-emission staging directories live directly under the working directory
    fn is_staging(&self, path: &Path) -> bool {
        path.strip_prefix(&self.cwd)
            .ok()
            .and_then(|rel| rel.components().next())
            .and_then(|first| first.as_os_str().to_str())
            .is_some_and(|name| name.starts_with(TYPEGEN_OUT_DIR))
    }

    /// Returns the first accepted path of `event`, if any.
    pub fn accepted<'a>(&self, event: &'a Event) -> Option<&'a Path> {
        if !is_relevant_event(&event.kind) {
            return None;
        }
        event
            .paths
            .iter()
            .map(PathBuf::as_path)
            .find(|p| self.accepts_path(p))
    }
}

fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn build_ignore_globs(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./");
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e),
        }
    }
    builder.build().ok()
}

/// A live recursive subscription on one directory.
pub struct WatcherHandle {
    dir: PathBuf,
    // Dropping the watcher ends the subscription
    watcher: RecommendedWatcher,
}

impl WatcherHandle {
    /// Subscribes to `dir`, forwarding raw events into `tx`.
    pub fn open(dir: PathBuf, tx: mpsc::UnboundedSender<Event>) -> TypegenResult<Self> {
        let setup_error = |source: notify::Error| TypegenError::WatcherSetup {
            dir: dir.clone(),
            source,
        };

        if !dir.is_dir() {
            return Err(setup_error(
                notify::Error::path_not_found().add_path(dir.clone()),
            ));
        }

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => tracing::warn!("Watch error: {}", e),
            },
            notify::Config::default(),
        )
        .map_err(setup_error)?;

        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .map_err(setup_error)?;

        Ok(Self { dir, watcher })
    }

    /// Watched directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn close(self) {
        let Self { dir, mut watcher } = self;
        if let Err(e) = watcher.unwatch(&dir) {
            tracing::debug!("Unwatch {} failed: {}", dir.display(), e);
        }
        tracing::debug!("Closed watcher for {}", dir.display());
    }
}

/// Owns every watcher of a plugin instance and tears them down exactly once.
pub struct WatchSupervisor {
    handles: Mutex<Vec<WatcherHandle>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    debounce: Arc<DebounceController>,
}

impl WatchSupervisor {
    /// Starts supervising every configured watch directory.
    ///
    /// Directories that cannot be watched are reported and skipped. Must be
    /// called from within a Tokio runtime.
    pub fn start(config: &PluginConfig, debounce: Arc<DebounceController>) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handles = Vec::new();

        for dir in config.watch_paths() {
            match WatcherHandle::open(dir, tx.clone()) {
                Ok(handle) => {
                    report::watching(handle.dir());
                    handles.push(handle);
                }
                Err(e) => report::watch_failed(&e),
            }
        }
        // Only the watchers hold senders now, so the pump ends with the last of them
        drop(tx);

        let filter = EventFilter::new(config);
        let pump = tokio::spawn(pump_events(rx, filter, Arc::clone(&debounce)));

        Arc::new(Self {
            handles: Mutex::new(handles),
            pump: Mutex::new(Some(pump)),
            debounce,
        })
    }

    /// Tears down the supervisor when `server` fires its shutdown event.
    pub fn attach(self: &Arc<Self>, server: &ServerHandle) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        let shutdown = server.subscribe();
        tokio::spawn(async move {
            wait_closed(shutdown).await;
            supervisor.shutdown();
        })
    }

    /// Directories currently under supervision.
    pub fn active_dirs(&self) -> Vec<PathBuf> {
        lock(&self.handles)
            .iter()
            .map(|h| h.dir().to_path_buf())
            .collect()
    }

    /// Closes every watcher and cancels the pending trigger.
    ///
    /// Returns the number of watchers closed by this call; repeated calls
    /// close nothing and return 0.
    pub fn shutdown(&self) -> usize {
        let handles: Vec<WatcherHandle> = lock(&self.handles).drain(..).collect();
        let closed = handles.len();
        for handle in handles {
            handle.close();
        }

        if let Some(pump) = lock(&self.pump).take() {
            pump.abort();
        }
        if self.debounce.cancel() {
            tracing::debug!("Cancelled pending regeneration on shutdown");
        }

        if closed > 0 {
            report::watchers_closed(closed);
        }
        closed
    }
}

impl Drop for WatchSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn pump_events(
    mut rx: mpsc::UnboundedReceiver<Event>,
    filter: EventFilter,
    debounce: Arc<DebounceController>,
) {
    while let Some(event) = rx.recv().await {
        if let Some(path) = filter.accepted(&event) {
            report::change_detected(path);
            debounce.notify();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TypegenOptions;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn filter(options: TypegenOptions) -> EventFilter {
        EventFilter::new(&PluginConfig::from_options(options, "/proj"))
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_suffix_filter() {
        let filter = filter(TypegenOptions::default());
        assert!(filter.accepts_path(Path::new("/proj/src/a.ts")));
        assert!(filter.accepts_path(Path::new("/proj/src/types.d.ts")));
        assert!(!filter.accepts_path(Path::new("/proj/src/view.tsx")));
        assert!(!filter.accepts_path(Path::new("/proj/src/readme.md")));
        assert!(!filter.accepts_path(Path::new("/proj/src/a.ts.swp")));
    }

    #[test]
    fn test_output_directory_is_ignored() {
        let options = TypegenOptions {
            out_dir: Some("src/generated".to_string()),
            ..Default::default()
        };
        let filter = filter(options);
        assert!(!filter.accepts_path(Path::new("/proj/src/generated/index.d.ts")));
        assert!(filter.accepts_path(Path::new("/proj/src/index.ts")));
    }

    #[test]
    fn test_staging_directories_are_ignored() {
        let options = TypegenOptions {
            watch: Some(vec![".".to_string()]),
            ..Default::default()
        };
        let filter = filter(options);
        assert!(!filter.accepts_path(Path::new("/proj/temp-typegen-a1b2c3/index.d.ts")));
        assert!(!filter.accepts_path(Path::new("/proj/temp-typegen/index.d.ts")));
        assert!(filter.accepts_path(Path::new("/proj/src/temp-typegen.ts")));
    }

    #[test]
    fn test_ignore_globs() {
        let options = TypegenOptions {
            ignore: Some(vec!["./src/**/*.test.ts".to_string()]),
            ..Default::default()
        };
        let filter = filter(options);
        assert!(!filter.accepts_path(Path::new("/proj/src/app.test.ts")));
        assert!(!filter.accepts_path(Path::new("/proj/src/deep/app.test.ts")));
        assert!(filter.accepts_path(Path::new("/proj/src/app.ts")));
    }

    #[test]
    fn test_event_kinds() {
        let filter = filter(TypegenOptions::default());
        let created = event(EventKind::Create(CreateKind::File), "/proj/src/a.ts");
        let modified = event(EventKind::Modify(ModifyKind::Any), "/proj/src/a.ts");
        let accessed = event(EventKind::Access(AccessKind::Any), "/proj/src/a.ts");
        let other = event(EventKind::Modify(ModifyKind::Any), "/proj/src/a.js");

        assert_eq!(filter.accepted(&created), Some(Path::new("/proj/src/a.ts")));
        assert!(filter.accepted(&modified).is_some());
        assert!(filter.accepted(&accessed).is_none());
        assert!(filter.accepted(&other).is_none());
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = WatcherHandle::open(PathBuf::from("/definitely/not/here"), tx);
        assert!(matches!(result, Err(TypegenError::WatcherSetup { .. })));
    }
}
