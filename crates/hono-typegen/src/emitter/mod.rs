// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Declaration emission.
//!
//! The actual emission engine is opaque behind [`DeclarationEngine`]; this
//! module wraps it with the project's output directory, include globs, path
//! rewrite hook and emission-complete notification.
//!
//! Every emission gets its own staging directory, so overlapping emissions
//! never see each other's engine output. Writing into the output directory is
//! serialized and ordered: an emission that started earlier than the last
//! committed one is discarded instead of overwriting newer declarations.
//!
//! # Components
//!
//! - [`DeclarationEmitter`]: writes engine output into the output directory
//! - [`tsc::TscEngine`]: engine backed by an external TypeScript compiler

pub mod tsc;

use crate::error::{TypegenError, TypegenResult};
use crate::mode::TYPEGEN_OUT_DIR;
use crate::options::{PathRewriteHook, PluginConfig};
use crate::{paths, report};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Input handed to a declaration engine.
#[derive(Debug, Clone)]
pub struct EmitRequest {
    /// Project working directory.
    pub cwd: PathBuf,
    /// Absolute library entry file.
    pub entry: PathBuf,
    /// Include globs, relative to `cwd`.
    pub include: Vec<String>,
    /// Empty scratch directory owned by this emission alone.
    ///
    /// It exists when the engine is called and is removed afterwards.
    pub staging_dir: PathBuf,
}

/// One declaration file produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    /// Path relative to the output directory.
    pub relative_path: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Produces declaration files for a project.
pub trait DeclarationEngine: Send + Sync {
    /// Emits declarations for `request`.
    fn emit(&self, request: &EmitRequest) -> TypegenResult<Vec<EmittedFile>>;
}

type CompleteFn = dyn Fn(&Path, usize) + Send + Sync;

/// Orders commits into the output directory.
#[derive(Debug, Default)]
struct CommitOrder {
    issued: AtomicU64,
    // Ticket of the last emission written into the output directory
    committed: Mutex<u64>,
}

/// Writes engine output into the configured output directory.
#[derive(Clone)]
pub struct DeclarationEmitter {
    engine: Arc<dyn DeclarationEngine>,
    cwd: PathBuf,
    entry: PathBuf,
    include: Vec<String>,
    out_dir: PathBuf,
    path_rewrite: PathRewriteHook,
    on_complete: Arc<CompleteFn>,
    order: Arc<CommitOrder>,
}

impl DeclarationEmitter {
    /// Creates an emitter for `config` backed by `engine`.
    pub fn new(config: &PluginConfig, engine: Arc<dyn DeclarationEngine>) -> Self {
        Self {
            engine,
            cwd: config.cwd().to_path_buf(),
            entry: config.entry_path(),
            include: config.include.clone(),
            out_dir: config.out_dir_path(),
            path_rewrite: config.path_rewrite.clone(),
            on_complete: Arc::new(report::types_regenerated),
            order: Arc::new(CommitOrder::default()),
        }
    }

    /// Replaces the emission-complete notification.
    ///
    /// The callback receives the output directory and the number of files written.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, usize) + Send + Sync + 'static,
    {
        self.on_complete = Arc::new(f);
        self
    }

    /// Absolute output directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Runs the engine and replaces the declarations in the output directory,
    /// returning the written paths.
    ///
    /// Engine and rewrite hook errors propagate unchanged and leave the output
    /// directory untouched. Declaration files under the output directory that
    /// this emission did not produce are removed. An emission superseded by a
    /// newer one that already committed writes nothing and returns no paths.
    /// The notification only fires once files have been written.
    pub fn emit(&self) -> TypegenResult<Vec<PathBuf>> {
        let ticket = self.order.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let staging = tempfile::Builder::new()
            .prefix(&format!("{}-", TYPEGEN_OUT_DIR))
            .tempdir_in(&self.cwd)?;
        let request = EmitRequest {
            cwd: self.cwd.clone(),
            entry: self.entry.clone(),
            include: self.include.clone(),
            staging_dir: staging.path().to_path_buf(),
        };
        let files = self.engine.emit(&request)?;
        drop(staging);

        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            let target = self.out_dir.join(&file.relative_path);
            let target = self
                .path_rewrite
                .rewrite(&target)
                .map_err(|source| TypegenError::PathRewrite {
                    path: target.clone(),
                    source,
                })?;
            planned.push((target, file.contents));
        }

        let written = {
            let mut committed = self
                .order
                .committed
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *committed > ticket {
                tracing::debug!(
                    "Emission {} superseded by {}, discarding its output",
                    ticket,
                    *committed
                );
                return Ok(Vec::new());
            }

            let mut written = Vec::with_capacity(planned.len());
            for (target, contents) in planned {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, contents)?;
                tracing::debug!("Wrote {}", target.display());
                written.push(target);
            }
            prune_stale(&self.out_dir, &written)?;
            *committed = ticket;
            written
        };

        if !written.is_empty() {
            (self.on_complete)(&self.out_dir, written.len());
        }
        Ok(written)
    }
}

/// Removes declaration files under `out_dir` that are not in `keep`, then
/// any directories left empty.
fn prune_stale(out_dir: &Path, keep: &[PathBuf]) -> TypegenResult<()> {
    if !out_dir.is_dir() {
        return Ok(());
    }
    let keep: HashSet<&Path> = keep.iter().map(PathBuf::as_path).collect();
    prune_dir(out_dir, &keep)?;
    Ok(())
}

// Returns true if `dir` is empty afterwards.
fn prune_dir(dir: &Path, keep: &HashSet<&Path>) -> TypegenResult<bool> {
    let mut empty = true;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if prune_dir(&path, keep)? {
                fs::remove_dir(&path)?;
            } else {
                empty = false;
            }
        } else if tsc::is_declaration(&path) && !keep.contains(path.as_path()) {
            fs::remove_file(&path)?;
            tracing::debug!("Removed stale {}", path.display());
        } else {
            empty = false;
        }
    }
    Ok(empty)
}

/// Expands include globs relative to `cwd` into a sorted list of files.
pub fn expand_includes(cwd: &Path, patterns: &[String]) -> TypegenResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let absolute = paths::resolve(cwd, pattern);
        let absolute = absolute.to_string_lossy();
        let entries = glob::glob(&absolute).map_err(|e| TypegenError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable include match: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::options::TypegenOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FixedEngine(Vec<EmittedFile>);

    impl DeclarationEngine for FixedEngine {
        fn emit(&self, _request: &EmitRequest) -> TypegenResult<Vec<EmittedFile>> {
            Ok(self.0.clone())
        }
    }

    fn file(path: &str, contents: &str) -> EmittedFile {
        EmittedFile {
            relative_path: PathBuf::from(path),
            contents: contents.to_string(),
        }
    }

    fn config(cwd: &Path, hook: Option<PathRewriteHook>) -> PluginConfig {
        let options = TypegenOptions {
            out_dir: Some("dist".to_string()),
            path_rewrite: hook,
            ..Default::default()
        };
        PluginConfig::from_options(options, cwd)
    }

    #[test]
    fn test_emit_writes_files_and_notifies() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FixedEngine(vec![
            file("index.d.ts", "export {}"),
            file("server/app.d.ts", "export declare const app: unknown;"),
        ]));
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = notified.clone();

        let emitter = DeclarationEmitter::new(&config(dir.path(), None), engine)
            .on_complete(move |out, count| sink.lock().unwrap().push((out.to_path_buf(), count)));
        let written = emitter.emit().unwrap();

        assert_eq!(written.len(), 2);
        assert!(dir.path().join("dist/index.d.ts").is_file());
        assert!(dir.path().join("dist/server/app.d.ts").is_file());
        assert_eq!(*notified.lock().unwrap(), vec![(dir.path().join("dist"), 2)]);
    }

    #[test]
    fn test_emit_writes_at_rewritten_path() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("dist");
        let hook = PathRewriteHook::sequester(out_dir.clone(), "+types");
        let engine = Arc::new(FixedEngine(vec![file("index.d.ts", "export {}")]));

        let emitter = DeclarationEmitter::new(&config(dir.path(), Some(hook)), engine)
            .on_complete(|_, _| {});
        let written = emitter.emit().unwrap();

        assert_eq!(written, vec![out_dir.join("+types/index.d.ts")]);
        assert!(out_dir.join("+types/index.d.ts").is_file());
        assert!(!out_dir.join("index.d.ts").exists());
    }

    #[test]
    fn test_hook_error_propagates_without_notification() {
        let dir = tempdir().unwrap();
        let hook = PathRewriteHook::new(|path| {
            Err(HookError::new(format!("refusing {}", path.display())))
        });
        let engine = Arc::new(FixedEngine(vec![file("index.d.ts", "export {}")]));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let emitter = DeclarationEmitter::new(&config(dir.path(), Some(hook)), engine)
            .on_complete(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let err = emitter.emit().unwrap_err();

        assert!(matches!(err, TypegenError::PathRewrite { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("dist/index.d.ts").exists());
    }

    #[test]
    fn test_hook_runs_once_per_file() {
        let dir = tempdir().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook = PathRewriteHook::new(move |path| {
            sink.lock().unwrap().push(path.to_path_buf());
            Ok(path.to_path_buf())
        });
        let engine = Arc::new(FixedEngine(vec![
            file("index.d.ts", "export {}"),
            file("server/app.d.ts", "export {}"),
            file("server/routes/users.d.ts", "export {}"),
        ]));

        DeclarationEmitter::new(&config(dir.path(), Some(hook)), engine)
            .on_complete(|_, _| {})
            .emit()
            .unwrap();

        let out_dir = dir.path().join("dist");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                out_dir.join("index.d.ts"),
                out_dir.join("server/app.d.ts"),
                out_dir.join("server/routes/users.d.ts"),
            ]
        );
    }

    #[test]
    fn test_emit_replaces_stale_declarations() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("dist");
        fs::create_dir_all(out_dir.join("old")).unwrap();
        fs::write(out_dir.join("removed.d.ts"), "export {}").unwrap();
        fs::write(out_dir.join("old/gone.d.ts"), "export {}").unwrap();
        fs::write(out_dir.join("index.d.ts"), "export declare const stale: 1;").unwrap();
        fs::write(out_dir.join("notes.md"), "# kept").unwrap();

        let engine = Arc::new(FixedEngine(vec![file("index.d.ts", "export {}")]));
        DeclarationEmitter::new(&config(dir.path(), None), engine)
            .on_complete(|_, _| {})
            .emit()
            .unwrap();

        assert_eq!(fs::read_to_string(out_dir.join("index.d.ts")).unwrap(), "export {}");
        assert!(!out_dir.join("removed.d.ts").exists());
        assert!(!out_dir.join("old").exists());
        assert!(out_dir.join("notes.md").is_file());
    }

    #[test]
    fn test_empty_emission_does_not_notify() {
        let dir = tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let written = DeclarationEmitter::new(&config(dir.path(), None), Arc::new(FixedEngine(vec![])))
            .on_complete(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .emit()
            .unwrap();

        assert!(written.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Writes one declaration per call; the first call is slow.
    struct SlowFirstEngine {
        calls: AtomicUsize,
        staging_dirs: Mutex<Vec<PathBuf>>,
    }

    impl DeclarationEngine for SlowFirstEngine {
        fn emit(&self, request: &EmitRequest) -> TypegenResult<Vec<EmittedFile>> {
            assert!(request.staging_dir.is_dir());
            self.staging_dirs
                .lock()
                .unwrap()
                .push(request.staging_dir.clone());

            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            fs::write(request.staging_dir.join("index.d.ts"), format!("v{}", call))?;
            if call == 1 {
                std::thread::sleep(std::time::Duration::from_millis(300));
            }
            super::tsc::collect_declarations(&request.staging_dir)
        }
    }

    #[test]
    fn test_overlapping_emissions_keep_the_newest_output() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(SlowFirstEngine {
            calls: AtomicUsize::new(0),
            staging_dirs: Mutex::new(Vec::new()),
        });
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let emitter = DeclarationEmitter::new(&config(dir.path(), None), engine.clone())
            .on_complete(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let older = {
            let emitter = emitter.clone();
            std::thread::spawn(move || emitter.emit())
        };
        std::thread::sleep(std::time::Duration::from_millis(100));
        let newer = emitter.emit().unwrap();
        let older = older.join().unwrap().unwrap();

        let index = dir.path().join("dist/index.d.ts");
        assert_eq!(newer, vec![index.clone()]);
        assert!(older.is_empty(), "superseded emission wrote {:?}", older);
        assert_eq!(fs::read_to_string(&index).unwrap(), "v2");
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        let staging_dirs = engine.staging_dirs.lock().unwrap();
        assert_eq!(staging_dirs.len(), 2);
        assert_ne!(staging_dirs[0], staging_dirs[1]);
        assert!(staging_dirs.iter().all(|d| !d.exists()));
    }

    #[cfg(unix)]
    #[test]
    fn test_overlapping_compiler_runs_both_emit() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "export const a = 1").unwrap();

        // $2 is the staging directory; the compiler lingers after writing
        let engine = Arc::new(tsc::TscEngine::new(crate::options::BuildCommand::new(
            "sh",
            [
                "-c",
                "mkdir -p \"$2\" && echo 'export declare const a: 1;' > \"$2/index.d.ts\" && sleep 0.3",
                "sh",
            ],
        )));
        let emitter =
            DeclarationEmitter::new(&config(dir.path(), None), engine).on_complete(|_, _| {});

        let first = {
            let emitter = emitter.clone();
            std::thread::spawn(move || emitter.emit())
        };
        std::thread::sleep(std::time::Duration::from_millis(100));
        let second = emitter.emit().unwrap();
        let first = first.join().unwrap().unwrap();

        let index = dir.path().join("dist/index.d.ts");
        assert_eq!(first, vec![index.clone()]);
        assert_eq!(second, vec![index.clone()]);
        assert!(index.is_file());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(TYPEGEN_OUT_DIR))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_expand_includes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/server")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "").unwrap();
        fs::write(dir.path().join("src/server/app.ts"), "").unwrap();
        fs::write(dir.path().join("src/view.tsx"), "").unwrap();
        fs::write(dir.path().join("src/readme.md"), "").unwrap();

        let patterns = vec!["./src/**/*.ts".to_string(), "./src/**/*.tsx".to_string()];
        let files = expand_includes(dir.path(), &patterns).unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("src/index.ts"),
                dir.path().join("src/server/app.ts"),
                dir.path().join("src/view.tsx"),
            ]
        );
    }

    #[test]
    fn test_expand_includes_rejects_bad_pattern() {
        let dir = tempdir().unwrap();
        let err = expand_includes(dir.path(), &["src/***/x.ts".to_string()]).unwrap_err();
        assert!(matches!(err, TypegenError::Pattern { .. }));
    }
}
