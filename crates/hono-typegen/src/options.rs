// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Plugin options and their defaulted, immutable form.
//!
//! [`TypegenOptions`] is what a host hands in (every field optional, usually
//! deserialized from the `[typegen]` table of `typegen.toml`). [`PluginConfig`]
//! is the result of filling every unset field with its default and resolving
//! paths against the working directory.
//!
//! # Example Configuration
//!
//! ```toml
//! [typegen]
//! entry = "./src/server/app.ts"
//! out_dir = ".hono/types/src"
//! include = ["./src/**/*.ts", "./src/**/*.tsx"]
//! watch = ["./src"]
//! watch_enabled = true
//! quiet_period_ms = 500
//! redirect_policy = "build-only"
//! ```

use crate::error::HookError;
use crate::paths;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default library entry point.
pub const DEFAULT_ENTRY: &str = "src/index.ts";
/// Default declaration output directory.
pub const DEFAULT_OUT_DIR: &str = ".hono/types/src";
/// Default quiet period before a regeneration fires.
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 500;

fn default_include() -> Vec<String> {
    vec!["./src/**/*.ts".to_string(), "./src/**/*.tsx".to_string()]
}

fn default_watch_dirs() -> Vec<String> {
    vec!["./src".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec![".ts".to_string()]
}

/// When the mode detector redirects the host configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    /// Only `build` in `typegen` mode is redirected.
    #[default]
    BuildOnly,
    /// Additionally redirect `serve` when watching is enabled.
    BuildAndServe,
}

/// External command that runs the host build tool in typegen mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl BuildCommand {
    /// Creates a build command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self::new("npx", ["vite", "build", "--mode", "typegen"])
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

type RewriteFn = dyn Fn(&Path) -> Result<PathBuf, HookError> + Send + Sync;

/// Hook invoked once per emitted declaration file, may relocate it.
///
/// Errors are not caught by the emitter; they abort the declaration build.
#[derive(Clone)]
pub struct PathRewriteHook(Arc<RewriteFn>);

impl PathRewriteHook {
    /// Wraps a rewrite closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path) -> Result<PathBuf, HookError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Hook that leaves every path untouched.
    pub fn identity() -> Self {
        Self::new(|path| Ok(path.to_path_buf()))
    }

    /// Hook that moves every file under `out_dir` into `out_dir/<subdir>`.
    ///
    /// `/proj/dist/index.d.ts` becomes `/proj/dist/+types/index.d.ts` for
    /// `sequester("/proj/dist", "+types")`. Paths already inside the subfolder
    /// are left alone; paths outside `out_dir` are rejected.
    pub fn sequester(out_dir: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        let out_dir = out_dir.into();
        let subdir = subdir.into();
        Self::new(move |path| {
            let rel = path.strip_prefix(&out_dir).map_err(|_| {
                HookError::new(format!(
                    "{} is outside of {}",
                    path.display(),
                    out_dir.display()
                ))
            })?;
            if rel.starts_with(&subdir) {
                return Ok(path.to_path_buf());
            }
            Ok(out_dir.join(&subdir).join(rel))
        })
    }

    /// Applies the hook to one path.
    pub fn rewrite(&self, path: &Path) -> Result<PathBuf, HookError> {
        (self.0)(path)
    }
}

impl Default for PathRewriteHook {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for PathRewriteHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathRewriteHook(..)")
    }
}

/// User-facing plugin options. Unset fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypegenOptions {
    /// Library entry file (default: "src/index.ts").
    pub entry: Option<String>,
    /// Declaration output directory (default: ".hono/types/src").
    pub out_dir: Option<String>,
    /// Globs of sources handed to the declaration engine.
    pub include: Option<Vec<String>>,
    /// Directories watched during development (default: ["./src"]).
    pub watch: Option<Vec<String>>,
    /// Whether dev-time regeneration is enabled (default: true).
    pub watch_enabled: Option<bool>,
    /// Filename suffixes that count as source changes (default: [".ts"]).
    pub extensions: Option<Vec<String>>,
    /// Globs (relative to the working directory) whose events are discarded.
    pub ignore: Option<Vec<String>>,
    /// Quiet period in milliseconds (default: 500).
    pub quiet_period_ms: Option<u64>,
    /// Redirect policy for `serve` (default: build-only).
    pub redirect_policy: Option<RedirectPolicy>,
    /// Reserved subfolder of `out_dir` that receives every declaration file.
    pub types_subdir: Option<String>,
    /// Command spawned to regenerate declarations.
    pub build_command: Option<BuildCommand>,
    /// Programmatic rewrite hook; takes precedence over `types_subdir`.
    #[serde(skip)]
    pub path_rewrite: Option<PathRewriteHook>,
}

/// Fully defaulted plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    cwd: PathBuf,
    /// Library entry file, relative to the working directory.
    pub entry: String,
    /// Declaration output directory, relative to the working directory.
    pub out_dir: String,
    /// Include globs for the declaration engine.
    pub include: Vec<String>,
    /// Watched directories, relative to the working directory.
    pub watch_dirs: Vec<String>,
    /// Whether dev-time regeneration is enabled.
    pub watch_enabled: bool,
    /// Filename suffixes that count as source changes.
    pub extensions: Vec<String>,
    /// Ignore globs for watch events.
    pub ignore: Vec<String>,
    /// Quiet period before a regeneration fires.
    pub quiet_period: Duration,
    /// Redirect policy for `serve`.
    pub redirect_policy: RedirectPolicy,
    /// Regeneration command.
    pub build_command: BuildCommand,
    /// Rewrite hook applied to every emitted declaration path.
    pub path_rewrite: PathRewriteHook,
}

fn non_empty(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

impl PluginConfig {
    /// Fills every unset option with its default and anchors it at `cwd`.
    pub fn from_options(options: TypegenOptions, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let entry = non_empty(options.entry, DEFAULT_ENTRY);
        let out_dir = non_empty(options.out_dir, DEFAULT_OUT_DIR);

        let path_rewrite = match (options.path_rewrite, options.types_subdir) {
            (Some(hook), _) => hook,
            (None, Some(subdir)) if !subdir.is_empty() => {
                PathRewriteHook::sequester(paths::resolve(&cwd, &out_dir), subdir)
            }
            _ => PathRewriteHook::identity(),
        };

        Self {
            entry,
            out_dir,
            include: options.include.unwrap_or_else(default_include),
            watch_dirs: options.watch.unwrap_or_else(default_watch_dirs),
            watch_enabled: options.watch_enabled.unwrap_or(true),
            extensions: options.extensions.unwrap_or_else(default_extensions),
            ignore: options.ignore.unwrap_or_default(),
            quiet_period: Duration::from_millis(
                options.quiet_period_ms.unwrap_or(DEFAULT_QUIET_PERIOD_MS),
            ),
            redirect_policy: options.redirect_policy.unwrap_or_default(),
            build_command: options.build_command.unwrap_or_default(),
            path_rewrite,
            cwd,
        }
    }

    /// Working directory every relative path is resolved against.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Absolute library entry path.
    pub fn entry_path(&self) -> PathBuf {
        paths::resolve(&self.cwd, &self.entry)
    }

    /// Absolute declaration output directory.
    pub fn out_dir_path(&self) -> PathBuf {
        paths::resolve(&self.cwd, &self.out_dir)
    }

    /// Absolute watch directories, in configured order.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        self.watch_dirs
            .iter()
            .map(|dir| paths::resolve(&self.cwd, dir))
            .collect()
    }
}
