// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Project configuration.
//!
//! Configuration is loaded from `typegen.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [typegen]
//! entry = "./src/server/app.ts"
//! out_dir = ".hono/types/src"
//! watch = ["./src"]
//! quiet_period_ms = 500
//! types_subdir = "+types"
//!
//! # Command spawned for each regeneration (default: this binary in typegen mode)
//! [typegen.build_command]
//! program = "npx"
//! args = ["vite", "build", "--mode", "typegen"]
//!
//! [emitter]
//! program = "npx"
//! args = ["tsc", "--declaration", "--emitDeclarationOnly"]
//! ```

use hono_typegen::emitter::tsc::TscEngine;
use hono_typegen::{typegen_plugins_with_engine, BuildCommand, PluginSet, TypegenOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "typegen.toml";

/// Main configuration structure loaded from `typegen.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Plugin options.
    #[serde(default)]
    pub typegen: TypegenOptions,
    /// Declaration compiler command; defaults to `npx tsc` in declaration-only mode.
    #[serde(default)]
    pub emitter: Option<BuildCommand>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from `typegen.toml` in the current directory.
    ///
    /// If no configuration file exists, returns default configuration.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads configuration from `path`, falling back to defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("{} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Command that regenerates declarations: the configured one, or this
    /// binary re-invoked as `build --mode typegen`.
    pub fn build_command(&self) -> anyhow::Result<BuildCommand> {
        if let Some(command) = &self.typegen.build_command {
            return Ok(command.clone());
        }

        let exe = std::env::current_exe()?;
        let mut args = Vec::new();
        if let Some(path) = &self.path {
            args.push("--config".to_string());
            args.push(path.to_string_lossy().to_string());
        }
        args.extend(["build", "--mode", "typegen"].map(String::from));
        Ok(BuildCommand::new(exe.to_string_lossy(), args))
    }

    /// Builds the plugin set for a project rooted at `cwd`.
    pub fn plugin_set(&self, cwd: &Path) -> anyhow::Result<PluginSet> {
        let mut options = self.typegen.clone();
        options.build_command = Some(self.build_command()?);

        let engine = match &self.emitter {
            Some(command) => TscEngine::new(command.clone()),
            None => TscEngine::default(),
        };

        Ok(PluginSet::new(typegen_plugins_with_engine(
            options,
            cwd,
            Arc::new(engine),
        )))
    }
}
