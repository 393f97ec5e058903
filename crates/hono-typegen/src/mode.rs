// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Mode detection and configuration redirection.
//!
//! Given the host's `(command, mode)` pair, [`ModeDetector::detect`] decides
//! whether the host build is redirected into a declaration-only library build.
//! The same predicate ([`ModeDetector::applies`]) gates the declaration plugin,
//! so redirection and emission always agree.

use crate::options::{PluginConfig, RedirectPolicy};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Mode name that selects the declaration-only build.
pub const TYPEGEN_MODE: &str = "typegen";
/// Output directory of the redirected library build.
pub const TYPEGEN_OUT_DIR: &str = "temp-typegen";
/// Library name of the redirected build.
pub const TYPEGEN_LIB_NAME: &str = "typegen";
/// Fixed file name of the redirected library output.
pub const TYPEGEN_FILE_NAME: &str = "temp.js";

/// Host command the configuration hook is invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    /// Production build.
    Build,
    /// Development server.
    Serve,
}

impl HostCommand {
    /// Returns the string identifier for this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostCommand::Build => "build",
            HostCommand::Serve => "serve",
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "build" => Ok(HostCommand::Build),
            "serve" | "dev" => Ok(HostCommand::Serve),
            _ => Err(format!("Unknown command: {}", s)),
        }
    }
}

/// Arguments of the host's configuration and activation hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEnv {
    /// Active host command.
    pub command: HostCommand,
    /// Active mode, e.g. "development" or "typegen".
    pub mode: String,
}

impl ConfigEnv {
    /// Creates a hook environment.
    pub fn new(command: HostCommand, mode: impl Into<String>) -> Self {
        Self {
            command,
            mode: mode.into(),
        }
    }
}

/// Output format of the redirected library build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibFormat {
    /// ECMAScript modules.
    Es,
}

/// Library section of the redirected build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibOverride {
    /// Absolute entry file.
    pub entry: PathBuf,
    /// Library name.
    pub name: String,
    /// Output formats.
    pub formats: Vec<LibFormat>,
    /// Fixed output file name.
    pub file_name: String,
}

/// Build section of the redirected configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOverride {
    /// Output directory, distinct from the final artifact directory.
    pub out_dir: String,
    /// Library build settings.
    pub lib: LibOverride,
}

/// Partial host configuration returned by the configuration hook.
///
/// Serializes to `{}` when empty, which leaves the host configuration untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverride {
    /// Build redirection, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildOverride>,
}

impl ConfigOverride {
    /// An override with no effect.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if this override changes nothing.
    pub fn is_empty(&self) -> bool {
        self.build.is_none()
    }

    /// Serializes the override in the host's JSON shape.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Decides configuration redirection for a plugin instance.
#[derive(Debug, Clone)]
pub struct ModeDetector {
    entry: PathBuf,
    watch_enabled: bool,
    policy: RedirectPolicy,
}

impl ModeDetector {
    /// Creates a detector from a defaulted plugin configuration.
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            entry: config.entry_path(),
            watch_enabled: config.watch_enabled,
            policy: config.redirect_policy,
        }
    }

    /// Returns true if the build should be a declaration-only build.
    pub fn applies(&self, env: &ConfigEnv) -> bool {
        match env.command {
            HostCommand::Build => env.mode == TYPEGEN_MODE,
            HostCommand::Serve => {
                self.policy == RedirectPolicy::BuildAndServe && self.watch_enabled
            }
        }
    }

    /// Computes the configuration override for `env`. Pure.
    pub fn detect(&self, env: &ConfigEnv) -> ConfigOverride {
        if !self.applies(env) {
            return ConfigOverride::empty();
        }

        ConfigOverride {
            build: Some(BuildOverride {
                out_dir: TYPEGEN_OUT_DIR.to_string(),
                lib: LibOverride {
                    entry: self.entry.clone(),
                    name: TYPEGEN_LIB_NAME.to_string(),
                    formats: vec![LibFormat::Es],
                    file_name: TYPEGEN_FILE_NAME.to_string(),
                },
            }),
        }
    }
}
