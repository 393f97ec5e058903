// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Prints the configuration override a host would receive.

use crate::config::Config;
use hono_typegen::{ConfigEnv, HostCommand};
use std::path::Path;

/// Returns the override for `(command, mode)` as pretty-printed JSON.
pub fn render(
    config_path: &Path,
    cwd: &Path,
    command: HostCommand,
    mode: &str,
) -> anyhow::Result<String> {
    let config = Config::load_from(config_path)?;
    let plugins = config.plugin_set(cwd)?;
    let resolved = plugins.resolve_config(&ConfigEnv::new(command, mode));
    Ok(serde_json::to_string_pretty(&resolved.to_json())?)
}

/// Prints the override for `(command, mode)` to stdout.
pub fn run(
    config_path: &Path,
    cwd: &Path,
    command: HostCommand,
    mode: &str,
) -> anyhow::Result<()> {
    println!("{}", render(config_path, cwd, command, mode)?);
    Ok(())
}
