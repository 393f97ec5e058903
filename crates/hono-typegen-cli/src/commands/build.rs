// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build command: drives the plugins through a host build.

use crate::config::Config;
use console::style;
use hono_typegen::{ConfigEnv, HostCommand};
use std::path::Path;
use std::time::Instant;

/// Runs a build in `mode` for the project at `cwd`.
///
/// Only a `typegen` build does any work: the configuration is redirected into
/// a declaration-only build and the declaration plugin emits after it.
pub async fn run(config_path: &Path, cwd: &Path, mode: &str) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    let plugins = config.plugin_set(cwd)?;
    let env = ConfigEnv::new(HostCommand::Build, mode);

    let resolved = plugins.resolve_config(&env);
    if resolved.is_empty() {
        println!(
            "{} {}",
            style("Typegen").cyan(),
            style(format!("mode '{}' is not a typegen build, nothing to do", mode)).dim()
        );
        return Ok(());
    }
    tracing::debug!("Resolved configuration override: {}", resolved.to_json());

    let start = Instant::now();
    plugins.close_bundle(&env)?;
    tracing::debug!("Declaration build completed in {:?}", start.elapsed());

    Ok(())
}
