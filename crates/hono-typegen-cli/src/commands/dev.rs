// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Development command: supervises the sources until Ctrl+C.

use crate::config::Config;
use console::style;
use hono_typegen::{ConfigEnv, HostCommand, ServerHandle};
use std::path::Path;
use tokio::signal;

/// Starts source supervision and regenerates declarations on change.
pub async fn run(config_path: &Path, cwd: &Path, mode: &str, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load_from(config_path)?;
    let plugins = config.plugin_set(cwd)?;
    let env = ConfigEnv::new(HostCommand::Serve, mode);

    if !quiet {
        let names: Vec<_> = plugins.active(&env).map(|p| p.name()).collect();
        println!("{} {}", style("Plugins:").cyan(), style(names.join(", ")).dim());
    }

    let resolved = plugins.resolve_config(&env);
    if !resolved.is_empty() {
        tracing::info!("Dev server configuration redirected: {}", resolved.to_json());
    }

    let server = ServerHandle::new();
    plugins.configure_server(&env, &server);

    if !quiet {
        println!(
            "{} {}",
            style("Status:").cyan(),
            style("Watching for changes... (Ctrl+C to stop)").dim()
        );
        println!();
    }

    signal::ctrl_c().await?;

    if !quiet {
        println!("\nStopping typegen watcher...");
    }
    server.close();
    // Let the teardown task observe the shutdown before the runtime exits
    tokio::task::yield_now().await;

    Ok(())
}
