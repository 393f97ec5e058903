// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Host build-tool contract.
//!
//! A host drives plugins through four hooks: `config` (partial configuration
//! override), `apply` (activation predicate), `configure_server` (dev-server
//! lifecycle) and `close_bundle` (post-build). [`typegen_plugins`] returns the
//! named plugin objects this crate registers; [`PluginSet`] is a minimal host
//! driver for them.
//!
//! # Plugins
//!
//! - `vite-plugin-typegen-mode-detector`: redirects typegen builds
//! - `vite-plugin-typegen-watch`: dev-time regeneration
//! - `vite-plugin-typegen-dts`: declaration emission, `enforce: post`

use crate::debounce::DebounceController;
use crate::emitter::tsc::TscEngine;
use crate::emitter::{DeclarationEmitter, DeclarationEngine};
use crate::error::TypegenResult;
use crate::invoker::BuildInvoker;
use crate::mode::{ConfigEnv, ConfigOverride, HostCommand, ModeDetector};
use crate::options::{PluginConfig, TypegenOptions};
use crate::server::ServerHandle;
use crate::watcher::WatchSupervisor;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Name of the configuration-redirecting plugin.
pub const MODE_DETECTOR_PLUGIN: &str = "vite-plugin-typegen-mode-detector";
/// Name of the dev-time watch plugin.
pub const WATCH_PLUGIN: &str = "vite-plugin-typegen-watch";
/// Name of the declaration emission plugin.
pub const DTS_PLUGIN: &str = "vite-plugin-typegen-dts";

/// Plugin ordering relative to the host's own plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforce {
    /// Run before other plugins.
    Pre,
    /// Run after other plugins.
    Post,
}

/// Hooks a host build tool invokes on a plugin.
pub trait Plugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Ordering marker.
    fn enforce(&self) -> Option<Enforce> {
        None
    }

    /// Partial configuration override for `env`.
    fn config(&self, _env: &ConfigEnv) -> ConfigOverride {
        ConfigOverride::empty()
    }

    /// Whether the plugin participates in a run with `env`.
    fn apply(&self, _env: &ConfigEnv) -> bool {
        true
    }

    /// Called once the hosting dev server has started.
    fn configure_server(&self, _server: &ServerHandle) {}

    /// Called after the bundle has been written.
    fn close_bundle(&self) -> TypegenResult<()> {
        Ok(())
    }
}

/// Redirects `build --mode typegen` into a declaration-only library build.
pub struct ModeDetectorPlugin {
    detector: ModeDetector,
}

impl ModeDetectorPlugin {
    /// Creates the plugin for `config`.
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            detector: ModeDetector::new(config),
        }
    }
}

impl Plugin for ModeDetectorPlugin {
    fn name(&self) -> &str {
        MODE_DETECTOR_PLUGIN
    }

    fn config(&self, env: &ConfigEnv) -> ConfigOverride {
        self.detector.detect(env)
    }
}

/// Watches sources during development and spawns regeneration builds.
pub struct WatchPlugin {
    config: Arc<PluginConfig>,
    supervisor: Mutex<Option<Arc<WatchSupervisor>>>,
}

impl WatchPlugin {
    /// Creates the plugin for `config`.
    pub fn new(config: Arc<PluginConfig>) -> Self {
        Self {
            config,
            supervisor: Mutex::new(None),
        }
    }

    /// Supervisor started by the last `configure_server`, if any.
    pub fn supervisor(&self) -> Option<Arc<WatchSupervisor>> {
        self.supervisor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Plugin for WatchPlugin {
    fn name(&self) -> &str {
        WATCH_PLUGIN
    }

    fn apply(&self, env: &ConfigEnv) -> bool {
        env.command == HostCommand::Serve
    }

    fn configure_server(&self, server: &ServerHandle) {
        if !self.config.watch_enabled {
            tracing::debug!("Watching disabled, skipping supervisor");
            return;
        }

        let invoker = BuildInvoker::from_config(&self.config);
        let shutdown = server.subscribe();
        let debounce = Arc::new(DebounceController::new(
            self.config.quiet_period,
            move || {
                // Overlapping builds are tolerated; each one is cancelled on shutdown
                let _ = invoker.spawn(shutdown.clone());
            },
        ));

        let supervisor = WatchSupervisor::start(&self.config, debounce);
        supervisor.attach(server);

        let previous = self
            .supervisor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(supervisor);
        if let Some(previous) = previous {
            previous.shutdown();
        }
    }
}

/// Emits declarations after a typegen build.
pub struct DeclarationPlugin {
    detector: ModeDetector,
    emitter: DeclarationEmitter,
}

impl DeclarationPlugin {
    /// Creates the plugin for `config` with a declaration engine.
    pub fn new(config: &PluginConfig, engine: Arc<dyn DeclarationEngine>) -> Self {
        Self {
            detector: ModeDetector::new(config),
            emitter: DeclarationEmitter::new(config, engine),
        }
    }
}

impl Plugin for DeclarationPlugin {
    fn name(&self) -> &str {
        DTS_PLUGIN
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Post)
    }

    // Same predicate as the redirection, otherwise declarations are silently skipped
    fn apply(&self, env: &ConfigEnv) -> bool {
        self.detector.applies(env)
    }

    fn close_bundle(&self) -> TypegenResult<()> {
        self.emitter.emit().map(|_| ())
    }
}

/// Builds the plugin objects for `options`, emitting through the TypeScript compiler.
pub fn typegen_plugins(options: TypegenOptions, cwd: impl Into<PathBuf>) -> Vec<Box<dyn Plugin>> {
    typegen_plugins_with_engine(options, cwd, Arc::new(TscEngine::default()))
}

/// Builds the plugin objects for `options` with a custom declaration engine.
pub fn typegen_plugins_with_engine(
    options: TypegenOptions,
    cwd: impl Into<PathBuf>,
    engine: Arc<dyn DeclarationEngine>,
) -> Vec<Box<dyn Plugin>> {
    let config = Arc::new(PluginConfig::from_options(options, cwd));
    vec![
        Box::new(ModeDetectorPlugin::new(&config)),
        Box::new(WatchPlugin::new(Arc::clone(&config))),
        Box::new(DeclarationPlugin::new(&config, engine)),
    ]
}

/// Minimal host driver for a set of plugins.
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    /// Wraps plugins, ordering them `pre`, unmarked, `post` (stable).
    pub fn new(mut plugins: Vec<Box<dyn Plugin>>) -> Self {
        plugins.sort_by_key(|p| match p.enforce() {
            Some(Enforce::Pre) => 0,
            None => 1,
            Some(Enforce::Post) => 2,
        });
        Self { plugins }
    }

    /// Names of every plugin, in hook order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Plugins that participate in a run with `env`.
    pub fn active<'a>(
        &'a self,
        env: &'a ConfigEnv,
    ) -> impl Iterator<Item = &'a Box<dyn Plugin>> + 'a {
        self.plugins.iter().filter(move |p| p.apply(env))
    }

    /// Collects configuration overrides; later non-empty overrides win.
    pub fn resolve_config(&self, env: &ConfigEnv) -> ConfigOverride {
        self.active(env)
            .map(|p| p.config(env))
            .filter(|o| !o.is_empty())
            .last()
            .unwrap_or_default()
    }

    /// Runs `configure_server` on every active plugin.
    pub fn configure_server(&self, env: &ConfigEnv, server: &ServerHandle) {
        for plugin in self.active(env) {
            plugin.configure_server(server);
        }
    }

    /// Runs `close_bundle` on every active plugin, stopping at the first error.
    pub fn close_bundle(&self, env: &ConfigEnv) -> TypegenResult<()> {
        for plugin in self.active(env) {
            tracing::debug!("close_bundle: {}", plugin.name());
            plugin.close_bundle()?;
        }
        Ok(())
    }
}
