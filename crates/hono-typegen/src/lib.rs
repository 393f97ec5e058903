// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # hono-typegen
//!
//! Keeps a generated type-declaration artifact in sync with a Hono server
//! source tree.
//!
//! A dedicated `typegen` build mode is detected and the host's library-build
//! configuration is redirected to emit declarations only. During development
//! the source directories are watched and a regeneration build is spawned
//! once file changes have settled.
//!
//! ## Features
//!
//! - Mode-aware configuration redirection (`build --mode typegen`)
//! - Declaration emission with a path rewrite hook
//! - Debounced, multi-directory source watching
//! - Regeneration builds cancelled on server shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hono_typegen::{typegen_plugins, ConfigEnv, HostCommand, PluginSet, TypegenOptions};
//!
//! let options = TypegenOptions {
//!     entry: Some("./src/server/app.ts".to_string()),
//!     ..Default::default()
//! };
//! let plugins = PluginSet::new(typegen_plugins(options, std::env::current_dir()?));
//!
//! let env = ConfigEnv::new(HostCommand::Build, "typegen");
//! println!("{}", plugins.resolve_config(&env).to_json());
//! plugins.close_bundle(&env)?;
//! ```

/// Debounced regeneration trigger.
pub mod debounce;
/// Declaration emission and engines.
pub mod emitter;
/// Error types.
pub mod error;
/// Regeneration build invocation.
pub mod invoker;
/// Mode detection and configuration redirection.
pub mod mode;
/// Plugin options and defaults.
pub mod options;
/// Working-directory path resolution.
pub mod paths;
/// Host plugin contract.
pub mod plugin;
/// Console notifications.
pub mod report;
/// Hosting dev-server lifecycle.
pub mod server;
/// Source directory supervision.
pub mod watcher;

pub use debounce::{DebounceController, DebounceState};
pub use emitter::{DeclarationEmitter, DeclarationEngine, EmitRequest, EmittedFile};
pub use error::{HookError, TypegenError, TypegenResult};
pub use invoker::{BuildInvoker, BuildOutcome};
pub use mode::{ConfigEnv, ConfigOverride, HostCommand, ModeDetector, TYPEGEN_MODE};
pub use options::{BuildCommand, PathRewriteHook, PluginConfig, RedirectPolicy, TypegenOptions};
pub use plugin::{typegen_plugins, typegen_plugins_with_engine, Enforce, Plugin, PluginSet};
pub use server::ServerHandle;
pub use watcher::{EventFilter, WatchSupervisor};
