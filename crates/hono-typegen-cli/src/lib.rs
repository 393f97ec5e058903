// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! hono-typegen CLI library.
//!
//! Acts as the host for the typegen plugins: it loads `typegen.toml`,
//! resolves configuration overrides and runs the plugin hooks.
//!
//! # Usage
//!
//! ```bash
//! hono-typegen dev                      # Watch sources, regenerate on change
//! hono-typegen build --mode typegen     # Emit declarations once
//! hono-typegen config --mode typegen    # Print the configuration override
//! ```

/// CLI commands (dev, build, config).
pub mod commands;
/// Project configuration from `typegen.toml`.
pub mod config;
