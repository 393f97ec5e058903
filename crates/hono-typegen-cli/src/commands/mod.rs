// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `build`: Run a host build; in `typegen` mode this emits declarations
//! - `config`: Print the configuration override for a command and mode
//! - `dev`: Watch sources and regenerate declarations on change

/// Host build command.
pub mod build;
/// Configuration override inspection.
pub mod config;
/// Development supervision command.
pub mod dev;
