// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for declaration regeneration.
//!
//! # Error Categories
//!
//! - **Watcher setup errors**: a watch directory could not be subscribed.
//!   Caught per directory by the supervisor, never fatal.
//! - **Build invocation errors**: the regeneration build could not be spawned
//!   or exited non-zero. Folded into a failed [`BuildOutcome`](crate::invoker::BuildOutcome).
//! - **Path rewrite errors**: the rewrite hook rejected an emitted path. These
//!   propagate and break the declaration build.
//! - **Emit errors**: the declaration engine itself failed.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a path rewrite hook.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    /// Creates a hook error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Main error type for the typegen plugin.
#[derive(Debug, Error)]
pub enum TypegenError {
    /// A file-system subscription could not be established for a directory.
    #[error("Failed to watch {}: {source}", dir.display())]
    WatcherSetup {
        /// Directory that was supposed to be watched.
        dir: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },

    /// The regeneration build could not be spawned or did not succeed.
    #[error("Build invocation failed: {0}")]
    BuildInvocation(String),

    /// The path rewrite hook failed for an emitted declaration file.
    #[error("Path rewrite failed for {}: {source}", path.display())]
    PathRewrite {
        /// Path handed to the hook.
        path: PathBuf,
        /// Error returned by the hook.
        #[source]
        source: HookError,
    },

    /// The declaration engine failed to produce output.
    #[error("Declaration emission failed: {0}")]
    Emit(String),

    /// An include pattern could not be parsed.
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading or writing declaration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for typegen operations.
pub type TypegenResult<T> = Result<T, TypegenError>;
