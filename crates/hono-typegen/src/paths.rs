// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Resolution of configured relative paths against the working directory.

use std::path::{Component, Path, PathBuf};

/// Resolves `path` against `cwd` and normalizes the result lexically.
///
/// Absolute inputs ignore `cwd`. `.` segments are dropped and `..` pops the
/// previous segment, without touching the file system.
pub fn resolve(cwd: &Path, path: impl AsRef<Path>) -> PathBuf {
    normalize(&cwd.join(path.as_ref()))
}

/// Lexically normalizes a path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root or a prefix
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
