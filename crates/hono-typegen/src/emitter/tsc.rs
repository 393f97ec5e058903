// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Declaration engine backed by an external TypeScript compiler.

use super::{expand_includes, DeclarationEngine, EmitRequest, EmittedFile};
use crate::error::{TypegenError, TypegenResult};
use crate::invoker::diagnostic_text;
use crate::options::BuildCommand;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Runs the compiler in declaration-only mode and collects its `.d.ts` output.
///
/// The compiler is invoked as `<program> <args> --outDir <staging> <sources...>`
/// where `sources` are the expanded include globs. A run that succeeds without
/// leaving any `.d.ts` file in the staging directory is an error.
#[derive(Debug, Clone)]
pub struct TscEngine {
    command: BuildCommand,
}

impl TscEngine {
    /// Creates an engine running `command`.
    pub fn new(command: BuildCommand) -> Self {
        Self { command }
    }
}

impl Default for TscEngine {
    fn default() -> Self {
        Self::new(BuildCommand::new(
            "npx",
            [
                "tsc",
                "--declaration",
                "--emitDeclarationOnly",
                "--skipLibCheck",
            ],
        ))
    }
}

impl DeclarationEngine for TscEngine {
    fn emit(&self, request: &EmitRequest) -> TypegenResult<Vec<EmittedFile>> {
        let sources = expand_includes(&request.cwd, &request.include)?;
        if sources.is_empty() {
            return Err(TypegenError::Emit(format!(
                "No sources matched {}",
                request.include.join(", ")
            )));
        }

        let start = Instant::now();
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg("--outDir")
            .arg(&request.staging_dir)
            .args(&sources)
            .current_dir(&request.cwd)
            .output()
            .map_err(|e| {
                TypegenError::Emit(format!("Failed to run {}: {}", self.command.program, e))
            })?;

        if !output.status.success() {
            return Err(TypegenError::Emit(diagnostic_text(
                &output.stdout,
                &output.stderr,
                output.status.code(),
            )));
        }
        tracing::debug!("{} finished in {:?}", self.command.program, start.elapsed());

        // A successful run that left nothing behind means the output went elsewhere
        if !request.staging_dir.is_dir() {
            return Err(TypegenError::Emit(format!(
                "{} succeeded but {} is missing",
                self.command.program,
                request.staging_dir.display()
            )));
        }
        let files = collect_declarations(&request.staging_dir)?;
        if files.is_empty() {
            return Err(TypegenError::Emit(format!(
                "{} succeeded but produced no declaration files",
                self.command.program
            )));
        }
        Ok(files)
    }
}

/// Reads every `.d.ts` file below `root`, keyed by its path relative to `root`.
pub fn collect_declarations(root: &Path) -> TypegenResult<Vec<EmittedFile>> {
    let mut files = Vec::new();
    if root.is_dir() {
        walk(root, root, &mut files)?;
    }
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<EmittedFile>) -> TypegenResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, files)?;
        } else if is_declaration(&path) {
            let relative_path: PathBuf = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.push(EmittedFile {
                relative_path,
                contents: fs::read_to_string(&path)?,
            });
        }
    }
    Ok(())
}

pub(crate) fn is_declaration(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts"))
}
