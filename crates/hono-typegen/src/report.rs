// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Console notifications.
//!
//! Human-readable status lines for watcher setup, detected changes and
//! regeneration results. Every line is mirrored as a `tracing` event so the
//! same information reaches structured logs.

use crate::error::TypegenError;
use crate::invoker::BuildOutcome;
use crate::options::BuildCommand;
use console::style;
use regex::Regex;
use std::path::Path;

/// Severity of one diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Compiler or build error.
    Error,
    /// Warning.
    Warning,
    /// Anything else.
    Info,
}

/// Highlights compiler diagnostics (`error TS2322: ...`) in build output.
pub struct DiagnosticFormatter {
    error_pattern: Regex,
    warning_pattern: Regex,
}

impl DiagnosticFormatter {
    /// Creates a formatter.
    pub fn new() -> Self {
        Self {
            error_pattern: Regex::new(r"(?i)\berror\b|\bTS\d{4,5}\b|failed").unwrap(),
            warning_pattern: Regex::new(r"(?i)\bwarn(ing)?\b").unwrap(),
        }
    }

    /// Classifies a line of build output.
    pub fn classify(&self, line: &str) -> LineKind {
        if self.error_pattern.is_match(line) {
            LineKind::Error
        } else if self.warning_pattern.is_match(line) {
            LineKind::Warning
        } else {
            LineKind::Info
        }
    }

    /// Formats a line for display.
    pub fn format_line(&self, line: &str) -> String {
        let line = line.trim_end();
        match self.classify(line) {
            LineKind::Error => format!("    {}", style(line).red()),
            LineKind::Warning => format!("    {}", style(line).yellow()),
            LineKind::Info => format!("    {}", style(line).dim()),
        }
    }
}

impl Default for DiagnosticFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// A watcher was established for `dir`.
pub fn watching(dir: &Path) {
    tracing::info!("Watching {}", dir.display());
    println!(
        "  {} {}",
        style("Watching").cyan(),
        style(dir.display()).dim()
    );
}

/// A watch directory could not be supervised.
pub fn watch_failed(err: &TypegenError) {
    tracing::error!("{}", err);
    eprintln!("  {} {}", style("✗").red(), style(err).red());
}

/// A qualifying source change was observed.
pub fn change_detected(path: &Path) {
    tracing::info!("Change detected: {}", path.display());
    println!(
        "  {} {}",
        style("↻").cyan(),
        style(path.display()).dim()
    );
}

/// A regeneration build is starting.
pub fn regenerating(command: &BuildCommand) {
    tracing::info!("Regenerating types: {}", command);
    println!(
        "  {} {}",
        style("Typegen").cyan(),
        style("regenerating...").dim()
    );
}

/// A regeneration build finished.
pub fn build_outcome(outcome: &BuildOutcome) {
    let ms = outcome.elapsed.as_millis();
    let err = match outcome.clone().into_result() {
        Ok(_) => {
            tracing::info!("Type regeneration succeeded in {}ms", ms);
            println!(
                "  {} {} {}",
                style("Typegen").cyan(),
                style("✓").green(),
                style(format!("{}ms", ms)).dim()
            );
            return;
        }
        Err(err) => err,
    };

    tracing::error!("Type regeneration failed after {}ms: {}", ms, err);
    eprintln!(
        "  {} {} {}",
        style("Typegen").cyan(),
        style("✗").red(),
        style("regeneration failed").red()
    );
    let diagnostic = outcome.diagnostic.as_deref().unwrap_or_default();
    let formatter = DiagnosticFormatter::new();
    for line in diagnostic.lines().filter(|l| !l.trim().is_empty()) {
        eprintln!("{}", formatter.format_line(line));
    }
}

/// `count` declaration files were written into `out_dir`.
pub fn types_regenerated(out_dir: &Path, count: usize) {
    tracing::info!("Types regenerated into {} ({} files)", out_dir.display(), count);
    println!(
        "{} Types are regenerated into {} {}",
        style("✓").green(),
        style(out_dir.display()).bold(),
        style(format!("({} {})", count, if count == 1 { "file" } else { "files" })).dim()
    );
}

/// Watchers were torn down on server shutdown.
pub fn watchers_closed(count: usize) {
    tracing::info!("Closed {} watcher(s)", count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let formatter = DiagnosticFormatter::new();
        assert_eq!(
            formatter.classify("src/app.ts(3,7): error TS2322: Type 'string' is not assignable"),
            LineKind::Error
        );
        assert_eq!(formatter.classify("Build failed"), LineKind::Error);
        assert_eq!(formatter.classify("warning: deprecated option"), LineKind::Warning);
        assert_eq!(formatter.classify("vite v5.0.0 building for typegen..."), LineKind::Info);
    }

    #[test]
    fn test_format_line_keeps_text() {
        console::set_colors_enabled(false);
        let formatter = DiagnosticFormatter::new();
        assert_eq!(formatter.format_line("error TS1005  \n"), "    error TS1005");
    }
}
