//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;

use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report};

use quakec_syntax::ast::Position;
use quakec_syntax::diagnostics::{Diagnostic, Severity};
use quakec_syntax::grammar::Dialect;

use crate::workspace::SourceDocumentManager;

use super::{CliError, CliResult, ExitCode};

/// Load the workspace under `root`, print every diagnostic with source
/// context, and fail the exit code when any error-severity diagnostics
/// exist.
pub fn check(root: &Path, dialect_name: &str) -> CliResult<ExitCode> {
    let dialect = Dialect::from_name(dialect_name)
        .ok_or_else(|| CliError::failure(format!("unknown dialect '{dialect_name}' (expected qcc or fteqcc)")))?;
    if !root.is_dir() {
        return Err(CliError::failure(format!("{} is not a directory", root.display())));
    }

    let mut manager = SourceDocumentManager::new(Some(root));
    manager.set_dialect(dialect);

    let mut problems = 0usize;
    let mut errors = 0usize;
    let mut files_with_problems = 0usize;

    for (path, diagnostics) in manager.get_diagnostics_all() {
        if diagnostics.is_empty() {
            continue;
        }
        files_with_problems += 1;
        let source = manager.document_text(&path).unwrap_or_default().to_string();
        for diagnostic in &diagnostics {
            problems += 1;
            if matches!(diagnostic.severity, Severity::Fatal | Severity::Error) {
                errors += 1;
            }
            eprintln!("{:?}", render_diagnostic(&path, &source, diagnostic));
        }
    }

    if problems == 0 {
        println!("No problems found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{problems} problem{} in {files_with_problems} file{}.",
        if problems == 1 { "" } else { "s" },
        if files_with_problems == 1 { "" } else { "s" },
    );
    Ok(if errors > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Build a rich terminal report with a labeled source span.
fn render_diagnostic(path: &str, source: &str, diagnostic: &Diagnostic) -> Report {
    let start = offset_of(source, diagnostic.range.start);
    let end = offset_of(source, diagnostic.range.end);
    let length = end.saturating_sub(start).max(1);

    let severity = match diagnostic.severity {
        Severity::Fatal | Severity::Error => miette::Severity::Error,
        Severity::Warning => miette::Severity::Warning,
        Severity::Info | Severity::Hint => miette::Severity::Advice,
    };

    let rendered = MietteDiagnostic::new(diagnostic.message.clone())
        .with_severity(severity)
        .with_labels(vec![LabeledSpan::at(start..start + length, "here")]);

    Report::new(rendered).with_source_code(NamedSource::new(path.to_string(), source.to_string()))
}

/// Byte offset of a line/character position.
fn offset_of(source: &str, position: Position) -> usize {
    let mut offset = 0usize;
    for (index, line) in source.split('\n').enumerate() {
        if index as u32 == position.line {
            let column: usize = line
                .chars()
                .take(position.character as usize)
                .map(char::len_utf8)
                .sum();
            return offset + column.min(line.len());
        }
        offset += line.len() + 1;
    }
    source.len()
}
