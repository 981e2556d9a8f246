//! Convert core analyzer types to LSP protocol types.

use tower_lsp::lsp_types::{self, DiagnosticSeverity, Url};

use quakec_syntax::ast::{Position, Range};
use quakec_syntax::diagnostics::{Diagnostic, Severity};

pub fn to_lsp_position(position: Position) -> lsp_types::Position {
    lsp_types::Position::new(position.line, position.character)
}

pub fn from_lsp_position(position: lsp_types::Position) -> Position {
    Position::new(position.line, position.character)
}

pub fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

/// Severity mapping: fatal shares the error code, per the wire encoding.
pub fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Fatal | Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

pub fn to_lsp_diagnostic(diagnostic: &Diagnostic) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: to_lsp_range(diagnostic.range),
        severity: Some(to_lsp_severity(diagnostic.severity)),
        source: Some("quakec".to_string()),
        message: diagnostic.message.clone(),
        ..lsp_types::Diagnostic::default()
    }
}

pub fn path_to_uri(path: &str) -> Option<Url> {
    Url::from_file_path(path).ok()
}

pub fn uri_to_path(uri: &Url) -> Option<String> {
    uri.to_file_path().ok().map(|path| path.to_string_lossy().into_owned())
}
