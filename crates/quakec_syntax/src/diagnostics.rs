//! Diagnostics produced while analyzing QuakeC source.
//!
//! Recoverable problems accumulate as [`Diagnostic`] values on the resulting
//! program; they are data, not `Err` returns. The only hard failure a parse
//! can hit is [`FatalParseError`], which the parse boundary converts into a
//! single fatal diagnostic while still returning the partial program.

use thiserror::Error;

use crate::ast::Range;

/// Diagnostic severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Wire encoding used by editor protocols: 1=error, 2=warning, 3=info,
    /// 4=hint. Fatal shares the error code.
    pub fn code(self) -> u8 {
        match self {
            Severity::Fatal | Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A positioned message attached to a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, severity: Severity, range: Range) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>, range: Range) -> Self {
        Self::new(message, Severity::Error, range)
    }

    pub fn warning(message: impl Into<String>, range: Range) -> Self {
        Self::new(message, Severity::Warning, range)
    }

    pub fn fatal(message: impl Into<String>, range: Range) -> Self {
        Self::new(message, Severity::Fatal, range)
    }
}

/// Unrecoverable parser failure.
///
/// These guards bound runaway parses; hitting one aborts the current file and
/// surfaces as one fatal diagnostic at the last known token position.
#[derive(Debug, Error)]
pub enum FatalParseError {
    #[error("expression nesting exceeded {0} levels")]
    DepthExceeded(usize),
    #[error("parser stopped making progress after {0} steps")]
    BudgetExhausted(usize),
}
