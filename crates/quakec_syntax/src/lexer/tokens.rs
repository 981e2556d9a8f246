//! Token types for the QuakeC lexer.
//!
//! Tokens carry their source text verbatim; with trivia retained, the
//! concatenation of all token texts reproduces the input exactly.

use crate::ast::Range;

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ========== Literals ==========
    /// Numeric literal, `[0-9]+(.[0-9]+)?`. Signs are separate tokens.
    Float,
    /// Quoted string, `\<nonspace>` escapes allowed, may span lines.
    String,
    /// Vector literal, `'x y z'` with optional signs and decimals.
    Vector,
    /// Builtin reference, `#<digits>`.
    Builtin,

    // ========== Identifiers ==========
    /// Type keyword, plain (`float`) or field-prefixed (`.float`).
    Type,
    /// Bare name.
    Name,

    // ========== Punctuation ==========
    Operator,

    // ========== Trivia (discarded unless retained) ==========
    Comment,
    Whitespace,
    /// Modelgen directive content skipped by the lexer.
    Directive,

    // ========== Fallback ==========
    /// One unrecognized character, passed through so the stream stays total.
    Unknown,
}

impl TokenKind {
    /// Trivia is dropped from the stream the parser sees.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Whitespace | TokenKind::Directive)
    }
}

/// A token with its kind, source text, and range.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
        }
    }
}

/// How modelgen directive lines (`$cd`, `$flags`, `$frame 0 …`) are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectiveHandling {
    /// The whole line is consumed as trivia.
    #[default]
    Skip,
    /// The leading `$word` is emitted as a name token; the rest of the line
    /// is consumed as trivia.
    LeadingName,
}

/// Lexer configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerOptions {
    pub directives: DirectiveHandling,
    /// Retain comments/whitespace/directives for exact round-tripping.
    pub keep_trivia: bool,
}
