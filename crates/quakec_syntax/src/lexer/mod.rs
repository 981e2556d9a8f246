//! Lexer for QuakeC source text.
//!
//! Handles tokenization including:
//! - Block and line comments (a line comment ending in `\` swallows the next line)
//! - Float, string, vector (`'x y z'`), and builtin (`#N`) literals
//! - Type keywords, plain or field-prefixed (`.float`)
//! - Names, the fixed operator set, and modelgen directive lines
//!
//! Competing rules at one offset resolve by longest match; equal-length
//! matches go to the earlier rule in the order above. Unrecognized characters
//! become one-character pass-through tokens, so the stream is total and the
//! lexer never fails.
//!
//! The stream is finite and not restartable; create a fresh [`Lexer`] per
//! input.

pub mod tokens;

pub use tokens::{DirectiveHandling, LexerOptions, Token, TokenKind};

use crate::ast::{Position, Range};

const TYPE_KEYWORDS: &[&str] = &["void", "float", "vector", "string", "entity", "$frame"];

const DIRECTIVE_WORDS: &[&str] = &[
    "cd",
    "origin",
    "base",
    "skin",
    "modelname",
    "name",
    "flags",
    "scale",
    "framegroupstart",
    "framegroupend",
    "spritename",
    "type",
    "load",
];

const TWO_CHAR_OPERATORS: &[&str] = &["&&", "||", "<=", ">=", "==", "!="];
const ONE_CHAR_OPERATORS: &str = "!*/-+=.,<>&|;()[]{}";

/// Candidate classification while resolving `$`/`.`/letter starts.
#[derive(Clone, Copy, PartialEq)]
enum Candidate {
    Type,
    Name,
    Directive,
}

/// Lexer for QuakeC source code.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    character: u32,
    options: LexerOptions,
    /// Set after a leading-name directive token; the rest of the line is
    /// emitted as trivia on the next call.
    in_directive_tail: bool,
}

impl Lexer {
    /// Create a lexer with default options (directives skipped, trivia dropped).
    pub fn new(source: &str) -> Self {
        Self::with_options(source, LexerOptions::default())
    }

    pub fn with_options(source: &str, options: LexerOptions) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 0,
            character: 0,
            options,
            in_directive_tail: false,
        }
    }

    /// Current position in the input, i.e. where the next token starts.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    /// Produce the next non-trivia token, or `None` at end of input.
    ///
    /// With `keep_trivia` set, trivia tokens are returned too.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            let token = self.next_lexeme()?;
            if token.kind.is_trivia() && !self.options.keep_trivia {
                continue;
            }
            return Some(token);
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
        Some(c)
    }

    fn consume(&mut self, count: usize) {
        for _ in 0..count {
            if self.advance().is_none() {
                break;
            }
        }
    }

    fn token_from(&self, kind: TokenKind, start: Position, start_idx: usize) -> Token {
        let text: String = self.chars[start_idx..self.pos].iter().collect();
        Token::new(kind, text, Range::new(start, self.position()))
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn next_lexeme(&mut self) -> Option<Token> {
        let c = self.peek(0)?;
        let start = Lexer::position(self);
        let start_idx = self.pos;

        if self.in_directive_tail {
            self.in_directive_tail = false;
            self.consume_to_end_of_line();
            if self.pos > start_idx {
                return Some(self.token_from(TokenKind::Directive, start, start_idx));
            }
            return self.next_lexeme();
        }

        match c {
            '/' => {
                if self.peek(1) == Some('*') {
                    if let Some(len) = self.block_comment_len() {
                        self.consume(len);
                        return Some(self.token_from(TokenKind::Comment, start, start_idx));
                    }
                }
                if self.peek(1) == Some('/') {
                    self.consume_line_comment();
                    return Some(self.token_from(TokenKind::Comment, start, start_idx));
                }
                self.consume(1);
                Some(self.token_from(TokenKind::Operator, start, start_idx))
            }

            '0'..='9' => {
                self.consume_float();
                Some(self.token_from(TokenKind::Float, start, start_idx))
            }

            '"' => match self.string_len() {
                Some(len) => {
                    self.consume(len);
                    Some(self.token_from(TokenKind::String, start, start_idx))
                }
                None => {
                    self.consume(1);
                    Some(self.token_from(TokenKind::Unknown, start, start_idx))
                }
            },

            '\'' => match self.vector_len() {
                Some(len) => {
                    self.consume(len);
                    Some(self.token_from(TokenKind::Vector, start, start_idx))
                }
                None => {
                    self.consume(1);
                    Some(self.token_from(TokenKind::Unknown, start, start_idx))
                }
            },

            '#' => match self.builtin_len() {
                Some(len) => {
                    self.consume(len);
                    Some(self.token_from(TokenKind::Builtin, start, start_idx))
                }
                None => {
                    self.consume(1);
                    Some(self.token_from(TokenKind::Unknown, start, start_idx))
                }
            },

            '.' => {
                if let Some(len) = self.type_keyword_len() {
                    self.consume(len);
                    return Some(self.token_from(TokenKind::Type, start, start_idx));
                }
                self.consume(1);
                Some(self.token_from(TokenKind::Operator, start, start_idx))
            }

            c if is_name_start(c) => Some(self.scan_word(start, start_idx)),

            c if c.is_whitespace() => {
                while self.peek(0).is_some_and(char::is_whitespace) {
                    self.consume(1);
                }
                Some(self.token_from(TokenKind::Whitespace, start, start_idx))
            }

            _ => {
                if let Some(len) = self.operator_len() {
                    self.consume(len);
                    return Some(self.token_from(TokenKind::Operator, start, start_idx));
                }
                self.consume(1);
                Some(self.token_from(TokenKind::Unknown, start, start_idx))
            }
        }
    }

    /// Resolve a `$`/letter/underscore start between type keywords, names,
    /// and directive lines: longest match wins, ties go to the earlier rule.
    fn scan_word(&mut self, start: Position, start_idx: usize) -> Token {
        let mut candidates: Vec<(usize, Candidate)> = Vec::new();

        if let Some(len) = self.type_keyword_len() {
            candidates.push((len, Candidate::Type));
        }
        if let Some(len) = self.name_len() {
            candidates.push((len, Candidate::Name));
        }
        let directive = self.directive_len();
        if let Some((_, total)) = directive {
            candidates.push((total, Candidate::Directive));
        }

        // Candidates are already in rule-priority order; keep the first of
        // the longest.
        let best = candidates
            .iter()
            .copied()
            .max_by_key(|&(len, _)| len)
            .map(|(len, _)| len)
            .unwrap_or(1);
        let winner = candidates
            .iter()
            .find(|&&(len, _)| len == best)
            .map(|&(_, kind)| kind)
            .unwrap_or(Candidate::Name);

        match winner {
            Candidate::Type => {
                self.consume(best);
                self.token_from(TokenKind::Type, start, start_idx)
            }
            Candidate::Name => {
                self.consume(best);
                self.token_from(TokenKind::Name, start, start_idx)
            }
            Candidate::Directive => {
                let (word_len, total_len) = directive.unwrap_or((best, best));
                match self.options.directives {
                    DirectiveHandling::Skip => {
                        self.consume(total_len);
                        self.token_from(TokenKind::Directive, start, start_idx)
                    }
                    DirectiveHandling::LeadingName => {
                        self.consume(word_len);
                        self.in_directive_tail = true;
                        self.token_from(TokenKind::Name, start, start_idx)
                    }
                }
            }
        }
    }

    // ========================================================================
    // Rule matchers (lookahead only; consumption happens at the call site)
    // ========================================================================

    fn block_comment_len(&self) -> Option<usize> {
        let mut i = 2;
        while let Some(c) = self.peek(i) {
            if c == '*' && self.peek(i + 1) == Some('/') {
                return Some(i + 2);
            }
            i += 1;
        }
        None
    }

    fn consume_line_comment(&mut self) {
        self.consume(2);
        loop {
            let mut last = None;
            while let Some(c) = self.peek(0) {
                if c == '\n' || c == '\r' {
                    break;
                }
                last = Some(c);
                self.consume(1);
            }
            // A trailing backslash continues the comment onto the next line.
            if last == Some('\\') && self.peek(0).is_some() {
                if self.peek(0) == Some('\r') {
                    self.consume(1);
                }
                if self.peek(0) == Some('\n') {
                    self.consume(1);
                }
            } else {
                break;
            }
        }
    }

    fn consume_float(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.consume(1);
        }
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.consume(1);
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.consume(1);
            }
        }
    }

    fn string_len(&self) -> Option<usize> {
        let mut i = 1;
        loop {
            match self.peek(i)? {
                '"' => return Some(i + 1),
                '\\' if self.peek(i + 1).is_some_and(|c| !c.is_whitespace()) => i += 2,
                _ => i += 1,
            }
        }
    }

    fn vector_len(&self) -> Option<usize> {
        let mut i = 1;
        let whitespace = |lexer: &Self, mut i: usize| {
            while lexer.peek(i).is_some_and(char::is_whitespace) {
                i += 1;
            }
            i
        };
        let number = |lexer: &Self, mut i: usize| -> Option<usize> {
            if lexer.peek(i) == Some('-') {
                i += 1;
            }
            let digits_start = i;
            while lexer.peek(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == digits_start {
                return None;
            }
            if lexer.peek(i) == Some('.') && lexer.peek(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
                while lexer.peek(i).is_some_and(|c| c.is_ascii_digit()) {
                    i += 1;
                }
            }
            Some(i)
        };

        i = whitespace(self, i);
        i = number(self, i)?;
        for _ in 0..2 {
            let after_ws = whitespace(self, i);
            if after_ws == i {
                return None;
            }
            i = number(self, after_ws)?;
        }
        i = whitespace(self, i);
        if self.peek(i) == Some('\'') { Some(i + 1) } else { None }
    }

    fn builtin_len(&self) -> Option<usize> {
        let mut i = 1;
        while self.peek(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > 1 { Some(i) } else { None }
    }

    fn type_keyword_len(&self) -> Option<usize> {
        let offset = usize::from(self.peek(0) == Some('.'));
        for keyword in TYPE_KEYWORDS {
            if self.matches_at(offset, keyword) {
                let end = offset + keyword.chars().count();
                if !self.peek(end).is_some_and(is_name_continue) {
                    return Some(end);
                }
            }
        }
        None
    }

    fn name_len(&self) -> Option<usize> {
        let mut i = 0;
        while self.peek(i).is_some_and(is_name_start) {
            i += 1;
        }
        if i == 0 {
            return None;
        }
        while self.peek(i).is_some_and(is_name_continue) {
            i += 1;
        }
        Some(i)
    }

    /// Directive line starting at `$`. Returns (leading word length, total
    /// length through end of line).
    fn directive_len(&self) -> Option<(usize, usize)> {
        if self.peek(0) != Some('$') {
            return None;
        }
        for word in DIRECTIVE_WORDS {
            if self.matches_at(1, word) {
                let end = 1 + word.chars().count();
                if !self.peek(end).is_some_and(is_name_continue) {
                    return Some((end, self.line_len_from(end)));
                }
            }
        }
        // `$frame` followed by a numeric frame name is modelgen output, not a
        // frame declaration; the whole line is skipped.
        if self.matches_at(1, "frame") {
            let mut i = 6;
            let ws_start = i;
            while self.peek(i).is_some_and(char::is_whitespace) {
                i += 1;
            }
            if i > ws_start && self.peek(i).is_some_and(|c| c.is_ascii_digit()) {
                return Some((6, self.line_len_from(i)));
            }
        }
        None
    }

    fn line_len_from(&self, mut i: usize) -> usize {
        while let Some(c) = self.peek(i) {
            if c == '\n' || c == '\r' {
                break;
            }
            i += 1;
        }
        i
    }

    fn operator_len(&self) -> Option<usize> {
        for op in TWO_CHAR_OPERATORS {
            if self.matches_at(0, op) {
                return Some(2);
            }
        }
        let c = self.peek(0)?;
        if ONE_CHAR_OPERATORS.contains(c) { Some(1) } else { None }
    }

    fn matches_at(&self, offset: usize, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(offset + i) == Some(c))
    }

    fn consume_to_end_of_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' || c == '\r' {
                break;
            }
            self.consume(1);
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Leading name characters: letters, underscore, and `$`.
fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string with trivia discarded.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lex with explicit options.
pub fn lex_with_options(source: &str, options: LexerOptions) -> Vec<Token> {
    Lexer::with_options(source, options).collect()
}

// ============================================================================
// TESTS
// ============================================================================
