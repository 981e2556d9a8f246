//! Operator-precedence parser for QuakeC.
//!
//! Expressions use precedence climbing driven by the grammar table: each
//! consumed token's behavior enums decide how it parses, and instantiated
//! symbols double as AST nodes and scope entries. The parser recovers from
//! errors wherever it can and accumulates diagnostics instead of failing; a
//! whole-file parse always yields a [`Program`].
//!
//! ## Examples
//!
//! ```rust,no_run
//! use quakec_syntax::parser::{self, ParseInfo};
//!
//! let program = parser::parse(ParseInfo::new("float health;"));
//! assert!(program.errors().is_empty());
//! ```

use std::sync::Arc;

use crate::ast::{Arity, Range, Symbol, SymbolArena, SymbolId};
use crate::diagnostics::{Diagnostic, FatalParseError, Severity};
use crate::grammar::{
    self, DeclRule, Dialect, DialectTable, ImdRule, LedRule, NudRule, RuleSet, RuleTemplate, StdRule,
};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::program::{ForeignRef, Program};
use crate::scope::{ScopeArena, ScopeId};

// NOTE: This module is split across multiple files using `include!` to keep
// all parser methods in the same Rust module (preserving privacy + call
// patterns) while avoiding a single large source file.

include!("parser/core.rs");
include!("parser/expr.rs");
include!("parser/stmts.rs");
include!("parser/decl.rs");
include!("parser/recovery.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
