#![forbid(unsafe_code)]
//! QuakeC tooling: incremental project analysis, CLI, and language server.
//!
//! The syntax core (lexer, grammar table, parser, program queries) lives in
//! the `quakec_syntax` crate. This crate adds the multi-file program cache
//! (manifest-driven link order, downstream invalidation), the LSP surface,
//! and the `quakec` CLI.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling: production code uses
//! `Result`/`Option` with `?`, and the `cli` module enforces
//! `#![deny(clippy::unwrap_used)]`. `.unwrap()` is acceptable in tests.

pub mod cli;
pub mod lsp;
pub mod workspace;

pub use workspace::SourceDocumentManager;
