//! Parsed-program bundle and its position-based queries.
//!
//! A [`Program`] is immutable once built: re-parsing a document produces a
//! fresh program that supersedes the old one. Programs chain to the previous
//! document in link order through an `Arc`, which is how a later file sees
//! earlier files' top-level declarations, mimicking static linking.
//!
//! Name occurrences resolve lazily at query time by walking the occurrence's
//! scope chain, so queries always reflect the scope the parse produced.

use std::sync::Arc;

use crate::ast::{Position, Range, SymbolArena, SymbolId};
use crate::diagnostics::Diagnostic;
use crate::scope::{ScopeArena, ScopeId};

/// A resolved place in the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

/// A reference made by this program to a definition owned by an earlier
/// program in the link chain.
#[derive(Debug, Clone)]
pub struct ForeignRef {
    /// Uri of the program owning the definition.
    pub def_uri: String,
    /// The definition symbol in that program's arena.
    pub def_symbol: SymbolId,
    /// Range of the referencing occurrence in this program.
    pub range: Range,
}

/// Everything one parse produced.
pub struct Program {
    pub uri: Option<String>,
    /// Top-level declaration initializer nodes, in source order.
    pub ast: Vec<SymbolId>,
    pub(crate) arena: SymbolArena,
    pub(crate) scopes: ScopeArena,
    /// The document's top-level scope; later files chain onto it.
    pub file_scope: ScopeId,
    /// Previous file in link order, if any.
    pub parent: Option<Arc<Program>>,
    /// Every instantiated symbol in the order it was produced.
    pub(crate) occurrences: Vec<SymbolId>,
    diagnostics: Vec<Diagnostic>,
    foreign_refs: Vec<ForeignRef>,
}

impl Program {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        uri: Option<String>,
        ast: Vec<SymbolId>,
        arena: SymbolArena,
        scopes: ScopeArena,
        file_scope: ScopeId,
        parent: Option<Arc<Program>>,
        occurrences: Vec<SymbolId>,
        diagnostics: Vec<Diagnostic>,
        foreign_refs: Vec<ForeignRef>,
    ) -> Self {
        Self {
            uri,
            ast,
            arena,
            scopes,
            file_scope,
            parent,
            occurrences,
            diagnostics,
            foreign_refs,
        }
    }

    /// Diagnostics collected while parsing this document.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// References this program makes into earlier programs.
    pub fn foreign_refs(&self) -> &[ForeignRef] {
        &self.foreign_refs
    }

    /// The symbol occurrence covering `position`, if any.
    ///
    /// Occurrence ranges do not overlap, so a linear scan finding the first
    /// hit finds the only hit.
    pub fn symbol_at(&self, position: Position) -> Option<&crate::ast::Symbol> {
        self.occurrence_at(position).map(|id| &self.arena[id])
    }

    fn occurrence_at(&self, position: Position) -> Option<SymbolId> {
        self.occurrences
            .iter()
            .copied()
            .find(|&id| self.arena[id].range.contains(position))
    }

    /// Resolve the occurrence at `position` to its definition, which may live
    /// in an earlier program in the link chain.
    fn resolve_definition(&self, position: Position) -> Option<(&Program, SymbolId)> {
        let occurrence = self.occurrence_at(position)?;
        let symbol = &self.arena[occurrence];
        let scope = symbol.scope?;
        self.resolve_name(scope, &symbol.name)
    }

    fn resolve_name(&self, scope: ScopeId, name: &str) -> Option<(&Program, SymbolId)> {
        if let Some(id) = self.scopes.lookup(scope, name) {
            return Some((self, id));
        }
        let mut parent = self.parent.as_deref();
        while let Some(program) = parent {
            if let Some(id) = program.scopes.lookup_here(program.file_scope, name) {
                return Some((program, id));
            }
            parent = program.parent.as_deref();
        }
        None
    }

    /// Look a name up in this document's top-level scope and the link chain.
    pub fn global_symbol(&self, name: &str) -> Option<&crate::ast::Symbol> {
        self.resolve_name(self.file_scope, name).map(|(program, id)| &program.arena[id])
    }

    /// Rendered type signature of a top-level name, e.g.
    /// `void(entity target) update`.
    pub fn global_type_string(&self, name: &str) -> Option<String> {
        let (program, id) = self.resolve_name(self.file_scope, name)?;
        program.type_string_of(id)
    }

    /// `"<type> <name>"` for the definition behind the occurrence at
    /// `position`.
    pub fn type_string_at(&self, position: Position) -> Option<String> {
        let (program, id) = self.resolve_definition(position)?;
        program.type_string_of(id)
    }

    fn type_string_of(&self, id: SymbolId) -> Option<String> {
        let symbol = &self.arena[id];
        let ty = symbol.ty?;
        Some(format!("{} {}", self.render_type(ty), symbol.name))
    }

    /// Render a type symbol, recursing into function parameter lists.
    fn render_type(&self, ty: SymbolId) -> String {
        let symbol = &self.arena[ty];
        let array_part = if symbol.array { "[]" } else { "" };
        match &symbol.params {
            None => format!("{}{}", symbol.name, array_part),
            Some(params) => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|&param| {
                        let p = &self.arena[param];
                        match p.ty {
                            Some(pty) => format!("{} {}", self.render_type(pty), p.name),
                            None => p.name.clone(),
                        }
                    })
                    .collect();
                format!("{}({}){}", symbol.name, rendered.join(", "), array_part)
            }
        }
    }

    /// Where the symbol under `position` is defined.
    pub fn definition_at(&self, position: Position) -> Option<Location> {
        let (program, id) = self.resolve_definition(position)?;
        let definition = &program.arena[id];
        let scope = definition.scope?;
        Some(Location {
            uri: program.scopes[scope].uri.clone().unwrap_or_default(),
            range: definition.range,
        })
    }

    /// Owner uri and arena handle of the definition under `position`; used by
    /// the cache manager to aggregate references across documents.
    pub fn definition_owner(&self, position: Position) -> Option<(String, SymbolId)> {
        let (program, id) = self.resolve_definition(position)?;
        Some((program.uri.clone().unwrap_or_default(), id))
    }

    /// Same-document references recorded on a definition symbol.
    pub fn references_of(&self, id: SymbolId) -> Vec<Location> {
        let uri = self.uri.clone().unwrap_or_default();
        self.arena[id]
            .references
            .iter()
            .map(|&range| Location {
                uri: uri.clone(),
                range,
            })
            .collect()
    }

    /// The declaration site of a definition symbol.
    pub fn declaration_location(&self, id: SymbolId) -> Location {
        Location {
            uri: self.uri.clone().unwrap_or_default(),
            range: self.arena[id].range,
        }
    }

    /// References to the symbol under `position` within this document's link
    /// view (its own occurrences only; workspace-wide aggregation is the
    /// cache manager's job).
    pub fn references_at(&self, position: Position, include_declaration: bool) -> Vec<Location> {
        let Some((program, id)) = self.resolve_definition(position) else {
            return Vec::new();
        };
        let mut locations = Vec::new();
        if include_declaration {
            locations.push(program.declaration_location(id));
        }
        locations.extend(program.references_of(id));
        locations
    }
}
