//! Lexical scopes for parsed QuakeC.
//!
//! Scopes form a chain: block scopes parent to their lexically enclosing
//! scope, and a document's file scope continues (through the owning program)
//! into the previous document in link order. Scopes and the symbols they hold
//! live in per-program arenas addressed by handles, so a rebuilt program
//! drops the whole chain segment it owns.

use std::collections::HashMap;

use crate::ast::SymbolId;

/// Handle into a [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One lexical environment.
#[derive(Debug, Default)]
pub struct Scope {
    /// Source document this scope belongs to, inherited by child scopes.
    pub uri: Option<String>,
    pub defs: HashMap<String, SymbolId>,
    pub parent: Option<ScopeId>,
}

/// Arena owning every scope created during one parse.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, uri: Option<String>, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            uri,
            defs: HashMap::new(),
            parent,
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Look a name up in one scope only.
    pub fn lookup_here(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.get(scope).defs.get(name).copied()
    }

    /// Walk the scope chain from `scope` to the root looking for `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&symbol) = self.get(id).defs.get(name) {
                return Some(symbol);
            }
            current = self.get(id).parent;
        }
        None
    }
}

impl std::ops::Index<ScopeId> for ScopeArena {
    type Output = Scope;

    fn index(&self, id: ScopeId) -> &Scope {
        self.get(id)
    }
}

impl std::ops::IndexMut<ScopeId> for ScopeArena {
    fn index_mut(&mut self, id: ScopeId) -> &mut Scope {
        self.get_mut(id)
    }
}
