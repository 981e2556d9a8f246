/// Parser state, token instantiation, and scope operations.
///
/// This chunk defines [`ParseInfo`] and the `ParserState` threaded through
/// every parse function: one instance per parse invocation, never shared.
///
/// ## Notes
/// - `advance` turns lexer tokens into arena symbols by copying behavior from
///   exactly one grammar template (or a resolved definition) and then
///   specializing the copy; templates are never written back.

/// Inputs for a single parse invocation.
pub struct ParseInfo<'a> {
    pub source: &'a str,
    /// Identity recorded on the file scope and query results.
    pub uri: Option<String>,
    /// Previous document in link order; its top-level scope is visible here.
    pub parent: Option<Arc<Program>>,
    pub dialect: Dialect,
}

impl<'a> ParseInfo<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            uri: None,
            parent: None,
            dialect: Dialect::default(),
        }
    }
}

/// Expression nesting bound; beyond this the parse aborts as fatal.
const MAX_EXPRESSION_DEPTH: usize = 256;

struct ParserState {
    lexer: Lexer,
    grammar: DialectTable<'static>,
    dialect: Dialect,
    uri: Option<String>,
    parent: Option<Arc<Program>>,
    arena: SymbolArena,
    scopes: ScopeArena,
    scope: ScopeId,
    file_scope: ScopeId,
    token: SymbolId,
    occurrences: Vec<SymbolId>,
    diagnostics: Vec<Diagnostic>,
    foreign_refs: Vec<ForeignRef>,
    depth: usize,
    steps: usize,
    budget: usize,
}

impl ParserState {
    fn new(info: ParseInfo<'_>) -> Self {
        // Every advance consumes input or recovers; the budget only trips on
        // an internal loop that stopped making progress.
        let budget = info.source.len() * 4 + 4096;
        let mut arena = SymbolArena::new();
        let sentinel = arena.alloc(Symbol::new(
            "(start)",
            Arity::Statement,
            RuleSet::default(),
            Range::default(),
        ));
        let mut scopes = ScopeArena::new();
        let file_scope = scopes.alloc(info.uri.clone(), None);

        Self {
            lexer: Lexer::new(info.source),
            grammar: DialectTable::new(grammar::base(), info.dialect),
            dialect: info.dialect,
            uri: info.uri,
            parent: info.parent,
            arena,
            scopes,
            scope: file_scope,
            file_scope,
            token: sentinel,
            occurrences: Vec::new(),
            diagnostics: Vec::new(),
            foreign_refs: Vec::new(),
            depth: 0,
            steps: 0,
            budget,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn report(&mut self, severity: Severity, range: Range, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(
            format!("[{}] {}", self.dialect, message.into()),
            severity,
            range,
        ));
    }

    fn error(&mut self, range: Range, message: impl Into<String>) {
        self.report(Severity::Error, range, message);
    }

    fn warn(&mut self, range: Range, message: impl Into<String>) {
        self.report(Severity::Warning, range, message);
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn current_is(&self, id: &str) -> bool {
        self.arena[self.token].name == id
    }

    fn at_end(&self) -> bool {
        self.current_is("(end)")
    }

    /// Consume the current token and instantiate the next one.
    ///
    /// With `expected` set, a mismatch against the current token's identity
    /// is reported before moving on.
    fn advance(&mut self, expected: Option<&str>) -> Result<SymbolId, FatalParseError> {
        self.steps += 1;
        if self.steps > self.budget {
            return Err(FatalParseError::BudgetExhausted(self.budget));
        }

        if let Some(id) = expected {
            if !self.current_is(id) {
                let actual = self.arena[self.token].name.clone();
                let range = self.arena[self.token].range;
                self.error(range, format!("Expected: '{}' Actual: '{}'", id, actual));
            }
        }

        let token = loop {
            match self.lexer.next_token() {
                None => {
                    let position = self.lexer.position();
                    let rules = self.grammar.get("(end)").map(|t| t.rules).unwrap_or_default();
                    let end = Symbol::new(
                        "(end)",
                        Arity::Statement,
                        rules,
                        Range::new(position, position),
                    );
                    let id = self.arena.alloc(end);
                    self.occurrences.push(id);
                    self.token = id;
                    return Ok(id);
                }
                Some(t) if t.kind == TokenKind::Unknown => {
                    self.error(t.range, format!("Unexpected token: '{}'", t.text));
                }
                Some(t) => break t,
            }
        };

        let id = self.instantiate(token);
        self.occurrences.push(id);
        self.token = id;
        Ok(id)
    }

    // ========================================================================
    // Token instantiation
    // ========================================================================

    fn instantiate(&mut self, token: Token) -> SymbolId {
        match token.kind {
            TokenKind::Name => self.instantiate_name(token),
            TokenKind::Type => self.instantiate_type(token),
            TokenKind::Operator => self.instantiate_operator(token),
            TokenKind::Float | TokenKind::String | TokenKind::Vector | TokenKind::Builtin => {
                self.instantiate_literal(token)
            }
            // Trivia and unknown tokens are filtered before instantiation.
            _ => self.instantiate_name(token),
        }
    }

    /// Names resolve through the scope chain, then earlier documents in link
    /// order, then grammar keywords, then an undefined-name placeholder.
    /// Resolution never fails; each resolved occurrence is recorded on its
    /// definition for find-references.
    fn instantiate_name(&mut self, token: Token) -> SymbolId {
        let (rules, lbp) = if let Some(definition) = self.scopes.lookup(self.scope, &token.text) {
            self.arena[definition].references.push(token.range);
            (self.arena[definition].rules, self.arena[definition].lbp)
        } else if let Some((def_uri, def_symbol, rules, lbp)) = self.lookup_upstream(&token.text) {
            self.foreign_refs.push(ForeignRef {
                def_uri,
                def_symbol,
                range: token.range,
            });
            (rules, lbp)
        } else if let Some(template) = self.grammar.get(&token.text) {
            (template.rules, template.lbp)
        } else {
            let placeholder = self.grammar.get("(name)").copied().unwrap_or_default();
            (placeholder.rules, placeholder.lbp)
        };

        let mut symbol = Symbol::new(token.text, Arity::Name, rules, token.range);
        symbol.lbp = lbp;
        symbol.scope = Some(self.scope);
        self.arena.alloc(symbol)
    }

    fn lookup_upstream(&self, name: &str) -> Option<(String, SymbolId, RuleSet, u32)> {
        let mut parent = self.parent.as_deref();
        while let Some(program) = parent {
            if let Some(id) = program.scopes.lookup_here(program.file_scope, name) {
                let definition = &program.arena[id];
                return Some((
                    program.uri.clone().unwrap_or_default(),
                    id,
                    definition.rules,
                    definition.lbp,
                ));
            }
            parent = program.parent.as_deref();
        }
        None
    }

    fn instantiate_type(&mut self, token: Token) -> SymbolId {
        let template = self.grammar.get(&token.text).copied().unwrap_or_default();
        let mut symbol = Symbol::new(token.text, Arity::Type, template.rules, token.range);
        symbol.lbp = template.lbp;
        self.arena.alloc(symbol)
    }

    fn instantiate_operator(&mut self, token: Token) -> SymbolId {
        let template = match self.grammar.get(&token.text) {
            Some(template) => *template,
            None => {
                self.error(token.range, "Unknown operator.");
                RuleTemplate::default()
            }
        };
        let mut symbol = Symbol::new(token.text, Arity::Operator, template.rules, token.range);
        symbol.lbp = template.lbp;
        self.arena.alloc(symbol)
    }

    fn instantiate_literal(&mut self, token: Token) -> SymbolId {
        let type_name = match token.kind {
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Vector => "vector",
            TokenKind::Builtin => "builtin",
            _ => "literal",
        };
        let template = self.grammar.get("(literal)").copied().unwrap_or_default();
        let ty = self
            .arena
            .alloc(Symbol::new(type_name, Arity::Type, RuleSet::default(), token.range));
        let mut symbol = Symbol::new(token.text, Arity::Literal, template.rules, token.range);
        symbol.lbp = template.lbp;
        symbol.ty = Some(ty);
        self.arena.alloc(symbol)
    }

    // ========================================================================
    // Scope operations
    // ========================================================================

    fn new_scope(&mut self) {
        let uri = self.scopes[self.scope].uri.clone();
        self.scope = self.scopes.alloc(uri, Some(self.scope));
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.scope].parent {
            self.scope = parent;
        }
    }

    /// Re-enter a previously created scope (a function's parameter scope).
    fn push_scope(&mut self, scope: ScopeId) {
        self.scope = scope;
    }

    /// Install `name` into the current scope with the given declared type and
    /// reset its behavior to a plain name reference.
    ///
    /// Re-declaring warns and keeps the first definition, unless the previous
    /// entry was a parameterless forward declaration being completed by a
    /// function definition. Colliding with a reserved word is an error.
    fn define(&mut self, name: SymbolId, ty: SymbolId) -> SymbolId {
        let key = self.arena[name].name.clone();
        let new_is_function = self.arena[ty].params.is_some();
        let mut keep_previous = false;

        if let Some(previous) = self.scopes.lookup_here(self.scope, &key) {
            let prev = &self.arena[previous];
            if prev.constant || !new_is_function {
                let range = self.arena[name].range;
                if prev.reserved {
                    self.error(range, format!("Already reserved: '{}'.", key));
                } else {
                    self.warn(range, format!("Already defined: '{}'.", key));
                    keep_previous = true;
                }
            }
        }

        if !keep_previous {
            self.scopes[self.scope].defs.insert(key, name);
        }

        let ty_clone = self.clone_type(ty);
        let symbol = &mut self.arena[name];
        symbol.reserved = false;
        symbol.rules = RuleSet::name_reference();
        symbol.lbp = 0;
        symbol.scope = Some(self.scope);
        symbol.ty = Some(ty_clone);
        name
    }

    /// Per-declaration copy of a type symbol, so flags like `array` stay
    /// local to one declared name.
    fn clone_type(&mut self, ty: SymbolId) -> SymbolId {
        let source = &self.arena[ty];
        let mut clone = Symbol::new(source.name.clone(), source.arity, source.rules, source.range);
        clone.lbp = source.lbp;
        clone.params = source.params.clone();
        clone.array = source.array;
        clone.scope = source.scope;
        self.arena.alloc(clone)
    }

    /// Mark a name token as a reserved word in the current scope. Idempotent;
    /// ignored for non-names.
    fn reserve(&mut self, id: SymbolId) {
        if self.arena[id].arity != Arity::Name || self.arena[id].reserved {
            return;
        }
        let key = self.arena[id].name.clone();
        if let Some(existing) = self.scopes.lookup_here(self.scope, &key) {
            if self.arena[existing].reserved {
                return;
            }
            if self.arena[existing].arity == Arity::Name {
                let range = self.arena[id].range;
                self.error(range, "Already defined.");
            }
        }
        self.scopes[self.scope].defs.insert(key, id);
        self.arena[id].reserved = true;
    }

    /// Initialized declarations freeze their name against silent
    /// redefinition.
    fn mark_constant(&mut self, name: SymbolId) {
        if self.arena[name].arity != Arity::Name {
            return;
        }
        let key = self.arena[name].name.clone();
        if let Some(definition) = self.scopes.lookup(self.scope, &key) {
            self.arena[definition].constant = true;
        }
    }

    /// A plain vector declaration also defines `_x`/`_y`/`_z` float
    /// components in the same scope. Function types returning vector get no
    /// components.
    fn expand_vector_definition(&mut self, name: SymbolId) {
        let Some(ty) = self.arena[name].ty else { return };
        if self.arena[ty].params.is_some() {
            return;
        }
        let component_type = match self.arena[ty].name.as_str() {
            "vector" => "float",
            ".vector" => ".float",
            _ => return,
        };

        let type_range = self.arena[ty].range;
        let base = self.arena[name].name.clone();
        let name_range = self.arena[name].range;

        for suffix in ["_x", "_y", "_z"] {
            let component_ty = self.arena.alloc(Symbol::new(
                component_type,
                Arity::Type,
                RuleSet::default(),
                type_range,
            ));
            let mut component = Symbol::new(
                format!("{base}{suffix}"),
                Arity::Name,
                RuleSet::name_reference(),
                name_range,
            );
            component.scope = Some(self.scope);
            let component_id = self.arena.alloc(component);
            self.define(component_id, component_ty);
        }
    }
}
