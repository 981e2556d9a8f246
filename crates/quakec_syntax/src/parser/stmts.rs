/// Statement parsing.
///
/// Dispatches on the current token's statement behavior; anything else is an
/// expression statement, which must be an assignment or a call. Statements
/// that produce no node (blocks flatten, `$frame` misuse) return an empty
/// list.
impl ParserState {
    fn statement(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let t = self.token;
        if let Some(rule) = self.arena[t].rules.std {
            self.advance(None)?;
            self.reserve(t);
            return self.statement_denotation(t, rule);
        }

        let expression = self.expression(0)?;
        {
            let symbol = &self.arena[expression];
            if !symbol.assignment && symbol.name != "(" {
                let range = symbol.range;
                self.error(range, "Bad expression statement.");
            }
        }
        self.missing_semicolon()?;
        Ok(vec![expression])
    }

    /// Parse statements until `}` or end of input.
    fn statements(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let mut parsed = Vec::new();
        loop {
            if self.current_is("}") || self.at_end() {
                break;
            }
            parsed.extend(self.statement()?);
        }
        Ok(parsed)
    }

    /// Parse a `{ … }` block; the current token must be `{`.
    fn block(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let brace = self.token;
        self.advance(Some("{"))?;
        self.statement_denotation(brace, StdRule::Block)
    }

    fn statement_denotation(&mut self, t: SymbolId, rule: StdRule) -> Result<Vec<SymbolId>, FatalParseError> {
        match rule {
            StdRule::Block => {
                self.new_scope();
                let statements = self.statements()?;
                self.advance(Some("}"))?;
                self.pop_scope();
                Ok(statements)
            }

            StdRule::If => {
                self.advance(Some("("))?;
                let test = self.expression(0)?;
                self.advance(Some(")"))?;
                let body = self.statement()?;
                {
                    let symbol = &mut self.arena[t];
                    symbol.test.push(test);
                    symbol.body = body;
                }
                if self.current_is("else") {
                    let else_token = self.token;
                    self.reserve(else_token);
                    self.advance(Some("else"))?;
                    let alt = self.statement()?;
                    self.arena[t].alt = alt;
                }
                self.arena[t].arity = Arity::Statement;
                Ok(vec![t])
            }

            StdRule::While => {
                self.advance(Some("("))?;
                let test = self.expression(0)?;
                self.advance(Some(")"))?;
                let body = if self.current_is("{") {
                    self.block()?
                } else {
                    self.statement()?
                };
                let symbol = &mut self.arena[t];
                symbol.first.push(test);
                symbol.second = body;
                symbol.arity = Arity::Statement;
                Ok(vec![t])
            }

            StdRule::DoWhile => {
                let body = if self.current_is("{") {
                    self.block()?
                } else {
                    self.statement()?
                };
                self.advance(Some("while"))?;
                self.advance(Some("("))?;
                let test = self.expression(0)?;
                {
                    let symbol = &mut self.arena[t];
                    symbol.first = body;
                    symbol.second.push(test);
                    symbol.arity = Arity::Statement;
                }
                self.advance(Some(")"))?;
                self.missing_semicolon()?;
                Ok(vec![t])
            }

            StdRule::Return => {
                if !self.current_is(";") {
                    let value = self.expression(0)?;
                    self.arena[t].first.push(value);
                }
                self.missing_semicolon()?;
                self.arena[t].arity = Arity::Statement;
                Ok(vec![t])
            }

            StdRule::Local => {
                if self.arena[self.token].rules.std.is_some() {
                    let inner = self.statement()?;
                    self.arena[t].first = inner;
                }
                self.arena[t].arity = Arity::Statement;
                Ok(vec![t])
            }

            StdRule::Declaration => self.declaration_statement(t),

            StdRule::InvalidFrame => {
                let range = self.arena[self.token].range;
                self.error(range, "$frame is not a valid statement.");
                Ok(Vec::new())
            }
        }
    }

    /// Bare declaration statement: `float x, y = 1;` inside a body.
    /// Initializers here are plain expressions, not immediates.
    fn declaration_statement(&mut self, t: SymbolId) -> Result<Vec<SymbolId>, FatalParseError> {
        self.type_denotation(t)?;
        let mut assignments = Vec::new();

        loop {
            let name = self.token;
            if self.arena[name].arity != Arity::Name {
                let range = self.arena[name].range;
                self.error(range, "Expected a new variable name.");
            }
            self.define(name, t);
            self.expand_vector_definition(name);
            self.advance(None)?;

            if self.current_is("=") {
                let assign = self.token;
                self.advance(Some("="))?;
                let value = self.expression(0)?;
                let symbol = &mut self.arena[assign];
                symbol.first.push(name);
                symbol.second.push(value);
                symbol.arity = Arity::Binary;
                assignments.push(assign);
            }

            if !self.current_is(",") {
                break;
            }
            self.advance(Some(","))?;
        }

        self.missing_semicolon()?;
        Ok(assignments)
    }
}
