/// Declaration parsing: type specifications, declared names, initializers.
///
/// Top-level documents are a sequence of declarations. A function-typed
/// declaration's initializer re-enters the parameter scope built while
/// parsing the type, so the body can see the parameters.
impl ParserState {
    fn parse_definitions(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let mut definitions = Vec::new();
        while !self.at_end() {
            definitions.extend(self.definition()?);
        }
        Ok(definitions)
    }

    fn definition(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let t = self.token;
        let Some(rule) = self.arena[t].rules.decl else {
            self.skip_to_declaration()?;
            return Ok(Vec::new());
        };
        self.advance(None)?;
        self.reserve(t);
        match rule {
            DeclRule::Variable => self.declaration_denotation(t),
            DeclRule::Frame => self.frame_declaration(t),
        }
    }

    /// Parse the declared names of a definition whose type symbol is `t`,
    /// returning the initializer nodes.
    fn declaration_denotation(&mut self, t: SymbolId) -> Result<Vec<SymbolId>, FatalParseError> {
        self.type_denotation(t)?;
        let mut initializers = Vec::new();

        loop {
            let name = self.token;
            if self.arena[name].arity != Arity::Name {
                let range = self.arena[name].range;
                self.error(range, "Expected a new variable name.");
                return Ok(initializers);
            }
            self.define(name, t);
            self.expand_vector_definition(name);
            self.advance(None)?;

            if self.current_is("[") {
                if let Some(ty) = self.arena[name].ty {
                    self.arena[ty].array = true;
                }
                let open = self.token;
                self.advance(Some("["))?;
                self.expression(0)?;
                let close = self.token;
                if self.current_is("]") {
                    self.advance(Some("]"))?;
                } else {
                    self.skip_while(|symbol| symbol.name != "," && symbol.name != ";")?;
                }
                let range = Range::new(self.arena[open].range.start, self.arena[close].range.end);
                self.error(range, "Array definition not supported.");
            }

            if self.current_is("=") {
                self.mark_constant(name);
                let assign = self.token;
                self.advance(Some("="))?;
                self.arena[assign].first.push(name);

                let params = self.arena[t].params.clone();
                if let Some(ref param_list) = params {
                    match param_list.first().and_then(|&param| self.arena[param].scope) {
                        Some(parameter_scope) => self.push_scope(parameter_scope),
                        None => self.new_scope(),
                    }
                }

                // Modelgen frame functions carry a `[ frame, nextthink ]`
                // specifier before the body.
                if params.is_some() && self.current_is("[") {
                    self.advance(Some("["))?;
                    self.expression(0)?;
                    self.advance(Some(","))?;
                    self.expression(0)?;
                    self.advance(Some("]"))?;
                }

                let value = self.immediate()?;
                if params.is_some() {
                    self.pop_scope();
                }

                let symbol = &mut self.arena[assign];
                symbol.second = value;
                symbol.arity = Arity::Binary;
                initializers.push(assign);
            }

            if !self.current_is(",") {
                break;
            }
            self.advance(Some(","))?;
        }

        self.missing_semicolon()?;
        Ok(initializers)
    }

    /// Parse a function parameter list if the declaration is function-typed,
    /// defining parameter names in a temporary scope recorded on each
    /// parameter symbol.
    fn type_denotation(&mut self, t: SymbolId) -> Result<(), FatalParseError> {
        if self.arena[t].rules.decl == Some(DeclRule::Frame) {
            let range = self.arena[self.token].range;
            self.error(range, "$frame is not a valid type");
            return Ok(());
        }
        if !self.current_is("(") {
            return Ok(());
        }
        self.advance(Some("("))?;

        let mut params = Vec::new();
        if !self.current_is(")") {
            self.new_scope();
            loop {
                let parameter_type = self.token;
                let is_type = self.arena[parameter_type].arity == Arity::Type;
                if !is_type {
                    let range = self.arena[parameter_type].range;
                    self.error(range, "Expected a parameter type.");
                }
                self.advance(None)?;

                if is_type {
                    self.type_denotation(parameter_type)?;
                    let parameter_name = self.token;
                    if self.arena[parameter_name].arity != Arity::Name {
                        let range = self.arena[parameter_name].range;
                        self.error(range, "Expected a parameter name.");
                    }
                    self.advance(None)?;
                    self.define(parameter_name, parameter_type);
                    params.push(parameter_name);
                } else {
                    self.skip_to_type_parameter()?;
                }

                if !self.current_is(",") {
                    break;
                }
                self.advance(Some(","))?;
            }
            self.pop_scope();
        }
        self.advance(Some(")"))?;
        self.arena[t].params = Some(params);
        Ok(())
    }

    /// A declaration initializer: a literal, a negated literal, a builtin
    /// reference, or a `{ … }` statement body.
    fn immediate(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        let t = self.token;
        match self.arena[t].rules.imd {
            Some(ImdRule::Expression) => Ok(vec![self.expression(0)?]),
            Some(ImdRule::Block) => {
                self.advance(Some("{"))?;
                let statements = self.statements()?;
                self.advance(Some("}"))?;
                Ok(statements)
            }
            None => {
                let range = self.arena[t].range;
                self.error(range, "Bad immediate.");
                Ok(vec![t])
            }
        }
    }

    /// `$frame` declares a run of frame names, each optionally followed by a
    /// float value.
    fn frame_declaration(&mut self, t: SymbolId) -> Result<Vec<SymbolId>, FatalParseError> {
        loop {
            let name = self.token;
            if self.arena[name].arity != Arity::Name {
                break;
            }
            self.define(name, t);
            self.advance(None)?;

            let has_frame_value = {
                let current = &self.arena[self.token];
                current.arity == Arity::Literal
                    && current.ty.is_some_and(|ty| self.arena[ty].name == "float")
            };
            if has_frame_value {
                self.advance(None)?;
            }
        }
        Ok(Vec::new())
    }
}
