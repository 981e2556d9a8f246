/// Expression parsing.
///
/// Precedence climbing: consume one token, run its null denotation to get a
/// left operand, then fold in infix operators while their binding power
/// exceeds the caller's threshold. Right-associative operators recurse with
/// `power - 1`.
impl ParserState {
    fn expression(&mut self, rbp: u32) -> Result<SymbolId, FatalParseError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(FatalParseError::DepthExceeded(MAX_EXPRESSION_DEPTH));
        }
        let result = self.expression_inner(rbp);
        self.depth -= 1;
        result
    }

    fn expression_inner(&mut self, rbp: u32) -> Result<SymbolId, FatalParseError> {
        let mut t = self.token;
        self.advance(None)?;
        let mut left = self.null_denotation(t)?;

        while rbp < self.arena[self.token].lbp {
            t = self.token;
            self.advance(None)?;
            left = self.left_denotation(t, left)?;
        }

        Ok(left)
    }

    fn null_denotation(&mut self, t: SymbolId) -> Result<SymbolId, FatalParseError> {
        match self.arena[t].rules.nud {
            Some(NudRule::Itself) => Ok(t),
            Some(NudRule::Prefix) => {
                self.reserve(t);
                let operand = self.expression(70)?;
                let symbol = &mut self.arena[t];
                symbol.first.push(operand);
                symbol.arity = Arity::Unary;
                Ok(t)
            }
            Some(NudRule::Group) => {
                let inner = self.expression(0)?;
                self.advance(Some(")"))?;
                Ok(inner)
            }
            None => {
                let range = self.arena[t].range;
                self.error(range, "Undefined.");
                Ok(t)
            }
        }
    }

    fn left_denotation(&mut self, t: SymbolId, left: SymbolId) -> Result<SymbolId, FatalParseError> {
        match self.arena[t].rules.led {
            Some(LedRule::Infix { power, right_assoc }) => {
                let rbp = if right_assoc { power.saturating_sub(1) } else { power };
                let second = self.expression(rbp)?;
                let symbol = &mut self.arena[t];
                symbol.first.push(left);
                symbol.second.push(second);
                symbol.arity = Arity::Binary;
                Ok(t)
            }
            Some(LedRule::SubtractChecked) => {
                let second = self.expression(50)?;
                {
                    let symbol = &mut self.arena[t];
                    symbol.first.push(left);
                    symbol.second.push(second);
                    symbol.arity = Arity::Binary;
                }
                // `1-1` is ambiguous between subtraction and a negative
                // literal under qcc; require whitespace before the operand.
                if self.arena[second].arity == Arity::Literal {
                    let operator_end = self.arena[t].range.end;
                    let operand_start = self.arena[second].range.start;
                    if operator_end.line == operand_start.line
                        && operator_end.character == operand_start.character
                    {
                        let range = self.arena[t].range;
                        self.error(range, "Missing whitespace for '-' operator.");
                    }
                }
                Ok(t)
            }
            Some(LedRule::Assign) => {
                {
                    let target = &self.arena[left];
                    if target.name != "." && target.arity != Arity::Name && target.name != "[" {
                        let range = target.range;
                        self.error(range, "Bad lvalue.");
                    }
                }
                let second = self.expression(9)?;
                let symbol = &mut self.arena[t];
                symbol.first.push(left);
                symbol.second.push(second);
                symbol.assignment = true;
                symbol.arity = Arity::Binary;
                Ok(t)
            }
            Some(LedRule::Member) => {
                let property = self.token;
                if self.arena[property].arity != Arity::Name {
                    let range = self.arena[property].range;
                    self.error(range, "Expected a property name.");
                }
                // Field access: the property is data, not a resolvable name.
                self.arena[property].arity = Arity::Literal;
                let symbol = &mut self.arena[t];
                symbol.first.push(left);
                symbol.second.push(property);
                symbol.arity = Arity::Binary;
                self.advance(None)?;
                Ok(t)
            }
            Some(LedRule::Call) => self.call_expression(t, left),
            Some(LedRule::Index) => {
                let index = self.expression(0)?;
                {
                    let symbol = &mut self.arena[t];
                    symbol.first.push(left);
                    symbol.second.push(index);
                    symbol.arity = Arity::Binary;
                }
                let closing = self.token;
                self.advance(Some("]"))?;
                let range = Range::new(self.arena[t].range.start, self.arena[closing].range.end);
                self.error(range, "Bracket operator not supported.");
                Ok(t)
            }
            None => {
                let range = self.arena[t].range;
                self.error(range, "Missing operator.");
                Ok(t)
            }
        }
    }

    /// `(` as an infix operator: a function call, or a field invocation when
    /// the left side is a member access.
    fn call_expression(&mut self, t: SymbolId, left: SymbolId) -> Result<SymbolId, FatalParseError> {
        let is_field_invocation = self.arena[left].name == ".";

        if is_field_invocation {
            let (object, property) = {
                let member = &self.arena[left];
                (member.first.clone(), member.second.clone())
            };
            let symbol = &mut self.arena[t];
            symbol.arity = Arity::Ternary;
            symbol.first = object;
            symbol.second = property;
        } else {
            self.arena[t].first.push(left);
            self.arena[t].arity = Arity::Binary;
            let callee = &self.arena[left];
            if callee.arity != Arity::Unary
                && callee.arity != Arity::Name
                && callee.name != "("
                && callee.name != "&&"
                && callee.name != "||"
            {
                let range = callee.range;
                self.error(range, "Expected a variable name.");
            }
        }

        let mut arguments = Vec::new();
        if !self.current_is(")") {
            loop {
                arguments.push(self.expression(0)?);
                if !self.current_is(",") {
                    break;
                }
                self.advance(Some(","))?;
            }
        }
        self.advance(Some(")"))?;

        let symbol = &mut self.arena[t];
        if is_field_invocation {
            symbol.third = arguments;
        } else {
            symbol.second = arguments;
        }
        Ok(t)
    }
}
