/// Error strategies and recovery.
///
/// Known conditions (a missing semicolon) get a targeted diagnostic and the
/// parse continues in place. Unknown conditions emit one "unexpected token"
/// error and discard tokens until a synchronization predicate holds, which
/// guarantees forward progress.
impl ParserState {
    /// Expect the statement terminator. When it is missing, the warning
    /// attaches to the previously emitted token, where the semicolon should
    /// have been.
    fn missing_semicolon(&mut self) -> Result<(), FatalParseError> {
        if self.current_is(";") {
            self.advance(Some(";"))?;
        } else if self.occurrences.len() >= 2 {
            let previous = self.occurrences[self.occurrences.len() - 2];
            let range = self.arena[previous].range;
            self.warn(range, "Missing semicolon.");
        }
        Ok(())
    }

    /// Discard tokens until one can start a declaration.
    fn skip_to_declaration(&mut self) -> Result<(), FatalParseError> {
        self.skip_while(|symbol| symbol.rules.decl.is_none())
    }

    /// Discard tokens until a parameter boundary (`,` or `)`).
    fn skip_to_type_parameter(&mut self) -> Result<(), FatalParseError> {
        self.skip_while(|symbol| symbol.name != "," && symbol.name != ")")
    }

    /// Report the current token as unexpected, then discard tokens while the
    /// predicate holds. Always stops at end of input.
    fn skip_while(&mut self, condition: impl Fn(&Symbol) -> bool) -> Result<(), FatalParseError> {
        let unexpected = self.arena[self.token].name.clone();
        let range = self.arena[self.token].range;
        self.error(range, format!("Unexpected token: '{}'", unexpected));

        while condition(&self.arena[self.token]) && !self.at_end() {
            self.advance(None)?;
        }
        Ok(())
    }
}
