/// Parse one QuakeC document into a [`Program`].
///
/// This is the main public entrypoint for parsing. It never fails: all
/// diagnostics accumulate on the returned program, and if the parser hits an
/// unrecoverable internal failure, the partial program built so far is
/// returned with one fatal diagnostic at the last known token position.
#[tracing::instrument(skip_all, fields(
    uri = info.uri.as_deref().unwrap_or("<memory>"),
    source_len = info.source.len(),
    dialect = %info.dialect,
))]
pub fn parse(info: ParseInfo<'_>) -> Program {
    let dialect = info.dialect;
    let mut state = ParserState::new(info);

    let ast = match state.run() {
        Ok(ast) => ast,
        Err(fatal) => {
            let range = state.arena[state.token].range;
            state.diagnostics.push(Diagnostic::fatal(
                format!("[{}] fatal error: {}", dialect, fatal),
                range,
            ));
            Vec::new()
        }
    };

    let ParserState {
        uri,
        arena,
        scopes,
        file_scope,
        parent,
        occurrences,
        diagnostics,
        foreign_refs,
        ..
    } = state;

    Program::new(
        uri,
        ast,
        arena,
        scopes,
        file_scope,
        parent,
        occurrences,
        diagnostics,
        foreign_refs,
    )
}

impl ParserState {
    fn run(&mut self) -> Result<Vec<SymbolId>, FatalParseError> {
        self.advance(None)?;
        self.parse_definitions()
    }
}
