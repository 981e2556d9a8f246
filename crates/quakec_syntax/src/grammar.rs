//! Data-driven grammar table for the QuakeC parser.
//!
//! Each token identity maps to a [`RuleTemplate`]: a left binding power plus
//! a [`RuleSet`] of small behavior enums. The parser dispatches on these with
//! `match`; templates hold no code. Instantiating a token copies the template
//! fields into a fresh symbol, so templates stay immutable for the life of
//! the process.
//!
//! The base table is built once. Each parse overlays it with a
//! [`DialectTable`] so dialect-specific rules (and any per-parse additions)
//! never leak into the shared registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Null-denotation behavior: how a token parses with nothing to its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudRule {
    /// Literals and resolved names produce themselves.
    Itself,
    /// Unary prefix operator.
    Prefix,
    /// Parenthesized grouping: parse an inner expression, expect `)`.
    Group,
}

/// Left-denotation behavior: how a token combines with a left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedRule {
    Infix { power: u32, right_assoc: bool },
    /// Infix `-` with the qcc ambiguity check: a numeric literal touching
    /// the operator on the same line is an error.
    SubtractChecked,
    /// Right-associative `=` with lvalue-shape checking.
    Assign,
    /// Member access; the right side must be a name.
    Member,
    /// Function call or field invocation.
    Call,
    /// Index syntax: parsed, then always diagnosed as unsupported.
    Index,
}

/// Statement-denotation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdRule {
    Block,
    If,
    While,
    DoWhile,
    Return,
    Local,
    /// Bare declaration statement (`float x;` inside a body).
    Declaration,
    /// `$frame` used where a statement is expected.
    InvalidFrame,
}

/// Declaration-denotation behavior for top-level definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRule {
    /// Typed variable/function declarations, with parameter-list types and
    /// initializers.
    Variable,
    /// `$frame` declarations: a run of frame names.
    Frame,
}

/// Immediate behavior: valid right-hand sides of a declaration initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImdRule {
    Expression,
    Block,
}

/// The full behavior bundle copied from template to instantiated symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub nud: Option<NudRule>,
    pub led: Option<LedRule>,
    pub std: Option<StdRule>,
    pub decl: Option<DeclRule>,
    pub imd: Option<ImdRule>,
}

impl RuleSet {
    /// Behavior of a defined name: resolves to itself, nothing else.
    pub fn name_reference() -> Self {
        Self {
            nud: Some(NudRule::Itself),
            ..Self::default()
        }
    }
}

/// One grammar entry: binding power plus behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTemplate {
    pub lbp: u32,
    pub rules: RuleSet,
}

/// Registry mapping token identities to parse behavior.
#[derive(Debug, Default)]
pub struct GrammarTable {
    symbols: HashMap<String, RuleTemplate>,
}

impl GrammarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&RuleTemplate> {
        self.symbols.get(id)
    }

    /// Register a symbol. Registering the same id twice raises its binding
    /// power to the larger of the two requests without duplicating the entry.
    pub fn symbol(&mut self, id: &str, lbp: u32) -> &mut RuleTemplate {
        let entry = self.symbols.entry(id.to_string()).or_default();
        if lbp > entry.lbp {
            entry.lbp = lbp;
        }
        entry
    }

    pub fn infix(&mut self, id: &str, power: u32) {
        self.symbol(id, power).rules.led = Some(LedRule::Infix {
            power,
            right_assoc: false,
        });
    }

    pub fn infix_right(&mut self, id: &str, power: u32) {
        self.symbol(id, power).rules.led = Some(LedRule::Infix {
            power,
            right_assoc: true,
        });
    }

    pub fn prefix(&mut self, id: &str) {
        self.symbol(id, 0).rules.nud = Some(NudRule::Prefix);
    }

    pub fn assignment(&mut self, id: &str) {
        self.symbol(id, 10).rules.led = Some(LedRule::Assign);
    }

    pub fn statement(&mut self, id: &str, rule: StdRule) {
        self.symbol(id, 0).rules.std = Some(rule);
    }

    pub fn immediate(&mut self, id: &str, rule: ImdRule) {
        self.symbol(id, 0).rules.imd = Some(rule);
    }

    /// Register a type keyword. Declarations double as statements (for local
    /// declarations) and as type specifications.
    pub fn declaration(&mut self, id: &str) {
        let entry = self.symbol(id, 0);
        entry.rules.std = Some(StdRule::Declaration);
        entry.rules.decl = Some(DeclRule::Variable);
    }
}

/// Grammar dialect selecting per-compiler behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// The original id Software compiler: whitespace-sensitive `-`.
    #[default]
    Qcc,
    /// FTEQCC-flavored grammar: no `-` spacing rule.
    Fteqcc,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Qcc => "qcc",
            Dialect::Fteqcc => "fteqcc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "qcc" => Some(Dialect::Qcc),
            "fteqcc" => Some(Dialect::Fteqcc),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-parse shadow layer over the base grammar.
///
/// Lookups consult the overlay first, then the shared base; writes only ever
/// touch the overlay.
pub struct DialectTable<'a> {
    base: &'a GrammarTable,
    overlay: HashMap<String, RuleTemplate>,
}

impl<'a> DialectTable<'a> {
    pub fn new(base: &'a GrammarTable, dialect: Dialect) -> Self {
        let mut table = Self {
            base,
            overlay: HashMap::new(),
        };
        // The `-` infix rule is the observable dialect difference: qcc
        // rejects `1-1` style subtraction against a touching literal.
        let led = match dialect {
            Dialect::Qcc => LedRule::SubtractChecked,
            Dialect::Fteqcc => LedRule::Infix {
                power: 50,
                right_assoc: false,
            },
        };
        table.override_symbol("-", 50, |entry| entry.rules.led = Some(led));
        table
    }

    pub fn get(&self, id: &str) -> Option<&RuleTemplate> {
        self.overlay.get(id).or_else(|| self.base.get(id))
    }

    /// Shadow one symbol, starting from its base entry if present.
    pub fn override_symbol(&mut self, id: &str, lbp: u32, build: impl FnOnce(&mut RuleTemplate)) {
        let mut entry = self
            .overlay
            .get(id)
            .or_else(|| self.base.get(id))
            .copied()
            .unwrap_or_default();
        if lbp > entry.lbp {
            entry.lbp = lbp;
        }
        build(&mut entry);
        self.overlay.insert(id.to_string(), entry);
    }
}

/// The shared base grammar, built once on first use.
pub fn base() -> &'static GrammarTable {
    static TABLE: OnceLock<GrammarTable> = OnceLock::new();
    TABLE.get_or_init(build_base_table)
}

fn build_base_table() -> GrammarTable {
    let mut table = GrammarTable::new();

    // Plain delimiters
    for id in [";", ",", ")", "}", "]", "else", "(end)"] {
        table.symbol(id, 0);
    }

    table.infix("+", 50);
    table.infix("*", 60);
    table.infix("/", 60);
    table.infix("==", 40);
    table.infix("!=", 40);
    table.infix("<", 40);
    table.infix("<=", 40);
    table.infix(">", 40);
    table.infix(">=", 40);

    table.symbol(".", 80).rules.led = Some(LedRule::Member);
    table.symbol("[", 80).rules.led = Some(LedRule::Index);

    table.infix_right("&", 40);
    table.infix_right("|", 40);
    table.infix_right("&&", 30);
    table.infix_right("||", 30);

    table.prefix("!");
    table.prefix("-");

    {
        let paren = table.symbol("(", 80);
        paren.rules.nud = Some(NudRule::Group);
        paren.rules.led = Some(LedRule::Call);
    }

    table.assignment("=");

    {
        let literal = table.symbol("(literal)", 0);
        literal.rules.nud = Some(NudRule::Itself);
        literal.rules.imd = Some(ImdRule::Expression);
    }
    table.symbol("(name)", 0).rules.nud = Some(NudRule::Itself);

    table.statement("{", StdRule::Block);
    table.immediate("{", ImdRule::Block);
    table.immediate("-", ImdRule::Expression);

    table.statement("while", StdRule::While);
    table.statement("do", StdRule::DoWhile);
    table.statement("if", StdRule::If);
    table.statement("return", StdRule::Return);
    table.statement("local", StdRule::Local);

    for id in [
        "void", "float", "vector", "string", "entity", ".void", ".float", ".vector", ".string", ".entity",
    ] {
        table.declaration(id);
    }

    {
        let frame = table.symbol("$frame", 0);
        frame.rules.std = Some(StdRule::InvalidFrame);
        frame.rules.decl = Some(DeclRule::Frame);
    }

    table
}
