use super::span::Span;
use serde::Serialize;

/// Words the lexer reserves. Only identifiers made purely of letters are
/// ever looked up here, so `int_1` or `var2` stay ordinary identifiers.
pub const KEYWORDS: &[&str] = &[
    "ann",
    "annotation",
    "any",
    "array",
    "bool",
    "constraint",
    "default",
    "diff",
    "div",
    "else",
    "elseif",
    "endif",
    "enum",
    "false",
    "float",
    "function",
    "if",
    "in",
    "include",
    "int",
    "intersect",
    "let",
    "list",
    "maximize",
    "minimize",
    "mod",
    "not",
    "of",
    "opt",
    "output",
    "par",
    "predicate",
    "record",
    "satisfy",
    "set",
    "solve",
    "string",
    "subset",
    "superset",
    "symdiff",
    "test",
    "then",
    "true",
    "tuple",
    "type",
    "union",
    "var",
    "where",
    "xor",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// A parsed source unit: a model file, a data file or an in-memory string.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum Item {
    Include(Include),
    Declare(Declare),
    Assign(Assign),
    Constraint(Constraint),
    Solve(Solve),
    Output(Output),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Include(i) => i.span,
            Item::Declare(d) => d.span,
            Item::Assign(a) => a.span,
            Item::Constraint(c) => c.span,
            Item::Solve(s) => s.span,
            Item::Output(o) => o.span,
        }
    }

    /// The name an item binds in a model namespace, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Item::Declare(d) => Some(&d.name.text),
            Item::Assign(a) => Some(&a.name.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Include {
    pub path: StrLit,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    Parameter,
    Variable,
    Function,
    Predicate,
    Test,
    Annotation,
    Enum,
    TypeAlias,
}

impl DeclKind {
    /// Function-like declarations may be overloaded by name.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            DeclKind::Function | DeclKind::Predicate | DeclKind::Test | DeclKind::Annotation
        )
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            DeclKind::Function => Some("function"),
            DeclKind::Predicate => Some("predicate"),
            DeclKind::Test => Some("test"),
            DeclKind::Annotation => Some("annotation"),
            DeclKind::Enum => Some("enum"),
            DeclKind::TypeAlias => Some("type"),
            DeclKind::Parameter | DeclKind::Variable => None,
        }
    }
}

/// Any declaration: variables and parameters, function-like items, enums
/// and type aliases.
///
/// `ty` is the declared type for variables, the return type for functions
/// (absent for `predicate`/`test`/`annotation`) and the aliased type for
/// `type X = ...`. `cases` is only used by enums.
#[derive(Debug, Clone, Serialize)]
pub struct Declare {
    pub kind: DeclKind,
    pub name: Ident,
    pub ty: Option<TypeInst>,
    pub params: Option<Vec<Param>>,
    pub cases: Option<Vec<EnumCases>>,
    pub body: Option<Expr>,
    pub anns: Vec<Expr>,
    pub span: Span,
}

impl Declare {
    /// Whether a value (or enum case list) has been supplied.
    pub fn has_initializer(&self) -> bool {
        match self.kind {
            DeclKind::Enum => self.cases.is_some(),
            DeclKind::TypeAlias => true,
            _ => self.body.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub ty: TypeInst,
    pub name: Option<Ident>,
    pub span: Span,
}

/// One `++`-separated group on the right of `enum X = ...`.
#[derive(Debug, Clone, Serialize)]
pub enum EnumCases {
    /// `{A, B, C}`
    Names(Vec<Ident>),
    /// `_(1..3)`
    Anon(Expr),
    /// `anon_enum(4)`
    AnonEnum(Expr),
    /// `C(1..3)` or `C(Other)`
    Constructor { name: Ident, arg: Expr },
}

#[derive(Debug, Clone, Serialize)]
pub struct Assign {
    pub name: Ident,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Constraint {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveMethod {
    Satisfy,
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Serialize)]
pub enum SolveGoal {
    Satisfy,
    Minimize(Expr),
    Maximize(Expr),
}

impl SolveGoal {
    pub fn method(&self) -> SolveMethod {
        match self {
            SolveGoal::Satisfy => SolveMethod::Satisfy,
            SolveGoal::Minimize(_) => SolveMethod::Minimize,
            SolveGoal::Maximize(_) => SolveMethod::Maximize,
        }
    }

    pub fn objective(&self) -> Option<&Expr> {
        match self {
            SolveGoal::Satisfy => None,
            SolveGoal::Minimize(e) | SolveGoal::Maximize(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solve {
    pub goal: SolveGoal,
    pub anns: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub expr: Expr,
    pub anns: Vec<Expr>,
    pub span: Span,
}

impl Output {
    /// The output pieces when the item is written as an array literal.
    pub fn exprs(&self) -> Vec<&Expr> {
        match &self.expr.kind {
            ExprKind::Array1d(elems) => elems.iter().map(|e| &e.value).collect(),
            _ => vec![&self.expr],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: Span::default(),
        }
    }
}

// ======= types =======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Inst {
    /// Neither `var` nor `par` was written.
    Implicit,
    Par,
    Var,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeInst {
    pub inst: Inst,
    pub opt: bool,
    pub base: TypeBase,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prim {
    Int,
    Bool,
    Float,
    String,
    Ann,
    Any,
}

impl Prim {
    pub fn keyword(self) -> &'static str {
        match self {
            Prim::Int => "int",
            Prim::Bool => "bool",
            Prim::Float => "float",
            Prim::String => "string",
            Prim::Ann => "ann",
            Prim::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum TypeBase {
    Prim(Prim),
    /// Alias, enum or `$T` / `$$E` type variable.
    Named(Ident),
    Array {
        dims: Vec<TypeInst>,
        elem: Box<TypeInst>,
    },
    List(Box<TypeInst>),
    Set(Box<TypeInst>),
    Tuple(Vec<TypeInst>),
    Record(Vec<(Ident, TypeInst)>),
    /// `A ++ B`
    Concat(Vec<TypeInst>),
    /// A range or set literal used directly as a type (`1..n`, `{1,3,5}`).
    Expr(Box<Expr>),
}

// ======= expressions =======

#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    /// Trailing `:: ann` list.
    pub anns: Vec<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            anns: Vec::new(),
            span,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    Lit(Lit),
    Ident(Ident),
    /// `_`
    Anon,
    Call {
        name: Ident,
        args: Vec<Expr>,
    },
    /// `base[i, j]`
    Access {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `base.1` or `base.name`
    Field {
        base: Box<Expr>,
        field: Field,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        rhs: Box<Expr>,
    },
    Range {
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
    },
    Set(Vec<Expr>),
    Array1d(Vec<ArrayElem>),
    Array2d(Array2d),
    Array3d(Array3d),
    Tuple(Vec<Expr>),
    Record(Vec<(Ident, Expr)>),
    Comprehension {
        kind: CompKind,
        body: Box<Expr>,
        generators: Vec<Generator>,
    },
    /// `forall(i in S)(body)`
    GenCall {
        name: Ident,
        generators: Vec<Generator>,
        body: Box<Expr>,
    },
    Let {
        items: Vec<LetItem>,
        body: Box<Expr>,
    },
    If {
        branches: Vec<IfBranch>,
        else_: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(StrLit),
    /// `<>`
    Empty,
}

/// String literal contents exactly as written between the quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrLit {
    pub raw: String,
}

impl StrLit {
    /// Build a literal from its unescaped value.
    pub fn new(value: &str) -> Self {
        let mut raw = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\n' => raw.push_str("\\n"),
                '\t' => raw.push_str("\\t"),
                '"' => raw.push_str("\\\""),
                '\\' => raw.push_str("\\\\"),
                c => raw.push(c),
            }
        }
        Self { raw }
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Decoded value. Interpolation spans `\( ... )` are kept verbatim.
    pub fn value(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        let mut chars = self.raw.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\'') => out.push('\''),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('(') => {
                    out.push_str("\\(");
                    let mut depth = 1usize;
                    for inner in chars.by_ref() {
                        out.push(inner);
                        match inner {
                            '(' => depth += 1,
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Field {
    Index(u32),
    Name(Ident),
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayElem {
    pub index: Option<Expr>,
    pub value: Expr,
}

/// `[| a: b: | x: 1, 2 | y: 3, 4 |]`
#[derive(Debug, Clone, Serialize)]
pub struct Array2d {
    /// Column index header; empty when absent.
    pub col_index: Vec<Expr>,
    pub rows: Vec<Array2dRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Array2dRow {
    pub index: Option<Expr>,
    pub values: Vec<Expr>,
}

/// `[| |1, 2|3, 4|, |5, 6|7, 8| |]`, stored flat in row-major order.
#[derive(Debug, Clone, Serialize)]
pub struct Array3d {
    pub dims: [usize; 3],
    pub elems: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompKind {
    Array,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generator {
    pub names: Vec<Ident>,
    pub source: Expr,
    pub where_: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBranch {
    pub cond: Expr,
    pub then: Expr,
}

#[derive(Debug, Clone, Serialize)]
pub enum LetItem {
    Declare(Declare),
    Assign(Assign),
    Constraint(Constraint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    Not,
    Neg,
    Plus,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "not",
            UnOp::Neg => "-",
            UnOp::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// Precedence level of prefix operators; tighter than every binary level.
pub const UNARY_PRECEDENCE: u16 = 10;
/// Precedence level of `lo..hi`.
pub const RANGE_PRECEDENCE: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BinOp {
    // implication family
    Equiv,
    Impl,
    RevImpl,
    // logical
    Or,
    Xor,
    And,
    // comparison / equality
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Eq,
    Ne,
    WeakEq,
    // set relations
    In,
    Subset,
    Superset,
    // set arithmetic
    Union,
    Diff,
    SymDiff,
    Intersect,
    // arithmetic
    Add,
    Sub,
    WeakAdd,
    WeakSub,
    Mul,
    Div,
    IntDiv,
    Mod,
    WeakMul,
    Pow,
    // misc
    Concat,
    Default,
    /// `` a `name` b ``
    Backtick(String),
}

impl BinOp {
    /// MiniZinc precedence level; a lower level binds tighter.
    pub fn precedence(&self) -> u16 {
        match self {
            BinOp::Equiv => 1200,
            BinOp::Impl | BinOp::RevImpl => 1100,
            BinOp::Or | BinOp::Xor => 1000,
            BinOp::And => 900,
            BinOp::Lt
            | BinOp::Gt
            | BinOp::Le
            | BinOp::Ge
            | BinOp::EqEq
            | BinOp::Eq
            | BinOp::Ne
            | BinOp::WeakEq => 800,
            BinOp::In | BinOp::Subset | BinOp::Superset => 700,
            BinOp::Union | BinOp::Diff | BinOp::SymDiff => 600,
            BinOp::Add | BinOp::Sub | BinOp::WeakAdd | BinOp::WeakSub => 400,
            BinOp::Mul
            | BinOp::Div
            | BinOp::IntDiv
            | BinOp::Mod
            | BinOp::Intersect
            | BinOp::WeakMul => 300,
            BinOp::Pow => 200,
            BinOp::Concat => 100,
            BinOp::Default => 70,
            BinOp::Backtick(_) => 50,
        }
    }

    pub fn assoc(&self) -> Assoc {
        match self {
            BinOp::Lt
            | BinOp::Gt
            | BinOp::Le
            | BinOp::Ge
            | BinOp::EqEq
            | BinOp::Eq
            | BinOp::Ne
            | BinOp::WeakEq
            | BinOp::In
            | BinOp::Subset
            | BinOp::Superset => Assoc::None,
            BinOp::Concat => Assoc::Right,
            _ => Assoc::Left,
        }
    }

    /// Source spelling. Backtick operators render their quoted name.
    pub fn symbol(&self) -> String {
        let s = match self {
            BinOp::Equiv => "<->",
            BinOp::Impl => "->",
            BinOp::RevImpl => "<-",
            BinOp::Or => "\\/",
            BinOp::Xor => "xor",
            BinOp::And => "/\\",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::EqEq => "==",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::WeakEq => "~=",
            BinOp::In => "in",
            BinOp::Subset => "subset",
            BinOp::Superset => "superset",
            BinOp::Union => "union",
            BinOp::Diff => "diff",
            BinOp::SymDiff => "symdiff",
            BinOp::Intersect => "intersect",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::WeakAdd => "~+",
            BinOp::WeakSub => "~-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "div",
            BinOp::Mod => "mod",
            BinOp::WeakMul => "~*",
            BinOp::Pow => "^",
            BinOp::Concat => "++",
            BinOp::Default => "default",
            BinOp::Backtick(name) => return format!("`{name}`"),
        };
        s.to_string()
    }
}
