//! Renders syntax trees back to MiniZinc source.
//!
//! Two modes are supported. [`WriteMode::Minimal`] emits no whitespace beyond
//! what the lexer needs to split adjacent tokens; it is the canonical form used
//! for cloning by reparse and for structural equality. [`WriteMode::Pretty`]
//! adds spacing meant for people.
//!
//! Parentheses are never stored in the tree. The writer inserts them where a
//! child operator binds more loosely than its parent, or equally loosely on the
//! side where associativity would regroup it.

use crate::ast::{
    is_keyword, Array2d, Array3d, Assoc, CompKind, DeclKind, Declare, EnumCases, Expr,
    ExprKind, Field, Generator, Ident, Include, Inst, Item, LetItem, Lit, Model, Param, SolveGoal,
    TypeBase, TypeInst, RANGE_PRECEDENCE, UNARY_PRECEDENCE,
};
use std::borrow::Cow;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Minimal,
    Pretty,
}

/// Anything that can be written as MiniZinc source.
pub trait Render {
    fn render_into(&self, w: &mut Writer);

    fn render(&self, mode: WriteMode) -> String {
        let mut w = Writer::new(mode);
        self.render_into(&mut w);
        w.finish()
    }

    fn minimal(&self) -> String {
        self.render(WriteMode::Minimal)
    }

    fn pretty(&self) -> String {
        self.render(WriteMode::Pretty)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

pub struct Writer {
    mode: WriteMode,
    out: String,
}

impl Writer {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            out: String::new(),
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Append a token, separating it from the previous one only when the two
    /// would otherwise lex as something else (`not` `x`, `<` `-`, ...).
    pub fn token(&mut self, piece: &str) {
        if let (Some(prev), Some(next)) = (self.out.chars().last(), piece.chars().next()) {
            if fuses(prev, next) {
                self.out.push(' ');
            }
        }
        self.out.push_str(piece);
    }

    fn sp(&mut self) {
        if self.mode == WriteMode::Pretty && !self.out.is_empty() && !self.out.ends_with(' ') {
            self.out.push(' ');
        }
    }

    fn newline(&mut self) {
        if self.mode == WriteMode::Pretty {
            self.out.push('\n');
        }
    }

    fn comma(&mut self) {
        self.token(",");
        self.sp();
    }

    fn infix(&mut self, op: &str) {
        self.sp();
        self.token(op);
        self.sp();
    }

    fn list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            each(self, item);
        }
    }

    // ======= items =======

    pub fn model(&mut self, m: &Model) {
        for item in &m.items {
            self.item(item);
            self.newline();
        }
    }

    pub fn item(&mut self, item: &Item) {
        match item {
            Item::Include(inc) => self.include(inc),
            Item::Declare(d) => {
                self.declare(d);
                self.token(";");
            }
            Item::Assign(a) => {
                self.ident(&a.name);
                self.infix("=");
                self.expr(&a.value);
                self.token(";");
            }
            Item::Constraint(c) => {
                self.token("constraint");
                self.sp();
                self.expr(&c.expr);
                self.token(";");
            }
            Item::Solve(s) => {
                self.token("solve");
                self.anns(&s.anns);
                self.sp();
                match &s.goal {
                    SolveGoal::Satisfy => self.token("satisfy"),
                    SolveGoal::Minimize(e) => {
                        self.token("minimize");
                        self.sp();
                        self.expr(e);
                    }
                    SolveGoal::Maximize(e) => {
                        self.token("maximize");
                        self.sp();
                        self.expr(e);
                    }
                }
                self.token(";");
            }
            Item::Output(o) => {
                self.token("output");
                self.anns(&o.anns);
                self.sp();
                self.expr(&o.expr);
                self.token(";");
            }
        }
    }

    fn include(&mut self, inc: &Include) {
        self.token("include");
        self.sp();
        self.token(&format!("\"{}\"", inc.path.raw));
        self.token(";");
    }

    /// A declaration without its terminating `;`.
    pub fn declare(&mut self, d: &Declare) {
        match d.kind {
            DeclKind::Parameter | DeclKind::Variable => {
                if let Some(ty) = &d.ty {
                    self.type_inst(ty);
                    self.token(":");
                    self.sp();
                }
                self.ident(&d.name);
                self.anns(&d.anns);
            }
            DeclKind::Function | DeclKind::Predicate | DeclKind::Test | DeclKind::Annotation => {
                self.token(d.kind.keyword().unwrap_or("function"));
                self.sp();
                if let Some(ty) = &d.ty {
                    self.type_inst(ty);
                    self.token(":");
                    self.sp();
                }
                self.ident(&d.name);
                if let Some(params) = &d.params {
                    self.params(params);
                }
                self.anns(&d.anns);
            }
            DeclKind::Enum => {
                self.token("enum");
                self.sp();
                self.ident(&d.name);
                self.anns(&d.anns);
                if let Some(cases) = &d.cases {
                    self.infix("=");
                    for (i, group) in cases.iter().enumerate() {
                        if i > 0 {
                            self.infix("++");
                        }
                        self.enum_cases(group);
                    }
                }
            }
            DeclKind::TypeAlias => {
                self.token("type");
                self.sp();
                self.ident(&d.name);
                self.anns(&d.anns);
                if let Some(ty) = &d.ty {
                    self.infix("=");
                    self.type_inst(ty);
                }
            }
        }
        if let Some(body) = &d.body {
            self.infix("=");
            self.expr(body);
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.token("(");
        self.list(params, |w, p| {
            w.type_inst(&p.ty);
            if let Some(name) = &p.name {
                w.token(":");
                w.sp();
                w.ident(name);
            }
        });
        self.token(")");
    }

    fn enum_cases(&mut self, group: &EnumCases) {
        match group {
            EnumCases::Names(names) => {
                self.token("{");
                self.list(names, |w, n| w.ident(n));
                self.token("}");
            }
            EnumCases::Anon(arg) => {
                self.token("_");
                self.token("(");
                self.expr(arg);
                self.token(")");
            }
            EnumCases::AnonEnum(arg) => {
                self.token("anon_enum");
                self.token("(");
                self.expr(arg);
                self.token(")");
            }
            EnumCases::Constructor { name, arg } => {
                self.ident(name);
                self.token("(");
                self.expr(arg);
                self.token(")");
            }
        }
    }

    fn anns(&mut self, anns: &[Expr]) {
        for ann in anns {
            self.sp();
            self.token("::");
            self.sp();
            let wrap = expr_precedence(ann) > 0 || !ann.anns.is_empty();
            self.wrapped(ann, wrap);
        }
    }

    pub fn ident(&mut self, id: &Ident) {
        self.token(&ident_text(&id.text));
    }

    // ======= types =======

    pub fn type_inst(&mut self, t: &TypeInst) {
        match t.inst {
            Inst::Implicit => {}
            Inst::Par => {
                self.token("par");
                self.sp();
            }
            Inst::Var => {
                self.token("var");
                self.sp();
            }
        }
        if t.opt {
            self.token("opt");
            self.sp();
        }
        match &t.base {
            TypeBase::Prim(p) => self.token(p.keyword()),
            TypeBase::Named(id) => self.ident(id),
            TypeBase::Array { dims, elem } => {
                self.token("array");
                self.token("[");
                self.list(dims, |w, d| w.type_inst(d));
                self.token("]");
                self.sp();
                self.token("of");
                self.sp();
                self.type_inst(elem);
            }
            TypeBase::List(elem) => {
                self.token("list");
                self.sp();
                self.token("of");
                self.sp();
                self.type_inst(elem);
            }
            TypeBase::Set(elem) => {
                self.token("set");
                self.sp();
                self.token("of");
                self.sp();
                self.type_inst(elem);
            }
            TypeBase::Tuple(fields) => {
                self.token("tuple");
                self.token("(");
                self.list(fields, |w, f| w.type_inst(f));
                self.token(")");
            }
            TypeBase::Record(fields) => {
                self.token("record");
                self.token("(");
                self.list(fields, |w, (name, ty)| {
                    w.type_inst(ty);
                    w.token(":");
                    w.sp();
                    w.ident(name);
                });
                self.token(")");
            }
            TypeBase::Concat(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        self.infix("++");
                    }
                    self.type_inst(part);
                }
            }
            TypeBase::Expr(e) => self.expr(e),
        }
    }

    // ======= expressions =======

    pub fn expr(&mut self, e: &Expr) {
        if e.anns.is_empty() {
            self.expr_kind(e);
            return;
        }
        let wrap = expr_precedence_of_kind(&e.kind) > 0;
        if wrap {
            self.token("(");
        }
        self.expr_kind(e);
        if wrap {
            self.token(")");
        }
        self.anns(&e.anns);
    }

    fn wrapped(&mut self, e: &Expr, wrap: bool) {
        if wrap {
            self.token("(");
            self.expr(e);
            self.token(")");
        } else {
            self.expr(e);
        }
    }

    fn operand(&mut self, child: &Expr, prec: u16, assoc: Assoc, side: Side) {
        let cp = expr_precedence(child);
        let wrap = cp > prec
            || (cp == prec
                && match assoc {
                    Assoc::Left => side == Side::Right,
                    Assoc::Right => side == Side::Left,
                    Assoc::None => true,
                });
        self.wrapped(child, wrap);
    }

    fn postfix_base(&mut self, base: &Expr, field: bool) {
        let numeric = matches!(base.kind, ExprKind::Lit(Lit::Int(_) | Lit::Float(_)));
        let string = matches!(base.kind, ExprKind::Lit(Lit::Str(_)));
        let wrap =
            expr_precedence(base) > 0 || !base.anns.is_empty() || string || (field && numeric);
        self.wrapped(base, wrap);
    }

    fn expr_kind(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Lit(lit) => self.lit(lit),
            ExprKind::Ident(id) => self.ident(id),
            ExprKind::Anon => self.token("_"),
            ExprKind::Call { name, args } => {
                // `_(...)` is the anonymous enum constructor, not a quoted name
                if name.text == "_" {
                    self.token("_");
                } else {
                    self.ident(name);
                }
                self.token("(");
                self.list(args, |w, a| w.expr(a));
                self.token(")");
            }
            ExprKind::Access { base, indices } => {
                self.postfix_base(base, false);
                self.token("[");
                self.list(indices, |w, i| w.expr(i));
                self.token("]");
            }
            ExprKind::Field { base, field } => {
                self.postfix_base(base, true);
                self.token(".");
                match field {
                    Field::Index(n) => self.token(&n.to_string()),
                    Field::Name(id) => self.ident(id),
                }
            }
            ExprKind::Unary { op, expr } => {
                self.token(op.symbol());
                let wrap = expr_precedence(expr) > UNARY_PRECEDENCE;
                self.wrapped(expr, wrap);
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let prec = op.precedence();
                let assoc = op.assoc();
                self.operand(lhs, prec, assoc, Side::Left);
                self.infix(&op.symbol());
                self.operand(rhs, prec, assoc, Side::Right);
            }
            ExprKind::Range { lo, hi } => {
                if let Some(lo) = lo {
                    self.operand(lo, RANGE_PRECEDENCE, Assoc::None, Side::Left);
                }
                self.token("..");
                if let Some(hi) = hi {
                    self.operand(hi, RANGE_PRECEDENCE, Assoc::None, Side::Right);
                }
            }
            ExprKind::Set(elems) => {
                self.token("{");
                self.list(elems, |w, x| w.expr(x));
                self.token("}");
            }
            ExprKind::Array1d(elems) => {
                self.token("[");
                self.list(elems, |w, el| {
                    if let Some(index) = &el.index {
                        w.expr(index);
                        w.token(":");
                        w.sp();
                    }
                    w.expr(&el.value);
                });
                self.token("]");
            }
            ExprKind::Array2d(arr) => self.array2d(arr),
            ExprKind::Array3d(arr) => self.array3d(arr),
            ExprKind::Tuple(elems) => {
                self.token("(");
                self.list(elems, |w, x| w.expr(x));
                if elems.len() == 1 {
                    self.token(",");
                }
                self.token(")");
            }
            ExprKind::Record(fields) => {
                self.token("(");
                self.list(fields, |w, (name, value)| {
                    w.ident(name);
                    w.token(":");
                    w.sp();
                    w.expr(value);
                });
                self.token(")");
            }
            ExprKind::Comprehension {
                kind,
                body,
                generators,
            } => {
                let (open, close) = match kind {
                    CompKind::Array => ("[", "]"),
                    CompKind::Set => ("{", "}"),
                };
                self.token(open);
                self.expr(body);
                self.infix("|");
                self.generators(generators);
                self.token(close);
            }
            ExprKind::GenCall {
                name,
                generators,
                body,
            } => {
                self.ident(name);
                self.token("(");
                self.generators(generators);
                self.token(")");
                self.token("(");
                self.expr(body);
                self.token(")");
            }
            ExprKind::Let { items, body } => {
                self.token("let");
                self.sp();
                self.token("{");
                self.sp();
                for item in items {
                    self.let_item(item);
                    self.token(";");
                    self.sp();
                }
                self.token("}");
                self.sp();
                self.token("in");
                self.sp();
                self.expr(body);
            }
            ExprKind::If { branches, else_ } => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        self.sp();
                    }
                    self.token(if i == 0 { "if" } else { "elseif" });
                    self.sp();
                    self.expr(&branch.cond);
                    self.sp();
                    self.token("then");
                    self.sp();
                    self.expr(&branch.then);
                }
                if let Some(e) = else_ {
                    self.sp();
                    self.token("else");
                    self.sp();
                    self.expr(e);
                }
                self.sp();
                self.token("endif");
            }
        }
    }

    fn lit(&mut self, lit: &Lit) {
        match lit {
            Lit::Int(v) => self.token(&v.to_string()),
            Lit::Float(v) => self.token(&format!("{v:?}")),
            Lit::Bool(b) => self.token(if *b { "true" } else { "false" }),
            Lit::Str(s) => self.token(&format!("\"{}\"", s.raw)),
            Lit::Empty => self.token("<>"),
        }
    }

    fn generators(&mut self, generators: &[Generator]) {
        self.list(generators, |w, g| {
            w.list(&g.names, |w, n| w.ident(n));
            w.sp();
            w.token("in");
            w.sp();
            w.expr(&g.source);
            if let Some(cond) = &g.where_ {
                w.sp();
                w.token("where");
                w.sp();
                w.expr(cond);
            }
        });
    }

    fn let_item(&mut self, item: &LetItem) {
        match item {
            LetItem::Declare(d) => self.declare(d),
            LetItem::Assign(a) => {
                self.ident(&a.name);
                self.infix("=");
                self.expr(&a.value);
            }
            LetItem::Constraint(c) => {
                self.token("constraint");
                self.sp();
                self.expr(&c.expr);
            }
        }
    }

    fn array2d(&mut self, arr: &Array2d) {
        self.token("[");
        self.token("|");
        self.sp();
        if !arr.col_index.is_empty() {
            for col in &arr.col_index {
                self.expr(col);
                self.token(":");
                self.sp();
            }
            self.token("|");
            self.sp();
        }
        for (i, row) in arr.rows.iter().enumerate() {
            if i > 0 {
                self.infix("|");
            }
            if let Some(index) = &row.index {
                self.expr(index);
                self.token(":");
                self.sp();
            }
            self.list(&row.values, |w, v| w.expr(v));
        }
        self.sp();
        self.token("|");
        self.token("]");
    }

    fn array3d(&mut self, arr: &Array3d) {
        let [planes, rows, cols] = arr.dims;
        self.token("[");
        self.token("|");
        self.sp();
        if arr.elems.is_empty() || planes * rows * cols == 0 {
            self.token("|");
            self.token("|");
        } else {
            let mut values = arr.elems.iter();
            for p in 0..planes {
                if p > 0 {
                    self.comma();
                }
                self.token("|");
                for _ in 0..rows {
                    for c in 0..cols {
                        if c > 0 {
                            self.comma();
                        }
                        if let Some(v) = values.next() {
                            self.expr(v);
                        }
                    }
                    self.token("|");
                }
            }
        }
        self.sp();
        self.token("|");
        self.token("]");
    }
}

/// Whether two adjacent characters from different tokens would merge.
fn fuses(prev: char, next: char) -> bool {
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let op = |c: char| "+-*/\\<>=.:~!".contains(c);
    (word(prev) && word(next)) || (op(prev) && op(next))
}

/// Binding level of an expression as an operand; 0 for atoms, which never
/// need parentheses. `let` extends as far right as it can, so it is loosest.
fn expr_precedence(e: &Expr) -> u16 {
    if !e.anns.is_empty() {
        return 0;
    }
    expr_precedence_of_kind(&e.kind)
}

fn expr_precedence_of_kind(kind: &ExprKind) -> u16 {
    match kind {
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Range { .. } => RANGE_PRECEDENCE,
        ExprKind::Unary { .. } => UNARY_PRECEDENCE,
        ExprKind::Let { .. } => u16::MAX,
        _ => 0,
    }
}

/// Identifier spelling, quoted when the bare name would not lex back as the
/// same identifier.
pub fn ident_text(name: &str) -> Cow<'_, str> {
    if is_plain_ident(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{name}'"))
    }
}

fn is_plain_ident(name: &str) -> bool {
    let (rest, poly) = match name.strip_prefix("$$").or_else(|| name.strip_prefix('$')) {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    let mut chars = rest.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    poly || !(rest.chars().all(|c| c.is_ascii_alphabetic()) && is_keyword(rest))
}

impl Render for Model {
    fn render_into(&self, w: &mut Writer) {
        w.model(self);
    }
}

impl Render for Item {
    fn render_into(&self, w: &mut Writer) {
        w.item(self);
    }
}

impl Render for Declare {
    fn render_into(&self, w: &mut Writer) {
        w.declare(self);
        w.token(";");
    }
}

impl Render for Expr {
    fn render_into(&self, w: &mut Writer) {
        w.expr(self);
    }
}

impl Render for TypeInst {
    fn render_into(&self, w: &mut Writer) {
        w.type_inst(self);
    }
}

macro_rules! display_pretty {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.pretty())
            }
        })*
    };
}

display_pretty!(Model, Item, Expr, TypeInst);
