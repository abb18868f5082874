//! Plain constructors for syntax nodes, for code that assembles models
//! programmatically instead of parsing them. Nodes built here carry default
//! spans.

use crate::ast::{
    ArrayElem, Assign, BinOp, CompKind, Constraint, DeclKind, Declare, Expr, ExprKind, Generator,
    Ident, IfBranch, Inst, Item, Lit, Prim, Solve, SolveGoal, StrLit, TypeBase, TypeInst, UnOp,
};
use crate::span::Span;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::default())
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Ident(Ident::new(name)))
}

/// Negative values become a unary minus over the magnitude, matching what
/// the parser produces for `-5`.
pub fn int(v: i64) -> Expr {
    match v.checked_neg() {
        Some(magnitude) if v < 0 => unary(UnOp::Neg, expr(ExprKind::Lit(Lit::Int(magnitude)))),
        _ => expr(ExprKind::Lit(Lit::Int(v))),
    }
}

pub fn float(v: f64) -> Expr {
    if v < 0.0 {
        unary(UnOp::Neg, expr(ExprKind::Lit(Lit::Float(-v))))
    } else {
        expr(ExprKind::Lit(Lit::Float(v)))
    }
}

pub fn boolean(v: bool) -> Expr {
    expr(ExprKind::Lit(Lit::Bool(v)))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Lit(Lit::Str(StrLit::new(value))))
}

pub fn empty() -> Expr {
    expr(ExprKind::Lit(Lit::Empty))
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        name: Ident::new(name),
        args,
    })
}

pub fn access(base: Expr, indices: Vec<Expr>) -> Expr {
    expr(ExprKind::Access {
        base: Box::new(base),
        indices,
    })
}

pub fn unary(op: UnOp, operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op,
        expr: Box::new(operand),
    })
}

pub fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Expr {
    expr(ExprKind::Binary {
        lhs: Box::new(lhs),
        op,
        rhs: Box::new(rhs),
    })
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::Add, rhs)
}

pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::Sub, rhs)
}

pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::Mul, rhs)
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::Eq, rhs)
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::And, rhs)
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    binary(lhs, BinOp::Or, rhs)
}

pub fn not(operand: Expr) -> Expr {
    unary(UnOp::Not, operand)
}

pub fn range(lo: Option<Expr>, hi: Option<Expr>) -> Expr {
    expr(ExprKind::Range {
        lo: lo.map(Box::new),
        hi: hi.map(Box::new),
    })
}

pub fn set(elems: Vec<Expr>) -> Expr {
    expr(ExprKind::Set(elems))
}

pub fn array(elems: Vec<Expr>) -> Expr {
    expr(ExprKind::Array1d(
        elems
            .into_iter()
            .map(|value| ArrayElem { index: None, value })
            .collect(),
    ))
}

pub fn tuple(elems: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(elems))
}

pub fn comprehension(kind: CompKind, body: Expr, generators: Vec<Generator>) -> Expr {
    expr(ExprKind::Comprehension {
        kind,
        body: Box::new(body),
        generators,
    })
}

pub fn gen_call(name: &str, generators: Vec<Generator>, body: Expr) -> Expr {
    expr(ExprKind::GenCall {
        name: Ident::new(name),
        generators,
        body: Box::new(body),
    })
}

pub fn if_then_else(cond: Expr, then: Expr, else_: Expr) -> Expr {
    expr(ExprKind::If {
        branches: vec![IfBranch { cond, then }],
        else_: Some(Box::new(else_)),
    })
}

pub fn annotate(mut e: Expr, ann: Expr) -> Expr {
    e.anns.push(ann);
    e
}

pub fn ty(inst: Inst, base: TypeBase) -> TypeInst {
    TypeInst {
        inst,
        opt: false,
        base,
        span: Span::default(),
    }
}

pub fn var_int() -> TypeInst {
    ty(Inst::Var, TypeBase::Prim(Prim::Int))
}

pub fn par_int() -> TypeInst {
    ty(Inst::Implicit, TypeBase::Prim(Prim::Int))
}

/// `ty: name [= value];`
pub fn declare(ty: TypeInst, name: &str, value: Option<Expr>) -> Item {
    let kind = if ty.inst == Inst::Var {
        DeclKind::Variable
    } else {
        DeclKind::Parameter
    };
    Item::Declare(Declare {
        kind,
        name: Ident::new(name),
        ty: Some(ty),
        params: None,
        cases: None,
        body: value,
        anns: Vec::new(),
        span: Span::default(),
    })
}

pub fn assign(name: &str, value: Expr) -> Item {
    Item::Assign(Assign {
        name: Ident::new(name),
        value,
        span: Span::default(),
    })
}

pub fn constraint(e: Expr) -> Item {
    Item::Constraint(Constraint {
        expr: e,
        span: Span::default(),
    })
}

pub fn solve(goal: SolveGoal) -> Item {
    Item::Solve(Solve {
        goal,
        anns: Vec::new(),
        span: Span::default(),
    })
}
