use mzn_ast::ast::{BinOp, Expr, ExprKind, UnOp};
use mzn_ast::Render;
use mzn_parse::parse_expr;
use pretty_assertions::assert_eq;

fn minimal(src: &str) -> String {
    parse_expr(src).unwrap().minimal()
}

fn top_op(src: &str) -> BinOp {
    match parse_expr(src).unwrap().kind {
        ExprKind::Binary { op, .. } => op,
        other => panic!("expected a binary expression, got {other:?}"),
    }
}

fn operands(e: Expr) -> (Expr, Expr) {
    match e.kind {
        ExprKind::Binary { lhs, rhs, .. } => (*lhs, *rhs),
        other => panic!("expected a binary expression, got {other:?}"),
    }
}

#[test]
fn left_assoc_needs_no_parens_on_the_left() {
    assert_eq!(minimal("a - b + c"), "a-b+c");
    assert_eq!(minimal("(a - b) + c"), "a-b+c");
}

#[test]
fn explicit_right_grouping_keeps_parens() {
    assert_eq!(minimal("a - (b + c)"), "a-(b+c)");
    assert_eq!(minimal("(1 + 2) * 3"), "(1+2)*3");
}

#[test]
fn concat_is_right_associative() {
    let left = minimal("(a ++ b) ++ c");
    let right = minimal("a ++ (b ++ c)");
    assert_eq!(left, "(a++b)++c");
    assert_eq!(right, "a++b++c");
    assert_ne!(left, right);
}

#[test]
fn arithmetic_binds_tighter_than_comparison_and_logic() {
    assert_eq!(top_op("1 + 2 * 3"), BinOp::Add);
    assert_eq!(top_op("a + 1 < b /\\ c"), BinOp::And);
    assert_eq!(top_op("a /\\ b \\/ c"), BinOp::Or);
    assert_eq!(top_op("a -> b <-> c"), BinOp::Equiv);
    assert_eq!(top_op("x in S union T"), BinOp::In);
}

#[test]
fn range_sits_between_set_ops_and_arithmetic() {
    let (lhs, rhs) = operands(parse_expr("x in 1..n+1").unwrap());
    assert!(matches!(lhs.kind, ExprKind::Ident(_)));
    let ExprKind::Range { lo, hi } = rhs.kind else {
        panic!("expected a range");
    };
    assert!(lo.is_some());
    assert!(matches!(
        hi.map(|h| h.kind),
        Some(ExprKind::Binary { op: BinOp::Add, .. })
    ));
    assert_eq!(minimal("x in 1..n+1"), "x in 1..n+1");
}

#[test]
fn unary_binds_tighter_than_any_binary_operator() {
    let (lhs, _) = operands(parse_expr("not a /\\ b").unwrap());
    assert!(matches!(lhs.kind, ExprKind::Unary { op: UnOp::Not, .. }));

    let (lhs, _) = operands(parse_expr("-x ^ 2").unwrap());
    assert!(matches!(lhs.kind, ExprKind::Unary { op: UnOp::Neg, .. }));

    assert_eq!(minimal("not (a /\\ b)"), "not(a/\\b)");
    assert_eq!(minimal("a - -b"), "a- -b");
}

#[test]
fn backtick_and_default_bind_tightly() {
    assert_eq!(top_op("a `plus` b * c"), BinOp::Mul);
    assert_eq!(top_op("x default 0 + 1"), BinOp::Add);
    assert_eq!(minimal("a `plus` b"), "a`plus`b");
}

#[test]
fn non_associative_chains_are_rejected() {
    for src in ["a < b < c", "a = b = c", "x in A in B", "1..2..3"] {
        let err = parse_expr(src).unwrap_err().to_string();
        assert!(err.contains("not associative"), "{src}: {err}");
    }
    // the check is per level, not per operator
    assert!(parse_expr("a < b = true").is_err());
    assert!(parse_expr("a < b /\\ b < c").is_ok());
}

#[test]
fn annotated_operand_is_parenthesised() {
    assert_eq!(minimal("(a + b) :: foo"), "(a+b)::foo");
    assert_eq!(minimal("x :: foo + 1"), "x::foo+1");
}
