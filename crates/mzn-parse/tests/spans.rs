//! Span tracking: byte offsets plus 1-based line/column of the first token.

use mzn_ast::ast::{ExprKind, Item};
use mzn_parse::{parse_expr, parse_str};
use pretty_assertions::assert_eq;

#[test]
fn item_spans_stop_before_the_semicolon() {
    let m = parse_str("<mem>", "int: a = 1;\nint: b = 2;").unwrap();
    let first = m.items[0].span();
    assert_eq!((first.start, first.end), (0, 10));
    let second = m.items[1].span();
    assert_eq!((second.start, second.end), (12, 22));
    assert_eq!((second.line, second.col), (2, 1));
}

#[test]
fn binary_span_covers_both_operands() {
    let e = parse_expr("a + bc").unwrap();
    assert_eq!((e.span.start, e.span.end), (0, 6));
    let ExprKind::Binary { rhs, .. } = e.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!((rhs.span.start, rhs.span.end, rhs.span.col), (4, 6, 5));
}

#[test]
fn call_span_ends_at_closing_paren() {
    let e = parse_expr("f(x, y) + 1").unwrap();
    let ExprKind::Binary { lhs, .. } = e.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!((lhs.span.start, lhs.span.end), (0, 7));
}

#[test]
fn declaration_name_span() {
    let m = parse_str("<mem>", "  var int: total;").unwrap();
    let Item::Declare(d) = &m.items[0] else {
        panic!("expected a declaration");
    };
    assert_eq!((d.name.span.start, d.name.span.end), (11, 16));
    assert_eq!((d.span.line, d.span.col), (1, 3));
}
