use mzn_ast::ast::{CompKind, Expr, ExprKind, Field, LetItem, Lit};
use mzn_ast::Render;
use mzn_parse::parse_expr;
use pretty_assertions::assert_eq;

fn kind(src: &str) -> ExprKind {
    parse_expr(src).unwrap().kind
}

#[test]
fn scalar_literals() {
    assert!(matches!(kind("42"), ExprKind::Lit(Lit::Int(42))));
    assert!(matches!(kind("0x2A"), ExprKind::Lit(Lit::Int(42))));
    assert!(matches!(kind("2.5"), ExprKind::Lit(Lit::Float(f)) if (f - 2.5).abs() < 1e-12));
    assert!(matches!(kind("1e3"), ExprKind::Lit(Lit::Float(f)) if (f - 1000.0).abs() < 1e-9));
    assert!(matches!(kind("true"), ExprKind::Lit(Lit::Bool(true))));
    assert!(matches!(kind("<>"), ExprKind::Lit(Lit::Empty)));
    assert!(matches!(kind("_"), ExprKind::Anon));
}

#[test]
fn string_literals_decode_on_demand() {
    let ExprKind::Lit(Lit::Str(s)) = kind(r#""a\tb\"c\(x + 1)""#) else {
        panic!("expected a string");
    };
    assert_eq!(s.raw, r#"a\tb\"c\(x + 1)"#);
    assert_eq!(s.value(), "a\tb\"c\\(x + 1)");
}

#[test]
fn one_dimensional_arrays() {
    let ExprKind::Array1d(elems) = kind("[1: a, 2: b]") else {
        panic!("expected an array");
    };
    assert_eq!(elems.len(), 2);
    assert!(elems.iter().all(|e| e.index.is_some()));

    let ExprKind::Array1d(elems) = kind("[3: a, b, c]") else {
        panic!("expected an array");
    };
    assert!(elems[0].index.is_some() && elems[1].index.is_none());

    assert!(matches!(kind("[]"), ExprKind::Array1d(v) if v.is_empty()));
    assert!(matches!(kind("[1, 2,]"), ExprKind::Array1d(v) if v.len() == 2));
}

#[test]
fn two_dimensional_arrays() {
    let ExprKind::Array2d(arr) = kind("[| 1, 2 | 3, 4 |]") else {
        panic!("expected a 2-D array");
    };
    assert!(arr.col_index.is_empty());
    assert_eq!(arr.rows.len(), 2);
    assert!(arr.rows.iter().all(|r| r.index.is_none() && r.values.len() == 2));

    let ExprKind::Array2d(arr) = kind("[| a: b: c: | x: 1, 2, 3 | y: 4, 5, 6 |]") else {
        panic!("expected a 2-D array");
    };
    assert_eq!(arr.col_index.len(), 3);
    assert!(arr.rows.iter().all(|r| r.index.is_some()));

    let ExprKind::Array2d(arr) = kind("[| x: 1 | y: 2 |]") else {
        panic!("expected a 2-D array");
    };
    assert!(arr.col_index.is_empty());
    assert_eq!(arr.rows.len(), 2);

    let ExprKind::Array2d(arr) = kind("[| a: | 1 | 2 |]") else {
        panic!("expected a 2-D array");
    };
    assert_eq!(arr.col_index.len(), 1);
    assert!(arr.rows.iter().all(|r| r.index.is_none()));

    assert!(matches!(kind("[||]"), ExprKind::Array2d(a) if a.rows.is_empty()));
    let ExprKind::Array2d(arr) = kind("[| a: b: ||]") else {
        panic!("expected a 2-D array");
    };
    assert_eq!((arr.col_index.len(), arr.rows.len()), (2, 0));
}

#[test]
fn ragged_two_dimensional_arrays_are_rejected() {
    assert!(parse_expr("[| 1, 2 | 3 |]").is_err());
    assert!(parse_expr("[| a: b: | 1 | 2 |]").is_err());
}

#[test]
fn three_dimensional_arrays_infer_their_shape() {
    let ExprKind::Array3d(arr) = kind("[| |1, 2|3, 4|, |5, 6|7, 8| |]") else {
        panic!("expected a 3-D array");
    };
    assert_eq!(arr.dims, [2, 2, 2]);
    assert_eq!(arr.elems.len(), 8);

    let ExprKind::Array3d(arr) = kind("[| |1, 2, 3|4, 5, 6| |]") else {
        panic!("expected a 3-D array");
    };
    assert_eq!(arr.dims, [1, 2, 3]);

    let ExprKind::Array3d(arr) = kind("[| || |]") else {
        panic!("expected a 3-D array");
    };
    assert_eq!(arr.dims, [0, 0, 0]);
    assert!(arr.elems.is_empty());
    assert_eq!(parse_expr("[| || |]").unwrap().minimal(), "[||||]");

    assert!(parse_expr("[| |1, 2|3| |]").is_err());
    assert!(parse_expr("[| |1|, |2|3| |]").is_err());
}

#[test]
fn tuples_records_and_plain_parens() {
    assert!(matches!(kind("(1)"), ExprKind::Lit(Lit::Int(1))));
    assert!(matches!(kind("(1,)"), ExprKind::Tuple(v) if v.len() == 1));
    assert!(matches!(kind("(1, 2)"), ExprKind::Tuple(v) if v.len() == 2));
    let ExprKind::Record(fields) = kind("(a: 1, b: 2.0)") else {
        panic!("expected a record");
    };
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.text.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(parse_expr("(1,)").unwrap().minimal(), "(1,)");
}

#[test]
fn anonymous_enum_constructor_is_a_call_on_underscore() {
    let ExprKind::Call { name, args } = kind("_(1..3)") else {
        panic!("expected a call");
    };
    assert_eq!(name.text, "_");
    assert!(matches!(args[0].kind, ExprKind::Range { .. }));
    assert_eq!(parse_expr("_(1..3)").unwrap().minimal(), "_(1..3)");
    assert!(matches!(kind("_"), ExprKind::Anon));
    assert!(matches!(kind("[_, 1]"), ExprKind::Array1d(v) if v.len() == 2));
}

#[test]
fn tuple_access_splits_float_shaped_indices() {
    let ExprKind::Field { base, field } = kind("t.1.2") else {
        panic!("expected a field access");
    };
    assert!(matches!(field, Field::Index(2)));
    assert!(matches!(base.kind, ExprKind::Field { field: Field::Index(1), .. }));
    assert_eq!(parse_expr("t.1.2").unwrap().minimal(), "t.1.2");
    assert!(matches!(kind("r.name"), ExprKind::Field { field: Field::Name(_), .. }));
}

#[test]
fn generator_call_is_sugar_for_a_comprehension_argument() {
    let sugar = parse_expr("forall(i in 1..3)(x[i] > 0)").unwrap();
    assert!(matches!(sugar.kind, ExprKind::GenCall { .. }));
    let plain = parse_expr("forall([x[i] > 0 | i in 1..3])").unwrap();
    assert!(matches!(plain.kind, ExprKind::Call { .. }));
    assert_eq!(sugar, plain);
    assert_ne!(sugar, parse_expr("exists([x[i] > 0 | i in 1..3])").unwrap());
}

#[test]
fn call_arguments_that_look_like_generators() {
    let ExprKind::Call { args, .. } = kind("f(x in S)") else {
        panic!("expected a call");
    };
    assert_eq!(args.len(), 1);
    assert!(matches!(kind("f(a, b)"), ExprKind::Call { args, .. } if args.len() == 2));
}

#[test]
fn comprehensions() {
    let ExprKind::Comprehension {
        kind: comp,
        generators,
        ..
    } = kind("[i + j | i in 1..3, j in 1..3 where i < j]")
    else {
        panic!("expected a comprehension");
    };
    assert_eq!(comp, CompKind::Array);
    assert_eq!(generators.len(), 2);
    assert!(generators[0].where_.is_none());
    assert!(generators[1].where_.is_some());

    let ExprKind::Comprehension {
        kind: comp,
        generators,
        ..
    } = kind("{i | i, j in S}")
    else {
        panic!("expected a comprehension");
    };
    assert_eq!(comp, CompKind::Set);
    assert_eq!(generators[0].names.len(), 2);
}

#[test]
fn let_and_if() {
    let ExprKind::Let { items, .. } = kind("let { int: a = 1; var int: b, constraint b > a } in a + b")
    else {
        panic!("expected a let");
    };
    assert!(matches!(
        items.as_slice(),
        [LetItem::Declare(_), LetItem::Declare(_), LetItem::Constraint(_)]
    ));

    let ExprKind::If { branches, else_ } = kind("if a then 1 elseif b then 2 else 3 endif")
    else {
        panic!("expected an if");
    };
    assert_eq!(branches.len(), 2);
    assert!(else_.is_some());
    assert!(matches!(kind("if a then 1 endif"), ExprKind::If { else_: None, .. }));
}

#[test]
fn let_extends_as_far_right_as_possible() {
    let e: Expr = parse_expr("1 + let { int: a = 1 } in a * 2").unwrap();
    assert_eq!(e.minimal(), "1+(let{int:a=1;}in a*2)");
}
