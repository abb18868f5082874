use mzn_ast::ast::{DeclKind, EnumCases, ExprKind, Inst, Item, SolveMethod, TypeBase};
use mzn_ast::Render;
use mzn_parse::{parse_item, parse_str, parse_type};
use pretty_assertions::assert_eq;

fn declare(src: &str) -> mzn_ast::ast::Declare {
    match parse_item(src).unwrap() {
        Item::Declare(d) => d,
        other => panic!("expected a declaration, got {other:?}"),
    }
}

#[test]
fn declaration_kinds_follow_the_type() {
    assert_eq!(declare("int: n;").kind, DeclKind::Parameter);
    assert_eq!(declare("var 1..3: x;").kind, DeclKind::Variable);
    assert_eq!(declare("array[1..3] of var int: xs;").kind, DeclKind::Variable);
    assert_eq!(declare("par set of int: s = {};").kind, DeclKind::Parameter);
    assert!(declare("int: n = 3;").has_initializer());
    assert!(!declare("int: n;").has_initializer());
}

#[test]
fn function_like_declarations() {
    let f = declare("function var int: f(var int: x, int) :: promise_total = x + 1;");
    assert_eq!(f.kind, DeclKind::Function);
    assert!(f.ty.is_some());
    let params = f.params.unwrap();
    assert_eq!(params.len(), 2);
    assert!(params[1].name.is_none());
    assert_eq!(f.anns.len(), 1);
    assert!(f.body.is_some());

    let p = declare("predicate p(var bool: b);");
    assert_eq!(p.kind, DeclKind::Predicate);
    assert!(p.ty.is_none() && p.body.is_none());

    assert_eq!(declare("test t() = true;").kind, DeclKind::Test);
    let a = declare("annotation bare;");
    assert_eq!(a.kind, DeclKind::Annotation);
    assert!(a.params.is_none());
}

#[test]
fn enum_declarations() {
    let e = declare("enum E = {A, B} ++ C(1..2) ++ _(1..3) ++ anon_enum(4);");
    let cases = e.cases.unwrap();
    assert!(matches!(
        cases.as_slice(),
        [
            EnumCases::Names(_),
            EnumCases::Constructor { .. },
            EnumCases::Anon(_),
            EnumCases::AnonEnum(_)
        ]
    ));
    let pending = declare("enum Later;");
    assert!(pending.cases.is_none());
    assert!(!pending.has_initializer());
}

#[test]
fn type_alias_and_type_insts() {
    let alias = declare("type Cell = tuple(int, var bool);");
    assert_eq!(alias.kind, DeclKind::TypeAlias);
    assert!(matches!(alias.ty.map(|t| t.base), Some(TypeBase::Tuple(v)) if v.len() == 2));

    let ty = parse_type("var opt 1..n").unwrap();
    assert_eq!(ty.inst, Inst::Var);
    assert!(ty.opt);
    assert!(matches!(ty.base, TypeBase::Expr(_)));

    assert!(matches!(parse_type("Colour").unwrap().base, TypeBase::Named(_)));
    assert!(matches!(
        parse_type("array[int, Colour] of float").unwrap().base,
        TypeBase::Array { ref dims, .. } if dims.len() == 2
    ));
    assert!(matches!(
        parse_type("record(int: a, bool: b)").unwrap().base,
        TypeBase::Record(ref f) if f.len() == 2
    ));
    assert!(matches!(
        parse_type("$$E").unwrap().base,
        TypeBase::Named(ref id) if id.text == "$$E"
    ));
    assert!(matches!(parse_type("A ++ B").unwrap().base, TypeBase::Concat(ref v) if v.len() == 2));
}

#[test]
fn solve_items() {
    let Item::Solve(s) = parse_item("solve satisfy;").unwrap() else {
        panic!("expected solve");
    };
    assert_eq!(s.goal.method(), SolveMethod::Satisfy);

    let Item::Solve(s) = parse_item("solve :: a maximize obj :: b;").unwrap() else {
        panic!("expected solve");
    };
    assert_eq!(s.goal.method(), SolveMethod::Maximize);
    assert_eq!(s.anns.len(), 2);
    assert!(s.goal.objective().unwrap().anns.is_empty());
}

#[test]
fn output_items() {
    let Item::Output(o) = parse_item("output :: \"json\" [\"x = \", show(x)];").unwrap() else {
        panic!("expected output");
    };
    assert_eq!(o.anns.len(), 1);
    assert_eq!(o.exprs().len(), 2);
}

#[test]
fn assignments_and_quoted_names() {
    let Item::Assign(a) = parse_item("'a b' = 3;").unwrap() else {
        panic!("expected an assignment");
    };
    assert_eq!(a.name.text, "a b");
    assert_eq!(Item::Assign(a).minimal(), "'a b'=3;");
    assert!(matches!(
        parse_item("x = y = z;"),
        Ok(Item::Assign(a)) if matches!(a.value.kind, ExprKind::Binary { .. })
    ));
}

#[test]
fn separators_are_lenient_at_the_edges() {
    let m = parse_str("<mem>", ";; int: a = 1;; int: b = 2").unwrap();
    assert_eq!(m.items.len(), 2);
    assert!(parse_str("<mem>", "").unwrap().items.is_empty());
    assert!(parse_str("<mem>", "% only a comment\n").unwrap().items.is_empty());
}
