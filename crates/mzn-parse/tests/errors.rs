use mzn_parse::{parse_expr, parse_item, parse_str};

fn err(src: &str) -> String {
    parse_str("<mem>", src).unwrap_err().to_string()
}

#[test]
fn missing_semicolon_names_the_position() {
    let e = err("int: a = 1 int: b = 2;");
    assert!(e.starts_with("<mem>:1:12:"), "{e}");
    assert!(e.contains("expected `;`"), "{e}");
    assert!(e.contains("found `int`"), "{e}");
}

#[test]
fn missing_expression() {
    assert!(err("constraint ;").contains("expected expression"));
    assert!(err("x = 1 +;").contains("expected expression"));
}

#[test]
fn bad_solve_goal() {
    let e = err("solve quickly;");
    assert!(e.contains("`satisfy`, `minimize` or `maximize`"), "{e}");
}

#[test]
fn lexer_errors_surface_in_the_parser() {
    let e = err("int: x = 99999999999999999999;");
    assert!(e.contains("lexer error"), "{e}");
    assert!(e.contains("malformed"), "{e}");

    let e = err("int: a;\nstring: s = \"abc");
    assert!(e.starts_with("<mem>:2:13:"), "{e}");
    assert!(e.contains("unterminated string"), "{e}");
}

#[test]
fn single_unit_entry_points_reject_trailing_input() {
    assert!(parse_expr("1 2").is_err());
    assert!(parse_item("int: a; int: b;").is_err());
    assert!(parse_item("int: a").is_ok());
}

#[test]
fn one_bad_item_fails_the_whole_unit() {
    assert!(parse_str("<mem>", "int: a = 1; int b; int: c = 3;").is_err());
}

#[test]
fn unbalanced_delimiters() {
    assert!(parse_expr("(1, 2").is_err());
    assert!(parse_expr("[1, 2").is_err());
    assert!(parse_expr("{1 | }").is_err());
    assert!(parse_expr("if a then b").is_err());
    assert!(parse_expr("let { int: a = 1 in a").is_err());
}

#[test]
fn tuple_index_must_be_a_plain_number() {
    let e = parse_expr("t.1e3").unwrap_err().to_string();
    assert!(e.contains("invalid tuple index"), "{e}");
}

#[test]
fn tuple_and_record_elements_cannot_mix() {
    let e = parse_expr("(1, b: 2)").unwrap_err().to_string();
    assert!(e.contains("record fields must all be named"), "{e}");
    assert!(e.starts_with("<expr>:1:5:"), "{e}");

    let e = parse_expr("(a: 1, 2)").unwrap_err().to_string();
    assert!(e.contains("record fields must all be named"), "{e}");
    assert!(parse_expr("(a: 1, b: 2,)").is_ok());
}
