//! Structural equality. Spans never take part. Variants without a dedicated
//! rule compare by their minimal rendering.

use crate::ast::{CompKind, Declare, Expr, ExprKind, Field, Generator, Ident, Item, Model, TypeInst};
use crate::write::Render;

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Field::Index(a), Field::Index(b)) => a == b,
            (Field::Name(a), Field::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if self.anns != other.anns {
            return false;
        }
        match (&self.kind, &other.kind) {
            (ExprKind::Lit(a), ExprKind::Lit(b)) => a == b,
            (ExprKind::Ident(a), ExprKind::Ident(b)) => a == b,
            (ExprKind::Anon, ExprKind::Anon) => true,
            (
                ExprKind::Call { name: n1, args: a1 },
                ExprKind::Call { name: n2, args: a2 },
            ) => n1 == n2 && a1 == a2,
            (
                ExprKind::Access {
                    base: b1,
                    indices: i1,
                },
                ExprKind::Access {
                    base: b2,
                    indices: i2,
                },
            ) => b1 == b2 && i1 == i2,
            (
                ExprKind::Field {
                    base: b1,
                    field: f1,
                },
                ExprKind::Field {
                    base: b2,
                    field: f2,
                },
            ) => b1 == b2 && f1 == f2,
            (ExprKind::Unary { op: o1, expr: e1 }, ExprKind::Unary { op: o2, expr: e2 }) => {
                o1 == o2 && e1 == e2
            }
            (
                ExprKind::Binary {
                    lhs: l1,
                    op: o1,
                    rhs: r1,
                },
                ExprKind::Binary {
                    lhs: l2,
                    op: o2,
                    rhs: r2,
                },
            ) => o1 == o2 && l1 == l2 && r1 == r2,
            (ExprKind::Range { lo: l1, hi: h1 }, ExprKind::Range { lo: l2, hi: h2 }) => {
                l1 == l2 && h1 == h2
            }
            (ExprKind::Set(a), ExprKind::Set(b)) | (ExprKind::Tuple(a), ExprKind::Tuple(b)) => {
                a == b
            }
            (
                ExprKind::GenCall {
                    name,
                    generators,
                    body,
                },
                ExprKind::Call {
                    name: call_name,
                    args,
                },
            )
            | (
                ExprKind::Call {
                    name: call_name,
                    args,
                },
                ExprKind::GenCall {
                    name,
                    generators,
                    body,
                },
            ) => gen_call_matches(name, generators, body, call_name, args),
            _ => self.minimal() == other.minimal(),
        }
    }
}

/// `f(i in S)(e)` is sugar for `f([e | i in S])`.
fn gen_call_matches(
    name: &Ident,
    generators: &[Generator],
    body: &Expr,
    call_name: &Ident,
    args: &[Expr],
) -> bool {
    if name != call_name {
        return false;
    }
    let [arg] = args else {
        return false;
    };
    match &arg.kind {
        ExprKind::Comprehension {
            kind: CompKind::Array,
            body: comp_body,
            generators: comp_gens,
        } => arg.anns.is_empty() && **comp_body == *body && comp_gens.as_slice() == generators,
        _ => false,
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

macro_rules! eq_by_minimal_text {
    ($($ty:ty),*) => {
        $(impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.minimal() == other.minimal()
            }
        })*
    };
}

eq_by_minimal_text!(Item, Declare, TypeInst);

#[cfg(test)]
mod tests {
    use crate::ast::{BinOp, CompKind, Generator, Ident};
    use crate::build;

    #[test]
    fn spans_do_not_affect_equality() {
        let mut a = build::ident("x");
        let b = build::ident("x");
        a.span.start = 10;
        a.span.end = 11;
        assert_eq!(a, b);
    }

    #[test]
    fn gen_call_equals_call_over_comprehension() {
        let gen = Generator {
            names: vec![Ident::new("i")],
            source: build::range(Some(build::int(1)), Some(build::ident("n"))),
            where_: None,
        };
        let body = build::binary(build::ident("i"), BinOp::Gt, build::int(0));
        let sugar = build::gen_call("forall", vec![gen.clone()], body.clone());
        let plain = build::call(
            "forall",
            vec![build::comprehension(CompKind::Array, body, vec![gen])],
        );
        assert_eq!(sugar, plain);
        assert_eq!(plain, sugar);
    }

    #[test]
    fn fallback_compares_rendered_text() {
        let a = build::array(vec![build::int(1), build::int(2)]);
        let b = build::array(vec![build::int(1), build::int(2)]);
        let c = build::array(vec![build::int(2), build::int(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
