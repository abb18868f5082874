use crate::lexer::{tokenize, LexerConfig};
use crate::token::{Tok, TokKind};
use anyhow::{bail, Result};
use mzn_ast::ast::{
    Array2d, Array2dRow, Array3d, ArrayElem, Assign, Assoc, BinOp, CompKind, Constraint, DeclKind,
    Declare, EnumCases, Expr, ExprKind, Field, Generator, Ident, IfBranch, Include, Inst, Item,
    LetItem, Lit, Model, Output, Param, Prim, Solve, SolveGoal, StrLit, TypeBase, TypeInst, UnOp,
    RANGE_PRECEDENCE,
};
use mzn_ast::span::Span;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Maximum nesting of expressions and type-insts. Deeper input is rejected
/// instead of risking a stack overflow in the recursive descent.
const MAX_DEPTH: usize = 128;

/// Parse a whole model or data file.
pub fn parse_str(file: &str, src: &str) -> Result<Model> {
    debug!(file, bytes = src.len(), "parsing model");
    let mut p = Parser::new(file, src)?;
    let model = p.parse_model()?;
    debug!(file, items = model.items.len(), "parsed model");
    Ok(model)
}

/// Parse a single item; the trailing `;` is optional.
pub fn parse_item(src: &str) -> Result<Item> {
    let mut p = Parser::new("<item>", src)?;
    let item = p.parse_item()?;
    p.eat(&TokKind::Semicolon);
    p.expect_eof()?;
    Ok(item)
}

pub fn parse_expr(src: &str) -> Result<Expr> {
    let mut p = Parser::new("<expr>", src)?;
    let e = p.parse_expr()?;
    p.expect_eof()?;
    Ok(e)
}

pub fn parse_type(src: &str) -> Result<TypeInst> {
    let mut p = Parser::new("<type>", src)?;
    let ty = p.parse_type_inst()?;
    p.expect_eof()?;
    Ok(ty)
}

struct Parser<'a> {
    file: &'a str,
    src: &'a str,
    toks: Vec<Tok>,
    pos: usize,
    depth: usize,
    /// Token positions where a generator call head was tried and failed.
    not_gen_heads: HashSet<usize>,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, src: &'a str) -> Result<Self> {
        let toks: Vec<Tok> = tokenize(src, LexerConfig::default())
            .into_iter()
            .filter(|t| !t.kind.is_comment())
            .collect();
        if let Some(bad) = toks
            .iter()
            .find(|t| matches!(t.kind, TokKind::Error { .. }))
        {
            bail!(
                "{file}:{}:{}: lexer error: {}",
                bad.span.line,
                bad.span.col,
                bad.kind
            );
        }
        Ok(Self {
            file,
            src,
            toks,
            pos: 0,
            depth: 0,
            not_gen_heads: HashSet::new(),
        })
    }

    // ======= token cursor =======

    fn cur(&self) -> &Tok {
        &self.toks[self.pos.min(self.toks.len() - 1)]
    }

    fn kind(&self) -> &TokKind {
        &self.cur().kind
    }

    fn peek(&self, n: usize) -> &TokKind {
        &self.toks[(self.pos + n).min(self.toks.len() - 1)].kind
    }

    fn bump(&mut self) {
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
    }

    fn at(&self, k: &TokKind) -> bool {
        self.kind() == k
    }

    fn eat(&mut self, k: &TokKind) -> bool {
        if self.at(k) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, k: &TokKind) -> Result<Span> {
        if self.at(k) {
            let span = self.cur().span;
            self.bump();
            Ok(span)
        } else {
            self.err(&k.to_string())
        }
    }

    fn expect_eof(&self) -> Result<()> {
        if self.at(&TokKind::Eof) {
            Ok(())
        } else {
            self.err("end of input")
        }
    }

    fn err<T>(&self, expected: &str) -> Result<T> {
        let tok = self.cur();
        bail!(
            "{}:{}:{}: expected {expected}, found {}",
            self.file,
            tok.span.line,
            tok.span.col,
            tok.kind
        )
    }

    fn err_at<T>(&self, span: Span, msg: &str) -> Result<T> {
        bail!("{}:{}:{}: {msg}", self.file, span.line, span.col)
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.toks.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.prev_span())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let span = self.cur().span;
            return self.err_at(
                span,
                &format!("maximum nesting depth of {MAX_DEPTH} exceeded"),
            );
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ======= model / items =======

    fn parse_model(&mut self) -> Result<Model> {
        let start = self.cur().span;
        let mut items = Vec::new();
        loop {
            while self.eat(&TokKind::Semicolon) {}
            if self.at(&TokKind::Eof) {
                break;
            }
            let item = self.parse_item()?;
            trace!(
                line = item.span().line,
                name = item.name().unwrap_or(""),
                "parsed item"
            );
            items.push(item);
            if !self.eat(&TokKind::Semicolon) && !self.at(&TokKind::Eof) {
                return self.err("`;`");
            }
        }
        Ok(Model {
            items,
            span: self.span_from(start),
        })
    }

    fn parse_item(&mut self) -> Result<Item> {
        let start = self.cur().span;
        let item = match self.kind() {
            TokKind::KwInclude => {
                self.bump();
                let path = self.parse_str_lit()?;
                Item::Include(Include {
                    path,
                    span: self.span_from(start),
                })
            }
            TokKind::KwConstraint => {
                self.bump();
                let expr = self.parse_expr()?;
                Item::Constraint(Constraint {
                    expr,
                    span: self.span_from(start),
                })
            }
            TokKind::KwSolve => Item::Solve(self.parse_solve()?),
            TokKind::KwOutput => {
                self.bump();
                let anns = self.parse_anns()?;
                let expr = self.parse_expr()?;
                Item::Output(Output {
                    expr,
                    anns,
                    span: self.span_from(start),
                })
            }
            TokKind::KwEnum => Item::Declare(self.parse_enum()?),
            TokKind::KwType => Item::Declare(self.parse_type_alias()?),
            TokKind::KwFunction
            | TokKind::KwPredicate
            | TokKind::KwTest
            | TokKind::KwAnnotation => Item::Declare(self.parse_function()?),
            _ if self.at_assign() => Item::Assign(self.parse_assign()?),
            _ => Item::Declare(self.parse_var_decl()?),
        };
        Ok(item)
    }

    fn at_assign(&self) -> bool {
        matches!(self.kind(), TokKind::Ident(_) | TokKind::QuotedIdent(_))
            && self.peek(1) == &TokKind::Eq
    }

    fn parse_assign(&mut self) -> Result<Assign> {
        let start = self.cur().span;
        let name = self.parse_ident()?;
        self.expect(&TokKind::Eq)?;
        let value = self.parse_expr()?;
        Ok(Assign {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_solve(&mut self) -> Result<Solve> {
        let start = self.cur().span;
        self.expect(&TokKind::KwSolve)?;
        let mut anns = self.parse_anns()?;
        let goal = match self.kind() {
            TokKind::KwSatisfy => {
                self.bump();
                SolveGoal::Satisfy
            }
            TokKind::KwMinimize => {
                self.bump();
                SolveGoal::Minimize(self.objective(&mut anns)?)
            }
            TokKind::KwMaximize => {
                self.bump();
                SolveGoal::Maximize(self.objective(&mut anns)?)
            }
            _ => return self.err("`satisfy`, `minimize` or `maximize`"),
        };
        anns.extend(self.parse_anns()?);
        Ok(Solve {
            goal,
            anns,
            span: self.span_from(start),
        })
    }

    /// Objective expression; annotations trailing it belong to the solve item.
    fn objective(&mut self, anns: &mut Vec<Expr>) -> Result<Expr> {
        let mut e = self.parse_expr()?;
        anns.append(&mut e.anns);
        Ok(e)
    }

    fn parse_anns(&mut self) -> Result<Vec<Expr>> {
        let mut anns = Vec::new();
        while self.eat(&TokKind::ColonColon) {
            anns.push(self.parse_postfix(false)?);
        }
        Ok(anns)
    }

    fn parse_enum(&mut self) -> Result<Declare> {
        let start = self.cur().span;
        self.expect(&TokKind::KwEnum)?;
        let name = self.parse_ident()?;
        let anns = self.parse_anns()?;
        let cases = if self.eat(&TokKind::Eq) {
            let mut groups = vec![self.parse_enum_cases()?];
            while self.eat(&TokKind::PlusPlus) {
                groups.push(self.parse_enum_cases()?);
            }
            Some(groups)
        } else {
            None
        };
        Ok(Declare {
            kind: DeclKind::Enum,
            name,
            ty: None,
            params: None,
            cases,
            body: None,
            anns,
            span: self.span_from(start),
        })
    }

    fn parse_enum_cases(&mut self) -> Result<EnumCases> {
        match self.kind() {
            TokKind::LBrace => {
                self.bump();
                let mut names = Vec::new();
                loop {
                    if self.eat(&TokKind::RBrace) {
                        break;
                    }
                    names.push(self.parse_ident()?);
                    if !self.eat(&TokKind::Comma) {
                        self.expect(&TokKind::RBrace)?;
                        break;
                    }
                }
                Ok(EnumCases::Names(names))
            }
            TokKind::Underscore => {
                self.bump();
                Ok(EnumCases::Anon(self.parse_paren_arg()?))
            }
            TokKind::Ident(name) if name == "anon_enum" => {
                self.bump();
                Ok(EnumCases::AnonEnum(self.parse_paren_arg()?))
            }
            TokKind::Ident(_) | TokKind::QuotedIdent(_) => {
                let name = self.parse_ident()?;
                let arg = self.parse_paren_arg()?;
                Ok(EnumCases::Constructor { name, arg })
            }
            _ => self.err("enum cases"),
        }
    }

    /// `( expr )`
    fn parse_paren_arg(&mut self) -> Result<Expr> {
        self.expect(&TokKind::LParen)?;
        let e = self.parse_expr()?;
        self.expect(&TokKind::RParen)?;
        Ok(e)
    }

    fn parse_type_alias(&mut self) -> Result<Declare> {
        let start = self.cur().span;
        self.expect(&TokKind::KwType)?;
        let name = self.parse_ident()?;
        let anns = self.parse_anns()?;
        self.expect(&TokKind::Eq)?;
        let ty = self.parse_type_inst()?;
        Ok(Declare {
            kind: DeclKind::TypeAlias,
            name,
            ty: Some(ty),
            params: None,
            cases: None,
            body: None,
            anns,
            span: self.span_from(start),
        })
    }

    fn parse_function(&mut self) -> Result<Declare> {
        let start = self.cur().span;
        let kind = match self.kind() {
            TokKind::KwFunction => DeclKind::Function,
            TokKind::KwPredicate => DeclKind::Predicate,
            TokKind::KwTest => DeclKind::Test,
            _ => DeclKind::Annotation,
        };
        self.bump();
        let ty = if kind == DeclKind::Function {
            let ty = self.parse_type_inst()?;
            self.expect(&TokKind::Colon)?;
            Some(ty)
        } else {
            None
        };
        let name = self.parse_ident()?;
        let params = if self.at(&TokKind::LParen) {
            Some(self.parse_params()?)
        } else {
            None
        };
        let anns = self.parse_anns()?;
        let body = if self.eat(&TokKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Declare {
            kind,
            name,
            ty,
            params,
            cases: None,
            body,
            anns,
            span: self.span_from(start),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.expect(&TokKind::LParen)?;
        let mut params = Vec::new();
        loop {
            if self.eat(&TokKind::RParen) {
                break;
            }
            let start = self.cur().span;
            let ty = self.parse_type_inst()?;
            let name = if self.eat(&TokKind::Colon) {
                Some(self.parse_ident()?)
            } else {
                None
            };
            params.push(Param {
                ty,
                name,
                span: self.span_from(start),
            });
            if !self.eat(&TokKind::Comma) {
                self.expect(&TokKind::RParen)?;
                break;
            }
        }
        Ok(params)
    }

    /// `ti: name [:: ann]* [= expr]`
    fn parse_var_decl(&mut self) -> Result<Declare> {
        let start = self.cur().span;
        let ty = self.parse_type_inst()?;
        self.expect(&TokKind::Colon)?;
        let name = self.parse_ident()?;
        let anns = self.parse_anns()?;
        let body = if self.eat(&TokKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let kind = if is_var_type(&ty) {
            DeclKind::Variable
        } else {
            DeclKind::Parameter
        };
        Ok(Declare {
            kind,
            name,
            ty: Some(ty),
            params: None,
            cases: None,
            body,
            anns,
            span: self.span_from(start),
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        match self.kind() {
            TokKind::Ident(s) | TokKind::QuotedIdent(s) => {
                let id = Ident {
                    text: s.clone(),
                    span: self.cur().span,
                };
                self.bump();
                Ok(id)
            }
            _ => self.err("identifier"),
        }
    }

    fn parse_str_lit(&mut self) -> Result<StrLit> {
        match self.kind() {
            TokKind::Str(raw) => {
                let lit = StrLit::from_raw(raw.clone());
                self.bump();
                Ok(lit)
            }
            _ => self.err("string literal"),
        }
    }

    // ======= types =======

    fn parse_type_inst(&mut self) -> Result<TypeInst> {
        self.enter()?;
        let ty = self.type_inst();
        self.leave();
        ty
    }

    fn type_inst(&mut self) -> Result<TypeInst> {
        let start = self.cur().span;
        let first = self.type_inst_part()?;
        if !self.at(&TokKind::PlusPlus) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat(&TokKind::PlusPlus) {
            parts.push(self.type_inst_part()?);
        }
        Ok(TypeInst {
            inst: Inst::Implicit,
            opt: false,
            base: TypeBase::Concat(parts),
            span: self.span_from(start),
        })
    }

    fn type_inst_part(&mut self) -> Result<TypeInst> {
        let start = self.cur().span;
        let inst = if self.eat(&TokKind::KwVar) {
            Inst::Var
        } else if self.eat(&TokKind::KwPar) {
            Inst::Par
        } else {
            Inst::Implicit
        };
        let opt = self.eat(&TokKind::KwOpt);
        let base = match self.kind() {
            TokKind::KwInt => self.prim(Prim::Int),
            TokKind::KwBool => self.prim(Prim::Bool),
            TokKind::KwFloat => self.prim(Prim::Float),
            TokKind::KwString => self.prim(Prim::String),
            TokKind::KwAnn => self.prim(Prim::Ann),
            TokKind::KwAny => self.prim(Prim::Any),
            TokKind::KwArray => {
                self.bump();
                self.expect(&TokKind::LBracket)?;
                let mut dims = vec![self.parse_type_inst()?];
                while self.eat(&TokKind::Comma) {
                    dims.push(self.parse_type_inst()?);
                }
                self.expect(&TokKind::RBracket)?;
                self.expect(&TokKind::KwOf)?;
                TypeBase::Array {
                    dims,
                    elem: Box::new(self.parse_type_inst()?),
                }
            }
            TokKind::KwList => {
                self.bump();
                self.expect(&TokKind::KwOf)?;
                TypeBase::List(Box::new(self.parse_type_inst()?))
            }
            TokKind::KwSet => {
                self.bump();
                self.expect(&TokKind::KwOf)?;
                TypeBase::Set(Box::new(self.parse_type_inst()?))
            }
            TokKind::KwTuple => {
                self.bump();
                self.expect(&TokKind::LParen)?;
                let mut fields = vec![self.parse_type_inst()?];
                while self.eat(&TokKind::Comma) {
                    fields.push(self.parse_type_inst()?);
                }
                self.expect(&TokKind::RParen)?;
                TypeBase::Tuple(fields)
            }
            TokKind::KwRecord => {
                self.bump();
                self.expect(&TokKind::LParen)?;
                let mut fields = Vec::new();
                loop {
                    let ty = self.parse_type_inst()?;
                    self.expect(&TokKind::Colon)?;
                    fields.push((self.parse_ident()?, ty));
                    if !self.eat(&TokKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokKind::RParen)?;
                TypeBase::Record(fields)
            }
            TokKind::PolyIdent(name) => {
                let id = Ident {
                    text: name.clone(),
                    span: self.cur().span,
                };
                self.bump();
                TypeBase::Named(id)
            }
            TokKind::Ident(_) | TokKind::QuotedIdent(_) if self.named_type_follows() => {
                TypeBase::Named(self.parse_ident()?)
            }
            _ => TypeBase::Expr(Box::new(self.parse_expr()?)),
        };
        Ok(TypeInst {
            inst,
            opt,
            base,
            span: self.span_from(start),
        })
    }

    fn prim(&mut self, p: Prim) -> TypeBase {
        self.bump();
        TypeBase::Prim(p)
    }

    /// An identifier is a type name unless it starts an expression such as
    /// `lo..hi`.
    fn named_type_follows(&self) -> bool {
        matches!(
            self.peek(1),
            TokKind::Colon
                | TokKind::Comma
                | TokKind::RBracket
                | TokKind::RParen
                | TokKind::Eq
                | TokKind::Semicolon
                | TokKind::ColonColon
                | TokKind::PlusPlus
                | TokKind::KwOf
                | TokKind::Eof
        )
    }

    // ======= expressions =======

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_prec(u16::MAX)
    }

    /// Precedence climbing over binary operators whose level is at most `max`.
    fn parse_expr_prec(&mut self, max: u16) -> Result<Expr> {
        self.enter()?;
        let e = self.expr_prec(max);
        self.leave();
        e
    }

    fn expr_prec(&mut self, max: u16) -> Result<Expr> {
        let start = self.cur().span;
        let mut lhs = self.parse_unary()?;
        let mut non_assoc: Option<u16> = None;
        loop {
            if self.at(&TokKind::DotDot) {
                if RANGE_PRECEDENCE > max {
                    break;
                }
                if non_assoc == Some(RANGE_PRECEDENCE) {
                    return self.err_at(self.cur().span, "`..` is not associative");
                }
                self.bump();
                let hi = self.range_bound()?;
                lhs = Expr::new(
                    ExprKind::Range {
                        lo: Some(Box::new(lhs)),
                        hi,
                    },
                    self.span_from(start),
                );
                non_assoc = Some(RANGE_PRECEDENCE);
                continue;
            }

            let Some(op) = binop(self.kind()) else {
                break;
            };
            let prec = op.precedence();
            if prec > max {
                break;
            }
            if non_assoc == Some(prec) {
                let msg = format!("`{}` is not associative", op.symbol());
                return self.err_at(self.cur().span, &msg);
            }
            self.bump();
            let assoc = op.assoc();
            let rhs_max = if assoc == Assoc::Right { prec } else { prec - 1 };
            let rhs = self.parse_expr_prec(rhs_max)?;
            non_assoc = (assoc == Assoc::None).then_some(prec);
            lhs = Expr::new(
                ExprKind::Binary {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                self.span_from(start),
            );
        }
        Ok(lhs)
    }

    /// Upper bound after `..`, absent when nothing that could start an
    /// expression follows.
    fn range_bound(&mut self) -> Result<Option<Box<Expr>>> {
        if !starts_expr(self.kind()) {
            return Ok(None);
        }
        Ok(Some(Box::new(self.parse_expr_prec(RANGE_PRECEDENCE - 1)?)))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.cur().span;
        let op = match self.kind() {
            TokKind::KwNot => UnOp::Not,
            TokKind::Minus => UnOp::Neg,
            TokKind::Plus => UnOp::Plus,
            _ => return self.parse_postfix(true),
        };
        self.bump();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                expr: Box::new(operand?),
            },
            self.span_from(start),
        ))
    }

    /// An atom followed by any `[...]` and `.field` suffixes, then (when
    /// `with_anns`) its `::` annotations.
    fn parse_postfix(&mut self, with_anns: bool) -> Result<Expr> {
        let start = self.cur().span;
        // `"sec" [..]` after `output ::` is an annotation then the body
        let literal_head = matches!(self.kind(), TokKind::Str(_));
        let mut e = self.parse_atom()?;
        while !literal_head {
            match self.kind() {
                TokKind::LBracket => {
                    self.bump();
                    let indices = self.parse_expr_list(&TokKind::RBracket)?;
                    e = Expr::new(
                        ExprKind::Access {
                            base: Box::new(e),
                            indices,
                        },
                        self.span_from(start),
                    );
                }
                TokKind::Dot => {
                    self.bump();
                    e = self.parse_field(e, start)?;
                }
                _ => break,
            }
        }
        if with_anns {
            while self.eat(&TokKind::ColonColon) {
                let ann = self.parse_postfix(false)?;
                e.anns.push(ann);
                e.span = self.span_from(start);
            }
        }
        Ok(e)
    }

    fn parse_field(&mut self, base: Expr, start: Span) -> Result<Expr> {
        let tok = self.cur().clone();
        let field = |base: Expr, field: Field, span: Span| {
            Expr::new(
                ExprKind::Field {
                    base: Box::new(base),
                    field,
                },
                span,
            )
        };
        match tok.kind {
            TokKind::Int(n) => {
                let Ok(index) = u32::try_from(n) else {
                    return self.err_at(tok.span, "tuple index out of range");
                };
                self.bump();
                Ok(field(base, Field::Index(index), self.span_from(start)))
            }
            TokKind::Float(_) => {
                // `t.1.2` lexes its indices as the float `1.2`
                let src = self.src;
                let text = src
                    .get(tok.span.start as usize..tok.span.end as usize)
                    .unwrap_or_default();
                self.bump();
                let span = self.span_from(start);
                let mut e = base;
                for part in text.split('.') {
                    let Ok(index) = part.parse::<u32>() else {
                        return self.err_at(tok.span, &format!("invalid tuple index `{text}`"));
                    };
                    e = field(e, Field::Index(index), span);
                }
                Ok(e)
            }
            TokKind::Ident(_) | TokKind::QuotedIdent(_) => {
                let name = self.parse_ident()?;
                Ok(field(base, Field::Name(name), self.span_from(start)))
            }
            _ => self.err("field index or name"),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let tok = self.cur().clone();
        let kind = match tok.kind {
            TokKind::Int(v) => ExprKind::Lit(Lit::Int(v)),
            TokKind::Float(v) => ExprKind::Lit(Lit::Float(v)),
            TokKind::Str(raw) => ExprKind::Lit(Lit::Str(StrLit::from_raw(raw))),
            TokKind::KwTrue => ExprKind::Lit(Lit::Bool(true)),
            TokKind::KwFalse => ExprKind::Lit(Lit::Bool(false)),
            TokKind::Empty => ExprKind::Lit(Lit::Empty),
            TokKind::Underscore if self.peek(1) == &TokKind::LParen => {
                // `_(1..3)`, the value of an anonymous enum
                self.bump();
                let arg = self.parse_paren_arg()?;
                let name = Ident {
                    text: "_".to_string(),
                    span: tok.span,
                };
                return Ok(Expr::new(
                    ExprKind::Call {
                        name,
                        args: vec![arg],
                    },
                    self.span_from(tok.span),
                ));
            }
            TokKind::Underscore => ExprKind::Anon,
            TokKind::DotDot => {
                self.bump();
                let hi = self.range_bound()?;
                return Ok(Expr::new(
                    ExprKind::Range { lo: None, hi },
                    self.span_from(tok.span),
                ));
            }
            TokKind::Ident(_) | TokKind::QuotedIdent(_) => return self.parse_ident_expr(),
            TokKind::LParen => return self.parse_paren(),
            TokKind::LBracket => return self.parse_bracket(),
            TokKind::LBrace => return self.parse_brace(),
            TokKind::KwIf => return self.parse_if(),
            TokKind::KwLet => return self.parse_let(),
            _ => return self.err("expression"),
        };
        self.bump();
        Ok(Expr::new(kind, tok.span))
    }

    /// Identifier, call `f(args)` or generator call `f(i in S)(body)`.
    fn parse_ident_expr(&mut self) -> Result<Expr> {
        let start = self.cur().span;
        let name = self.parse_ident()?;
        if !self.eat(&TokKind::LParen) {
            let span = name.span;
            return Ok(Expr::new(ExprKind::Ident(name), span));
        }
        if let Some(generators) = self.gen_call_head() {
            self.expect(&TokKind::LParen)?;
            let body = self.parse_expr()?;
            self.expect(&TokKind::RParen)?;
            return Ok(Expr::new(
                ExprKind::GenCall {
                    name,
                    generators,
                    body: Box::new(body),
                },
                self.span_from(start),
            ));
        }
        let args = self.parse_expr_list(&TokKind::RParen)?;
        Ok(Expr::new(ExprKind::Call { name, args }, self.span_from(start)))
    }

    /// Tries to read `gens )` followed by `(`; rewinds and yields `None`
    /// when the parenthesis holds ordinary call arguments. A failed head is
    /// remembered so nested calls are not retried on every rewind.
    fn gen_call_head(&mut self) -> Option<Vec<Generator>> {
        let looks_like_generator = matches!(self.kind(), TokKind::Ident(_) | TokKind::QuotedIdent(_))
            && matches!(self.peek(1), TokKind::KwIn | TokKind::Comma);
        if !looks_like_generator || self.not_gen_heads.contains(&self.pos) {
            return None;
        }
        let (pos, depth) = (self.pos, self.depth);
        if let Ok(generators) = self.parse_generators() {
            if self.eat(&TokKind::RParen) && self.at(&TokKind::LParen) {
                return Some(generators);
            }
        }
        trace!(pos, "not a generator call, rewinding");
        self.not_gen_heads.insert(pos);
        self.pos = pos;
        self.depth = depth;
        None
    }

    fn parse_generators(&mut self) -> Result<Vec<Generator>> {
        let mut generators = vec![self.parse_generator()?];
        while self.eat(&TokKind::Comma) {
            generators.push(self.parse_generator()?);
        }
        Ok(generators)
    }

    /// `a, b in source [where cond]`
    fn parse_generator(&mut self) -> Result<Generator> {
        let mut names = vec![self.parse_ident()?];
        while self.eat(&TokKind::Comma) {
            names.push(self.parse_ident()?);
        }
        self.expect(&TokKind::KwIn)?;
        let source = self.parse_expr()?;
        let where_ = if self.eat(&TokKind::KwWhere) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Generator {
            names,
            source,
            where_,
        })
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_expr_list(&mut self, close: &TokKind) -> Result<Vec<Expr>> {
        let mut out = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(out);
            }
            out.push(self.parse_expr()?);
            if !self.eat(&TokKind::Comma) {
                self.expect(close)?;
                return Ok(out);
            }
        }
    }

    /// Parenthesised expression, tuple `(a, b)` / `(a,)` or record `(x: 1)`.
    fn parse_paren(&mut self) -> Result<Expr> {
        let start = self.expect(&TokKind::LParen)?;
        if self.at_field_name() {
            let mut fields = Vec::new();
            loop {
                if !self.at_field_name() {
                    return self.err_at(self.cur().span, "record fields must all be named");
                }
                let name = self.parse_ident()?;
                self.expect(&TokKind::Colon)?;
                fields.push((name, self.parse_expr()?));
                if !self.eat(&TokKind::Comma) || self.at(&TokKind::RParen) {
                    break;
                }
            }
            self.expect(&TokKind::RParen)?;
            return Ok(Expr::new(ExprKind::Record(fields), self.span_from(start)));
        }

        let first = self.parse_expr()?;
        if self.eat(&TokKind::RParen) {
            return Ok(first);
        }
        self.expect(&TokKind::Comma)?;
        let mut elems = vec![first];
        loop {
            if self.eat(&TokKind::RParen) {
                break;
            }
            if self.at_field_name() {
                return self.err_at(self.cur().span, "record fields must all be named");
            }
            elems.push(self.parse_expr()?);
            if !self.eat(&TokKind::Comma) {
                self.expect(&TokKind::RParen)?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Tuple(elems), self.span_from(start)))
    }

    /// `name :` at the start of a parenthesised element.
    fn at_field_name(&self) -> bool {
        matches!(self.kind(), TokKind::Ident(_) | TokKind::QuotedIdent(_))
            && self.peek(1) == &TokKind::Colon
    }

    /// `[...]`: array literal, comprehension, or `[| ... |]`.
    fn parse_bracket(&mut self) -> Result<Expr> {
        let start = self.expect(&TokKind::LBracket)?;
        if self.at(&TokKind::Pipe) {
            return self.parse_array_nd(start);
        }
        if self.eat(&TokKind::RBracket) {
            return Ok(Expr::new(ExprKind::Array1d(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_array_elem()?;
        if first.index.is_none() && self.eat(&TokKind::Pipe) {
            let generators = self.parse_generators()?;
            self.expect(&TokKind::RBracket)?;
            return Ok(Expr::new(
                ExprKind::Comprehension {
                    kind: CompKind::Array,
                    body: Box::new(first.value),
                    generators,
                },
                self.span_from(start),
            ));
        }
        let mut elems = vec![first];
        while self.eat(&TokKind::Comma) {
            if self.at(&TokKind::RBracket) {
                break;
            }
            elems.push(self.parse_array_elem()?);
        }
        self.expect(&TokKind::RBracket)?;
        Ok(Expr::new(ExprKind::Array1d(elems), self.span_from(start)))
    }

    fn parse_array_elem(&mut self) -> Result<ArrayElem> {
        let e = self.parse_expr()?;
        if self.eat(&TokKind::Colon) {
            let value = self.parse_expr()?;
            Ok(ArrayElem {
                index: Some(e),
                value,
            })
        } else {
            Ok(ArrayElem {
                index: None,
                value: e,
            })
        }
    }

    fn parse_array_nd(&mut self, start: Span) -> Result<Expr> {
        self.expect(&TokKind::Pipe)?;
        if self.at(&TokKind::Pipe) {
            if self.peek(1) == &TokKind::RBracket {
                self.bump();
                self.bump();
                let empty = Array2d {
                    col_index: Vec::new(),
                    rows: Vec::new(),
                };
                return Ok(Expr::new(ExprKind::Array2d(empty), self.span_from(start)));
            }
            return self.parse_array3d(start);
        }
        self.parse_array2d(start)
    }

    /// Body of `[| ... |]` after the opening bar. The first segment is either
    /// a column header (`a: b: |`) or the first row, which may start with a
    /// row index (`r: 1, 2`).
    fn parse_array2d(&mut self, start: Span) -> Result<Expr> {
        let mut col_index = Vec::new();
        let mut pending = None;
        let first = self.parse_expr()?;
        if self.eat(&TokKind::Colon) {
            if self.at(&TokKind::Pipe) {
                col_index.push(first);
            } else {
                let second = self.parse_expr()?;
                if self.eat(&TokKind::Colon) {
                    col_index.push(first);
                    col_index.push(second);
                    while !self.at(&TokKind::Pipe) {
                        col_index.push(self.parse_expr()?);
                        self.expect(&TokKind::Colon)?;
                    }
                } else {
                    pending = Some((Some(first), second));
                }
            }
        } else {
            pending = Some((None, first));
        }

        let mut rows = Vec::new();
        if pending.is_none() {
            self.expect(&TokKind::Pipe)?;
            if self.at(&TokKind::Pipe) && self.peek(1) == &TokKind::RBracket {
                self.bump();
                self.bump();
                return Ok(Expr::new(
                    ExprKind::Array2d(Array2d { col_index, rows }),
                    self.span_from(start),
                ));
            }
        }
        loop {
            let (index, head) = match pending.take() {
                Some(row) => row,
                None => self.parse_row_head()?,
            };
            let mut values = vec![head];
            while self.eat(&TokKind::Comma) {
                if self.at(&TokKind::Pipe) {
                    break;
                }
                values.push(self.parse_expr()?);
            }
            rows.push(Array2dRow { index, values });
            self.expect(&TokKind::Pipe)?;
            if self.eat(&TokKind::RBracket) {
                break;
            }
        }

        let width = if col_index.is_empty() {
            rows[0].values.len()
        } else {
            col_index.len()
        };
        if rows.iter().any(|r| r.values.len() != width) {
            return self.err_at(start, "2-D array rows must all have the same length");
        }
        Ok(Expr::new(
            ExprKind::Array2d(Array2d { col_index, rows }),
            self.span_from(start),
        ))
    }

    fn parse_row_head(&mut self) -> Result<(Option<Expr>, Expr)> {
        let e = self.parse_expr()?;
        if self.eat(&TokKind::Colon) {
            Ok((Some(e), self.parse_expr()?))
        } else {
            Ok((None, e))
        }
    }

    /// `[| |1,2|3,4|, |5,6|7,8| |]` after the opening `[|`. Every slice opens
    /// with `|` and closes each row with `|`; `||` is an empty slice.
    fn parse_array3d(&mut self, start: Span) -> Result<Expr> {
        let mut slices: Vec<Vec<Vec<Expr>>> = Vec::new();
        loop {
            self.expect(&TokKind::Pipe)?;
            let mut rows = Vec::new();
            if !self.eat(&TokKind::Pipe) {
                loop {
                    let mut row = vec![self.parse_expr()?];
                    while self.eat(&TokKind::Comma) {
                        row.push(self.parse_expr()?);
                    }
                    self.expect(&TokKind::Pipe)?;
                    rows.push(row);
                    if self.at(&TokKind::Comma) || self.at(&TokKind::Pipe) {
                        break;
                    }
                }
            }
            slices.push(rows);
            if !self.eat(&TokKind::Comma) {
                break;
            }
        }
        self.expect(&TokKind::Pipe)?;
        self.expect(&TokKind::RBracket)?;

        let span = self.span_from(start);
        if slices.iter().all(Vec::is_empty) {
            let empty = Array3d {
                dims: [0, 0, 0],
                elems: Vec::new(),
            };
            return Ok(Expr::new(ExprKind::Array3d(empty), span));
        }
        let rows = slices[0].len();
        let cols = slices[0].first().map_or(0, Vec::len);
        let rectangular = slices
            .iter()
            .all(|s| s.len() == rows && s.iter().all(|r| r.len() == cols));
        if !rectangular {
            return self.err_at(start, "3-D array slices must all have the same shape");
        }
        let dims = [slices.len(), rows, cols];
        let elems = slices.into_iter().flatten().flatten().collect();
        Ok(Expr::new(ExprKind::Array3d(Array3d { dims, elems }), span))
    }

    /// `{...}`: set literal or set comprehension.
    fn parse_brace(&mut self) -> Result<Expr> {
        let start = self.expect(&TokKind::LBrace)?;
        if self.eat(&TokKind::RBrace) {
            return Ok(Expr::new(ExprKind::Set(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_expr()?;
        if self.eat(&TokKind::Pipe) {
            let generators = self.parse_generators()?;
            self.expect(&TokKind::RBrace)?;
            return Ok(Expr::new(
                ExprKind::Comprehension {
                    kind: CompKind::Set,
                    body: Box::new(first),
                    generators,
                },
                self.span_from(start),
            ));
        }
        let mut elems = vec![first];
        if self.eat(&TokKind::Comma) {
            elems.extend(self.parse_expr_list(&TokKind::RBrace)?);
        } else {
            self.expect(&TokKind::RBrace)?;
        }
        Ok(Expr::new(ExprKind::Set(elems), self.span_from(start)))
    }

    fn parse_if(&mut self) -> Result<Expr> {
        let start = self.expect(&TokKind::KwIf)?;
        let mut branches = vec![self.parse_if_branch()?];
        while self.eat(&TokKind::KwElseif) {
            branches.push(self.parse_if_branch()?);
        }
        let else_ = if self.eat(&TokKind::KwElse) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect(&TokKind::KwEndif)?;
        Ok(Expr::new(
            ExprKind::If { branches, else_ },
            self.span_from(start),
        ))
    }

    fn parse_if_branch(&mut self) -> Result<IfBranch> {
        let cond = self.parse_expr()?;
        self.expect(&TokKind::KwThen)?;
        let then = self.parse_expr()?;
        Ok(IfBranch { cond, then })
    }

    /// `let { items } in body`; items are separated by `;` or `,`.
    fn parse_let(&mut self) -> Result<Expr> {
        let start = self.expect(&TokKind::KwLet)?;
        self.expect(&TokKind::LBrace)?;
        let mut items = Vec::new();
        loop {
            if self.eat(&TokKind::RBrace) {
                break;
            }
            items.push(self.parse_let_item()?);
            if !self.eat(&TokKind::Semicolon) && !self.eat(&TokKind::Comma) {
                self.expect(&TokKind::RBrace)?;
                break;
            }
        }
        self.expect(&TokKind::KwIn)?;
        let body = self.parse_expr()?;
        Ok(Expr::new(
            ExprKind::Let {
                items,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_let_item(&mut self) -> Result<LetItem> {
        if self.at(&TokKind::KwConstraint) {
            let start = self.cur().span;
            self.bump();
            let expr = self.parse_expr()?;
            return Ok(LetItem::Constraint(Constraint {
                expr,
                span: self.span_from(start),
            }));
        }
        if self.at_assign() {
            return Ok(LetItem::Assign(self.parse_assign()?));
        }
        Ok(LetItem::Declare(self.parse_var_decl()?))
    }
}

fn binop(kind: &TokKind) -> Option<BinOp> {
    let op = match kind {
        TokKind::Equiv => BinOp::Equiv,
        TokKind::Impl => BinOp::Impl,
        TokKind::RevImpl => BinOp::RevImpl,
        TokKind::Or => BinOp::Or,
        TokKind::KwXor => BinOp::Xor,
        TokKind::And => BinOp::And,
        TokKind::Lt => BinOp::Lt,
        TokKind::Gt => BinOp::Gt,
        TokKind::Le => BinOp::Le,
        TokKind::Ge => BinOp::Ge,
        TokKind::EqEq => BinOp::EqEq,
        TokKind::Eq => BinOp::Eq,
        TokKind::Ne => BinOp::Ne,
        TokKind::TildeEq => BinOp::WeakEq,
        TokKind::KwIn => BinOp::In,
        TokKind::KwSubset => BinOp::Subset,
        TokKind::KwSuperset => BinOp::Superset,
        TokKind::KwUnion => BinOp::Union,
        TokKind::KwDiff => BinOp::Diff,
        TokKind::KwSymdiff => BinOp::SymDiff,
        TokKind::KwIntersect => BinOp::Intersect,
        TokKind::Plus => BinOp::Add,
        TokKind::Minus => BinOp::Sub,
        TokKind::TildePlus => BinOp::WeakAdd,
        TokKind::TildeMinus => BinOp::WeakSub,
        TokKind::Star => BinOp::Mul,
        TokKind::Slash => BinOp::Div,
        TokKind::KwDiv => BinOp::IntDiv,
        TokKind::KwMod => BinOp::Mod,
        TokKind::TildeStar => BinOp::WeakMul,
        TokKind::Caret => BinOp::Pow,
        TokKind::PlusPlus => BinOp::Concat,
        TokKind::KwDefault => BinOp::Default,
        TokKind::BacktickIdent(name) => BinOp::Backtick(name.clone()),
        _ => return None,
    };
    Some(op)
}

fn starts_expr(kind: &TokKind) -> bool {
    matches!(
        kind,
        TokKind::Int(_)
            | TokKind::Float(_)
            | TokKind::Str(_)
            | TokKind::KwTrue
            | TokKind::KwFalse
            | TokKind::Empty
            | TokKind::Underscore
            | TokKind::Ident(_)
            | TokKind::QuotedIdent(_)
            | TokKind::LParen
            | TokKind::LBracket
            | TokKind::LBrace
            | TokKind::KwIf
            | TokKind::KwLet
            | TokKind::KwNot
            | TokKind::Minus
            | TokKind::Plus
    )
}

/// Whether a declaration of this type introduces decision variables.
fn is_var_type(ty: &TypeInst) -> bool {
    if ty.inst == Inst::Var {
        return true;
    }
    match &ty.base {
        TypeBase::Array { elem, .. } | TypeBase::List(elem) => is_var_type(elem),
        TypeBase::Tuple(fields) => fields.iter().any(is_var_type),
        TypeBase::Record(fields) => fields.iter().any(|(_, t)| is_var_type(t)),
        _ => false,
    }
}
