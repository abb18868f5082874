#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

mod lexer;
mod parser;
mod token;

use anyhow::Result;
use mzn_ast::ast::{Expr, Item};
use mzn_ast::Render;

pub use lexer::{tokenize, Lexer, LexerConfig};
pub use parser::{parse_expr, parse_item, parse_str, parse_type};
pub use token::{LexErrorKind, Tok, TokKind};

/// Deep copy of an item made by writing it in minimal form and parsing the
/// text again. Spans of the copy refer to that text.
pub fn reparse_item(item: &Item) -> Result<Item> {
    parse_item(&item.minimal())
}

pub fn reparse_expr(e: &Expr) -> Result<Expr> {
    parse_expr(&e.minimal())
}
