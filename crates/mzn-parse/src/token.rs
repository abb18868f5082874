use mzn_ast::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedComment,
    UnterminatedIdent,
    InvalidEscape,
    MalformedNumber,
    UnexpectedChar,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::UnterminatedComment => "unterminated block comment",
            LexErrorKind::UnterminatedIdent => "unterminated quoted identifier",
            LexErrorKind::InvalidEscape => "invalid escape sequence in string literal",
            LexErrorKind::MalformedNumber => "malformed or out of range numeric literal",
            LexErrorKind::UnexpectedChar => "unexpected character",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    // trivia / eof / error
    Eof,
    /// Malformed input; `text` holds what was consumed.
    Error {
        kind: LexErrorKind,
        text: String,
    },
    LineComment(String),
    BlockComment(String),
    // punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    ColonColon,
    Semicolon,
    Pipe,
    Dot,
    DotDot,
    Underscore,
    // comparison / assignment
    Eq,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    PlusPlus,
    TildePlus,
    TildeMinus,
    TildeStar,
    TildeEq,
    // logical
    Equiv,   // <->
    Impl,    // ->
    RevImpl, // <-
    Or,      // \/
    And,     // /\
    Empty,   // <>
    // keywords
    KwAnn,
    KwAnnotation,
    KwAny,
    KwArray,
    KwBool,
    KwConstraint,
    KwDefault,
    KwDiff,
    KwDiv,
    KwElse,
    KwElseif,
    KwEndif,
    KwEnum,
    KwFalse,
    KwFloat,
    KwFunction,
    KwIf,
    KwIn,
    KwInclude,
    KwInt,
    KwIntersect,
    KwLet,
    KwList,
    KwMaximize,
    KwMinimize,
    KwMod,
    KwNot,
    KwOf,
    KwOpt,
    KwOutput,
    KwPar,
    KwPredicate,
    KwRecord,
    KwSatisfy,
    KwSet,
    KwSolve,
    KwString,
    KwSubset,
    KwSuperset,
    KwSymdiff,
    KwTest,
    KwThen,
    KwTrue,
    KwTuple,
    KwType,
    KwUnion,
    KwVar,
    KwWhere,
    KwXor,
    // identifiers
    Ident(String),
    /// `'name'`
    QuotedIdent(String),
    /// `` `name` ``
    BacktickIdent(String),
    /// `$T` or `$$E`, sigil included.
    PolyIdent(String),
    // literals
    Int(i64),
    Float(f64),
    /// Raw contents between the quotes, escapes untouched.
    Str(String),
}

impl TokKind {
    pub fn keyword(word: &str) -> Option<TokKind> {
        let kind = match word {
            "ann" => TokKind::KwAnn,
            "annotation" => TokKind::KwAnnotation,
            "any" => TokKind::KwAny,
            "array" => TokKind::KwArray,
            "bool" => TokKind::KwBool,
            "constraint" => TokKind::KwConstraint,
            "default" => TokKind::KwDefault,
            "diff" => TokKind::KwDiff,
            "div" => TokKind::KwDiv,
            "else" => TokKind::KwElse,
            "elseif" => TokKind::KwElseif,
            "endif" => TokKind::KwEndif,
            "enum" => TokKind::KwEnum,
            "false" => TokKind::KwFalse,
            "float" => TokKind::KwFloat,
            "function" => TokKind::KwFunction,
            "if" => TokKind::KwIf,
            "in" => TokKind::KwIn,
            "include" => TokKind::KwInclude,
            "int" => TokKind::KwInt,
            "intersect" => TokKind::KwIntersect,
            "let" => TokKind::KwLet,
            "list" => TokKind::KwList,
            "maximize" => TokKind::KwMaximize,
            "minimize" => TokKind::KwMinimize,
            "mod" => TokKind::KwMod,
            "not" => TokKind::KwNot,
            "of" => TokKind::KwOf,
            "opt" => TokKind::KwOpt,
            "output" => TokKind::KwOutput,
            "par" => TokKind::KwPar,
            "predicate" => TokKind::KwPredicate,
            "record" => TokKind::KwRecord,
            "satisfy" => TokKind::KwSatisfy,
            "set" => TokKind::KwSet,
            "solve" => TokKind::KwSolve,
            "string" => TokKind::KwString,
            "subset" => TokKind::KwSubset,
            "superset" => TokKind::KwSuperset,
            "symdiff" => TokKind::KwSymdiff,
            "test" => TokKind::KwTest,
            "then" => TokKind::KwThen,
            "true" => TokKind::KwTrue,
            "tuple" => TokKind::KwTuple,
            "type" => TokKind::KwType,
            "union" => TokKind::KwUnion,
            "var" => TokKind::KwVar,
            "where" => TokKind::KwWhere,
            "xor" => TokKind::KwXor,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, TokKind::LineComment(_) | TokKind::BlockComment(_))
    }
}

impl fmt::Display for TokKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokKind::Eof => f.write_str("end of input"),
            TokKind::Error { kind, text } => write!(f, "{kind} `{text}`"),
            TokKind::LineComment(_) | TokKind::BlockComment(_) => f.write_str("comment"),
            TokKind::Ident(s) => write!(f, "identifier `{s}`"),
            TokKind::QuotedIdent(s) => write!(f, "identifier `'{s}'`"),
            TokKind::BacktickIdent(s) => write!(f, "operator `` `{s}` ``"),
            TokKind::PolyIdent(s) => write!(f, "type variable `{s}`"),
            TokKind::Int(v) => write!(f, "integer `{v}`"),
            TokKind::Float(v) => write!(f, "float `{v:?}`"),
            TokKind::Str(s) => write!(f, "string \"{s}\""),
            other => write!(f, "`{}`", other.spelling()),
        }
    }
}

impl TokKind {
    fn spelling(&self) -> &'static str {
        match self {
            TokKind::LParen => "(",
            TokKind::RParen => ")",
            TokKind::LBracket => "[",
            TokKind::RBracket => "]",
            TokKind::LBrace => "{",
            TokKind::RBrace => "}",
            TokKind::Comma => ",",
            TokKind::Colon => ":",
            TokKind::ColonColon => "::",
            TokKind::Semicolon => ";",
            TokKind::Pipe => "|",
            TokKind::Dot => ".",
            TokKind::DotDot => "..",
            TokKind::Underscore => "_",
            TokKind::Eq => "=",
            TokKind::EqEq => "==",
            TokKind::Ne => "!=",
            TokKind::Lt => "<",
            TokKind::Le => "<=",
            TokKind::Gt => ">",
            TokKind::Ge => ">=",
            TokKind::Plus => "+",
            TokKind::Minus => "-",
            TokKind::Star => "*",
            TokKind::Slash => "/",
            TokKind::Caret => "^",
            TokKind::PlusPlus => "++",
            TokKind::TildePlus => "~+",
            TokKind::TildeMinus => "~-",
            TokKind::TildeStar => "~*",
            TokKind::TildeEq => "~=",
            TokKind::Equiv => "<->",
            TokKind::Impl => "->",
            TokKind::RevImpl => "<-",
            TokKind::Or => "\\/",
            TokKind::And => "/\\",
            TokKind::Empty => "<>",
            TokKind::KwAnn => "ann",
            TokKind::KwAnnotation => "annotation",
            TokKind::KwAny => "any",
            TokKind::KwArray => "array",
            TokKind::KwBool => "bool",
            TokKind::KwConstraint => "constraint",
            TokKind::KwDefault => "default",
            TokKind::KwDiff => "diff",
            TokKind::KwDiv => "div",
            TokKind::KwElse => "else",
            TokKind::KwElseif => "elseif",
            TokKind::KwEndif => "endif",
            TokKind::KwEnum => "enum",
            TokKind::KwFalse => "false",
            TokKind::KwFloat => "float",
            TokKind::KwFunction => "function",
            TokKind::KwIf => "if",
            TokKind::KwIn => "in",
            TokKind::KwInclude => "include",
            TokKind::KwInt => "int",
            TokKind::KwIntersect => "intersect",
            TokKind::KwLet => "let",
            TokKind::KwList => "list",
            TokKind::KwMaximize => "maximize",
            TokKind::KwMinimize => "minimize",
            TokKind::KwMod => "mod",
            TokKind::KwNot => "not",
            TokKind::KwOf => "of",
            TokKind::KwOpt => "opt",
            TokKind::KwOutput => "output",
            TokKind::KwPar => "par",
            TokKind::KwPredicate => "predicate",
            TokKind::KwRecord => "record",
            TokKind::KwSatisfy => "satisfy",
            TokKind::KwSet => "set",
            TokKind::KwSolve => "solve",
            TokKind::KwString => "string",
            TokKind::KwSubset => "subset",
            TokKind::KwSuperset => "superset",
            TokKind::KwSymdiff => "symdiff",
            TokKind::KwTest => "test",
            TokKind::KwThen => "then",
            TokKind::KwTrue => "true",
            TokKind::KwTuple => "tuple",
            TokKind::KwType => "type",
            TokKind::KwUnion => "union",
            TokKind::KwVar => "var",
            TokKind::KwWhere => "where",
            TokKind::KwXor => "xor",
            _ => "?",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
}
