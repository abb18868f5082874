use crate::token::{LexErrorKind, Tok, TokKind};
use mzn_ast::span::Span;
use tracing::trace;

/// Lexer settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerConfig {
    /// Emit `%` and `/* */` comments as tokens instead of skipping them.
    pub keep_comments: bool,
}

/// Character-level scanner. It never fails: malformed input becomes a
/// [`TokKind::Error`] token and scanning resumes right after it.
pub struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    config: LexerConfig,
}

/// Position of the token being scanned.
#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_config(src, LexerConfig::default())
    }

    pub fn with_config(src: &'a str, config: LexerConfig) -> Self {
        Self {
            text: src,
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            config,
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let b = *self.src.get(self.pos)?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if b & 0xC0 != 0x80 {
            // continuation bytes of a UTF-8 sequence share one column
            self.col += 1;
        }
        Some(b)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn peek3(&self) -> Option<u8> {
        self.src.get(self.pos + 2).copied()
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn span(&self, start: Mark) -> Span {
        Span::new(start.pos as u32, self.pos as u32, start.line, start.col)
    }

    fn tok(&self, kind: TokKind, start: Mark) -> Tok {
        Tok {
            kind,
            span: self.span(start),
        }
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        self.text.get(from..to).unwrap_or_default()
    }

    fn error(&self, kind: LexErrorKind, start: Mark) -> Tok {
        let text = self.slice(start.pos, self.pos).to_string();
        trace!(%kind, %text, line = start.line, col = start.col, "lexer error");
        self.tok(TokKind::Error { kind, text }, start)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.bump();
        }
    }

    /// Consume one (possibly multi-byte) character.
    fn bump_char(&mut self) {
        self.bump();
        while matches!(self.peek(), Some(b) if b & 0xC0 == 0x80) {
            self.bump();
        }
    }

    pub fn next_tok(&mut self) -> Tok {
        loop {
            self.skip_ws();
            let start = self.mark();
            let Some(b) = self.bump() else {
                return self.tok(TokKind::Eof, start);
            };

            // comments
            if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.bump();
                }
                if self.config.keep_comments {
                    let body = self.slice(start.pos + 1, self.pos).to_string();
                    return self.tok(TokKind::LineComment(body), start);
                }
                continue;
            }
            if b == b'/' && self.peek() == Some(b'*') {
                self.bump();
                let body_start = self.pos;
                loop {
                    match self.peek() {
                        None => return self.error(LexErrorKind::UnterminatedComment, start),
                        Some(b'*') if self.peek2() == Some(b'/') => {
                            let body = self.slice(body_start, self.pos).to_string();
                            self.bump();
                            self.bump();
                            if self.config.keep_comments {
                                return self.tok(TokKind::BlockComment(body), start);
                            }
                            break;
                        }
                        Some(_) => {
                            self.bump();
                        }
                    }
                }
                continue;
            }

            return self.scan(b, start);
        }
    }

    fn scan(&mut self, b: u8, start: Mark) -> Tok {
        // multi-char punctuation, longest match first
        let kind = match b {
            b'<' => match (self.peek(), self.peek2()) {
                (Some(b'-'), Some(b'>')) => {
                    self.bump();
                    self.bump();
                    Some(TokKind::Equiv)
                }
                (Some(b'-'), _) => self.take(TokKind::RevImpl),
                (Some(b'='), _) => self.take(TokKind::Le),
                (Some(b'>'), _) => self.take(TokKind::Empty),
                _ => Some(TokKind::Lt),
            },
            b'>' => match self.peek() {
                Some(b'=') => self.take(TokKind::Ge),
                _ => Some(TokKind::Gt),
            },
            b'-' => match self.peek() {
                Some(b'>') => self.take(TokKind::Impl),
                _ => Some(TokKind::Minus),
            },
            b'+' => match self.peek() {
                Some(b'+') => self.take(TokKind::PlusPlus),
                _ => Some(TokKind::Plus),
            },
            b'=' => match self.peek() {
                Some(b'=') => self.take(TokKind::EqEq),
                _ => Some(TokKind::Eq),
            },
            b'!' => match self.peek() {
                Some(b'=') => self.take(TokKind::Ne),
                _ => None,
            },
            b':' => match self.peek() {
                Some(b':') => self.take(TokKind::ColonColon),
                _ => Some(TokKind::Colon),
            },
            b'.' => match self.peek() {
                Some(b'.') => self.take(TokKind::DotDot),
                _ => Some(TokKind::Dot),
            },
            b'/' => match self.peek() {
                Some(b'\\') => self.take(TokKind::And),
                _ => Some(TokKind::Slash),
            },
            b'\\' => match self.peek() {
                Some(b'/') => self.take(TokKind::Or),
                _ => None,
            },
            b'~' => match self.peek() {
                Some(b'+') => self.take(TokKind::TildePlus),
                Some(b'-') => self.take(TokKind::TildeMinus),
                Some(b'*') => self.take(TokKind::TildeStar),
                Some(b'=') => self.take(TokKind::TildeEq),
                _ => None,
            },
            b'(' => Some(TokKind::LParen),
            b')' => Some(TokKind::RParen),
            b'[' => Some(TokKind::LBracket),
            b']' => Some(TokKind::RBracket),
            b'{' => Some(TokKind::LBrace),
            b'}' => Some(TokKind::RBrace),
            b',' => Some(TokKind::Comma),
            b';' => Some(TokKind::Semicolon),
            b'|' => Some(TokKind::Pipe),
            b'*' => Some(TokKind::Star),
            b'^' => Some(TokKind::Caret),
            b'_' => Some(TokKind::Underscore),
            b'"' => return self.string(start),
            b'\'' => return self.delimited_ident(b'\'', start),
            b'`' => return self.delimited_ident(b'`', start),
            b'$' => return self.poly_ident(start),
            b'0'..=b'9' => return self.number(b, start),
            b if b.is_ascii_alphabetic() => return self.ident(start),
            _ => {
                // step back so the whole character ends up in the error text
                self.pos = start.pos;
                self.line = start.line;
                self.col = start.col;
                self.bump_char();
                return self.error(LexErrorKind::UnexpectedChar, start);
            }
        };
        match kind {
            Some(kind) => self.tok(kind, start),
            None => self.error(LexErrorKind::UnexpectedChar, start),
        }
    }

    fn take(&mut self, kind: TokKind) -> Option<TokKind> {
        self.bump();
        Some(kind)
    }

    fn ident(&mut self, start: Mark) -> Tok {
        let mut letters_only = true;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                self.bump();
            } else if c.is_ascii_digit() || c == b'_' {
                letters_only = false;
                self.bump();
            } else {
                break;
            }
        }
        let word = self.slice(start.pos, self.pos);
        // keywords are only recognised for purely alphabetic words
        let kind = if letters_only {
            TokKind::keyword(word).unwrap_or_else(|| TokKind::Ident(word.to_string()))
        } else {
            TokKind::Ident(word.to_string())
        };
        self.tok(kind, start)
    }

    fn delimited_ident(&mut self, delim: u8, start: Mark) -> Tok {
        let body_start = self.pos;
        loop {
            match self.peek() {
                None | Some(b'\n') => return self.error(LexErrorKind::UnterminatedIdent, start),
                Some(c) if c == delim => {
                    let name = self.slice(body_start, self.pos).to_string();
                    self.bump();
                    let kind = if delim == b'`' {
                        TokKind::BacktickIdent(name)
                    } else {
                        TokKind::QuotedIdent(name)
                    };
                    return self.tok(kind, start);
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn poly_ident(&mut self, start: Mark) -> Tok {
        if self.peek() == Some(b'$') {
            self.bump();
        }
        if !matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            return self.error(LexErrorKind::UnexpectedChar, start);
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.bump();
        }
        let name = self.slice(start.pos, self.pos).to_string();
        self.tok(TokKind::PolyIdent(name), start)
    }

    /// String body up to the closing quote. Escapes are validated but left
    /// in place; `\( ... )` spans are skipped with their parentheses
    /// balanced, so quotes inside them do not end the literal.
    fn string(&mut self, start: Mark) -> Tok {
        let body_start = self.pos;
        let mut bad_escape = false;
        loop {
            match self.peek() {
                None | Some(b'\n') => return self.error(LexErrorKind::UnterminatedString, start),
                Some(b'"') => break,
                Some(b'\\') => {
                    self.bump();
                    match self.peek() {
                        Some(b'n' | b't' | b'\'' | b'"' | b'\\') => {
                            self.bump();
                        }
                        Some(b'(') => {
                            self.bump();
                            if !self.interpolation() {
                                return self.error(LexErrorKind::UnterminatedString, start);
                            }
                        }
                        None => return self.error(LexErrorKind::UnterminatedString, start),
                        Some(_) => bad_escape = true,
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        let raw = self.slice(body_start, self.pos).to_string();
        self.bump();
        if bad_escape {
            return self.error(LexErrorKind::InvalidEscape, start);
        }
        self.tok(TokKind::Str(raw), start)
    }

    /// Skip to the `)` closing an interpolation; false at end of input.
    fn interpolation(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn number(&mut self, first: u8, start: Mark) -> Tok {
        if first == b'0' {
            let radix = match self.peek() {
                Some(b'x') => Some(16),
                Some(b'o') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.bump();
                let digits_start = self.pos;
                while matches!(self.peek(), Some(c) if (c as char).is_digit(radix)) {
                    self.bump();
                }
                let digits = self.slice(digits_start, self.pos);
                return match i64::from_str_radix(digits, radix) {
                    Ok(v) => self.tok(TokKind::Int(v), start),
                    Err(_) => self.error(LexErrorKind::MalformedNumber, start),
                };
            }
        }

        self.digits();
        let mut is_float = false;
        // `1..2` is a range, `1.5` a float; the dot only belongs to the
        // number when a digit follows it
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            match (self.peek2(), self.peek3()) {
                (Some(c), _) if c.is_ascii_digit() => {
                    is_float = true;
                    self.bump();
                    self.digits();
                }
                (Some(b'+' | b'-'), Some(c)) if c.is_ascii_digit() => {
                    is_float = true;
                    self.bump();
                    self.bump();
                    self.digits();
                }
                (Some(b'+' | b'-'), _) => {
                    self.bump();
                    self.bump();
                    return self.error(LexErrorKind::MalformedNumber, start);
                }
                _ => {}
            }
        }

        let text = self.slice(start.pos, self.pos);
        if is_float {
            match text.parse::<f64>() {
                Ok(v) if v.is_finite() => self.tok(TokKind::Float(v), start),
                _ => self.error(LexErrorKind::MalformedNumber, start),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => self.tok(TokKind::Int(v), start),
                Err(_) => self.error(LexErrorKind::MalformedNumber, start),
            }
        }
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Tok;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Tok> {
        let tok = self.next_tok();
        if tok.kind == TokKind::Eof {
            None
        } else {
            Some(tok)
        }
    }
}

/// Lex a whole source string. The result always ends with an `Eof` token.
pub fn tokenize(src: &str, config: LexerConfig) -> Vec<Tok> {
    let mut lex = Lexer::with_config(src, config);
    let mut toks = Vec::new();
    loop {
        let tok = lex.next_tok();
        let done = tok.kind == TokKind::Eof;
        toks.push(tok);
        if done {
            return toks;
        }
    }
}
