//! Unit-expression lexer.
//!
//! Positions are character offsets, not byte offsets, so `°C` and `μm` report
//! the same columns a reader counts.

use tracing::trace;

use crate::Error;
use crate::catalog::UnitContext;
use crate::system::UnitSystem;
use crate::unit::Unit;

/// Longest symbol tried when splitting a run of letters (`kmol`).
pub const MAX_SYMBOL_LENGTH: usize = 4;

/// Sign plus at most three digits.
const MAX_EXPONENT_DIGITS: usize = 3;

/// A token from the lexer.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub enum TokenKind {
    Unit(Unit),
    /// The signed integer following `^`.
    Exponent(i8),
    Multiply,
    Divide,
    Power,
    LParen,
    RParen,
}

impl TokenKind {
    fn ends_operand(&self) -> bool {
        matches!(self, TokenKind::Unit(_) | TokenKind::Exponent(_) | TokenKind::RParen)
    }
}

/// Tokens read before the first error, and that error.
#[derive(Debug)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub error: Option<Error>,
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphabetic() || c == '°' || c == '_'
}

/// Tokenize a unit expression.
///
/// Adjacent operands (`kg m`, `N(m)`, `s^2 m`) get an implicit multiply token
/// with an empty span between them.
pub fn tokenize(input: &str, ctx: &UnitContext<'_>) -> Tokenized {
    let mut lexer = Lexer { chars: input.chars().collect(), pos: 0, tokens: Vec::new(), ctx };
    let error = lexer.run().err();
    Tokenized { tokens: lexer.tokens, error }
}

struct Lexer<'x, 'c> {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    ctx: &'x UnitContext<'c>,
}

impl Lexer<'_, '_> {
    fn run(&mut self) -> crate::Result<()> {
        while let Some(&ch) = self.chars.get(self.pos) {
            let start = self.pos;
            match ch {
                c if c.is_whitespace() => self.pos += 1,
                '*' | '·' | '⋅' => self.single(TokenKind::Multiply),
                '/' => self.single(TokenKind::Divide),
                '(' => {
                    self.implicit_multiply();
                    self.single(TokenKind::LParen);
                }
                ')' => self.single(TokenKind::RParen),
                '^' => {
                    self.single(TokenKind::Power);
                    self.exponent()?;
                }
                '1' if !self.chars.get(start + 1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.implicit_multiply();
                    let one = self.ctx.dimensionless();
                    self.single(TokenKind::Unit(one));
                }
                c if is_symbol_char(c) => self.symbol()?,
                _ => return Err(self.error(start, start + 1, "unexpected character")),
            }
        }
        Ok(())
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn error(&self, start: usize, end: usize, message: &str) -> Error {
        Error::Format {
            position: start,
            fragment: self.text(start, end.min(self.chars.len())),
            message: message.to_string(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let text = self.text(start, end);
        self.tokens.push(Token { kind, span: Span { start, end }, text });
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.pos += 1;
        self.push(kind, start, self.pos);
    }

    fn implicit_multiply(&mut self) {
        if self.tokens.last().is_some_and(|t| t.kind.ends_operand()) {
            self.push(TokenKind::Multiply, self.pos, self.pos);
        }
    }

    fn exponent(&mut self) -> crate::Result<()> {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        let start = self.pos;
        if matches!(self.chars.get(self.pos), Some('+' | '-')) {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.pos - digits_start < MAX_EXPONENT_DIGITS
            && self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit())
        {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(self.error(start, start + 1, "expected an integer exponent after '^'"));
        }
        if self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.error(start, self.pos + 1, "exponent has too many digits"));
        }
        let text = self.text(start, self.pos);
        let exponent = text
            .parse::<i8>()
            .map_err(|_| self.error(start, self.pos, "exponent out of range"))?;
        self.push(TokenKind::Exponent(exponent), start, self.pos);
        Ok(())
    }

    fn run_end(&self, from: usize) -> usize {
        let mut end = from;
        while self.chars.get(end).is_some_and(|&c| is_symbol_char(c)) {
            end += 1;
        }
        end
    }

    /// A symbol run, optionally qualified with a system name (`SI.km`).
    fn symbol(&mut self) -> crate::Result<()> {
        let start = self.pos;
        let end = self.run_end(start);

        let mut qualifier: Option<&UnitSystem> = None;
        let mut symbol_start = start;
        if self.chars.get(end) == Some(&'.') {
            let name = self.text(start, end);
            if let Some(system) = self.ctx.catalog().system(&name) {
                qualifier = Some(&**system);
                symbol_start = end + 1;
            }
        }
        let symbol_end = self.run_end(symbol_start);
        if symbol_start == symbol_end {
            return Err(self.error(start, symbol_start, "expected a unit symbol after the system name"));
        }

        let longest = (symbol_end - symbol_start).min(MAX_SYMBOL_LENGTH);
        for len in (1..=longest).rev() {
            let candidate = self.text(symbol_start, symbol_start + len);
            let unit = match qualifier {
                Some(system) => system.scaled_unit_from_symbol(&candidate),
                None => self.ctx.scaled_unit_from_symbol(&candidate),
            };
            trace!(
                candidate = %candidate,
                system = qualifier.map(|s| s.name()),
                found = unit.is_some(),
                "resolving unit symbol"
            );
            if let Some(unit) = unit {
                self.implicit_multiply();
                self.pos = symbol_start + len;
                self.push(TokenKind::Unit(unit), start, self.pos);
                return Ok(());
            }
        }
        Err(self.error(start, symbol_end, "unknown unit symbol"))
    }
}
