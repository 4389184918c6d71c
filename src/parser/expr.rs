//! Operator-precedence evaluation of a token stream.
//!
//! Tokens are reordered into postfix with an operator stack (`*` and `/`,
//! precedence 2, left-associative), then evaluated with an operand stack.
//! `^n` binds tighter than anything else and always follows its operand, so it
//! goes straight to the output as a postfix operator.

use crate::unit::Unit;
use crate::{Error, Result};

use super::lexer::{Token, TokenKind};

/// Postfix items refer back to the token they came from, for error positions.
#[derive(Debug, Clone, Copy)]
enum Postfix {
    Operand(usize),
    Multiply(usize),
    Divide(usize),
    Pow { exponent: i8, token: usize },
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Multiply(usize),
    Divide(usize),
    LParen(usize),
}

impl Pending {
    fn into_postfix(self) -> Option<Postfix> {
        match self {
            Pending::Multiply(i) => Some(Postfix::Multiply(i)),
            Pending::Divide(i) => Some(Postfix::Divide(i)),
            Pending::LParen(_) => None,
        }
    }
}

fn error_at(token: &Token, message: &str) -> Error {
    Error::Format {
        position: token.span.start,
        fragment: token.text.clone(),
        message: message.to_string(),
    }
}

fn to_postfix(tokens: &[Token]) -> Result<Vec<Postfix>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Pending> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i].kind {
            TokenKind::Unit(_) => output.push(Postfix::Operand(i)),
            TokenKind::Multiply | TokenKind::Divide => {
                // equal precedence, left-associative: pop every pending operator
                while let Some(op) = stack.last().and_then(|p| p.into_postfix()) {
                    stack.pop();
                    output.push(op);
                }
                stack.push(match tokens[i].kind {
                    TokenKind::Multiply => Pending::Multiply(i),
                    _ => Pending::Divide(i),
                });
            }
            TokenKind::Power => {
                let Some(TokenKind::Exponent(exponent)) = tokens.get(i + 1).map(|t| &t.kind) else {
                    return Err(error_at(&tokens[i], "expected an integer exponent after '^'"));
                };
                output.push(Postfix::Pow { exponent: *exponent, token: i });
                i += 1;
            }
            TokenKind::Exponent(_) => return Err(error_at(&tokens[i], "unexpected exponent")),
            TokenKind::LParen => stack.push(Pending::LParen(i)),
            TokenKind::RParen => loop {
                match stack.pop() {
                    Some(Pending::LParen(_)) => break,
                    Some(op) => output.extend(op.into_postfix()),
                    None => return Err(error_at(&tokens[i], "unbalanced ')'")),
                }
            },
        }
        i += 1;
    }
    while let Some(op) = stack.pop() {
        match op {
            Pending::LParen(at) => return Err(error_at(&tokens[at], "unbalanced '('")),
            op => output.extend(op.into_postfix()),
        }
    }
    Ok(output)
}

/// Evaluate a complete token stream into one unit.
pub(crate) fn evaluate(tokens: &[Token]) -> Result<Unit> {
    let postfix = to_postfix(tokens)?;
    let mut operands: Vec<Unit> = Vec::new();

    for item in postfix {
        match item {
            Postfix::Operand(i) => {
                let TokenKind::Unit(unit) = &tokens[i].kind else { unreachable!("operand token") };
                operands.push(unit.clone());
            }
            Postfix::Pow { exponent, token } => {
                let base = operands
                    .pop()
                    .ok_or_else(|| error_at(&tokens[token], "missing operand before '^'"))?;
                operands.push(base.combine_pow(exponent)?);
            }
            Postfix::Multiply(i) | Postfix::Divide(i) => {
                let missing = || error_at(&tokens[i], "missing operand");
                let rhs = operands.pop().ok_or_else(missing)?;
                let lhs = operands.pop().ok_or_else(missing)?;
                let unit = match item {
                    Postfix::Multiply(_) => lhs.combine_multiply(&rhs)?,
                    _ => lhs.combine_divide(&rhs)?,
                };
                operands.push(unit);
            }
        }
    }

    match (operands.pop(), operands.is_empty()) {
        (Some(unit), true) => Ok(unit),
        (None, _) => Err(Error::Format {
            position: tokens.first().map_or(0, |t| t.span.start),
            fragment: String::new(),
            message: "empty unit expression".to_string(),
        }),
        (Some(_), false) => Err(Error::Format {
            position: tokens.first().map_or(0, |t| t.span.start),
            fragment: tokens.iter().map(|t| t.text.as_str()).collect(),
            message: "missing operator".to_string(),
        }),
    }
}
