//! Restricted arithmetic evaluator.
//!
//! Accepts numeric literals, binary `+ - * / ^` (`**` is read as `^`), unary
//! minus and parentheses. Every other character or construct is rejected
//! before evaluation starts.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?
//! primary := NUMBER | '(' expr ')'
//! ```

use thiserror::Error;

use crate::error::AppError;

const MAX_DEPTH: usize = 64;
const MAX_EXPRESSION_LEN: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("expression is empty")]
    Empty,
    #[error("expression is too long")]
    TooLong,
    #[error("unsupported character '{ch}' at position {pos}")]
    UnsupportedChar { ch: char, pos: usize },
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
    #[error("unexpected {found} at position {pos}")]
    Unexpected { found: String, pos: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression is nested too deeply")]
    TooDeep,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let tok = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                let literal = scan_number(&chars, &mut i);
                let value: f64 = literal
                    .parse()
                    .map_err(|_| CalcError::MalformedNumber(literal.clone()))?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push((Token::Caret, i));
                i += 2;
                continue;
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(CalcError::UnsupportedChar { ch: other, pos: i }),
        };
        tokens.push((tok, i));
        i += 1;
    }
    Ok(tokens)
}

// Digits with an optional fraction and exponent. `1e3` is a literal, `1e` is not.
fn scan_number(chars: &[char], i: &mut usize) -> String {
    let mut out = String::new();
    while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
        out.push(chars[*i]);
        *i += 1;
    }
    if *i < chars.len() && matches!(chars[*i], 'e' | 'E') {
        out.push(chars[*i]);
        *i += 1;
        if *i < chars.len() && matches!(chars[*i], '+' | '-') {
            out.push(chars[*i]);
            *i += 1;
        }
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            out.push(chars[*i]);
            *i += 1;
        }
    }
    out
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn enter(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        self.enter()?;
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == Token::Plus { acc + rhs } else { acc - rhs };
        }
        self.depth -= 1;
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = if op == Token::Star {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                acc / rhs
            };
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.peek() == Some(Token::Minus) {
            self.pos += 1;
            self.enter()?;
            let value = self.unary()?;
            self.depth -= 1;
            return Ok(-value);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some((Token::Number(n), _)) => Ok(n),
            Some((Token::LParen, _)) => {
                let value = self.expr()?;
                match self.next() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((tok, pos)) => Err(CalcError::Unexpected {
                        found: tok.describe(),
                        pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some((tok, pos)) => Err(CalcError::Unexpected {
                found: tok.describe(),
                pos,
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some((tok, pos)) = parser.next() {
        return Err(CalcError::Unexpected {
            found: tok.describe(),
            pos,
        });
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn calculate(expression: &str) -> Result<String, AppError> {
    let value = evaluate(expression).map_err(|e| {
        AppError::ToolExecutionFailed(format!("Error calculating '{expression}': {e}"))
    })?;
    Ok(format!("{} = {}", expression.trim(), format_number(value)))
}
