// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global specification expressions.
//!
//! Grammar over per-variable verdicts:
//!
//! ```text
//! expr  := or
//! or    := and ("or" and)*
//! and   := prim ("and" prim)*
//! prim  := "(" expr ")" | atom
//! atom  := ident "[" int "]" "." ident "is" bool
//! ```
//!
//! An atom such as `worker[1].lines is true` compares the recorded
//! verdict of variable `lines` on the first `worker` process against the
//! literal. Atoms naming unknown processes, ordinals, or variables are
//! rejected before evaluation.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("expected {expected} at offset {pos}, found {found:?}")]
    UnexpectedToken { pos: usize, found: String, expected: &'static str },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("process ordinals are 1-based; found [0] at offset {pos}")]
    ZeroOrdinal { pos: usize },
    #[error("expression names unknown {what} \"{name}\"")]
    UnknownAtom { what: &'static str, name: String },
}

/// One `proc[i].var is value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub process: String,
    /// 1-based, as written in the expression.
    pub ordinal: usize,
    pub variable: String,
    pub expected: bool,
}

impl Atom {
    /// Zero-based ordinal for indexing verdict tables.
    pub fn index(&self) -> usize {
        self.ordinal - 1
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}].{} is {}", self.process, self.ordinal, self.variable, self.expected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Atom(Atom),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression, or error on invalid syntax.
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(ExprError::UnexpectedToken {
                pos: token.pos,
                found: token.kind.describe(),
                expected: "end of expression",
            });
        }
        Ok(expr)
    }

    /// Every atom of the expression, left to right.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a Atom>) {
        match self {
            Expr::Atom(atom) => out.push(atom),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.collect_atoms(out);
                b.collect_atoms(out);
            }
        }
    }

    /// Evaluate with `verdict` supplying the recorded per-variable
    /// verdict for each atom; the atom holds when the verdict equals its
    /// literal.
    pub fn evaluate(&self, verdict: &dyn Fn(&Atom) -> bool) -> bool {
        match self {
            Expr::Atom(atom) => verdict(atom) == atom.expected,
            Expr::And(a, b) => a.evaluate(verdict) && b.evaluate(verdict),
            Expr::Or(a, b) => a.evaluate(verdict) || b.evaluate(verdict),
        }
    }
}

// --- lexer ---

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Number(usize),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    And,
    Or,
    Is,
    True,
    False,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("identifier \"{s}\""),
            Self::Number(n) => format!("number {n}"),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::LBracket => "'['".into(),
            Self::RBracket => "']'".into(),
            Self::Dot => "'.'".into(),
            Self::And => "\"and\"".into(),
            Self::Or => "\"or\"".into(),
            Self::Is => "\"is\"".into(),
            Self::True => "\"true\"".into(),
            Self::False => "\"false\"".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let pos = i;
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos });
                i += 1;
            }
            '[' => {
                tokens.push(Token { kind: TokenKind::LBracket, pos });
                i += 1;
            }
            ']' => {
                tokens.push(Token { kind: TokenKind::RBracket, pos });
                i += 1;
            }
            '.' => {
                tokens.push(Token { kind: TokenKind::Dot, pos });
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let mut value = 0usize;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    value = value.saturating_mul(10).saturating_add(chars[i] as usize - '0' as usize);
                    i += 1;
                }
                tokens.push(Token { kind: TokenKind::Number(value), pos });
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = match word.to_ascii_lowercase().as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "is" => TokenKind::Is,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    _ => TokenKind::Ident(word),
                };
                tokens.push(Token { kind, pos });
            }
            c => return Err(ExprError::UnexpectedChar { pos, ch: c }),
        }
    }
    Ok(tokens)
}

// --- parser ---

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(
        &mut self,
        expected: &'static str,
        matches: impl Fn(&TokenKind) -> bool,
    ) -> Result<Token, ExprError> {
        match self.advance() {
            Some(token) if matches(&token.kind) => Ok(token),
            Some(token) => Err(ExprError::UnexpectedToken {
                pos: token.pos,
                found: token.kind.describe(),
                expected,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_and()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::And)) {
            self.advance();
            let rhs = self.parse_primary()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
            self.advance();
            let expr = self.parse_or()?;
            self.expect("')'", |k| matches!(k, TokenKind::RParen))?;
            return Ok(expr);
        }
        self.parse_atom().map(Expr::Atom)
    }

    fn parse_atom(&mut self) -> Result<Atom, ExprError> {
        let name = self.expect("process name", |k| matches!(k, TokenKind::Ident(_)))?;
        let TokenKind::Ident(process) = name.kind else { unreachable!() };
        self.expect("'['", |k| matches!(k, TokenKind::LBracket))?;
        let number = self.expect("process ordinal", |k| matches!(k, TokenKind::Number(_)))?;
        let TokenKind::Number(ordinal) = number.kind else { unreachable!() };
        if ordinal == 0 {
            return Err(ExprError::ZeroOrdinal { pos: number.pos });
        }
        self.expect("']'", |k| matches!(k, TokenKind::RBracket))?;
        self.expect("'.'", |k| matches!(k, TokenKind::Dot))?;
        let variable = self.expect("variable name", |k| matches!(k, TokenKind::Ident(_)))?;
        let TokenKind::Ident(variable) = variable.kind else { unreachable!() };
        self.expect("\"is\"", |k| matches!(k, TokenKind::Is))?;
        let literal =
            self.expect("\"true\" or \"false\"", |k| matches!(k, TokenKind::True | TokenKind::False))?;
        Ok(Atom {
            process,
            ordinal,
            variable,
            expected: literal.kind == TokenKind::True,
        })
    }
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
