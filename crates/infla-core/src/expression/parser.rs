// Recursive-descent parser over lexer tokens.
//
//   expr    := term (('+' | '-') term)*
//   term    := unary (('*' | '/') unary)*
//   unary   := ('-' | '+') unary | power
//   power   := primary ('^' unary)?          right associative
//   primary := NUMBER | TICKER | '(' expr ')'

use rust_decimal::Decimal;
use std::fmt;
use std::iter::Peekable;
use std::slice::Iter;

use crate::error::InflaError;
use crate::expression::lexer::{Operator, Token, TokenKind};
use crate::InflaResult;

/// Deepest allowed nesting of parentheses, signs and exponents.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Decimal),
    /// Sanitized identifier of a ticker column.
    Symbol(String),
    Neg(Box<Expr>),
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Identifiers referenced anywhere in the tree, in first-seen order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Symbol(s) => {
                if !out.contains(&s.as_str()) {
                    out.push(s);
                }
            }
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Neg(inner) => write!(f, "(-{inner})"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

/// Build an AST from tokens. `ident` maps each ticker token to the
/// identifier stored in [`Expr::Symbol`].
pub fn parse_tokens<F>(tokens: &[Token], ident: F) -> InflaResult<Expr>
where
    F: Fn(&str) -> String,
{
    if tokens.is_empty() {
        return Err(InflaError::InvalidExpression("empty expression".into()));
    }
    let mut parser = Parser {
        tokens: tokens.iter().peekable(),
        ident,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.tokens.next() {
        None => Ok(expr),
        Some(t) if t.kind == TokenKind::RParen => Err(InflaError::InvalidExpression(format!(
            "unbalanced ')' at position {}",
            t.start
        ))),
        Some(t) => Err(unexpected(t)),
    }
}

struct Parser<'a, F> {
    tokens: Peekable<Iter<'a, Token>>,
    ident: F,
    depth: usize,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> String,
{
    fn expr(&mut self) -> InflaResult<Expr> {
        let mut lhs = self.term()?;
        let mut chain = 0;
        while let Some(op) = self.peek_op(&[Operator::Add, Operator::Sub]) {
            self.tokens.next();
            chain += 1;
            self.check_chain(chain)?;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> InflaResult<Expr> {
        let mut lhs = self.unary()?;
        let mut chain = 0;
        while let Some(op) = self.peek_op(&[Operator::Mul, Operator::Div]) {
            self.tokens.next();
            chain += 1;
            self.check_chain(chain)?;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> InflaResult<Expr> {
        self.descend()?;
        let out = match self.peek_op(&[Operator::Sub, Operator::Add]) {
            Some(Operator::Sub) => {
                self.tokens.next();
                self.unary().map(|e| Expr::Neg(Box::new(e)))
            }
            Some(_) => {
                self.tokens.next();
                self.unary()
            }
            None => self.power(),
        };
        self.depth -= 1;
        out
    }

    fn power(&mut self) -> InflaResult<Expr> {
        let base = self.primary()?;
        if self.peek_op(&[Operator::Pow]).is_some() {
            self.tokens.next();
            let exponent = self.unary()?;
            return Ok(binary(Operator::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> InflaResult<Expr> {
        let Some(token) = self.tokens.next() else {
            return Err(InflaError::InvalidExpression(
                "unexpected end of expression".into(),
            ));
        };
        match &token.kind {
            TokenKind::Number(v) => Ok(Expr::Literal(*v)),
            TokenKind::Ticker(t) => Ok(Expr::Symbol((self.ident)(t))),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.expr();
                self.depth -= 1;
                let inner = inner?;
                match self.tokens.next() {
                    Some(t) if t.kind == TokenKind::RParen => Ok(inner),
                    Some(t) => Err(unexpected(t)),
                    None => Err(InflaError::InvalidExpression(format!(
                        "unbalanced '(' at position {}",
                        token.start
                    ))),
                }
            }
            _ => Err(unexpected(token)),
        }
    }

    fn descend(&mut self) -> InflaResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(InflaError::InvalidExpression(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    // A chain of N left-associative operators builds a tree N levels deep.
    fn check_chain(&self, chain: usize) -> InflaResult<()> {
        if self.depth + chain > MAX_DEPTH {
            return Err(InflaError::InvalidExpression(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn peek_op(&mut self, ops: &[Operator]) -> Option<Operator> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) if ops.contains(op) => Some(*op),
            _ => None,
        }
    }
}

fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn unexpected(token: &Token) -> InflaError {
    let what = match &token.kind {
        TokenKind::Number(v) => v.to_string(),
        TokenKind::Ticker(t) => t.clone(),
        TokenKind::Op(op) => op.to_string(),
        TokenKind::LParen => "(".into(),
        TokenKind::RParen => ")".into(),
    };
    InflaError::InvalidExpression(format!(
        "unexpected '{what}' at position {}",
        token.start
    ))
}
