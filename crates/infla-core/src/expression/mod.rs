//! Arithmetic expressions over ticker symbols.
//!
//! `GGAL.BA + TXR.BA/ALUA.BA` is tokenized into numbers, tickers, operators
//! and parentheses. Each distinct ticker gets a sanitized identifier (`.`
//! becomes `_`) which names its column at evaluation time. Substitution works
//! on token spans, so `YPF` and `YPFD` can never collide the way a textual
//! replace would let them.
//!
//! Supported: `+ - * / ^ ( )`, unary minus, decimal literals.

pub mod eval;
pub mod lexer;
pub mod parser;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::InflaError;
use crate::types::Price;
use crate::InflaResult;
use lexer::TokenKind;
use parser::Expr;

/// A parsed expression, ready to evaluate against any number of ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExpression {
    /// Text as entered.
    pub source: String,
    /// Source text with every ticker replaced by its identifier.
    pub normalized: String,
    /// Ticker symbol -> identifier.
    pub tickers: BTreeMap<String, String>,
    #[serde(skip)]
    ast: Option<Expr>,
}

impl ParsedExpression {
    /// Tickers in the expression, sorted.
    pub fn ticker_symbols(&self) -> Vec<&str> {
        self.tickers.keys().map(String::as_str).collect()
    }

    pub fn identifier(&self, ticker: &str) -> Option<&str> {
        self.tickers.get(ticker).map(String::as_str)
    }

    /// Evaluate against columns keyed by identifier.
    pub fn evaluate(&self, columns: &BTreeMap<String, Vec<Price>>) -> InflaResult<Vec<Price>> {
        match &self.ast {
            Some(ast) => eval::evaluate_columns(ast, columns),
            None => evaluate(&self.normalized, columns),
        }
    }
}

/// Identifier used for `ticker` in normalized expressions and column maps.
pub fn sanitize_ticker(ticker: &str) -> String {
    ticker.replace('.', "_")
}

fn is_whitelisted(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '*' | '/' | '^' | '(' | ')' | ' ')
}

fn push_checked(out: &mut String, segment: &str) -> InflaResult<()> {
    if let Some(c) = segment.chars().find(|c| !is_whitelisted(*c)) {
        return Err(InflaError::InvalidExpression(format!(
            "character '{c}' not allowed in normalized expression"
        )));
    }
    out.push_str(segment);
    Ok(())
}

/// Parse a ticker expression into its normalized form and ticker map.
///
/// Identifiers never contain `.`; the only dots left in the normalized text
/// belong to decimal literals. Fails with `InvalidExpression` on characters
/// outside the expression alphabet, malformed syntax, unbalanced parentheses, or two tickers that
/// sanitize to the same identifier.
pub fn parse(text: &str) -> InflaResult<ParsedExpression> {
    let tokens = lexer::tokenize(text)?;

    let mut tickers: BTreeMap<String, String> = BTreeMap::new();
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    for token in &tokens {
        if let TokenKind::Ticker(t) = &token.kind {
            let id = sanitize_ticker(t);
            if let Some(other) = owners.get(&id) {
                if other != t {
                    return Err(InflaError::InvalidExpression(format!(
                        "tickers '{other}' and '{t}' both map to identifier '{id}'"
                    )));
                }
            }
            owners.insert(id.clone(), t.clone());
            tickers.insert(t.clone(), id);
        }
    }

    // Numeric literals are copied verbatim; every other stretch of the
    // normalized text must stay inside the whitelist.
    let mut normalized = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in &tokens {
        let replacement: &str = match &token.kind {
            TokenKind::Ticker(t) => &tickers[t],
            TokenKind::Number(_) => &text[token.start..token.end],
            _ => continue,
        };
        push_checked(&mut normalized, &text[cursor..token.start])?;
        normalized.push_str(replacement);
        cursor = token.end;
    }
    push_checked(&mut normalized, &text[cursor..])?;

    let ast = parser::parse_tokens(&tokens, sanitize_ticker)?;

    Ok(ParsedExpression {
        source: text.to_string(),
        normalized,
        tickers,
        ast: Some(ast),
    })
}

/// Evaluate a normalized expression element-wise over aligned columns keyed
/// by identifier.
///
/// Fails with `DivisionByZero` if any row divides by zero and with
/// `EvaluationError` for any other fault. Never returns partial results.
pub fn evaluate(normalized: &str, columns: &BTreeMap<String, Vec<Price>>) -> InflaResult<Vec<Price>> {
    let tokens = lexer::tokenize(normalized)
        .map_err(|e| InflaError::EvaluationError(e.to_string()))?;
    let ast = parser::parse_tokens(&tokens, str::to_string)
        .map_err(|e| InflaError::EvaluationError(e.to_string()))?;
    eval::evaluate_columns(&ast, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_extracts_tickers() {
        let p = parse("GGAL.BA*0.5+PAMP.BA*0.2").unwrap();
        assert_eq!(p.ticker_symbols(), vec!["GGAL.BA", "PAMP.BA"]);
        assert_eq!(p.normalized, "GGAL_BA*0.5+PAMP_BA*0.2");
        assert!(p.tickers.values().all(|id| !id.contains('.')));
        assert_eq!(p.normalized.replace("0.5", "").replace("0.2", "").find('.'), None);
    }

    #[test]
    fn test_decimal_literals_round_trip_through_normalized_text() {
        let p = parse("(A.X - 1.25) * 0.5").unwrap();
        assert_eq!(p.normalized, "(A_X - 1.25) * 0.5");
        let mut cols = BTreeMap::new();
        cols.insert("A_X".to_string(), vec![dec!(3.25)]);
        assert_eq!(evaluate(&p.normalized, &cols).unwrap(), vec![dec!(1.00)]);
    }

    #[test]
    fn test_prefix_tickers_do_not_collide() {
        let p = parse("YPF + YPFD.BA / YPF").unwrap();
        assert_eq!(p.normalized, "YPF + YPFD_BA / YPF");
        assert_eq!(p.identifier("YPF"), Some("YPF"));
        assert_eq!(p.identifier("YPFD.BA"), Some("YPFD_BA"));
    }

    #[test]
    fn test_identifier_collision_rejected() {
        assert!(matches!(
            parse("A.B + A_B"),
            Err(InflaError::InvalidExpression(_))
        ));
    }

    #[test]
    fn test_normalized_text_evaluates() {
        let p = parse("GGAL.BA + TXR.BA/ALUA.BA").unwrap();
        let mut cols = BTreeMap::new();
        cols.insert("GGAL_BA".to_string(), vec![dec!(100)]);
        cols.insert("TXR_BA".to_string(), vec![dec!(50)]);
        cols.insert("ALUA_BA".to_string(), vec![dec!(25)]);
        assert_eq!(p.evaluate(&cols).unwrap(), vec![dec!(102)]);
        assert_eq!(evaluate(&p.normalized, &cols).unwrap(), vec![dec!(102)]);
    }

    #[test]
    fn test_deserialized_expression_still_evaluates() {
        let p = parse("A.X * 2").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: ParsedExpression = serde_json::from_str(&json).unwrap();
        let mut cols = BTreeMap::new();
        cols.insert("A_X".to_string(), vec![dec!(3)]);
        assert_eq!(back.evaluate(&cols).unwrap(), vec![dec!(6)]);
    }
}
