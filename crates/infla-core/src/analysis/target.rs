use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::InflaError;
use crate::expression::{self, sanitize_ticker, ParsedExpression};
use crate::InflaResult;

/// One position of a portfolio: `weight` units of `ticker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub weight: Decimal,
}

/// What is being compared against inflation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    Ticker(String),
    Expression(String),
    Portfolio(Vec<Holding>),
}

impl Target {
    /// Validate and parse once so the target can be reused across ranges.
    pub fn prepare(&self) -> InflaResult<PreparedTarget> {
        match self {
            Target::Ticker(t) => {
                let t = t.trim();
                if t.is_empty() {
                    return Err(InflaError::InvalidInput {
                        field: "ticker".into(),
                        reason: "ticker must not be empty".into(),
                    });
                }
                Ok(PreparedTarget::Ticker(t.to_string()))
            }
            Target::Expression(text) => Ok(PreparedTarget::Expression(expression::parse(text)?)),
            Target::Portfolio(holdings) => {
                if holdings.is_empty() {
                    return Err(InflaError::InvalidInput {
                        field: "portfolio".into(),
                        reason: "portfolio needs at least one holding".into(),
                    });
                }
                let mut seen = BTreeSet::new();
                for h in holdings {
                    if !seen.insert(h.ticker.as_str()) {
                        return Err(InflaError::InvalidInput {
                            field: "portfolio".into(),
                            reason: format!("ticker '{}' listed twice", h.ticker),
                        });
                    }
                    if h.weight.is_zero() {
                        return Err(InflaError::InvalidInput {
                            field: format!("portfolio.{}", h.ticker),
                            reason: "weight must be non-zero".into(),
                        });
                    }
                }
                Ok(PreparedTarget::Portfolio(holdings.clone()))
            }
        }
    }
}

/// A validated [`Target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedTarget {
    Ticker(String),
    Expression(ParsedExpression),
    Portfolio(Vec<Holding>),
}

impl PreparedTarget {
    /// Distinct tickers whose prices are needed.
    pub fn tickers(&self) -> Vec<String> {
        match self {
            PreparedTarget::Ticker(t) => vec![t.clone()],
            PreparedTarget::Expression(e) => e.tickers.keys().cloned().collect(),
            PreparedTarget::Portfolio(h) => h.iter().map(|h| h.ticker.clone()).collect(),
        }
    }

    /// Column key used for `ticker` when series are merged.
    pub fn column_key(&self, ticker: &str) -> String {
        match self {
            PreparedTarget::Expression(e) => e
                .identifier(ticker)
                .map(str::to_string)
                .unwrap_or_else(|| sanitize_ticker(ticker)),
            _ => sanitize_ticker(ticker),
        }
    }

    /// Name for the asset line of the chart.
    pub fn label(&self) -> String {
        match self {
            PreparedTarget::Ticker(t) => t.clone(),
            PreparedTarget::Expression(e) => e.source.clone(),
            PreparedTarget::Portfolio(h) => {
                let parts: Vec<String> = h
                    .iter()
                    .map(|h| format!("{}*{}", h.ticker, h.weight))
                    .collect();
                format!("Portfolio({})", parts.join(" + "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_expression_tickers() {
        let p = Target::Expression("GGAL.BA*0.5+PAMP.BA*0.2".into())
            .prepare()
            .unwrap();
        assert_eq!(p.tickers(), vec!["GGAL.BA".to_string(), "PAMP.BA".to_string()]);
        assert_eq!(p.column_key("GGAL.BA"), "GGAL_BA");
    }

    #[test]
    fn test_portfolio_validation() {
        let dup = Target::Portfolio(vec![
            Holding { ticker: "A".into(), weight: dec!(1) },
            Holding { ticker: "A".into(), weight: dec!(2) },
        ]);
        assert!(dup.prepare().is_err());
        assert!(Target::Portfolio(vec![]).prepare().is_err());
        let zero = Target::Portfolio(vec![Holding { ticker: "A".into(), weight: dec!(0) }]);
        assert!(zero.prepare().is_err());
    }

    #[test]
    fn test_blank_ticker_rejected() {
        assert!(Target::Ticker("  ".into()).prepare().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let t: Target =
            serde_json::from_str(r#"{"kind":"expression","value":"YPFD.BA/2"}"#).unwrap();
        assert_eq!(t, Target::Expression("YPFD.BA/2".into()));
    }
}
