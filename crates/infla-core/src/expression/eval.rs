use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

use crate::error::InflaError;
use crate::expression::lexer::Operator;
use crate::expression::parser::Expr;
use crate::types::Price;
use crate::InflaResult;

/// Evaluate `expr` row by row over aligned columns.
///
/// Every referenced identifier must be present and all referenced columns
/// must have the same length. An expression with no identifiers is
/// broadcast over the length of the supplied columns. The first failing row
/// aborts the whole evaluation.
pub fn evaluate_columns(
    expr: &Expr,
    columns: &BTreeMap<String, Vec<Price>>,
) -> InflaResult<Vec<Price>> {
    let symbols = expr.symbols();

    let mut rows: Option<usize> = None;
    for sym in &symbols {
        let col = columns
            .get(*sym)
            .ok_or_else(|| InflaError::EvaluationError(format!("unknown identifier '{sym}'")))?;
        match rows {
            None => rows = Some(col.len()),
            Some(n) if n != col.len() => {
                return Err(InflaError::EvaluationError(format!(
                    "column '{sym}' has {} rows, expected {n}",
                    col.len()
                )));
            }
            Some(_) => {}
        }
    }
    let rows = match rows {
        Some(n) => n,
        None => columns.values().next().map(Vec::len).ok_or_else(|| {
            InflaError::EvaluationError("no columns to evaluate against".into())
        })?,
    };

    (0..rows).map(|row| eval_row(expr, columns, row)).collect()
}

fn eval_row(expr: &Expr, columns: &BTreeMap<String, Vec<Price>>, row: usize) -> InflaResult<Decimal> {
    match expr {
        Expr::Literal(v) => Ok(*v),
        Expr::Symbol(s) => columns
            .get(s)
            .and_then(|c| c.get(row))
            .copied()
            .ok_or_else(|| InflaError::EvaluationError(format!("no value for '{s}' at row {row}"))),
        Expr::Neg(inner) => Ok(-eval_row(inner, columns, row)?),
        Expr::Binary { op, lhs, rhs } => {
            let a = eval_row(lhs, columns, row)?;
            let b = eval_row(rhs, columns, row)?;
            apply(*op, a, b, row)
        }
    }
}

fn apply(op: Operator, a: Decimal, b: Decimal, row: usize) -> InflaResult<Decimal> {
    let overflow = || InflaError::EvaluationError(format!("arithmetic overflow in '{op}' at row {row}"));
    match op {
        Operator::Add => a.checked_add(b).ok_or_else(overflow),
        Operator::Sub => a.checked_sub(b).ok_or_else(overflow),
        Operator::Mul => a.checked_mul(b).ok_or_else(overflow),
        Operator::Div => {
            if b.is_zero() {
                return Err(InflaError::DivisionByZero {
                    context: format!("row {row}"),
                });
            }
            a.checked_div(b).ok_or_else(overflow)
        }
        Operator::Pow => power(a, b, row).and_then(|v| v.ok_or_else(overflow)),
    }
}

fn power(base: Decimal, exponent: Decimal, row: usize) -> InflaResult<Option<Decimal>> {
    if base.is_zero() && exponent.is_sign_negative() && !exponent.is_zero() {
        return Err(InflaError::DivisionByZero {
            context: format!("row {row}: zero raised to a negative power"),
        });
    }
    if exponent.fract().is_zero() {
        let Some(n) = exponent.to_i64() else {
            return Ok(None);
        };
        if n < 0 {
            return Ok(n
                .checked_neg()
                .and_then(|m| base.checked_powi(m))
                .and_then(|p| Decimal::ONE.checked_div(p)));
        }
        return Ok(base.checked_powi(n));
    }
    if base.is_sign_negative() && !base.is_zero() {
        return Err(InflaError::EvaluationError(format!(
            "fractional power of negative value {base} at row {row}"
        )));
    }
    if base.is_zero() {
        return Ok(Some(Decimal::ZERO));
    }
    Ok(base.checked_powd(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::lexer::tokenize;
    use crate::expression::parser::parse_tokens;
    use rust_decimal_macros::dec;

    fn expr(text: &str) -> Expr {
        parse_tokens(&tokenize(text).unwrap(), |t| t.replace('.', "_")).unwrap()
    }

    fn cols(pairs: &[(&str, Vec<Decimal>)]) -> BTreeMap<String, Vec<Decimal>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_column_arithmetic() {
        let c = cols(&[("A", vec![dec!(10), dec!(20)]), ("B", vec![dec!(2), dec!(4)])]);
        let out = evaluate_columns(&expr("A / B + 1"), &c).unwrap();
        assert_eq!(out, vec![dec!(6), dec!(6)]);
    }

    #[test]
    fn test_integer_power() {
        let c = cols(&[("A", vec![dec!(2), dec!(3)])]);
        assert_eq!(evaluate_columns(&expr("A ^ 3"), &c).unwrap(), vec![dec!(8), dec!(27)]);
        assert_eq!(evaluate_columns(&expr("A ^ -1"), &c).unwrap()[0], dec!(0.5));
    }

    #[test]
    fn test_fractional_power() {
        let c = cols(&[("A", vec![dec!(4)])]);
        let out = evaluate_columns(&expr("A ^ 0.5"), &c).unwrap();
        assert!((out[0] - dec!(2)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_fractional_power_of_negative_fails() {
        let c = cols(&[("A", vec![dec!(-4)])]);
        assert!(matches!(
            evaluate_columns(&expr("A ^ 0.5"), &c),
            Err(InflaError::EvaluationError(_))
        ));
    }

    #[test]
    fn test_zero_to_negative_power() {
        let c = cols(&[("A", vec![dec!(0)])]);
        assert!(matches!(
            evaluate_columns(&expr("A ^ -2"), &c),
            Err(InflaError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_unknown_identifier() {
        let c = cols(&[("A", vec![dec!(1)])]);
        assert!(matches!(
            evaluate_columns(&expr("A + B"), &c),
            Err(InflaError::EvaluationError(_))
        ));
    }

    #[test]
    fn test_ragged_columns() {
        let c = cols(&[("A", vec![dec!(1), dec!(2)]), ("B", vec![dec!(1)])]);
        assert!(evaluate_columns(&expr("A + B"), &c).is_err());
    }

    #[test]
    fn test_constant_broadcasts() {
        let c = cols(&[("A", vec![dec!(1), dec!(2), dec!(3)])]);
        assert_eq!(evaluate_columns(&expr("2 * 3"), &c).unwrap(), vec![dec!(6); 3]);
    }

    #[test]
    fn test_negation() {
        let c = cols(&[("A", vec![dec!(5)])]);
        assert_eq!(evaluate_columns(&expr("-A + 10"), &c).unwrap(), vec![dec!(5)]);
    }
}
