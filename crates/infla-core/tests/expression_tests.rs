use infla_core::expression::{self, sanitize_ticker};
use infla_core::InflaError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

// ===========================================================================
// Ticker expressions: parsing, normalization and column evaluation
// ===========================================================================

fn columns(pairs: &[(&str, &[Decimal])]) -> BTreeMap<String, Vec<Decimal>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_vec()))
        .collect()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_weighted_expression_ticker_set() {
    let p = expression::parse("GGAL.BA*0.5+PAMP.BA*0.2").unwrap();
    let tickers: Vec<&str> = p.tickers.keys().map(String::as_str).collect();
    assert_eq!(tickers, vec!["GGAL.BA", "PAMP.BA"]);
    assert_eq!(p.normalized, "GGAL_BA*0.5+PAMP_BA*0.2");
    assert!(p.tickers.values().all(|id| !id.contains('.')));
}

#[test]
fn test_dots_survive_only_inside_literals() {
    let p = expression::parse("YPFD.BA / 2.5 - BMA.BA").unwrap();
    assert_eq!(p.normalized, "YPFD_BA / 2.5 - BMA_BA");
    let without_literal = p.normalized.replace("2.5", "");
    assert!(!without_literal.contains('.'), "normalized: {}", p.normalized);
}

#[test]
fn test_ratio_expression() {
    let p = expression::parse("GGAL.BA + TXR.BA/ALUA.BA").unwrap();
    assert_eq!(p.normalized, "GGAL_BA + TXR_BA/ALUA_BA");
    assert_eq!(p.tickers.len(), 3);
    assert_eq!(p.identifier("TXR.BA"), Some("TXR_BA"));
}

#[test]
fn test_whitespace_and_parentheses_preserved() {
    let p = expression::parse("( YPFD.BA - 2 ) * ( BMA.BA ^ 2 )").unwrap();
    assert_eq!(p.normalized, "( YPFD_BA - 2 ) * ( BMA_BA ^ 2 )");
}

#[test]
fn test_substring_tickers_are_independent() {
    let p = expression::parse("YPFD.BA / YPF").unwrap();
    assert_eq!(p.normalized, "YPFD_BA / YPF");
    let p = expression::parse("YPF + YPFD").unwrap();
    assert_eq!(p.normalized, "YPF + YPFD");
    assert_eq!(p.tickers.len(), 2);
}

#[test]
fn test_sanitize_ticker() {
    assert_eq!(sanitize_ticker("BRK.B.BA"), "BRK_B_BA");
    assert_eq!(sanitize_ticker("AAPL"), "AAPL");
}

#[test]
fn test_invalid_characters_rejected() {
    for bad in [
        "GGAL.BA % 2",
        "GGAL.BA; rm -rf",
        "os.system('x')",
        "A == B",
        "A, B",
        "Ñ + A",
    ] {
        assert!(
            matches!(expression::parse(bad), Err(InflaError::InvalidExpression(_))),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn test_pathological_nesting_is_a_typed_error() {
    let parens = format!("{}GGAL.BA{}", "(".repeat(3000), ")".repeat(3000));
    let minus = format!("{}GGAL.BA", "-".repeat(3000));
    for bad in [parens, minus] {
        assert!(matches!(
            expression::parse(&bad),
            Err(InflaError::InvalidExpression(_))
        ));
    }
    assert!(expression::parse("((GGAL.BA * 0.5) - (-PAMP.BA))").is_ok());
}

#[test]
fn test_syntax_errors_rejected() {
    for bad in ["", "   ", "(GGAL.BA", "GGAL.BA)", "GGAL.BA +", "* GGAL.BA", "A B", "1..2"] {
        assert!(
            matches!(expression::parse(bad), Err(InflaError::InvalidExpression(_))),
            "accepted {bad:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn test_division_by_zero_is_atomic() {
    let cols = columns(&[
        ("GGAL_BA", &[dec!(10), dec!(20)]),
        ("PAMP_BA", &[dec!(5), dec!(0)]),
    ]);
    let result = expression::evaluate("GGAL_BA / PAMP_BA", &cols);
    match result {
        Err(InflaError::DivisionByZero { context }) => assert!(context.contains("row 1")),
        other => panic!("expected DivisionByZero, got {other:?}"),
    }
}

#[test]
fn test_weighted_sum_evaluation() {
    let p = expression::parse("GGAL.BA*0.5+PAMP.BA*0.2").unwrap();
    let cols = columns(&[
        ("GGAL_BA", &[dec!(1000), dec!(1100)]),
        ("PAMP_BA", &[dec!(2000), dec!(1900)]),
    ]);
    assert_eq!(p.evaluate(&cols).unwrap(), vec![dec!(900), dec!(930)]);
}

#[test]
fn test_missing_identifier_is_evaluation_error() {
    let cols = columns(&[("GGAL_BA", &[dec!(1)])]);
    assert!(matches!(
        expression::evaluate("GGAL_BA + TXR_BA", &cols),
        Err(InflaError::EvaluationError(_))
    ));
}

#[test]
fn test_malformed_normalized_text_is_evaluation_error() {
    let cols = columns(&[("A", &[dec!(1)])]);
    assert!(matches!(
        expression::evaluate("A +", &cols),
        Err(InflaError::EvaluationError(_))
    ));
}

#[test]
fn test_reuse_across_ranges() {
    let p = expression::parse("A.BA - B.BA").unwrap();
    let first = columns(&[("A_BA", &[dec!(3)]), ("B_BA", &[dec!(1)])]);
    let second = columns(&[("A_BA", &[dec!(10), dec!(12)]), ("B_BA", &[dec!(4), dec!(5)])]);
    assert_eq!(p.evaluate(&first).unwrap(), vec![dec!(2)]);
    assert_eq!(p.evaluate(&second).unwrap(), vec![dec!(6), dec!(7)]);
}

#[test]
fn test_operator_precedence_in_evaluation() {
    let cols = columns(&[("A", &[dec!(2)]), ("B", &[dec!(3)])]);
    assert_eq!(expression::evaluate("A + B * 2 ^ 2", &cols).unwrap(), vec![dec!(14)]);
    assert_eq!(expression::evaluate("(A + B) * 2", &cols).unwrap(), vec![dec!(10)]);
    assert_eq!(expression::evaluate("-A - -B", &cols).unwrap(), vec![dec!(1)]);
}
