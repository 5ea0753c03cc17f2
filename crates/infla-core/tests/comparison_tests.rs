use chrono::NaiveDate;
use infla_core::adjust::{CompoundSplit, SplitTable};
use infla_core::inflation::amortizer::{amortize, CumulativeInflationSeries};
use infla_core::inflation::table::InflationTable;
use infla_core::report::comparison::build;
use infla_core::series::{PricePoint, PriceSeries};
use infla_core::{InflaError, YearMonth};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Split adjustment and asset-vs-inflation comparison
// ===========================================================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series(points: &[(NaiveDate, Decimal)]) -> PriceSeries {
    PriceSeries::new(points.iter().map(|(d, c)| PricePoint::new(*d, *c)).collect()).unwrap()
}

fn flat_inflation(dates: &[NaiveDate], factors: &[Decimal]) -> CumulativeInflationSeries {
    CumulativeInflationSeries {
        dates: dates.to_vec(),
        factors: factors.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Split adjustment
// ---------------------------------------------------------------------------

fn compound_table() -> SplitTable {
    SplitTable::new(d(2023, 12, 29))
        .with_compound(
            "TXR.BA",
            CompoundSplit {
                split_date: d(2024, 1, 26),
                pre_divisor: dec!(4),
                multiplier: dec!(2),
            },
        )
        .unwrap()
}

#[test]
fn test_compound_split_on_split_date() {
    let raw = series(&[
        (d(2024, 1, 25), dec!(400)),
        (d(2024, 1, 26), dec!(100)),
        (d(2024, 1, 29), dec!(210)),
        (d(2024, 1, 30), dec!(215)),
    ]);
    let out = compound_table().adjust(raw, "TXR.BA");
    assert_eq!(
        out.closes(),
        vec![dec!(100), dec!(200), dec!(210), dec!(215)]
    );
}

#[test]
fn test_adjustment_is_not_idempotent() {
    let table = SplitTable::new(d(2023, 6, 30))
        .with_divisor("ALUA.BA", dec!(10))
        .unwrap();
    let raw = series(&[(d(2023, 6, 1), dec!(1000)), (d(2023, 7, 3), dec!(110))]);

    let once = table.adjust(raw, "ALUA.BA");
    assert_eq!(once.closes(), vec![dec!(100), dec!(110)]);

    // a second pass divides again, which is why the pipeline adjusts once
    let twice = table.adjust(once, "ALUA.BA");
    assert_eq!(twice.closes(), vec![dec!(10), dec!(110)]);
}

#[test]
fn test_compound_rule_wins_over_divisor() {
    let table = compound_table().with_divisor("TXR.BA", dec!(1000)).unwrap();
    let raw = series(&[(d(2024, 1, 25), dec!(400))]);
    assert_eq!(table.adjust(raw, "TXR.BA").closes(), vec![dec!(100)]);
}

#[test]
fn test_split_table_rejects_zero_divisor_in_json() {
    let json = r#"{"cutoff": "2024-01-01", "divisors": {"X.BA": "0"}}"#;
    assert!(matches!(
        SplitTable::from_json(json),
        Err(InflaError::InvalidInput { .. })
    ));
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[test]
fn test_equal_length_comparison() {
    let dates = [d(2023, 12, 1), d(2023, 12, 4), d(2023, 12, 5)];
    let asset = series(&[
        (dates[0], dec!(200)),
        (dates[1], dec!(210)),
        (dates[2], dec!(260)),
    ]);
    let inflation = flat_inflation(&dates, &[dec!(1.01), dec!(1.1), dec!(1.3)]);
    let out = build(&asset, &inflation).unwrap();

    assert_eq!(out.result.observations, 3);
    assert_eq!(out.result.asset_return_pct, dec!(30));
    assert_eq!(out.result.inflation_return_pct, dec!(30));
    assert_eq!(out.result.difference_pct, Decimal::ZERO);
    assert_eq!(out.result.real_return_pct, Decimal::ZERO);

    let inflation_line: Vec<Decimal> = out.result.points.iter().map(|p| p.inflation).collect();
    assert_eq!(inflation_line, vec![dec!(202), dec!(220), dec!(260)]);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_asset_longer_than_inflation_is_truncated() {
    let asset = series(&[
        (d(2023, 12, 1), dec!(100)),
        (d(2023, 12, 4), dec!(120)),
        (d(2023, 12, 5), dec!(90)),
    ]);
    let inflation = flat_inflation(&[d(2023, 12, 1), d(2023, 12, 4)], &[dec!(1.05), dec!(1.1)]);
    let out = build(&asset, &inflation).unwrap();

    assert_eq!(out.result.observations, 2);
    assert_eq!(out.result.asset_return_pct, dec!(20));
    assert_eq!(out.result.points.last().unwrap().date, d(2023, 12, 4));
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("truncated to 2"));
}

#[test]
fn test_inflation_longer_than_asset_is_truncated() {
    let asset = series(&[(d(2023, 12, 1), dec!(100)), (d(2023, 12, 4), dec!(80))]);
    let inflation = flat_inflation(
        &[d(2023, 12, 1), d(2023, 12, 4), d(2023, 12, 5)],
        &[dec!(1.01), dec!(1.02), dec!(1.03)],
    );
    let out = build(&asset, &inflation).unwrap();
    assert_eq!(out.result.observations, 2);
    assert_eq!(out.result.inflation_return_pct, dec!(2));
    assert_eq!(out.result.difference_pct, dec!(-22));
}

#[test]
fn test_empty_asset_fails() {
    let inflation = flat_inflation(&[d(2023, 12, 1)], &[dec!(1.01)]);
    assert!(matches!(
        build(&PriceSeries::default(), &inflation),
        Err(InflaError::EmptySeries(_))
    ));
}

#[test]
fn test_comparison_with_amortized_december() {
    let table = InflationTable::argentina();
    let dates: Vec<NaiveDate> = [1u32, 4, 5, 6, 7]
        .iter()
        .map(|day| d(2023, 12, *day))
        .collect();
    let month = YearMonth::new(2023, 12).unwrap();
    let amortized = amortize(&table, &dates, month, month).unwrap();

    let asset = series(&[
        (dates[0], dec!(1000)),
        (dates[1], dec!(1050)),
        (dates[2], dec!(1100)),
        (dates[3], dec!(1200)),
        (dates[4], dec!(1255)),
    ]);
    let out = build(&asset, &amortized.series).unwrap();

    // five trading days in the month carry the whole 25.5%
    let diff = (out.result.inflation_return_pct - dec!(25.5)).abs();
    assert!(diff < dec!(0.0000001), "inflation {}", out.result.inflation_return_pct);
    assert_eq!(out.result.asset_return_pct, dec!(25.5));
    assert!(out.result.difference_pct.abs() < dec!(0.0000001));
    assert!(out.result.points[0].inflation > dec!(1000));
}
