use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::InflaError;
use crate::series::PriceSeries;
use crate::types::Price;
use crate::InflaResult;

/// Several per-ticker close columns aligned on a shared date axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedColumns {
    pub dates: Vec<NaiveDate>,
    /// Column key -> closes, each the same length as `dates`.
    pub columns: BTreeMap<String, Vec<Price>>,
}

impl MergedColumns {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inner join of per-ticker series on date.
///
/// Only dates on which every input has an observation survive. Fails with
/// `EmptySeries` when the inputs share no trading date.
pub fn merge_on_date(inputs: &[(String, &PriceSeries)]) -> InflaResult<MergedColumns> {
    if inputs.is_empty() {
        return Err(InflaError::InvalidInput {
            field: "series".into(),
            reason: "At least one series is required to merge".into(),
        });
    }

    let mut seen = BTreeSet::new();
    for (key, _) in inputs {
        if !seen.insert(key.as_str()) {
            return Err(InflaError::InvalidInput {
                field: "series".into(),
                reason: format!("duplicate column '{key}'"),
            });
        }
    }

    let mut common: BTreeSet<NaiveDate> = inputs[0].1.points().iter().map(|p| p.date).collect();
    for (_, series) in &inputs[1..] {
        let dates: BTreeSet<NaiveDate> = series.points().iter().map(|p| p.date).collect();
        common = common.intersection(&dates).copied().collect();
    }

    if common.is_empty() {
        let keys: Vec<&str> = inputs.iter().map(|(k, _)| k.as_str()).collect();
        return Err(InflaError::EmptySeries(format!(
            "no common trading dates across {}",
            keys.join(", ")
        )));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let mut columns = BTreeMap::new();
    for (key, series) in inputs {
        let by_date: HashMap<NaiveDate, Price> =
            series.points().iter().map(|p| (p.date, p.close)).collect();
        let column: Vec<Price> = dates.iter().filter_map(|d| by_date.get(d).copied()).collect();
        columns.insert(key.clone(), column);
    }

    Ok(MergedColumns { dates, columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, day).unwrap()
    }

    fn series(points: &[(u32, Price)]) -> PriceSeries {
        PriceSeries::new(points.iter().map(|(day, c)| PricePoint::new(d(*day), *c)).collect())
            .unwrap()
    }

    #[test]
    fn test_inner_join_keeps_shared_dates() {
        let a = series(&[(1, dec!(10)), (2, dec!(11)), (3, dec!(12))]);
        let b = series(&[(2, dec!(5)), (3, dec!(6)), (6, dec!(7))]);
        let merged =
            merge_on_date(&[("A".to_string(), &a), ("B".to_string(), &b)]).unwrap();
        assert_eq!(merged.dates, vec![d(2), d(3)]);
        assert_eq!(merged.columns["A"], vec![dec!(11), dec!(12)]);
        assert_eq!(merged.columns["B"], vec![dec!(5), dec!(6)]);
    }

    #[test]
    fn test_disjoint_series_fail() {
        let a = series(&[(1, dec!(10))]);
        let b = series(&[(2, dec!(5))]);
        let err = merge_on_date(&[("A".to_string(), &a), ("B".to_string(), &b)]).unwrap_err();
        assert!(matches!(err, InflaError::EmptySeries(_)));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let a = series(&[(1, dec!(10))]);
        assert!(merge_on_date(&[("A".to_string(), &a), ("A".to_string(), &a)]).is_err());
    }
}
