use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::InflaError;
use crate::types::{Factor, Percent, YearMonth};
use crate::InflaResult;

/// One month of the price index, in percent (25.5 = 25.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRate {
    pub year: i32,
    pub month: u32,
    pub percent: Percent,
}

/// Year -> twelve monthly inflation percentages, January first.
///
/// Years that are not present are treated as a hard gap by the amortizer.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<i32, Vec<Percent>>",
    into = "BTreeMap<i32, Vec<Percent>>"
)]
pub struct InflationTable {
    years: BTreeMap<i32, [Percent; 12]>,
}

impl InflationTable {
    pub fn new(years: BTreeMap<i32, [Percent; 12]>) -> Self {
        InflationTable { years }
    }

    /// Parse `{"year": [12 percentages]}`. Shape errors keep their
    /// `InvalidInput` kind instead of being folded into a serde error.
    pub fn from_json(json: &str) -> InflaResult<Self> {
        let raw: BTreeMap<i32, Vec<Percent>> = serde_json::from_str(json)?;
        InflationTable::try_from(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    pub fn year(&self, year: i32) -> Option<&[Percent; 12]> {
        self.years.get(&year)
    }

    /// Like [`year`](Self::year) but an absent year is an error.
    pub fn require_year(&self, year: i32) -> InflaResult<&[Percent; 12]> {
        self.year(year)
            .ok_or(InflaError::MissingInflationYear(year))
    }

    pub fn rate(&self, month: YearMonth) -> Option<Percent> {
        self.year(month.year)
            .and_then(|rates| rates.get(month.month as usize - 1).copied())
    }

    /// Flattened, chronologically ordered monthly rates.
    pub fn months(&self) -> Vec<MonthlyRate> {
        self.years
            .iter()
            .flat_map(|(year, rates)| {
                rates.iter().enumerate().map(move |(i, percent)| MonthlyRate {
                    year: *year,
                    month: i as u32 + 1,
                    percent: *percent,
                })
            })
            .collect()
    }

    /// Compounded factor over the twelve months of `year`.
    pub fn annual_factor(&self, year: i32) -> InflaResult<Factor> {
        let rates = self.require_year(year)?;
        Ok(rates
            .iter()
            .fold(Decimal::ONE, |acc, p| acc * (Decimal::ONE + p / dec!(100))))
    }

    /// Monthly INDEC consumer price index variation for Argentina, 2017-2024.
    pub fn argentina() -> Self {
        let rows: [(i32, [Percent; 12]); 8] = [
            (2017, [dec!(1.6), dec!(2.5), dec!(2.4), dec!(2.6), dec!(1.4), dec!(1.2), dec!(1.7), dec!(1.4), dec!(1.9), dec!(1.5), dec!(1.4), dec!(3.1)]),
            (2018, [dec!(1.8), dec!(2.4), dec!(2.3), dec!(2.7), dec!(2.1), dec!(3.7), dec!(3.1), dec!(3.9), dec!(6.5), dec!(5.4), dec!(3.2), dec!(2.6)]),
            (2019, [dec!(2.9), dec!(3.8), dec!(4.7), dec!(3.4), dec!(3.1), dec!(2.7), dec!(2.2), dec!(4.0), dec!(5.9), dec!(3.3), dec!(4.3), dec!(3.7)]),
            (2020, [dec!(2.3), dec!(2.0), dec!(3.3), dec!(1.5), dec!(1.5), dec!(2.2), dec!(1.9), dec!(2.7), dec!(2.8), dec!(3.8), dec!(3.2), dec!(4.0)]),
            (2021, [dec!(4.0), dec!(3.6), dec!(4.8), dec!(4.1), dec!(3.3), dec!(3.2), dec!(3.0), dec!(2.5), dec!(3.5), dec!(3.5), dec!(2.5), dec!(3.8)]),
            (2022, [dec!(3.9), dec!(4.7), dec!(6.7), dec!(6.0), dec!(5.1), dec!(5.3), dec!(7.4), dec!(7.0), dec!(6.2), dec!(6.3), dec!(4.9), dec!(5.1)]),
            (2023, [dec!(6.0), dec!(6.6), dec!(7.7), dec!(8.4), dec!(7.8), dec!(6.0), dec!(6.3), dec!(12.4), dec!(12.7), dec!(8.3), dec!(12.8), dec!(25.5)]),
            (2024, [dec!(20.6), dec!(13.2), dec!(11.0), dec!(8.8), dec!(4.2), dec!(4.6), dec!(4.0), dec!(4.2), dec!(3.5), dec!(2.7), dec!(2.4), dec!(2.7)]),
        ];
        InflationTable {
            years: rows.into_iter().collect(),
        }
    }
}

impl Default for InflationTable {
    fn default() -> Self {
        InflationTable::argentina()
    }
}

impl TryFrom<BTreeMap<i32, Vec<Percent>>> for InflationTable {
    type Error = InflaError;

    fn try_from(raw: BTreeMap<i32, Vec<Percent>>) -> InflaResult<Self> {
        let mut years = BTreeMap::new();
        for (year, rates) in raw {
            let months: [Percent; 12] =
                rates.try_into().map_err(|v: Vec<Percent>| InflaError::InvalidInput {
                    field: format!("inflation_table.{year}"),
                    reason: format!("expected 12 monthly rates, got {}", v.len()),
                })?;
            if let Some(p) = months.iter().find(|p| **p <= dec!(-100)) {
                return Err(InflaError::InvalidInput {
                    field: format!("inflation_table.{year}"),
                    reason: format!("monthly rate {p}% implies a non-positive price index"),
                });
            }
            years.insert(year, months);
        }
        Ok(InflationTable { years })
    }
}

impl From<InflationTable> for BTreeMap<i32, Vec<Percent>> {
    fn from(table: InflationTable) -> Self {
        table
            .years
            .into_iter()
            .map(|(y, rates)| (y, rates.to_vec()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argentina_has_twelve_months_per_year() {
        let t = InflationTable::argentina();
        assert_eq!(t.first_year(), Some(2017));
        assert_eq!(t.last_year(), Some(2024));
        assert_eq!(t.months().len(), 8 * 12);
    }

    #[test]
    fn test_december_2023() {
        let t = InflationTable::argentina();
        let dec_2023 = YearMonth::new(2023, 12).unwrap();
        assert_eq!(t.rate(dec_2023), Some(dec!(25.5)));
    }

    #[test]
    fn test_missing_year() {
        let t = InflationTable::argentina();
        assert!(t.rate(YearMonth::new(2010, 1).unwrap()).is_none());
        assert!(matches!(
            t.require_year(2010),
            Err(InflaError::MissingInflationYear(2010))
        ));
    }

    #[test]
    fn test_json_requires_twelve_entries() {
        let err = InflationTable::from_json(r#"{"2023": [1.0, 2.0]}"#).unwrap_err();
        assert!(matches!(err, InflaError::InvalidInput { .. }));
        let err = InflationTable::from_json(r#"{"2023": "none"}"#).unwrap_err();
        assert!(matches!(err, InflaError::SerializationError(_)));
    }

    #[test]
    fn test_json_round_trip_keys() {
        let json = r#"{"2030": [1,1,1,1,1,1,1,1,1,1,1,1]}"#;
        let t = InflationTable::from_json(json).unwrap();
        assert!(t.contains_year(2030));
        assert_eq!(t.rate(YearMonth::new(2030, 7).unwrap()), Some(dec!(1)));
    }

    #[test]
    fn test_annual_factor_compounds() {
        let mut years = BTreeMap::new();
        years.insert(2030, [dec!(1); 12]);
        let t = InflationTable::new(years);
        let f = t.annual_factor(2030).unwrap();
        // 1.01^12 = 1.126825...
        assert!((f - dec!(1.1268250301319698)).abs() < dec!(0.0000000001));
    }
}
