use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use tracing::{debug, warn};

use crate::error::InflaError;
use crate::series::PriceSeries;
use crate::InflaResult;

/// Provider of raw (unadjusted) daily closes.
///
/// Implementations must be safe to call from several threads at once;
/// [`fetch_all`] issues one call per ticker concurrently.
pub trait PriceSource: Sync {
    /// Short provider name, e.g. `"yahoo"`.
    fn name(&self) -> &str;

    /// Closes for `ticker` with `start <= date <= end`.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> InflaResult<PriceSeries>;
}

/// Fetch every distinct ticker in parallel and wait for all of them.
///
/// Results come back in first-seen ticker order. A failure (including an
/// empty series or a panicking provider) is returned for that ticker only and
/// never cancels the other fetches.
pub fn fetch_all<S>(
    source: &S,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(String, InflaResult<PriceSeries>)>
where
    S: PriceSource + ?Sized,
{
    let mut seen = BTreeSet::new();
    let unique: Vec<&String> = tickers.iter().filter(|t| seen.insert(t.as_str())).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = unique
            .iter()
            .map(|ticker| {
                let ticker = ticker.as_str();
                scope.spawn(move || {
                    debug!(source = source.name(), ticker, %start, %end, "fetching prices");
                    source.fetch(ticker, start, end)
                })
            })
            .collect();

        unique
            .iter()
            .zip(handles)
            .map(|(ticker, handle)| {
                let result = match handle.join() {
                    Ok(Ok(series)) if series.is_empty() => Err(InflaError::EmptyPriceSeries {
                        ticker: ticker.to_string(),
                    }),
                    Ok(other) => other,
                    Err(_) => Err(InflaError::FetchFailed {
                        ticker: ticker.to_string(),
                        reason: "price source panicked".into(),
                    }),
                };
                if let Err(e) = &result {
                    warn!(ticker = ticker.as_str(), error = %e, "price fetch failed");
                }
                (ticker.to_string(), result)
            })
            .collect()
    })
}

/// In-memory price source over pre-loaded series.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    name: String,
    series: BTreeMap<String, PriceSeries>,
}

impl StaticPriceSource {
    pub fn new(name: impl Into<String>, series: BTreeMap<String, PriceSeries>) -> Self {
        StaticPriceSource {
            name: name.into(),
            series,
        }
    }

    pub fn insert(&mut self, ticker: impl Into<String>, series: PriceSeries) {
        self.series.insert(ticker.into(), series);
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl PriceSource for StaticPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> InflaResult<PriceSeries> {
        self.series
            .get(ticker)
            .map(|s| s.between(start, end))
            .ok_or_else(|| InflaError::FetchFailed {
                ticker: ticker.to_string(),
                reason: format!("not available from source '{}'", self.name),
            })
    }
}
