//! Historical price series and alignment onto a common date grid.
//!
//! Series arrive from an external data collaborator already materialized in
//! memory. Gaps between series are never resolved implicitly: the caller picks a
//! [`GapPolicy`], and the default refuses any disagreement.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Result, RiskError};

/// Ordered `(date, price)` observations for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Builds a series, checking strictly increasing dates and finite positive prices.
    pub fn new(ticker: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let ticker = ticker.into();
        if ticker.is_empty() {
            return Err(RiskError::invalid_series(ticker, "ticker must not be empty"));
        }
        if points.is_empty() {
            return Err(RiskError::invalid_series(ticker, "series must not be empty"));
        }

        let mut dates = Vec::with_capacity(points.len());
        let mut prices = Vec::with_capacity(points.len());
        for (i, (date, price)) in points.into_iter().enumerate() {
            if !price.is_finite() || price <= 0.0 {
                return Err(RiskError::invalid_series(
                    ticker,
                    format!("price at index {i} ({date}) must be finite and > 0, got {price}"),
                ));
            }
            if let Some(prev) = dates.last() {
                if date <= *prev {
                    return Err(RiskError::invalid_series(
                        ticker,
                        format!("dates must be strictly increasing: {date} follows {prev}"),
                    ));
                }
            }
            dates.push(date);
            prices.push(price);
        }

        Ok(Self {
            ticker,
            dates,
            prices,
        })
    }

    /// Builds a series of consecutive calendar days starting at `start`.
    pub fn from_daily_closes(
        ticker: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self> {
        let points = start
            .iter_days()
            .zip(closes.iter().copied())
            .collect::<Vec<_>>();
        Self::new(ticker, points)
    }

    #[inline]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[inline]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Price observed on `date`, if any.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.prices[i])
    }

    /// Last observed price on or before `date`.
    fn price_at_or_before(&self, date: NaiveDate) -> Option<f64> {
        match self.dates.binary_search(&date) {
            Ok(i) => Some(self.prices[i]),
            Err(0) => None,
            Err(i) => Some(self.prices[i - 1]),
        }
    }
}

/// How disagreeing date grids are reconciled before returns are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GapPolicy {
    /// Every series must share an identical date grid.
    #[default]
    Strict,
    /// Keep only dates observed in every series.
    Intersect,
    /// Union of dates from the first date every series has observed; gaps carry
    /// the last observed price forward.
    ForwardFill,
}

/// Asset price histories keyed by ticker, in insertion order.
///
/// Insertion order defines the asset order used by weights, drift and covariance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    series: Vec<PriceSeries>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from series, rejecting duplicate tickers.
    pub fn from_series(series: impl IntoIterator<Item = PriceSeries>) -> Result<Self> {
        let mut history = Self::new();
        for s in series {
            history.push(s)?;
        }
        Ok(history)
    }

    /// Appends a series, rejecting duplicate tickers.
    pub fn push(&mut self, series: PriceSeries) -> Result<()> {
        if self.get(series.ticker()).is_some() {
            return Err(RiskError::invalid_series(
                series.ticker(),
                "duplicate ticker in price history",
            ));
        }
        self.series.push(series);
        Ok(())
    }

    /// Validates and appends `(date, price)` points under `ticker`.
    pub fn insert(
        &mut self,
        ticker: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<()> {
        self.push(PriceSeries::new(ticker, points)?)
    }

    pub fn get(&self, ticker: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.ticker() == ticker)
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.series.iter().map(PriceSeries::ticker).collect()
    }

    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Aligns every series onto one date grid according to `policy`.
    pub fn align(&self, policy: GapPolicy) -> Result<AlignedPrices> {
        let first = self
            .series
            .first()
            .ok_or_else(|| RiskError::insufficient_data("price history assets", 1, 0))?;

        let dates = match policy {
            GapPolicy::Strict => {
                for s in &self.series[1..] {
                    check_same_grid(first, s)?;
                }
                first.dates().to_vec()
            }
            GapPolicy::Intersect => first
                .dates()
                .iter()
                .copied()
                .filter(|d| self.series[1..].iter().all(|s| s.dates.binary_search(d).is_ok()))
                .collect(),
            GapPolicy::ForwardFill => {
                let start = self
                    .series
                    .iter()
                    .filter_map(|s| s.dates().first().copied())
                    .max();
                let union: BTreeSet<NaiveDate> = self
                    .series
                    .iter()
                    .flat_map(|s| s.dates().iter().copied())
                    .collect();
                match start {
                    Some(start) => union.into_iter().filter(|d| *d >= start).collect(),
                    None => Vec::new(),
                }
            }
        };

        let n_assets = self.series.len();
        let mut prices = DMatrix::<f64>::zeros(dates.len(), n_assets);
        for (j, s) in self.series.iter().enumerate() {
            for (t, date) in dates.iter().enumerate() {
                let px = match policy {
                    GapPolicy::Strict => s.prices.get(t).copied(),
                    GapPolicy::Intersect => s.price_on(*date),
                    GapPolicy::ForwardFill => s.price_at_or_before(*date),
                }
                .ok_or_else(|| {
                    RiskError::misaligned(
                        s.ticker(),
                        dates.len(),
                        s.len(),
                        format!("no observation available for {date}"),
                    )
                })?;
                prices[(t, j)] = px;
            }
        }

        debug!(
            assets = n_assets,
            observations = dates.len(),
            ?policy,
            "aligned price history"
        );

        Ok(AlignedPrices {
            tickers: self.series.iter().map(|s| s.ticker.clone()).collect(),
            dates,
            prices,
        })
    }
}

fn check_same_grid(reference: &PriceSeries, other: &PriceSeries) -> Result<()> {
    if other.len() != reference.len() {
        return Err(RiskError::misaligned(
            other.ticker(),
            reference.len(),
            other.len(),
            format!("length differs from `{}`", reference.ticker()),
        ));
    }
    if let Some((i, (a, b))) = reference
        .dates()
        .iter()
        .zip(other.dates())
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(RiskError::misaligned(
            other.ticker(),
            reference.len(),
            other.len(),
            format!(
                "timestamp {b} at index {i} differs from {a} in `{}`",
                reference.ticker()
            ),
        ));
    }
    Ok(())
}

/// Price table on a shared date grid: `T` rows (dates) by `N` columns (assets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPrices {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: DMatrix<f64>,
}

impl AlignedPrices {
    /// Wraps an already aligned `T x N` price table.
    pub fn from_matrix(
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        prices: DMatrix<f64>,
    ) -> Result<Self> {
        if prices.ncols() != tickers.len() {
            return Err(RiskError::shape_mismatch(
                "aligned price columns",
                tickers.len(),
                prices.ncols(),
            ));
        }
        if prices.nrows() != dates.len() {
            return Err(RiskError::shape_mismatch(
                "aligned price rows",
                dates.len(),
                prices.nrows(),
            ));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RiskError::misaligned(
                tickers.first().map_or("", String::as_str),
                dates.len(),
                dates.len(),
                "dates must be strictly increasing",
            ));
        }
        for (j, ticker) in tickers.iter().enumerate() {
            if prices.column(j).iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(RiskError::invalid_series(
                    ticker.clone(),
                    "prices must be finite and > 0",
                ));
            }
        }
        Ok(Self {
            tickers,
            dates,
            prices,
        })
    }

    #[inline]
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// `T x N` price table.
    #[inline]
    pub fn prices(&self) -> &DMatrix<f64> {
        &self.prices
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    #[inline]
    pub fn n_observations(&self) -> usize {
        self.dates.len()
    }

    /// Last observed price per asset, the starting point of every simulated path.
    pub fn last_prices(&self) -> Option<DVector<f64>> {
        let t = self.prices.nrows().checked_sub(1)?;
        Some(self.prices.row(t).transpose())
    }
}
