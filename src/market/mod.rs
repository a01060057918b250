//! Market-data input shapes: per-asset price series and their alignment.

pub mod history;

pub use history::{AlignedPrices, GapPolicy, PriceHistory, PriceSeries};
