//! Day-over-day percentage change between the two most recent closes.

use crate::data_structures::PriceSeries;
use crate::error::{QuoteError, Shortfall};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
    Zero,
}

impl Direction {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Direction::Positive
        } else if value < 0.0 {
            Direction::Negative
        } else {
            Direction::Zero
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
            Direction::Zero => "zero",
        }
    }
}

/// Full-precision percentage change. Round only when displaying.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PercentChange {
    pub value: f64,
    pub direction: Direction,
}

impl PercentChange {
    /// Signed, two decimals, e.g. `+10.00%`.
    pub fn display(&self) -> String {
        let sign = if self.direction == Direction::Positive { "+" } else { "" };
        format!("{}{:.2}%", sign, self.value)
    }
}

pub fn percent_change(series: &PriceSeries) -> Result<PercentChange, QuoteError> {
    let [.., previous, latest] = series.points() else {
        return Err(QuoteError::InsufficientData(Shortfall::TooFewPoints(series.len())));
    };
    if !previous.close.is_finite() || !latest.close.is_finite() {
        return Err(QuoteError::InsufficientData(Shortfall::NonFinite));
    }
    if previous.close == 0.0 {
        return Err(QuoteError::InsufficientData(Shortfall::ZeroPreviousClose));
    }

    let value = (latest.close - previous.close) / previous.close * 100.0;
    // Subnormal denominators can still overflow.
    if !value.is_finite() {
        return Err(QuoteError::InsufficientData(Shortfall::NonFinite));
    }
    Ok(PercentChange { value, direction: Direction::of(value) })
}
