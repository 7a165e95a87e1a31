// Year-over-year growth arithmetic.
//
// Growth from a zero base is `Undefined` everywhere. It is never shown
// as 0% and never coerced to a number.
use serde::Serialize;
use std::fmt;

use crate::engine::Comparison;
use crate::types::{Measure, Month, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Positive,
    Negative,
    NoChange,
    Undefined,
}

impl Classification {
    pub fn name(self) -> &'static str {
        match self {
            Classification::Positive => "positive",
            Classification::Negative => "negative",
            Classification::NoChange => "no_change",
            Classification::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthResult {
    /// Percentage growth; `None` exactly when `Undefined`.
    pub value: Option<f64>,
    pub classification: Classification,
}

impl GrowthResult {
    pub const UNDEFINED: GrowthResult = GrowthResult {
        value: None,
        classification: Classification::Undefined,
    };

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for GrowthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.classification, self.value) {
            (Classification::NoChange, _) => f.write_str("No Change"),
            (_, Some(v)) => write!(f, "{:+.1}%", v),
            (_, None) => f.write_str("NaN"),
        }
    }
}

/// Percentage change from `previous` to `current`.
///
/// - `0 -> 0` is `NoChange` with value 0.
/// - `0 -> x` is `Undefined`.
/// - Non-finite inputs (undefined ratios upstream) are `Undefined`.
pub fn yoy_growth(current: f64, previous: f64) -> GrowthResult {
    if !current.is_finite() || !previous.is_finite() {
        return GrowthResult::UNDEFINED;
    }
    if previous == 0.0 {
        return if current == 0.0 {
            GrowthResult {
                value: Some(0.0),
                classification: Classification::NoChange,
            }
        } else {
            GrowthResult::UNDEFINED
        };
    }
    let value = (current - previous) / previous * 100.0;
    let classification = if value > 0.0 {
        Classification::Positive
    } else if value < 0.0 {
        Classification::Negative
    } else {
        Classification::NoChange
    };
    GrowthResult {
        value: Some(value),
        classification,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuarterGrowth {
    pub quarter: u8,
    pub current: f64,
    pub previous: f64,
    pub growth: GrowthResult,
}

fn amount_in(table: &Table, months: &[Month]) -> f64 {
    table
        .records
        .iter()
        .filter(|r| months.contains(&r.month))
        .map(|r| r.amount)
        .sum()
}

/// Revenue growth for the quarter holding the latest month of the current
/// period, against the same quarter a year earlier. `None` when the
/// current period is empty.
pub fn quarter_growth(cmp: &Comparison) -> Option<QuarterGrowth> {
    let latest = cmp.current.records.iter().map(|r| r.month).max()?;
    let quarter = latest.quarter();
    let months = Month::quarter_months(quarter);
    let current = amount_in(&cmp.current, months);
    let previous = amount_in(&cmp.previous, months);
    Some(QuarterGrowth {
        quarter,
        current,
        previous,
        growth: yoy_growth(current, previous),
    })
}

/// Year-to-date revenue growth: the months present in the current period
/// against the same months of the prior year.
pub fn ytd_growth(cmp: &Comparison) -> GrowthResult {
    let mut months: Vec<Month> = cmp.current.records.iter().map(|r| r.month).collect();
    months.sort();
    months.dedup();
    let current = cmp.current.sum(Measure::Amount);
    let previous = amount_in(&cmp.previous, &months);
    yoy_growth(current, previous)
}
