use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::ConfigError;
use crate::util::safe_ratio;

pub const COL_MONTH: &str = "Month";
pub const COL_YEAR: &str = "Year";
pub const COL_PACKAGE: &str = "Subscription Package";
pub const COL_SUBSCRIPTIONS: &str = "Number of Subscriptions";
pub const COL_FIRMS: &str = "Number of Firms";
pub const COL_USERS: &str = "Number of Users";
pub const COL_AMOUNT: &str = "Amount (GHS)";

/// Calendar month. Variant order is calendar order, so `Ord` sorts
/// January before February rather than alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

static MONTH_LOOKUP: Lazy<HashMap<&'static str, Month>> =
    Lazy::new(|| Month::ALL.iter().map(|m| (m.name(), *m)).collect());

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Exact, case-sensitive match against the English month names.
    pub fn from_name(s: &str) -> Option<Month> {
        MONTH_LOOKUP.get(s).copied()
    }

    /// Zero-based position in the calendar.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Calendar quarter, 1 through 4.
    pub fn quarter(self) -> u8 {
        (self.index() / 3) as u8 + 1
    }

    pub fn quarter_months(quarter: u8) -> &'static [Month] {
        let all: &'static [Month; 12] = &Month::ALL;
        let q = quarter.clamp(1, 4) as usize - 1;
        &all[q * 3..q * 3 + 3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which upload layout a table follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Solo,
    Firm,
}

impl SchemaKind {
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            SchemaKind::Solo => &[COL_MONTH, COL_YEAR, COL_PACKAGE, COL_SUBSCRIPTIONS, COL_AMOUNT],
            SchemaKind::Firm => &[COL_MONTH, COL_YEAR, COL_PACKAGE, COL_FIRMS, COL_USERS, COL_AMOUNT],
        }
    }

    /// Summable columns for this layout, Amount first.
    pub fn measures(self) -> &'static [Measure] {
        match self {
            SchemaKind::Solo => &[Measure::Amount, Measure::Subscriptions],
            SchemaKind::Firm => &[Measure::Amount, Measure::Firms, Measure::Users],
        }
    }

    /// Count measures only (everything except Amount).
    pub fn count_measures(self) -> &'static [Measure] {
        &self.measures()[1..]
    }

    /// Denominator used for "Average Value".
    pub fn average_basis(self) -> Measure {
        match self {
            SchemaKind::Solo => Measure::Subscriptions,
            SchemaKind::Firm => Measure::Users,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Solo => "solo",
            SchemaKind::Firm => "firm",
        }
    }
}

impl FromStr for SchemaKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" | "individual" => Ok(SchemaKind::Solo),
            "firm" => Ok(SchemaKind::Firm),
            other => Err(ConfigError::UnknownSchema(other.to_string())),
        }
    }
}

/// A summable numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Measure {
    Amount,
    Subscriptions,
    Firms,
    Users,
}

impl Measure {
    pub fn column(self) -> &'static str {
        match self {
            Measure::Amount => COL_AMOUNT,
            Measure::Subscriptions => COL_SUBSCRIPTIONS,
            Measure::Firms => COL_FIRMS,
            Measure::Users => COL_USERS,
        }
    }
}

/// One validated row. Count fields that do not belong to the table's
/// schema kind stay at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub month: Month,
    pub year: i32,
    pub package: String,
    pub amount: f64,
    pub subscriptions: u64,
    pub firms: u64,
    pub users: u64,
}

impl Record {
    pub fn measure(&self, m: Measure) -> f64 {
        match m {
            Measure::Amount => self.amount,
            Measure::Subscriptions => self.subscriptions as f64,
            Measure::Firms => self.firms as f64,
            Measure::Users => self.users as f64,
        }
    }

    /// Amount / Subscriptions. `NaN` when there are no subscriptions.
    pub fn average_value(&self) -> f64 {
        safe_ratio(self.amount, self.subscriptions as f64)
    }

    pub fn revenue_per_user(&self) -> f64 {
        safe_ratio(self.amount, self.users as f64)
    }

    pub fn revenue_per_firm(&self) -> f64 {
        safe_ratio(self.amount, self.firms as f64)
    }

    pub fn users_per_firm(&self) -> f64 {
        safe_ratio(self.users as f64, self.firms as f64)
    }
}

/// An in-memory table of records of a single schema kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: SchemaKind,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(kind: SchemaKind, records: Vec<Record>) -> Self {
        Table { kind, records }
    }

    /// An empty table with the same column shape.
    pub fn empty(kind: SchemaKind) -> Self {
        Table { kind, records: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sum(&self, m: Measure) -> f64 {
        self.records.iter().map(|r| r.measure(m)).sum()
    }

    pub fn max_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }
}

/// Untyped cells as they come out of a delimited file, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current")]
    pub current: String,
    #[serde(rename = "Previous")]
    #[tabled(rename = "Previous")]
    pub previous: String,
    #[serde(rename = "YoYGrowth")]
    #[tabled(rename = "YoYGrowth")]
    pub growth: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
    #[serde(rename = "AverageValue")]
    #[tabled(rename = "AverageValue")]
    pub average_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PackageRow {
    #[serde(rename = "Package")]
    #[tabled(rename = "Package")]
    pub package: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
    #[serde(rename = "AverageValue")]
    #[tabled(rename = "AverageValue")]
    pub average_value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PackageGrowthRow {
    #[serde(rename = "Package")]
    #[tabled(rename = "Package")]
    pub package: String,
    #[serde(rename = "CurrentRevenue")]
    #[tabled(rename = "CurrentRevenue")]
    pub current: String,
    #[serde(rename = "PreviousRevenue")]
    #[tabled(rename = "PreviousRevenue")]
    pub previous: String,
    #[serde(rename = "Growth")]
    #[tabled(rename = "Growth")]
    pub growth: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HighlightRow {
    #[serde(rename = "Highlight")]
    #[tabled(rename = "Highlight")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatisticRow {
    #[serde(rename = "Statistic")]
    #[tabled(rename = "Statistic")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct SummaryMetric {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    /// `None` when growth from the prior period is undefined.
    pub growth_pct: Option<f64>,
    pub classification: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct DashboardSummary {
    pub schema: SchemaKind,
    pub year: Option<i32>,
    pub months: Vec<Month>,
    pub packages: Vec<String>,
    pub filtered_rows: usize,
    pub metrics: Vec<SummaryMetric>,
    pub quarter_growth_pct: Option<f64>,
    pub ytd_growth_pct: Option<f64>,
    pub generated_at: String,
}
