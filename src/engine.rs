// Filtering and aggregation over loaded tables.
//
// All functions here are pure: they borrow a table, never mutate it, and
// return new tables or row vectors. Empty inputs give empty outputs.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::filter::{FilterState, ResolvedFilter};
use crate::growth::{yoy_growth, GrowthResult};
use crate::types::{Measure, Month, Record, SchemaKind, Table};
use crate::util::safe_ratio;

/// Keep the rows of `table` that satisfy `filter`. "All" selections are
/// resolved against `table` itself.
pub fn apply(table: &Table, filter: &FilterState) -> Table {
    apply_resolved(table, &filter.resolve(table))
}

pub fn apply_resolved(table: &Table, filter: &ResolvedFilter) -> Table {
    let records: Vec<Record> = table
        .records
        .iter()
        .filter(|r| filter.matches(r.year, r.month, &r.package))
        .cloned()
        .collect();
    debug!(
        kept = records.len(),
        total = table.len(),
        year = ?filter.year,
        "applied filter"
    );
    Table::new(table.kind, records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Month,
}

/// Summed measures for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow<K> {
    pub key: K,
    /// Number of input rows folded into this group.
    pub rows: usize,
    totals: Vec<(Measure, f64)>,
}

impl<K> AggregateRow<K> {
    /// Summed value of `m`, or `None` if `m` was not requested.
    pub fn total(&self, m: Measure) -> Option<f64> {
        self.totals.iter().find(|(t, _)| *t == m).map(|(_, v)| *v)
    }

    /// `numerator / denominator` over the group totals. `NaN` if either
    /// measure is missing or the denominator sums to zero.
    pub fn ratio(&self, numerator: Measure, denominator: Measure) -> f64 {
        match (self.total(numerator), self.total(denominator)) {
            (Some(n), Some(d)) => safe_ratio(n, d),
            _ => f64::NAN,
        }
    }

    /// Amount per subscription (solo) or per user (firm).
    pub fn average_value(&self, kind: SchemaKind) -> f64 {
        self.ratio(Measure::Amount, kind.average_basis())
    }
}

struct Acc {
    rows: usize,
    amount: f64,
    sums: Vec<f64>,
}

/// Group rows by `key_of` and sum `measures`. Also returns the summed
/// Amount per group, which orderings need even when it was not requested.
fn group<K, F>(table: &Table, measures: &[Measure], key_of: F) -> Vec<(AggregateRow<K>, f64)>
where
    K: Eq + Hash,
    F: Fn(&Record) -> K,
{
    let mut map: HashMap<K, Acc> = HashMap::new();
    for r in &table.records {
        let e = map.entry(key_of(r)).or_insert_with(|| Acc {
            rows: 0,
            amount: 0.0,
            sums: vec![0.0; measures.len()],
        });
        e.rows += 1;
        e.amount += r.amount;
        for (slot, m) in e.sums.iter_mut().zip(measures) {
            *slot += r.measure(*m);
        }
    }
    map.into_iter()
        .map(|(key, acc)| {
            let row = AggregateRow {
                key,
                rows: acc.rows,
                totals: measures.iter().copied().zip(acc.sums).collect(),
            };
            (row, acc.amount)
        })
        .collect()
}

/// Sum `measures` per (Year, Month), ordered by year then calendar month.
pub fn aggregate_by_period(table: &Table, measures: &[Measure]) -> Vec<AggregateRow<PeriodKey>> {
    let mut rows: Vec<AggregateRow<PeriodKey>> = group(table, measures, |r| PeriodKey {
        year: r.year,
        month: r.month,
    })
    .into_iter()
    .map(|(row, _)| row)
    .collect();
    rows.sort_by_key(|r| r.key);
    rows
}

/// Sum `measures` per calendar month across whatever years `table` holds,
/// in calendar order.
pub fn aggregate_by_month(table: &Table, measures: &[Measure]) -> Vec<AggregateRow<Month>> {
    let mut rows: Vec<AggregateRow<Month>> = group(table, measures, |r| r.month)
        .into_iter()
        .map(|(row, _)| row)
        .collect();
    rows.sort_by_key(|r| r.key);
    rows
}

/// Sum `measures` per package, ordered by descending summed Amount.
/// Ties fall back to package name.
pub fn aggregate_by_package(table: &Table, measures: &[Measure]) -> Vec<AggregateRow<String>> {
    let mut rows = group(table, measures, |r| r.package.clone());
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.key.cmp(&b.0.key))
    });
    rows.into_iter().map(|(row, _)| row).collect()
}

/// A record together with its derived ratios. Produced on demand; the
/// source table is never extended.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub record: Record,
    pub average_value: f64,
    pub revenue_per_user: f64,
    pub revenue_per_firm: f64,
    pub users_per_firm: f64,
}

pub fn with_derived(table: &Table) -> Vec<DerivedRecord> {
    table
        .records
        .iter()
        .map(|r| DerivedRecord {
            average_value: match table.kind {
                SchemaKind::Solo => r.average_value(),
                SchemaKind::Firm => r.revenue_per_user(),
            },
            revenue_per_user: r.revenue_per_user(),
            revenue_per_firm: r.revenue_per_firm(),
            users_per_firm: r.users_per_firm(),
            record: r.clone(),
        })
        .collect()
}

/// The selected year and the year before it, under the same month and
/// package selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub year: Option<i32>,
    pub filter: ResolvedFilter,
    pub current: Table,
    pub previous: Table,
}

/// Split `table` into current and prior-year views.
///
/// Months and packages are resolved once against the whole table, so the
/// prior year is compared over exactly the same selection. With no year
/// selected the latest year in the table is used.
pub fn compare(table: &Table, filter: &FilterState) -> Comparison {
    let resolved = filter.resolve(table);
    let year = filter.year.or_else(|| table.max_year());
    let (current, previous) = match year {
        Some(y) => (
            apply_resolved(table, &resolved.with_year(Some(y))),
            // No prior year exists below i32::MIN.
            match y.checked_sub(1) {
                Some(prior) => apply_resolved(table, &resolved.with_year(Some(prior))),
                None => Table::empty(table.kind),
            },
        ),
        None => (Table::empty(table.kind), Table::empty(table.kind)),
    };
    Comparison {
        year,
        filter: resolved.with_year(year),
        current,
        previous,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricComparison {
    pub label: &'static str,
    pub current: f64,
    pub previous: f64,
    pub growth: GrowthResult,
    /// Ratios render with decimals, counts as whole numbers.
    pub is_ratio: bool,
    pub is_money: bool,
}

impl MetricComparison {
    fn new(label: &'static str, current: f64, previous: f64) -> Self {
        MetricComparison {
            label,
            current,
            previous,
            growth: yoy_growth(current, previous),
            is_ratio: false,
            is_money: false,
        }
    }

    fn money(mut self) -> Self {
        self.is_money = true;
        self
    }

    fn ratio(mut self) -> Self {
        self.is_ratio = true;
        self
    }
}

/// Headline metrics for the comparison, by schema kind.
pub fn kpis(cmp: &Comparison) -> Vec<MetricComparison> {
    let (c, p) = (&cmp.current, &cmp.previous);
    match c.kind {
        SchemaKind::Solo => {
            let (rev, prev_rev) = (c.sum(Measure::Amount), p.sum(Measure::Amount));
            let (subs, prev_subs) = (c.sum(Measure::Subscriptions), p.sum(Measure::Subscriptions));
            vec![
                MetricComparison::new("Total Revenue", rev, prev_rev).money(),
                MetricComparison::new("Subscriptions", subs, prev_subs),
                MetricComparison::new(
                    "Average Value",
                    safe_ratio(rev, subs),
                    safe_ratio(prev_rev, prev_subs),
                )
                .money()
                .ratio(),
            ]
        }
        SchemaKind::Firm => {
            let (firms, prev_firms) = (c.sum(Measure::Firms), p.sum(Measure::Firms));
            let (users, prev_users) = (c.sum(Measure::Users), p.sum(Measure::Users));
            let (rev, prev_rev) = (c.sum(Measure::Amount), p.sum(Measure::Amount));
            vec![
                MetricComparison::new("Total Firms", firms, prev_firms),
                MetricComparison::new("Total Users", users, prev_users),
                MetricComparison::new(
                    "Users per Firm",
                    safe_ratio(users, firms),
                    safe_ratio(prev_users, prev_firms),
                )
                .ratio(),
                MetricComparison::new("Total Revenue", rev, prev_rev).money(),
                MetricComparison::new(
                    "Revenue per User",
                    safe_ratio(rev, users),
                    safe_ratio(prev_rev, prev_users),
                )
                .money()
                .ratio(),
            ]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageShare {
    pub row: AggregateRow<String>,
    /// Percentage of the table's total Amount. `NaN` when that total is 0.
    pub share_pct: f64,
}

/// Per-package totals with their share of revenue, largest first.
pub fn package_distribution(table: &Table) -> Vec<PackageShare> {
    let total = table.sum(Measure::Amount);
    aggregate_by_package(table, table.kind.measures())
        .into_iter()
        .map(|row| {
            let amount = row.total(Measure::Amount).unwrap_or(0.0);
            PackageShare {
                share_pct: safe_ratio(amount, total) * 100.0,
                row,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageGrowth {
    pub package: String,
    pub current: f64,
    pub previous: f64,
    pub growth: GrowthResult,
}

/// Revenue growth per package over the union of packages seen in either
/// period. Highest growth first; undefined growth sorts last.
pub fn package_growth(current: &Table, previous: &Table) -> Vec<PackageGrowth> {
    let mut amounts: HashMap<&str, (f64, f64)> = HashMap::new();
    for r in &current.records {
        amounts.entry(r.package.as_str()).or_default().0 += r.amount;
    }
    for r in &previous.records {
        amounts.entry(r.package.as_str()).or_default().1 += r.amount;
    }
    let mut rows: Vec<PackageGrowth> = amounts
        .into_iter()
        .map(|(package, (cur, prev))| PackageGrowth {
            package: package.to_string(),
            current: cur,
            previous: prev,
            growth: yoy_growth(cur, prev),
        })
        .collect();
    rows.sort_by(|a, b| match (a.growth.value, b.growth.value) {
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.package.cmp(&b.package)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.package.cmp(&b.package),
    });
    rows
}

/// The `n` months with the highest revenue, highest first. Ties keep
/// calendar order.
pub fn top_months(table: &Table, n: usize) -> Vec<AggregateRow<Month>> {
    let mut rows = aggregate_by_month(table, &[Measure::Amount]);
    // Stable sort keeps calendar order between equal amounts.
    rows.sort_by(|a, b| {
        let (x, y) = (
            a.total(Measure::Amount).unwrap_or(0.0),
            b.total(Measure::Amount).unwrap_or(0.0),
        );
        y.partial_cmp(&x).unwrap_or(Ordering::Equal)
    });
    rows.truncate(n);
    rows
}

pub fn top_package(table: &Table) -> Option<AggregateRow<String>> {
    aggregate_by_package(table, table.kind.measures())
        .into_iter()
        .next()
}

/// Package with the highest Average Value. Packages whose ratio is
/// undefined never win.
pub fn best_value_package(table: &Table) -> Option<(AggregateRow<String>, f64)> {
    aggregate_by_package(table, table.kind.measures())
        .into_iter()
        .map(|row| {
            let avg = row.average_value(table.kind);
            (row, avg)
        })
        .filter(|(_, avg)| avg.is_finite())
        .fold(None, |best: Option<(AggregateRow<String>, f64)>, cand| match best {
            Some(b) if b.1 >= cand.1 => Some(b),
            _ => Some(cand),
        })
}

/// Month-level statistics over a filtered table. A month here is one
/// (year, month) period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStatistics {
    /// Subscriptions for solo tables, users for firm tables.
    pub basis: Measure,
    pub total_revenue: f64,
    pub total_count: f64,
    pub periods: usize,
    /// NaN when there are no periods.
    pub revenue_per_month: f64,
    pub count_per_month: f64,
    pub highest_monthly_revenue: Option<f64>,
    pub lowest_monthly_revenue: Option<f64>,
    /// NaN when the count is zero.
    pub revenue_per_unit: f64,
}

pub fn period_statistics(table: &Table) -> PeriodStatistics {
    let basis = table.kind.average_basis();
    let rows = aggregate_by_period(table, &[Measure::Amount, basis]);
    let monthly: Vec<f64> = rows
        .iter()
        .map(|r| r.total(Measure::Amount).unwrap_or(0.0))
        .collect();
    let total_revenue = table.sum(Measure::Amount);
    let total_count = table.sum(basis);
    let periods = rows.len();
    PeriodStatistics {
        basis,
        total_revenue,
        total_count,
        periods,
        revenue_per_month: safe_ratio(total_revenue, periods as f64),
        count_per_month: safe_ratio(total_count, periods as f64),
        highest_monthly_revenue: monthly.iter().copied().reduce(f64::max),
        lowest_monthly_revenue: monthly.iter().copied().reduce(f64::min),
        revenue_per_unit: safe_ratio(total_revenue, total_count),
    }
}
