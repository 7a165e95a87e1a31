// Dashboard report rows.
//
// Each function turns engine output into display-ready rows (formatted
// strings) for the terminal preview and the JSON summary. No arithmetic
// beyond what the engine and growth modules already provide.
use chrono::Local;

use crate::engine::{
    aggregate_by_period, best_value_package, kpis, package_distribution, package_growth,
    period_statistics, top_months, top_package, Comparison, MetricComparison,
};
use crate::growth::{quarter_growth, ytd_growth};
use crate::types::{
    DashboardSummary, HighlightRow, KpiRow, Measure, PackageGrowthRow, PackageRow,
    StatisticRow, SummaryMetric, Table, TrendRow,
};
use crate::util::{format_count, format_money, format_number};

fn format_metric(m: &MetricComparison, v: f64) -> String {
    match (m.is_money, m.is_ratio) {
        (true, _) => format_money(v),
        (false, true) => format_number(v, 1),
        (false, false) => format_count(v),
    }
}

pub fn generate_kpis(cmp: &Comparison) -> Vec<KpiRow> {
    kpis(cmp)
        .iter()
        .map(|m| KpiRow {
            metric: m.label.to_string(),
            current: format_metric(m, m.current),
            previous: format_metric(m, m.previous),
            growth: m.growth.to_string(),
        })
        .collect()
}

/// Monthly trend across the prior and current year, in calendar order.
pub fn generate_trend(cmp: &Comparison) -> Vec<TrendRow> {
    let kind = cmp.current.kind;
    let both = Table::new(
        kind,
        cmp.previous
            .records
            .iter()
            .chain(cmp.current.records.iter())
            .cloned()
            .collect(),
    );
    let basis = kind.average_basis();
    aggregate_by_period(&both, &[Measure::Amount, basis])
        .into_iter()
        .map(|row| TrendRow {
            year: row.key.year,
            month: row.key.month.to_string(),
            revenue: format_number(row.total(Measure::Amount).unwrap_or(0.0), 2),
            count: format_count(row.total(basis).unwrap_or(0.0)),
            average_value: format_number(row.average_value(kind), 2),
        })
        .collect()
}

pub fn generate_packages(table: &Table) -> Vec<PackageRow> {
    let basis = table.kind.average_basis();
    package_distribution(table)
        .into_iter()
        .map(|share| PackageRow {
            revenue: format_number(share.row.total(Measure::Amount).unwrap_or(0.0), 2),
            share_pct: format_number(share.share_pct, 1),
            count: format_count(share.row.total(basis).unwrap_or(0.0)),
            average_value: format_number(share.row.average_value(table.kind), 2),
            package: share.row.key,
        })
        .collect()
}

pub fn generate_package_growth(cmp: &Comparison) -> Vec<PackageGrowthRow> {
    package_growth(&cmp.current, &cmp.previous)
        .into_iter()
        .map(|g| PackageGrowthRow {
            current: format_number(g.current, 2),
            previous: format_number(g.previous, 2),
            growth: g.growth.to_string(),
            package: g.package,
        })
        .collect()
}

pub fn generate_highlights(cmp: &Comparison, top_n: usize) -> Vec<HighlightRow> {
    let mut rows = Vec::new();
    for (rank, month) in top_months(&cmp.current, top_n).iter().enumerate() {
        rows.push(HighlightRow {
            label: format!("Top month #{}", rank + 1),
            value: format!(
                "{} ({})",
                month.key,
                format_money(month.total(Measure::Amount).unwrap_or(0.0))
            ),
        });
    }
    if let Some(pkg) = top_package(&cmp.current) {
        rows.push(HighlightRow {
            label: "Top package".to_string(),
            value: format!(
                "{} ({})",
                pkg.key,
                format_money(pkg.total(Measure::Amount).unwrap_or(0.0))
            ),
        });
    }
    if let Some((pkg, avg)) = best_value_package(&cmp.current) {
        rows.push(HighlightRow {
            label: "Best average value".to_string(),
            value: format!("{} ({})", pkg.key, format_money(avg)),
        });
    }
    if let Some(q) = quarter_growth(cmp) {
        rows.push(HighlightRow {
            label: format!("Q{} growth", q.quarter),
            value: q.growth.to_string(),
        });
    }
    rows.push(HighlightRow {
        label: "YTD growth".to_string(),
        value: ytd_growth(cmp).to_string(),
    });
    rows
}

/// Summary statistics for a filtered table. Undefined averages and the
/// extremes of an empty table render as `NaN`.
pub fn generate_statistics(table: &Table) -> Vec<StatisticRow> {
    let stats = period_statistics(table);
    let unit = match stats.basis {
        Measure::Users => "User",
        Measure::Firms => "Firm",
        _ => "Subscription",
    };
    let money = |v: Option<f64>| format_money(v.unwrap_or(f64::NAN));
    let rows = [
        ("Total Revenue".to_string(), format_money(stats.total_revenue)),
        (
            "Average Revenue per Month".to_string(),
            format_money(stats.revenue_per_month),
        ),
        (format!("Total {}s", unit), format_count(stats.total_count)),
        (
            format!("Average {}s per Month", unit),
            format_number(stats.count_per_month, 1),
        ),
        (
            "Highest Monthly Revenue".to_string(),
            money(stats.highest_monthly_revenue),
        ),
        (
            "Lowest Monthly Revenue".to_string(),
            money(stats.lowest_monthly_revenue),
        ),
        (
            format!("Average Revenue per {}", unit),
            format_money(stats.revenue_per_unit),
        ),
    ];
    rows.into_iter()
        .map(|(label, value)| StatisticRow { label, value })
        .collect()
}

pub fn generate_summary(cmp: &Comparison) -> DashboardSummary {
    let metrics = kpis(cmp)
        .into_iter()
        .map(|m| SummaryMetric {
            metric: m.label.to_string(),
            current: m.current,
            previous: m.previous,
            growth_pct: m.growth.value,
            classification: m.growth.classification.name().to_string(),
        })
        .collect();
    DashboardSummary {
        schema: cmp.current.kind,
        year: cmp.year,
        months: cmp.filter.months.clone(),
        packages: cmp.filter.packages.clone(),
        filtered_rows: cmp.current.len(),
        metrics,
        quarter_growth_pct: quarter_growth(cmp).and_then(|q| q.growth.value),
        ytd_growth_pct: ytd_growth(cmp).value,
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compare;
    use crate::filter::FilterState;
    use crate::types::{Month, Record, SchemaKind};

    fn rec(month: Month, year: i32, package: &str, subs: u64, amount: f64) -> Record {
        Record {
            month,
            year,
            package: package.to_string(),
            amount,
            subscriptions: subs,
            firms: 0,
            users: 0,
        }
    }

    fn cmp() -> Comparison {
        let table = Table::new(
            SchemaKind::Solo,
            vec![
                rec(Month::January, 2023, "Basic", 10, 1000.0),
                rec(Month::January, 2024, "Basic", 15, 1800.0),
                rec(Month::February, 2024, "New", 0, 0.0),
            ],
        );
        compare(&table, &FilterState::for_year(2024))
    }

    #[test]
    fn test_kpi_rows_formatting() {
        let rows = generate_kpis(&cmp());
        assert_eq!(rows[0].metric, "Total Revenue");
        assert_eq!(rows[0].current, "GHS 1,800.00");
        assert_eq!(rows[0].previous, "GHS 1,000.00");
        assert_eq!(rows[0].growth, "+80.0%");
        assert_eq!(rows[1].current, "15");
        assert_eq!(rows[2].current, "GHS 120.00");
        assert_eq!(rows[2].growth, "+20.0%");
    }

    #[test]
    fn test_trend_covers_both_years() {
        let rows = generate_trend(&cmp());
        let keys: Vec<(i32, &str)> = rows.iter().map(|r| (r.year, r.month.as_str())).collect();
        assert_eq!(
            keys,
            vec![(2023, "January"), (2024, "January"), (2024, "February")]
        );
        assert_eq!(rows[2].average_value, "NaN");
    }

    #[test]
    fn test_package_rows_and_growth() {
        let c = cmp();
        let pkgs = generate_packages(&c.current);
        assert_eq!(pkgs[0].package, "Basic");
        assert_eq!(pkgs[0].share_pct, "100.0");
        assert_eq!(pkgs[1].average_value, "NaN");

        let growth = generate_package_growth(&c);
        assert_eq!(growth[0].package, "Basic");
        assert_eq!(growth[0].growth, "+80.0%");
        assert_eq!(growth[1].package, "New");
        assert_eq!(growth[1].growth, "No Change");
    }

    #[test]
    fn test_statistics_rows() {
        let rows = generate_statistics(&cmp().current);
        let get = |label: &str| {
            rows.iter()
                .find(|r| r.label == label)
                .map(|r| r.value.clone())
                .unwrap()
        };
        assert_eq!(rows.len(), 7);
        assert_eq!(get("Total Revenue"), "GHS 1,800.00");
        assert_eq!(get("Average Revenue per Month"), "GHS 900.00");
        assert_eq!(get("Total Subscriptions"), "15");
        assert_eq!(get("Average Subscriptions per Month"), "7.5");
        assert_eq!(get("Highest Monthly Revenue"), "GHS 1,800.00");
        assert_eq!(get("Lowest Monthly Revenue"), "GHS 0.00");
        assert_eq!(get("Average Revenue per Subscription"), "GHS 120.00");
    }

    #[test]
    fn test_statistics_on_empty_firm_table() {
        let rows = generate_statistics(&Table::empty(SchemaKind::Firm));
        assert_eq!(rows[0].value, "GHS 0.00");
        assert_eq!(rows[1].value, "NaN");
        assert_eq!(rows[2].label, "Total Users");
        assert_eq!(rows[2].value, "0");
        assert_eq!(rows[4].value, "NaN");
        assert_eq!(rows[6].label, "Average Revenue per User");
        assert_eq!(rows[6].value, "NaN");
    }

    #[test]
    fn test_highlights_and_summary() {
        let c = cmp();
        let rows = generate_highlights(&c, 1);
        assert_eq!(rows[0].label, "Top month #1");
        assert_eq!(rows[0].value, "January (GHS 1,800.00)");
        assert!(rows.iter().any(|r| r.label == "Q1 growth" && r.value == "+80.0%"));

        let summary = generate_summary(&c);
        assert_eq!(summary.year, Some(2024));
        assert_eq!(summary.filtered_rows, 2);
        assert_eq!(summary.metrics[0].growth_pct, Some(80.0));
        assert_eq!(summary.metrics[0].classification, "positive");
        assert_eq!(summary.months, vec![Month::January, Month::February]);
    }
}
