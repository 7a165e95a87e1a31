use sales_dashboard::engine::{aggregate_by_month, compare, kpis};
use sales_dashboard::growth::{quarter_growth, ytd_growth};
use sales_dashboard::loader::{self, read_csv};
use sales_dashboard::output::write_export;
use sales_dashboard::reports::generate_summary;
use sales_dashboard::*;

fn solo(month: Month, year: i32, package: &str, subs: u64, amount: f64) -> Record {
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

fn fixture() -> Table {
    Table::new(
        SchemaKind::Solo,
        vec![
            solo(Month::January, 2023, "Basic", 10, 1000.0),
            solo(Month::January, 2024, "Basic", 15, 1800.0),
            solo(Month::March, 2024, "Premium", 4, 2000.0),
            solo(Month::February, 2024, "Basic", 0, 0.0),
            solo(Month::December, 2023, "Premium", 2, 900.0),
            solo(Month::March, 2023, "Basic", 3, 250.0),
            solo(Month::January, 2024, "Basic", 5, 200.0),
            solo(Month::July, 2022, "Legacy", 1, 50.0),
        ],
    )
}

fn filters() -> Vec<FilterState> {
    vec![
        FilterState::default(),
        FilterState::for_year(2024),
        FilterState::for_year(2023),
        FilterState::for_year(1999),
        FilterState::new(
            Some(2024),
            Selection::Explicit(vec![Month::January, Month::March]),
            Selection::AllOf,
        ),
        FilterState::new(
            None,
            Selection::AllOf,
            Selection::Explicit(vec!["Premium".to_string()]),
        ),
        FilterState::new(
            Some(2023),
            Selection::Explicit(vec![Month::March]),
            Selection::Explicit(vec!["Basic".to_string(), "Unknown".to_string()]),
        ),
        FilterState::new(
            None,
            Selection::Explicit(vec![Month::November]),
            Selection::AllOf,
        ),
    ]
}

#[test]
fn test_apply_returns_subset_satisfying_predicates() {
    let table = fixture();
    for f in filters() {
        let resolved = f.resolve(&table);
        let out = apply(&table, &f);
        for r in &out.records {
            assert!(table.records.contains(r), "fabricated row {:?}", r);
            assert!(resolved.matches(r.year, r.month, &r.package));
        }
        // Every matching row is kept.
        let expected = table
            .records
            .iter()
            .filter(|r| resolved.matches(r.year, r.month, &r.package))
            .count();
        assert_eq!(out.len(), expected);
    }
}

#[test]
fn test_apply_is_idempotent() {
    let table = fixture();
    for f in filters() {
        let once = apply(&table, &f);
        let twice = apply(&once, &f);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_period_totals_match_filtered_sums() {
    let table = fixture();
    let measures = [Measure::Amount, Measure::Subscriptions];
    for f in filters() {
        let filtered = apply(&table, &f);
        let rows = aggregate_by_period(&filtered, &measures);
        for m in measures {
            let total: f64 = rows.iter().map(|r| r.total(m).unwrap()).sum();
            assert_eq!(total, filtered.sum(m));
        }
        let by_pkg: f64 = aggregate_by_package(&filtered, &measures)
            .iter()
            .map(|r| r.total(Measure::Amount).unwrap())
            .sum();
        assert_eq!(by_pkg, filtered.sum(Measure::Amount));
    }
}

#[test]
fn test_empty_filtered_table_aggregates_to_nothing() {
    let table = fixture();
    let filtered = apply(&table, &FilterState::for_year(1999));
    assert!(filtered.is_empty());
    assert!(aggregate_by_period(&filtered, &[Measure::Amount]).is_empty());
    assert!(aggregate_by_package(&filtered, &[Measure::Amount]).is_empty());
    assert!(aggregate_by_month(&filtered, &[Measure::Amount]).is_empty());
}

#[test]
fn test_period_order_is_calendar_not_lexical() {
    let rows = aggregate_by_period(&fixture(), &[Measure::Amount]);
    let keys: Vec<(i32, Month)> = rows.iter().map(|r| (r.key.year, r.key.month)).collect();
    assert_eq!(
        keys,
        vec![
            (2022, Month::July),
            (2023, Month::January),
            (2023, Month::March),
            (2023, Month::December),
            (2024, Month::January),
            (2024, Month::February),
            (2024, Month::March),
        ]
    );
}

#[test]
fn test_all_normalizes_in_calendar_order() {
    let universe = vec![Month::January, Month::March];
    let sel = Selection::from_labels(&["All"], Month::from_name);
    assert_eq!(normalize(&sel, &universe), vec![Month::January, Month::March]);
}

#[test]
fn test_growth_classification_cases() {
    let g = yoy_growth(100.0, 50.0);
    assert_eq!((g.value, g.classification), (Some(100.0), Classification::Positive));
    let g = yoy_growth(50.0, 100.0);
    assert_eq!((g.value, g.classification), (Some(-50.0), Classification::Negative));
    let g = yoy_growth(0.0, 0.0);
    assert_eq!((g.value, g.classification), (Some(0.0), Classification::NoChange));
    let g = yoy_growth(50.0, 0.0);
    assert_eq!(g.classification, Classification::Undefined);
    assert!(g.value.is_none());
}

#[test]
fn test_end_to_end_solo_scenario() {
    let csv = "\
Month,Year,Subscription Package,Number of Subscriptions,Amount (GHS)
January,2023,Basic,10,1000
January,2024,Basic,15,1800
";
    let (table, _) = read_csv(csv.as_bytes(), SchemaKind::Solo).unwrap();
    let mut session = SessionContext::new();
    session.load(table, None);
    session.set_year(Some(2024));
    session.set_months(Selection::from_labels(&["All"], Month::from_name));
    session.set_packages(Selection::from_labels(&["All"], |s| Some(s.to_string())));

    let cmp = session.comparison().unwrap();
    let current = cmp.current.sum(Measure::Amount);
    let previous = cmp.previous.sum(Measure::Amount);
    assert_eq!(current / cmp.current.sum(Measure::Subscriptions), 120.0);
    assert_eq!(previous / cmp.previous.sum(Measure::Subscriptions), 100.0);

    let g = yoy_growth(current, previous);
    assert_eq!(g.value, Some(80.0));
    assert_eq!(g.classification, Classification::Positive);

    let metrics = kpis(&cmp);
    let avg = metrics.iter().find(|m| m.label == "Average Value").unwrap();
    assert_eq!((avg.current, avg.previous), (120.0, 100.0));
    assert_eq!(avg.growth.value, Some(20.0));

    let summary = generate_summary(&cmp);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["year"], 2024);
    assert_eq!(json["metrics"][0]["growth_pct"], 80.0);
}

#[test]
fn test_end_to_end_firm_with_new_package() {
    let csv = "\
Month,Year,Subscription Package,Number of Firms,Number of Users,Amount (GHS)
April,2023,Team,2,10,500
April,2024,Team,3,15,900
May,2024,Enterprise,1,40,4000
";
    let (table, _) = read_csv(csv.as_bytes(), SchemaKind::Firm).unwrap();
    let cmp = compare(&table, &FilterState::for_year(2024));

    let ent_only = FilterState::new(
        Some(2024),
        Selection::AllOf,
        Selection::Explicit(vec!["Enterprise".to_string()]),
    );
    let ent = kpis(&compare(&table, &ent_only));
    let revenue = ent.iter().find(|m| m.label == "Total Revenue").unwrap();
    assert_eq!(revenue.growth.classification, Classification::Undefined);

    let all = kpis(&cmp);
    let firms = all.iter().find(|m| m.label == "Total Firms").unwrap();
    assert_eq!((firms.current, firms.previous), (4.0, 2.0));
    assert_eq!(firms.growth.value, Some(100.0));

    // Latest month is May, so Q2; only April existed a year earlier.
    let q = quarter_growth(&cmp).unwrap();
    assert_eq!(q.quarter, 2);
    assert_eq!(q.growth.value, Some((4900.0 - 500.0) / 500.0 * 100.0));
    assert_eq!(ytd_growth(&cmp).value, q.growth.value);

    let mut buf = Vec::new();
    write_export(&mut buf, &cmp.current, true).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with(
        "Month,Year,Subscription Package,Number of Firms,Number of Users,Amount (GHS),Users per Firm"
    ));
    assert!(text.contains("May,2024,Enterprise,1,40,\"4,000.00\",40.00,100.00,\"4,000.00\""));
}

#[test]
fn test_rejected_upload_keeps_previous_table() {
    let mut session = SessionContext::new();
    session.load(fixture(), None);
    let bad = "Month,Year,Subscription Package,Number of Subscriptions,Amount (GHS)\nJanuary,2024,Basic,1,abc\n";
    let err = read_csv(bad.as_bytes(), SchemaKind::Solo).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Schema(SchemaError::InvalidType(ref c)) if c == "Amount (GHS)"
    ));
    assert_eq!(session.table().unwrap().len(), fixture().len());
}

#[test]
fn test_bundled_sample_files_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let (solo, report) =
        loader::load_csv(&dir.join("solo_sales.csv"), SchemaKind::Solo).unwrap();
    assert_eq!(report.years, vec![2023, 2024]);
    let cmp = compare(&solo, &FilterState::for_year(2024));
    assert_eq!(cmp.current.sum(Measure::Amount), 9820.0);
    assert_eq!(cmp.previous.sum(Measure::Amount), 5000.0);

    let (firm, _) = loader::load_csv(&dir.join("firm_sales.csv"), SchemaKind::Firm).unwrap();
    assert_eq!(Universe::of(&firm).packages, vec!["Enterprise", "Team"]);
}
