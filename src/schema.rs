// Schema validation for uploaded tables.
//
// Checks run column by column in a fixed order so the first reported
// problem is deterministic: missing columns, Year, Amount, Month, then
// the count columns and the non-negative rule. Nothing is partially
// accepted.
use crate::error::SchemaError;
use crate::types::{
    Month, RawTable, Record, SchemaKind, Table, COL_AMOUNT, COL_FIRMS, COL_MONTH, COL_PACKAGE,
    COL_SUBSCRIPTIONS, COL_USERS, COL_YEAR,
};
use crate::util::{parse_f64_safe, parse_int_like};

/// Find a column by name, ignoring surrounding whitespace and case.
pub fn find_column(raw: &RawTable, name: &str) -> Option<usize> {
    raw.headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Validate `raw` against the columns and types required by `kind`.
///
/// Returns a typed [`Table`] on success. Rows keep their input order.
pub fn validate(raw: &RawTable, kind: SchemaKind) -> Result<Table, SchemaError> {
    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|c| find_column(raw, c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }
    // Every required column was found above.
    let col = |name: &str| find_column(raw, name).unwrap_or(usize::MAX);

    let year_idx = col(COL_YEAR);
    let years = raw
        .rows
        .iter()
        .map(|row| {
            parse_int_like(Some(cell(row, year_idx)))
                .filter(|y| (1000..=9999).contains(y))
                .map(|y| y as i32)
                .ok_or_else(|| SchemaError::InvalidType(COL_YEAR.to_string()))
        })
        .collect::<Result<Vec<i32>, _>>()?;

    let amount_idx = col(COL_AMOUNT);
    let amounts = raw
        .rows
        .iter()
        .map(|row| {
            parse_f64_safe(Some(cell(row, amount_idx)))
                .ok_or_else(|| SchemaError::InvalidType(COL_AMOUNT.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let month_idx = col(COL_MONTH);
    let months = raw
        .rows
        .iter()
        .map(|row| {
            let value = cell(row, month_idx).trim();
            Month::from_name(value).ok_or_else(|| SchemaError::InvalidMonth(value.to_string()))
        })
        .collect::<Result<Vec<Month>, _>>()?;

    let mut counts: Vec<(&str, Vec<u64>)> = Vec::new();
    for measure in kind.count_measures() {
        let name = measure.column();
        let idx = col(name);
        let values = raw
            .rows
            .iter()
            .map(|row| match parse_int_like(Some(cell(row, idx))) {
                Some(v) if v < 0 => Err(SchemaError::NegativeValue(name.to_string())),
                Some(v) => Ok(v as u64),
                None => Err(SchemaError::InvalidType(name.to_string())),
            })
            .collect::<Result<Vec<u64>, _>>()?;
        counts.push((name, values));
    }

    if amounts.iter().any(|a| *a < 0.0) {
        return Err(SchemaError::NegativeValue(COL_AMOUNT.to_string()));
    }

    let count_at = |name: &str, i: usize| -> u64 {
        counts
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.get(i).copied())
            .unwrap_or(0)
    };

    let package_idx = col(COL_PACKAGE);
    let records = raw
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| Record {
            month: months[i],
            year: years[i],
            package: cell(row, package_idx).trim().to_string(),
            amount: amounts[i],
            subscriptions: count_at(COL_SUBSCRIPTIONS, i),
            firms: count_at(COL_FIRMS, i),
            users: count_at(COL_USERS, i),
        })
        .collect();

    Ok(Table::new(kind, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    const SOLO: &[&str] = &[
        "Month",
        "Year",
        "Subscription Package",
        "Number of Subscriptions",
        "Amount (GHS)",
    ];

    #[test]
    fn test_valid_solo_table() {
        let t = raw(SOLO, &[&["January", "2024", " Basic ", "15", "1800"]]);
        let table = validate(&t, SchemaKind::Solo).unwrap();
        assert_eq!(table.len(), 1);
        let r = &table.records[0];
        assert_eq!(r.month, Month::January);
        assert_eq!(r.year, 2024);
        assert_eq!(r.package, "Basic");
        assert_eq!(r.subscriptions, 15);
        assert_eq!(r.amount, 1800.0);
    }

    #[test]
    fn test_headers_match_after_trim_and_case() {
        let t = raw(
            &[" month", "YEAR ", "subscription package", "Number of Subscriptions", "amount (ghs)"],
            &[&["March", "2023", "Pro", "2", "10.5"]],
        );
        assert!(validate(&t, SchemaKind::Solo).is_ok());
    }

    #[test]
    fn test_missing_columns_lists_every_absent_column() {
        let t = raw(&["Month", "Year", "Subscription Package"], &[]);
        let err = validate(&t, SchemaKind::Firm).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumns(vec![
                "Number of Firms".to_string(),
                "Number of Users".to_string(),
                "Amount (GHS)".to_string(),
            ])
        );
    }

    #[test]
    fn test_year_checked_before_amount_and_month() {
        let t = raw(SOLO, &[&["Smarch", "20x4", "Basic", "1", "abc"]]);
        assert_eq!(
            validate(&t, SchemaKind::Solo).unwrap_err(),
            SchemaError::InvalidType("Year".to_string())
        );
    }

    #[test]
    fn test_invalid_amount() {
        let t = raw(SOLO, &[&["January", "2024", "Basic", "1", "lots"]]);
        assert_eq!(
            validate(&t, SchemaKind::Solo).unwrap_err(),
            SchemaError::InvalidType("Amount (GHS)".to_string())
        );
    }

    #[test]
    fn test_invalid_month_reports_value() {
        let t = raw(SOLO, &[&["january", "2024", "Basic", "1", "10"]]);
        assert_eq!(
            validate(&t, SchemaKind::Solo).unwrap_err(),
            SchemaError::InvalidMonth("january".to_string())
        );
    }

    #[test]
    fn test_year_must_have_four_digits() {
        let t = raw(SOLO, &[&["January", "0", "Basic", "1", "10"]]);
        assert!(matches!(
            validate(&t, SchemaKind::Solo),
            Err(SchemaError::InvalidType(c)) if c == "Year"
        ));
    }

    #[test]
    fn test_negative_values_rejected() {
        let t = raw(SOLO, &[&["January", "2024", "Basic", "-1", "10"]]);
        assert_eq!(
            validate(&t, SchemaKind::Solo).unwrap_err(),
            SchemaError::NegativeValue("Number of Subscriptions".to_string())
        );
        let t = raw(SOLO, &[&["January", "2024", "Basic", "1", "-10"]]);
        assert_eq!(
            validate(&t, SchemaKind::Solo).unwrap_err(),
            SchemaError::NegativeValue("Amount (GHS)".to_string())
        );
    }

    #[test]
    fn test_firm_counts_parsed() {
        let t = raw(
            &["Month", "Year", "Subscription Package", "Number of Firms", "Number of Users", "Amount (GHS)"],
            &[&["July", "2024.0", "Enterprise", "3", "1,200", "9,000.00"]],
        );
        let table = validate(&t, SchemaKind::Firm).unwrap();
        let r = &table.records[0];
        assert_eq!((r.firms, r.users, r.subscriptions), (3, 1200, 0));
        assert_eq!(r.amount, 9000.0);
    }

    #[test]
    fn test_empty_table_is_valid() {
        let t = raw(SOLO, &[]);
        let table = validate(&t, SchemaKind::Solo).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.kind, SchemaKind::Solo);
    }
}
