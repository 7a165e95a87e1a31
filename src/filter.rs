//! Filter state and "All" normalization.
//!
//! A multi-select dimension is either every value present in the data
//! ([`Selection::AllOf`]) or an explicit subset. The "All" label exists
//! only at the UI boundary ([`Selection::from_labels`]); engine code only
//! ever sees resolved value lists.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{Month, Table};

/// UI label for the every-value option.
pub const ALL_LABEL: &str = "All";

/// A user selection for one multi-select dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selection<T> {
    AllOf,
    Explicit(Vec<T>),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::AllOf
    }
}

impl<T: Clone + PartialEq> Selection<T> {
    /// Build a selection from UI labels.
    ///
    /// An empty list or `["All"]` selects everything. When "All" appears
    /// alongside explicit values, "All" is dropped and the explicit values
    /// win, wherever "All" sits in the list. Labels `parse` rejects select
    /// nothing, so a list of only unrecognised labels is an explicit empty
    /// selection.
    pub fn from_labels<S, F>(labels: &[S], parse: F) -> Self
    where
        S: AsRef<str>,
        F: Fn(&str) -> Option<T>,
    {
        let given: Vec<&str> = explicit_labels(labels).collect();
        if given.is_empty() {
            return Selection::AllOf;
        }
        Selection::Explicit(given.into_iter().filter_map(parse).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::AllOf)
    }
}

fn explicit_labels<S: AsRef<str>>(labels: &[S]) -> impl Iterator<Item = &str> {
    labels
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty() && *l != ALL_LABEL)
}

/// Labels `parse` does not recognise, for warning the user.
pub fn unknown_labels<S, T, F>(labels: &[S], parse: F) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> Option<T>,
{
    explicit_labels(labels)
        .filter(|l| parse(l).is_none())
        .map(str::to_string)
        .collect()
}

/// Resolve a selection against the values present in the data.
///
/// The result follows `universe` order. `AllOf` yields the full universe;
/// otherwise only explicit values that actually occur in the universe
/// survive, and an explicit empty selection yields nothing.
pub fn normalize<T: Clone + PartialEq>(selection: &Selection<T>, universe: &[T]) -> Vec<T> {
    match selection {
        Selection::AllOf => universe.to_vec(),
        Selection::Explicit(values) => universe
            .iter()
            .filter(|u| values.contains(u))
            .cloned()
            .collect(),
    }
}

/// Distinct values per filter dimension, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Universe {
    /// Ascending.
    pub years: Vec<i32>,
    /// Calendar order.
    pub months: Vec<Month>,
    /// Lexical order.
    pub packages: Vec<String>,
}

impl Universe {
    pub fn of(table: &Table) -> Self {
        let years: BTreeSet<i32> = table.records.iter().map(|r| r.year).collect();
        let months: BTreeSet<Month> = table.records.iter().map(|r| r.month).collect();
        let packages: BTreeSet<&str> = table.records.iter().map(|r| r.package.as_str()).collect();
        Universe {
            years: years.into_iter().collect(),
            months: months.into_iter().collect(),
            packages: packages.into_iter().map(str::to_string).collect(),
        }
    }
}

/// The user's filter choices. Replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterState {
    /// `None` leaves the year dimension unfiltered.
    pub year: Option<i32>,
    pub months: Selection<Month>,
    pub packages: Selection<String>,
}

impl FilterState {
    pub fn new(year: Option<i32>, months: Selection<Month>, packages: Selection<String>) -> Self {
        FilterState { year, months, packages }
    }

    pub fn for_year(year: i32) -> Self {
        FilterState {
            year: Some(year),
            ..FilterState::default()
        }
    }

    pub fn with_year(&self, year: Option<i32>) -> Self {
        FilterState {
            year,
            ..self.clone()
        }
    }

    /// Resolve both multi-select dimensions against `table`.
    pub fn resolve(&self, table: &Table) -> ResolvedFilter {
        let universe = Universe::of(table);
        ResolvedFilter {
            year: self.year,
            months: normalize(&self.months, &universe.months),
            packages: normalize(&self.packages, &universe.packages),
        }
    }
}

/// A filter with every "All" expanded to concrete values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFilter {
    pub year: Option<i32>,
    pub months: Vec<Month>,
    pub packages: Vec<String>,
}

impl ResolvedFilter {
    pub fn matches(&self, year: i32, month: Month, package: &str) -> bool {
        self.year.map_or(true, |y| y == year)
            && self.months.contains(&month)
            && self.packages.iter().any(|p| p == package)
    }

    pub fn with_year(&self, year: Option<i32>) -> Self {
        ResolvedFilter {
            year,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, SchemaKind};

    fn rec(month: Month, year: i32, package: &str) -> Record {
        Record {
            month,
            year,
            package: package.to_string(),
            amount: 1.0,
            subscriptions: 1,
            firms: 0,
            users: 0,
        }
    }

    #[test]
    fn test_all_expands_to_universe_in_calendar_order() {
        let universe = vec![Month::January, Month::March];
        let sel = Selection::from_labels(&["All"], Month::from_name);
        assert_eq!(normalize(&sel, &universe), vec![Month::January, Month::March]);
    }

    #[test]
    fn test_empty_selection_means_everything() {
        let universe = vec!["Basic".to_string(), "Pro".to_string()];
        let from_ui: Selection<String> =
            Selection::from_labels::<&str, _>(&[], |s| Some(s.to_string()));
        assert!(from_ui.is_all());
        assert_eq!(normalize(&from_ui, &universe), universe);
        let blanks = Selection::from_labels(&["", "  "], |s| Some(s.to_string()));
        assert!(blanks.is_all());
    }

    #[test]
    fn test_unrecognised_month_labels_select_nothing() {
        let universe = vec![Month::January, Month::March];
        let sel = Selection::from_labels(&["march"], Month::from_name);
        assert_eq!(sel, Selection::Explicit(vec![]));
        assert!(normalize(&sel, &universe).is_empty());

        let mixed = Selection::from_labels(&["All", "march", "January"], Month::from_name);
        assert_eq!(mixed, Selection::Explicit(vec![Month::January]));
        assert_eq!(
            unknown_labels(&["All", "march", "January"], Month::from_name),
            vec!["march".to_string()]
        );
    }

    #[test]
    fn test_unrecognised_months_filter_to_empty_table() {
        let table = Table::new(SchemaKind::Solo, vec![rec(Month::January, 2024, "Basic")]);
        let f = FilterState::new(
            Some(2024),
            Selection::from_labels(&["march"], Month::from_name),
            Selection::AllOf,
        );
        let resolved = f.resolve(&table);
        assert!(resolved.months.is_empty());
        assert!(!resolved.matches(2024, Month::January, "Basic"));
    }

    #[test]
    fn test_explicit_values_win_over_all_regardless_of_position() {
        let first = Selection::from_labels(&["All", "March"], Month::from_name);
        let last = Selection::from_labels(&["March", "All"], Month::from_name);
        assert_eq!(first, Selection::Explicit(vec![Month::March]));
        assert_eq!(first, last);
    }

    #[test]
    fn test_explicit_result_follows_universe_order() {
        let universe = vec![Month::January, Month::March, Month::June];
        let sel = Selection::Explicit(vec![Month::June, Month::January]);
        assert_eq!(normalize(&sel, &universe), vec![Month::January, Month::June]);
    }

    #[test]
    fn test_explicit_values_absent_from_data_resolve_to_nothing() {
        let universe = vec![Month::January];
        let sel = Selection::Explicit(vec![Month::July]);
        assert!(normalize(&sel, &universe).is_empty());
    }

    #[test]
    fn test_universe_ordering() {
        let table = Table::new(
            SchemaKind::Solo,
            vec![
                rec(Month::March, 2024, "Pro"),
                rec(Month::January, 2023, "Basic"),
                rec(Month::March, 2023, "Pro"),
                rec(Month::February, 2024, "Annual"),
            ],
        );
        let u = Universe::of(&table);
        assert_eq!(u.years, vec![2023, 2024]);
        assert_eq!(u.months, vec![Month::January, Month::February, Month::March]);
        assert_eq!(u.packages, vec!["Annual", "Basic", "Pro"]);
    }

    #[test]
    fn test_resolved_filter_matches() {
        let f = ResolvedFilter {
            year: Some(2024),
            months: vec![Month::January],
            packages: vec!["Basic".to_string()],
        };
        assert!(f.matches(2024, Month::January, "Basic"));
        assert!(!f.matches(2023, Month::January, "Basic"));
        assert!(!f.matches(2024, Month::February, "Basic"));
        assert!(!f.matches(2024, Month::January, "Pro"));
        assert!(f.with_year(None).matches(2023, Month::January, "Basic"));
    }
}
