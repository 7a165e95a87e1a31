//! # Sales Dashboard
//!
//! Filter and aggregate subscription-sales tables for a year-over-year
//! dashboard.
//!
//! A table is loaded once per upload ([`loader`]), checked against one of
//! two layouts ([`schema`]), and then queried through a [`FilterState`]:
//! a year, a month selection and a package selection, where either
//! selection may be "All". The [`engine`] applies filters and groups rows
//! by period or package; [`growth`] compares the selected year against
//! the year before it.
//!
//! ```rust,ignore
//! use sales_dashboard::*;
//!
//! let (table, _) = loader::load_csv(Path::new("solo.csv"), SchemaKind::Solo)?;
//! let filter = FilterState::for_year(2024);
//! let cmp = engine::compare(&table, &filter);
//! let growth = yoy_growth(cmp.current.sum(Measure::Amount), cmp.previous.sum(Measure::Amount));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod growth;
pub mod loader;
pub mod output;
pub mod reports;
pub mod schema;
pub mod session;
pub mod types;
pub mod util;

pub use engine::{
    aggregate_by_package, aggregate_by_period, apply, compare, AggregateRow, Comparison,
    PeriodKey,
};
pub use error::{ConfigError, ExportError, LoadError, SchemaError};
pub use filter::{normalize, FilterState, Selection, Universe};
pub use growth::{yoy_growth, Classification, GrowthResult};
pub use schema::validate;
pub use session::SessionContext;
pub use types::{Measure, Month, RawTable, Record, SchemaKind, Table};
