//! Per-session state: the loaded table and the current filter.
//!
//! A session is created once by the front-end and passed explicitly to
//! every action. There is no process-wide state; dropping the session
//! drops everything it loaded.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

use crate::engine::{self, Comparison};
use crate::filter::{FilterState, Selection, Universe};
use crate::types::{Month, Table};

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    table: Option<Table>,
    filter: FilterState,
    loaded_at: Option<DateTime<Local>>,
    source: Option<PathBuf>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded table wholesale. Filters reset and the year
    /// defaults to the latest one present.
    pub fn load(&mut self, table: Table, source: Option<PathBuf>) {
        info!(rows = table.len(), kind = table.kind.name(), "session table replaced");
        self.filter = FilterState::default().with_year(table.max_year());
        self.table = Some(table);
        self.loaded_at = Some(Local::now());
        self.source = source;
    }

    pub fn clear(&mut self) {
        info!("session cleared");
        *self = Self::default();
    }

    pub fn reset_filters(&mut self) {
        let year = self.table.as_ref().and_then(Table::max_year);
        self.filter = FilterState::default().with_year(year);
    }

    pub fn set_year(&mut self, year: Option<i32>) {
        self.filter = self.filter.with_year(year);
    }

    pub fn set_months(&mut self, months: Selection<Month>) {
        self.filter = FilterState {
            months,
            ..self.filter.clone()
        };
    }

    pub fn set_packages(&mut self, packages: Selection<String>) {
        self.filter = FilterState {
            packages,
            ..self.filter.clone()
        };
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn universe(&self) -> Universe {
        self.table.as_ref().map(Universe::of).unwrap_or_default()
    }

    /// The loaded table under the current filter; `None` before any load.
    pub fn filtered(&self) -> Option<Table> {
        self.table
            .as_ref()
            .map(|t| engine::apply(t, &self.filter))
    }

    pub fn comparison(&self) -> Option<Comparison> {
        self.table
            .as_ref()
            .map(|t| engine::compare(t, &self.filter))
    }
}
