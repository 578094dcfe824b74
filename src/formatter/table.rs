//! Table formatting using tabled
//!
//! This module renders small tabular views on the terminal:
//! - Result previews after an export
//! - Bound parameters of a dry run
//! - The list of known city codes

use std::collections::BTreeMap;

use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::executor::Row;
use crate::query::CityEntry;

use super::cell_text;

/// Maximum width for a single column (characters)
const MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for terminal output
pub struct TableFormatter {
    /// Table style
    style: TableStyle,

    /// Enable colored output
    use_colors: bool,
}

/// Available table styles
#[derive(Debug, Clone, Copy)]
pub enum TableStyle {
    /// Modern style with box-drawing characters
    Modern,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self::with_colors(false)
    }

    /// Create a new table formatter with color support
    ///
    /// # Arguments
    /// * `use_colors` - Enable colored header row
    ///
    /// # Returns
    /// * `Self` - New table formatter
    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            style: TableStyle::Modern,
            use_colors,
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Format result rows under their column headers
    ///
    /// # Arguments
    /// * `columns` - Header names
    /// * `rows` - Rows to show
    ///
    /// # Returns
    /// * `String` - Rendered table
    pub fn format_rows(&self, columns: &[String], rows: &[Row]) -> String {
        if rows.is_empty() {
            return "(empty result set)".to_string();
        }

        let records = rows
            .iter()
            .map(|row| row.iter().map(|v| cell_text(v).into_owned()).collect());
        self.render(columns.to_vec(), records)
    }

    /// Format bound query parameters as name/value pairs
    pub fn format_parameters(&self, parameters: &BTreeMap<String, String>) -> String {
        let records = parameters
            .iter()
            .map(|(name, value)| vec![name.clone(), value.clone()]);
        self.render(vec!["parameter".to_string(), "value".to_string()], records)
    }

    /// Format the known city codes
    pub fn format_cities(&self, cities: &[CityEntry]) -> String {
        let records = cities.iter().map(|c| {
            vec![
                c.code.to_string(),
                c.name.to_string(),
                c.region.to_string(),
            ]
        });
        self.render(
            vec!["code".to_string(), "city".to_string(), "region".to_string()],
            records,
        )
    }

    fn render(
        &self,
        header: Vec<String>,
        records: impl Iterator<Item = Vec<String>>,
    ) -> String {
        let width = header.len();

        let mut builder = Builder::default();
        builder.push_record(header);
        for record in records {
            builder.push_record(record);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        for i in 0..width {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(MAX_COLUMN_WIDTH)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        table.to_string()
    }

    /// Apply table style
    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
