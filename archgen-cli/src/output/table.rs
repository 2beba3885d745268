//! Table output formatting using the `tabled` crate

use tabled::{builder::Builder, settings::style::Style};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Rounded table with a header row.
    pub fn format_rows(headers: &[&str], rows: Vec<Vec<String>>) -> String {
        if rows.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().copied());
        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Two-column key/value table.
    pub fn format_key_value(pairs: &[(&str, String)]) -> String {
        let rows = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.clone()])
            .collect();
        Self::format_rows(&["Field", "Value"], rows)
    }
}
