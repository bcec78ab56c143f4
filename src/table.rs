//! Tabular data in its two shapes: the untyped [`RawTable`] read from a source
//! spreadsheet export, and the elastic text tables reports are rendered into.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::parse_number;

/// Rows × named columns exactly as read, before any schema resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Builds a table whose first row is the header. An empty input yields a
    /// table with no columns.
    pub fn from_rows(name: impl Into<String>, mut rows: Vec<Vec<String>>) -> Self {
        let headers = if rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
        };
        Self::new(name, headers, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, or `""` when the row is shorter than the header.
    pub fn cell(row: &[String], column: usize) -> &str {
        row.get(column).map(|s| s.as_str()).unwrap_or("")
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut numeric = vec![!rows.is_empty(); column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            if !cell.is_empty() && parse_number(cell).is_none() {
                numeric[idx] = false;
            }
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let separator = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &numeric));
    }
    output
}

// Numeric columns are right-aligned so decimal places line up.
fn format_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            if right_align.get(idx).copied().unwrap_or(false) {
                format!("{padding}{sanitized}")
            } else {
                format!("{sanitized}{padding}")
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
