use serde::{Deserialize, Serialize};

/// An ordered table of string cells sharing one ordered header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell values of one column, in row order.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r[idx].as_str()))
    }
}

/// Final column layout of a compressed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    /// Grouping key, then descriptive columns, then metric columns.
    #[default]
    Grouped,
    /// Input column order unchanged.
    Original,
}

impl ColumnOrder {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Grouped => "grouped",
            Self::Original => "original",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Key,
    Descriptive,
    Metric,
}

impl ColumnClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Descriptive => "descriptive",
            Self::Metric => "metric",
        }
    }
}

/// Row counts reported alongside a compressed report.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub dropped_rows: usize,
    pub metric_columns: Vec<String>,
}
