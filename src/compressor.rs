use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::{Result, RoyaltyError};
use crate::models::{ColumnClass, ColumnOrder, CompressSummary, Report};
use crate::report::{parse_report, write_report};
use crate::settings::DEFAULT_METRIC_COLUMNS;

/// Read-only settings for one compression run. Safe to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressorConfig {
    pub grouping_key: String,
    /// Known metric names, already header-normalized.
    pub metric_columns: Vec<String>,
    pub column_order: ColumnOrder,
    pub adjustment_column: Option<String>,
    pub adjustment_placeholder: String,
    pub preamble_token: String,
    pub delimiter: u8,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            grouping_key: "Asset ID".to_string(),
            metric_columns: DEFAULT_METRIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
            column_order: ColumnOrder::Grouped,
            adjustment_column: Some("Adjustment Type".to_string()),
            adjustment_placeholder: "None".to_string(),
            preamble_token: "Asset Summary".to_string(),
            delimiter: b',',
        }
    }
}

impl CompressorConfig {
    pub fn with_grouping_key(mut self, key: &str) -> Self {
        self.grouping_key = crate::report::normalize_header(key);
        self
    }

    pub fn with_column_order(mut self, order: ColumnOrder) -> Self {
        self.column_order = order;
        self
    }

    pub fn classify(&self, column: &str) -> ColumnClass {
        if column == self.grouping_key {
            ColumnClass::Key
        } else if self.metric_columns.iter().any(|m| m == column) {
            ColumnClass::Metric
        } else {
            ColumnClass::Descriptive
        }
    }
}

/// Result of [`compress`]: serialized output plus the table it came from.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub report: Report,
    pub summary: CompressSummary,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Lenient numeric parse: blanks, placeholders, NaN and infinities count as zero.
pub fn coerce_numeric(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// A sum that overflowed is written as 0, the value it would coerce to on re-read.
fn format_metric(val: f64) -> String {
    if val.is_finite() {
        format!("{val}")
    } else {
        "0".to_string()
    }
}

fn fill_adjustment_column(report: &mut Report, config: &CompressorConfig) {
    let Some(column) = config.adjustment_column.as_deref() else {
        return;
    };
    let Some(idx) = report.column_index(column) else {
        return;
    };
    let mut filled = 0usize;
    for row in &mut report.rows {
        if row[idx].trim().is_empty() {
            row[idx] = config.adjustment_placeholder.clone();
            filled += 1;
        }
    }
    if filled > 0 {
        debug!(column, filled, "filled blank adjustment cells");
    }
}

/// Collapse rows sharing a grouping key into one row each. Metric columns are
/// summed, every other column keeps the value of the group's first row, and
/// groups are emitted in order of first appearance.
pub fn compress_report(mut report: Report, config: &CompressorConfig) -> Result<(Report, CompressSummary)> {
    let key_idx = report
        .column_index(&config.grouping_key)
        .ok_or_else(|| RoyaltyError::MissingColumn(config.grouping_key.clone()))?;

    fill_adjustment_column(&mut report, config);

    let metric_idx: Vec<usize> = report
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != key_idx && config.classify(h) == ColumnClass::Metric)
        .map(|(i, _)| i)
        .collect();
    if metric_idx.is_empty() {
        return Err(RoyaltyError::NoAggregatableColumns);
    }
    let metric_columns: Vec<String> = metric_idx.iter().map(|&i| report.headers[i].clone()).collect();
    info!(columns = ?metric_columns, "found metric columns");

    let input_rows = report.rows.len();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    let mut firsts: Vec<Vec<String>> = Vec::new();
    let mut sums: Vec<Vec<f64>> = Vec::new();
    let mut dropped_rows = 0usize;

    for row in report.rows {
        if row[key_idx].is_empty() {
            dropped_rows += 1;
            continue;
        }
        let values: Vec<f64> = metric_idx.iter().map(|&i| coerce_numeric(&row[i])).collect();
        match group_of.get(&row[key_idx]).copied() {
            Some(g) => {
                for (acc, v) in sums[g].iter_mut().zip(values) {
                    *acc += v;
                }
            }
            None => {
                group_of.insert(row[key_idx].clone(), firsts.len());
                sums.push(values);
                firsts.push(row);
            }
        }
    }
    if dropped_rows > 0 {
        warn!(dropped_rows, key = %config.grouping_key, "dropped rows with an empty grouping key");
    }

    let mut rows = firsts;
    for (row, group_sums) in rows.iter_mut().zip(&sums) {
        for (&i, total) in metric_idx.iter().zip(group_sums) {
            row[i] = format_metric(*total);
        }
    }

    let order = column_layout(&report.headers, key_idx, &metric_idx, config.column_order);
    let headers = order.iter().map(|&i| report.headers[i].clone()).collect();
    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| order.iter().map(|&i| row[i].clone()).collect())
        .collect();

    let summary = CompressSummary {
        input_rows,
        output_rows: rows.len(),
        dropped_rows,
        metric_columns,
    };
    info!(input_rows, output_rows = summary.output_rows, "report compressed");
    Ok((Report { headers, rows }, summary))
}

fn column_layout(headers: &[String], key_idx: usize, metric_idx: &[usize], order: ColumnOrder) -> Vec<usize> {
    match order {
        ColumnOrder::Original => (0..headers.len()).collect(),
        ColumnOrder::Grouped => {
            let metrics: HashSet<usize> = metric_idx.iter().copied().collect();
            std::iter::once(key_idx)
                .chain((0..headers.len()).filter(|i| *i != key_idx && !metrics.contains(i)))
                .chain(metric_idx.iter().copied())
                .collect()
        }
    }
}

/// Full pipeline: raw delimited bytes in, compressed delimited bytes out.
pub fn compress(raw: &[u8], config: &CompressorConfig) -> Result<Compressed> {
    let report = parse_report(raw, config)?;
    let (report, summary) = compress_report(report, config)?;
    let bytes = write_report(&report, config.delimiter)?;
    Ok(Compressed { bytes, report, summary })
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Column classification for a parsed report, used by `inspect`.
pub struct ReportAnalysis {
    pub columns: Vec<(String, ColumnClass)>,
    pub total_rows: usize,
    pub distinct_keys: Option<usize>,
}

pub fn analyze(report: &Report, config: &CompressorConfig) -> ReportAnalysis {
    let columns = report
        .headers
        .iter()
        .map(|h| (h.clone(), config.classify(h)))
        .collect();
    let distinct_keys = report.column(&config.grouping_key).map(|values| {
        values
            .filter(|v| !v.is_empty())
            .collect::<HashSet<_>>()
            .len()
    });
    ReportAnalysis {
        columns,
        total_rows: report.rows.len(),
        distinct_keys,
    }
}
