use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::resolve_config;
use crate::compressor::analyze;
use crate::error::Result;
use crate::fmt::count;
use crate::models::ColumnClass;
use crate::report::parse_report;

pub fn run(file: &str, key: Option<&str>) -> Result<()> {
    let config = resolve_config(key, None)?;
    let raw = std::fs::read(file)?;
    let report = parse_report(&raw, &config)?;
    let analysis = analyze(&report, &config);

    let mut table = Table::new();
    table.set_header(vec!["#", "Column", "Treatment"]);
    for (i, (name, class)) in analysis.columns.iter().enumerate() {
        let label = match class {
            ColumnClass::Key => class.label().cyan().bold(),
            ColumnClass::Metric => class.label().green(),
            ColumnClass::Descriptive => class.label().normal(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(name),
            Cell::new(label),
        ]);
    }
    println!("{table}");

    println!("Rows:          {}", count(analysis.total_rows));
    match analysis.distinct_keys {
        Some(n) => println!("Distinct keys: {}", count(n)),
        None => println!(
            "{}",
            format!("Grouping key column '{}' not found", config.grouping_key).red()
        ),
    }
    let metrics = analysis
        .columns
        .iter()
        .filter(|(_, c)| *c == ColumnClass::Metric)
        .count();
    if metrics == 0 {
        println!("{}", "No metric columns recognized".red());
    }
    Ok(())
}
