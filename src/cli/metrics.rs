use comfy_table::Table;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path};

pub fn list() -> Result<()> {
    let settings = load_settings();
    let mut table = Table::new();
    table.set_header(vec!["Metric column"]);
    for name in &settings.metric_columns {
        table.add_row(vec![name]);
    }
    println!("{table}");
    println!("Grouping key: {}", settings.grouping_key);
    println!("Column order: {}", settings.column_order.key());
    println!("Settings:     {}", settings_path().display());
    Ok(())
}

pub fn add(name: &str) -> Result<()> {
    let mut settings = load_settings();
    if !settings.add_metric(name) {
        println!("'{name}' is already a metric column.");
        return Ok(());
    }
    save_settings(&settings)?;
    println!("Added metric column '{name}'.");
    Ok(())
}

pub fn remove(name: &str) -> Result<()> {
    let mut settings = load_settings();
    if !settings.remove_metric(name) {
        println!("'{name}' is not a metric column.");
        return Ok(());
    }
    save_settings(&settings)?;
    println!("Removed metric column '{name}'.");
    Ok(())
}

pub fn reset() -> Result<()> {
    let mut settings = load_settings();
    settings.reset_metrics();
    save_settings(&settings)?;
    println!("Restored {} built-in metric columns.", settings.metric_columns.len());
    Ok(())
}
