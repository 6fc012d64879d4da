use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::resolve_config;
use crate::compressor::compress;
use crate::error::Result;
use crate::fmt::rows;
use crate::models::ColumnOrder;

/// "[COMPRESSED] <stem>.csv" in the input's directory.
pub(crate) fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    input.with_file_name(format!("[COMPRESSED] {stem}.csv"))
}

pub fn run(
    file: &str,
    output: Option<String>,
    stdout: bool,
    key: Option<&str>,
    order: Option<ColumnOrder>,
) -> Result<()> {
    let config = resolve_config(key, order)?;
    let input = PathBuf::from(file);
    let raw = std::fs::read(&input)?;

    let compressed = compress(&raw, &config)?;

    if stdout {
        let mut out = std::io::stdout().lock();
        out.write_all(&compressed.bytes)?;
        out.flush()?;
        return Ok(());
    }

    let dest = output.map(PathBuf::from).unwrap_or_else(|| default_output_path(&input));
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, &compressed.bytes)?;

    let summary = &compressed.summary;
    println!(
        "{} {} in, {} out",
        "Compressed".green().bold(),
        rows(summary.input_rows),
        rows(summary.output_rows)
    );
    if summary.dropped_rows > 0 {
        println!(
            "{}",
            format!("{} skipped (empty {})", rows(summary.dropped_rows), config.grouping_key).yellow()
        );
    }
    println!(
        "Summed {} of {} columns",
        summary.metric_columns.len(),
        compressed.report.headers.len()
    );
    println!("Wrote {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let p = default_output_path(Path::new("/tmp/reports/jan.csv"));
        assert_eq!(p, PathBuf::from("/tmp/reports/[COMPRESSED] jan.csv"));
        let p = default_output_path(Path::new("feb"));
        assert_eq!(p, PathBuf::from("[COMPRESSED] feb.csv"));
    }
}
