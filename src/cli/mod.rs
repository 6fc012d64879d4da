pub mod compress;
pub mod handle;
pub mod inspect;
pub mod metrics;

use clap::{Parser, Subcommand};

use crate::compressor::CompressorConfig;
use crate::error::Result;
use crate::models::ColumnOrder;
use crate::settings::load_settings;

/// Config from saved settings with per-invocation overrides applied.
pub(crate) fn resolve_config(key: Option<&str>, order: Option<ColumnOrder>) -> Result<CompressorConfig> {
    let mut config = load_settings().compressor_config()?;
    if let Some(k) = key {
        config = config.with_grouping_key(k);
    }
    if let Some(o) = order {
        config = config.with_column_order(o);
    }
    Ok(config)
}

#[derive(Parser)]
#[command(
    name = "royalty-compressor",
    about = "Collapse royalty report rows into one summed row per asset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a royalty report CSV.
    Compress {
        /// Path to the report CSV
        file: String,
        /// Output path (default: "[COMPRESSED] <name>.csv" next to the input)
        #[arg(long, conflicts_with = "stdout")]
        output: Option<String>,
        /// Write the compressed CSV to stdout instead of a file
        #[arg(long)]
        stdout: bool,
        /// Grouping key column (default from settings: "Asset ID")
        #[arg(long)]
        key: Option<String>,
        /// Column layout of the output
        #[arg(long, value_enum)]
        order: Option<ColumnOrder>,
    },
    /// Show how each column of a report would be treated.
    Inspect {
        /// Path to the report CSV
        file: String,
        /// Grouping key column
        #[arg(long)]
        key: Option<String>,
    },
    /// Manage the set of metric columns that get summed.
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },
    /// Run a compress request envelope against a local object directory.
    Handle {
        /// Directory acting as the object store
        #[arg(long)]
        store: String,
        /// Event JSON file (default: read stdin)
        #[arg(long)]
        event: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MetricsCommands {
    /// List configured metric columns.
    List,
    /// Add a metric column name.
    Add {
        /// Column name, e.g. 'Partner Revenue : Per Sub Min'
        name: String,
    },
    /// Remove a metric column name.
    Remove {
        name: String,
    },
    /// Restore the built-in metric column list.
    Reset,
}
