use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compressor::CompressorConfig;
use crate::error::{Result, RoyaltyError};
use crate::models::ColumnOrder;
use crate::report::normalize_header;

pub const DEFAULT_METRIC_COLUMNS: &[&str] = &[
    "Owned Views",
    "Monetized Views : Audio",
    "Monetized Views : Audio Visual",
    "Monetized Views",
    "YouTube Revenue Split",
    "YouTube Revenue Split : Auction",
    "YouTube Revenue Split : Reserved",
    "YouTube Revenue Split : Partner Sold YouTube Served",
    "YouTube Revenue Split : Partner Sold Partner Served",
    "Partner Revenue",
    "Partner Revenue : Auction",
    "Partner Revenue : Reserved",
    "Partner Revenue : Partner Sold YouTube Served",
    "Partner Revenue : Partner Sold Partner Served",
    "Partner Revenue : Pro Rata : Audio",
    "Partner Revenue : Pro Rata : Audio Visual",
    "Partner Revenue : Pro Rata",
    "Partner Revenue : Per Sub Min",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_grouping_key")]
    pub grouping_key: String,
    #[serde(default = "default_metric_columns")]
    pub metric_columns: Vec<String>,
    #[serde(default)]
    pub column_order: ColumnOrder,
    #[serde(default = "default_adjustment_column")]
    pub adjustment_column: String,
    #[serde(default = "default_adjustment_placeholder")]
    pub adjustment_placeholder: String,
    #[serde(default = "default_preamble_token")]
    pub preamble_token: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_grouping_key() -> String {
    "Asset ID".to_string()
}

fn default_metric_columns() -> Vec<String> {
    DEFAULT_METRIC_COLUMNS.iter().map(|s| s.to_string()).collect()
}

fn default_adjustment_column() -> String {
    "Adjustment Type".to_string()
}

fn default_adjustment_placeholder() -> String {
    "None".to_string()
}

fn default_preamble_token() -> String {
    "Asset Summary".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grouping_key: default_grouping_key(),
            metric_columns: default_metric_columns(),
            column_order: ColumnOrder::default(),
            adjustment_column: default_adjustment_column(),
            adjustment_placeholder: default_adjustment_placeholder(),
            preamble_token: default_preamble_token(),
            delimiter: default_delimiter(),
        }
    }
}

impl Settings {
    /// Build the compressor configuration, normalizing metric names the same
    /// way report headers are normalized.
    pub fn compressor_config(&self) -> Result<CompressorConfig> {
        let delimiter = match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => {
                return Err(RoyaltyError::MalformedInput(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                )))
            }
        };
        let mut metric_columns: Vec<String> = Vec::new();
        for name in &self.metric_columns {
            let name = normalize_header(name);
            if !name.is_empty() && !metric_columns.contains(&name) {
                metric_columns.push(name);
            }
        }
        Ok(CompressorConfig {
            grouping_key: normalize_header(&self.grouping_key),
            metric_columns,
            column_order: self.column_order,
            adjustment_column: Some(normalize_header(&self.adjustment_column))
                .filter(|c| !c.is_empty()),
            adjustment_placeholder: self.adjustment_placeholder.clone(),
            preamble_token: self.preamble_token.clone(),
            delimiter,
        })
    }

    /// Returns false when the metric was already present.
    pub fn add_metric(&mut self, name: &str) -> bool {
        let name = normalize_header(name);
        if name.is_empty() || self.metric_columns.iter().any(|m| normalize_header(m) == name) {
            return false;
        }
        self.metric_columns.push(name);
        true
    }

    /// Returns false when no such metric was configured.
    pub fn remove_metric(&mut self, name: &str) -> bool {
        let name = normalize_header(name);
        let before = self.metric_columns.len();
        self.metric_columns.retain(|m| normalize_header(m) != name);
        self.metric_columns.len() != before
    }

    pub fn reset_metrics(&mut self) {
        self.metric_columns = default_metric_columns();
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("royalty-compressor")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            warn!("could not read {}: {e}; using defaults", path.display());
            return Settings::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("invalid settings in {}: {e}; using defaults", path.display());
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}
