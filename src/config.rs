// Pipeline configuration.
//
// Everything the cleanup scripts used to hard-code (header position, marker
// glyphs, anomaly window, price constants) lives here so one normalizer can
// serve every table variant. A JSON file may override any subset of fields.
use crate::error::{PipelineError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MARKER_PATTERN: &str = r"\[[^\]]*\]|[*†‡]";

/// Shape of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Two header rows (sector, then fuel/`Year`), one block per sector.
    #[default]
    SectorBlocks,
    /// One header row; `Sector`, `Fuel`, then one column per year.
    YearColumns,
    /// The normalized `Year,Sector,Fuel,Consumption_ktoe` format itself.
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub window: usize,
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 1.2,
        }
    }
}

/// Constants for the cost estimate: `ktoe * conversion_factor * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub conversion_factor: f64,
    pub unit_price: f64,
    pub currency_symbol: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            conversion_factor: 11_630.0,
            unit_price: 0.34,
            currency_symbol: "£".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: Layout,
    /// 0-based row index of the outer (sector) header row.
    pub header_row: usize,
    pub marker_pattern: String,
    /// Year-columns layout only: stop reading at the first row whose first
    /// cell contains this text (case-insensitive).
    pub stop_marker: Option<String>,
    pub anomaly: AnomalyConfig,
    pub pricing: PricingConfig,
    pub decimals: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: Layout::SectorBlocks,
            header_row: 4,
            marker_pattern: DEFAULT_MARKER_PATTERN.to_string(),
            stop_marker: None,
            anomaly: AnomalyConfig::default(),
            pricing: PricingConfig::default(),
            decimals: 2,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file, falling back to defaults for missing fields.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.marker_regex()?;
        Ok(config)
    }

    pub fn marker_regex(&self) -> Result<Regex> {
        Regex::new(&self.marker_pattern).map_err(|source| PipelineError::InvalidMarkerPattern {
            pattern: self.marker_pattern.clone(),
            source,
        })
    }
}
