use crate::util::{display_ktoe, display_pct};
use serde::Serialize;
use tabled::Tabled;

/// One row of a flat `Year,Sector,Fuel,Consumption_ktoe` table, before
/// cleaning. A missing column or blank cell is `None`.
#[derive(Debug)]
pub struct FlatRow {
    pub year: Option<String>,
    pub sector: Option<String>,
    pub fuel: Option<String>,
    pub consumption_ktoe: Option<String>,
}

/// A normalized `(Year, Sector, Fuel, Consumption)` observation.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ConsumptionRecord {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Sector")]
    #[tabled(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Fuel")]
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "Consumption_ktoe")]
    #[tabled(rename = "Consumption_ktoe")]
    pub consumption_ktoe: f64,
}

/// Uniqueness key of a [`ConsumptionRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub year: i32,
    pub sector: String,
    pub fuel: String,
}

impl ConsumptionRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            year: self.year,
            sector: self.sector.clone(),
            fuel: self.fuel.clone(),
        }
    }
}

/// Two-level column header of the wide table: `(sector, fuel-or-"Year")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub outer: String,
    pub inner: String,
}

impl ColumnKey {
    pub fn is_year(&self) -> bool {
        self.inner == "Year"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct AnomalyFlag {
    #[serde(rename = "Sector")]
    #[tabled(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Fuel")]
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Consumption_ktoe")]
    #[tabled(rename = "Consumption_ktoe", display_with = "display_ktoe")]
    pub consumption_ktoe: f64,
    #[serde(rename = "BaselineMean")]
    #[tabled(rename = "BaselineMean", display_with = "display_ktoe")]
    pub baseline_mean: f64,
}

/// Per-fuel change between two years of one sector.
///
/// `delta_pct` is `None` exactly when `value_a == 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ComparisonRow {
    #[serde(rename = "Fuel")]
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "ValueA")]
    #[tabled(rename = "ValueA", display_with = "display_ktoe")]
    pub value_a: f64,
    #[serde(rename = "ValueB")]
    #[tabled(rename = "ValueB", display_with = "display_ktoe")]
    pub value_b: f64,
    #[serde(rename = "DeltaAbs")]
    #[tabled(rename = "DeltaAbs", display_with = "display_ktoe")]
    pub delta_abs: f64,
    #[serde(rename = "DeltaPct")]
    #[tabled(rename = "DeltaPct", display_with = "display_pct")]
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    #[serde(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "Consumption_ktoe")]
    pub consumption_ktoe: f64,
    #[serde(rename = "Cost")]
    pub cost: f64,
}

/// Console rendering of a [`CostRow`].
#[derive(Debug, Clone, Tabled)]
pub struct CostDisplayRow {
    #[tabled(rename = "Fuel")]
    pub fuel: String,
    #[tabled(rename = "Consumption_ktoe")]
    pub consumption_ktoe: String,
    #[tabled(rename = "Cost")]
    pub cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SectorTotal {
    #[serde(rename = "Sector")]
    #[tabled(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Total_ktoe")]
    #[tabled(rename = "Total_ktoe", display_with = "display_ktoe")]
    pub total_ktoe: f64,
}

/// Dense labelled grid handed to heatmap renderers; `None` marks no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}
