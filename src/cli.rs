use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Layout;

#[derive(Parser, Debug)]
#[command(
    name = "energy-report",
    version,
    about = "Normalize energy consumption tables and build comparison reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reshape the input table into the flat Year/Sector/Fuel/Consumption file.
    Normalize(NormalizeArgs),
    /// Flag consumption spikes for every fuel of a sector.
    Anomalies(AnomalyArgs),
    /// Compare a sector's fuels between two years.
    Compare(CompareArgs),
    /// Build the comparison report document for a sector and year pair.
    Report(ReportArgs),
    /// Estimate fuel costs for a sector and year.
    Costs(CostArgs),
    /// Sector totals and heatmap matrices.
    Summary(SummaryArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LayoutArg {
    SectorBlocks,
    YearColumns,
    Flat,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::SectorBlocks => Layout::SectorBlocks,
            LayoutArg::YearColumns => Layout::YearColumns,
            LayoutArg::Flat => Layout::Flat,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV export of the consumption table.
    #[arg(long)]
    pub input: PathBuf,

    /// JSON pipeline configuration; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// 0-based row index of the outer header row.
    #[arg(long)]
    pub header_row: Option<usize>,

    #[arg(long, default_value = "output")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, default_value = "Standardized_Energy_Data.csv")]
    pub output_name: String,

    #[arg(long, default_value_t = 5)]
    pub preview: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AnomalyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub sector: String,

    #[arg(long)]
    pub window: Option<usize>,

    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub sector: String,

    #[arg(long)]
    pub year_a: i32,

    #[arg(long)]
    pub year_b: i32,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub compare: CompareArgs,

    /// Pre-rendered change chart to embed; defaults to a path derived from
    /// the selection for the plotting step to fill in.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Date stamped on the report (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub generated_on: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct CostArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub sector: String,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub unit_price: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Defaults to the latest year in the data.
    #[arg(long)]
    pub year: Option<i32>,

    /// Also emit the fuel-by-year matrix for this sector.
    #[arg(long)]
    pub sector: Option<String>,
}
