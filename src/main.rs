// Entry point and high-level CLI flow.
//
// Every subcommand runs one pipeline pass:
// - load the input table and normalize it into a `RecordSet`,
// - run the requested analysis on the finished (read-only) set,
// - write CSV/JSON for the presentation side and print a console preview.
mod anomaly;
mod cli;
mod compare;
mod config;
mod costs;
mod error;
mod loader;
mod narrative;
mod normalize;
mod output;
mod records;
mod report;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{AnomalyArgs, Cli, Commands, CompareArgs, CostArgs, InputArgs, NormalizeArgs, ReportArgs, SummaryArgs};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::normalize::TableNormalizer;
use crate::records::RecordSet;
use crate::report::{ChartImage, ReportContentBuilder};
use crate::types::ComparisonRow;
use crate::util::{format_int, format_number, slug};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize(args) => handle_normalize(args),
        Commands::Anomalies(args) => handle_anomalies(args),
        Commands::Compare(args) => handle_compare(args),
        Commands::Report(args) => handle_report(args),
        Commands::Costs(args) => handle_costs(args),
        Commands::Summary(args) => handle_summary(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &InputArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.layout = layout.into();
    }
    if let Some(header_row) = args.header_row {
        config.header_row = header_row;
    }
    Ok(config)
}

/// Read and normalize the input. The returned set is complete before any
/// analysis sees it and is never modified afterwards.
fn load_records(args: &InputArgs, config: &PipelineConfig) -> Result<RecordSet> {
    let normalizer = TableNormalizer::new(config)?;
    let path = args.input.as_path();
    let raw = loader::read_raw_table(path).with_context(|| format!("failed to read {}", path.display()))?;
    let (records, report) = normalizer.normalize(&raw);

    println!(
        "Processing dataset... ({} records from {} data rows)",
        format_int(report.records),
        format_int(report.data_rows)
    );
    if report.skipped_cells + report.skipped_rows > 0 {
        println!(
            "Note: {} cells and {} rows skipped as missing or unparseable.",
            format_int(report.skipped_cells),
            format_int(report.skipped_rows)
        );
    }
    if report.blocks_missing_year > 0 {
        println!(
            "Note: {} sector blocks skipped for lack of a Year column.",
            format_int(report.blocks_missing_year)
        );
    }
    println!();
    info!(%report, "normalization summary");

    if records.is_empty() {
        return Err(PipelineError::NoRecords(path.display().to_string()).into());
    }
    Ok(RecordSet::new(records))
}

fn ensure_sector(records: &RecordSet, sector: &str) -> Result<()> {
    if records.has_sector(sector) {
        Ok(())
    } else {
        Err(PipelineError::UnknownSector(sector.to_string()))
            .with_context(|| format!("available sectors: {}", records.sectors().join(", ")))
    }
}

fn prepare_out_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

fn handle_normalize(args: NormalizeArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let records = load_records(&args.input, &config)?;
    prepare_out_dir(&args.input.out_dir)?;

    let path = args.input.out_dir.join(&args.output_name);
    output::write_csv(&path, records.records())?;
    println!("Data cleaning completed, first {} rows:\n", args.preview);
    output::preview_table_rows(records.records(), args.preview);
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn handle_anomalies(args: AnomalyArgs) -> Result<()> {
    let mut config = load_config(&args.input)?;
    if let Some(window) = args.window {
        config.anomaly.window = window;
    }
    if let Some(threshold) = args.threshold {
        config.anomaly.threshold = threshold;
    }
    let records = load_records(&args.input, &config)?;
    ensure_sector(&records, &args.sector)?;
    prepare_out_dir(&args.input.out_dir)?;

    let flags = anomaly::detect_sector(&records, &args.sector, &config.anomaly);
    let path = args.input.out_dir.join(format!("anomalies_{}.csv", slug(&args.sector)));
    output::write_csv(&path, &flags)?;

    println!(
        "{}: {} points above {}x the trailing {}-point mean\n",
        args.sector,
        flags.len(),
        config.anomaly.threshold,
        config.anomaly.window
    );
    output::preview_table_rows(&flags, 20);
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

/// Validate the selection and run the comparison engine.
fn run_comparison(args: &CompareArgs, config: &PipelineConfig) -> Result<Vec<ComparisonRow>> {
    compare::ensure_distinct_years(args.year_a, args.year_b)
        .context("Please select two different years for comparison")?;
    let records = load_records(&args.input, config)?;
    ensure_sector(&records, &args.sector)?;
    let rows = compare::compare(records.records(), &args.sector, args.year_a, args.year_b)?;
    Ok(rows)
}

fn comparison_stem(args: &CompareArgs) -> String {
    format!("{}_{}_{}", slug(&args.sector), args.year_a, args.year_b)
}

fn handle_compare(args: CompareArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let rows = run_comparison(&args, &config)?;
    prepare_out_dir(&args.input.out_dir)?;

    let path = args.input.out_dir.join(format!("comparison_{}.csv", comparison_stem(&args)));
    output::write_csv(&path, &rows)?;

    println!("{}: {} vs {}\n", args.sector, args.year_a, args.year_b);
    output::preview_table_rows(&rows, rows.len());
    match compare::rank_movers(&rows) {
        Some(movers) => println!(
            "Largest % increase: {} ({}%), largest % decrease: {} ({}%)\n",
            movers.top_increase.fuel,
            util::format_pct(movers.top_increase.delta_pct, config.decimals),
            movers.top_decrease.fuel,
            util::format_pct(movers.top_decrease.delta_pct, config.decimals),
        ),
        None => println!("No fuel has a non-zero base in {}; nothing to rank.\n", args.year_a),
    }
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let selection = &args.compare;
    let config = load_config(&selection.input)?;
    let rows = run_comparison(selection, &config)?;
    let out_dir = &selection.input.out_dir;
    prepare_out_dir(out_dir)?;

    let stem = comparison_stem(selection);
    // The comparison rows double as the data for the change chart.
    let chart_data = out_dir.join(format!("comparison_{stem}.csv"));
    output::write_csv(&chart_data, &rows)?;

    let chart = ChartImage {
        path: args
            .chart
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("chart_{stem}.png"))),
        caption: format!(
            "Change in {} consumption by fuel, {} to {} (ktoe)",
            selection.sector, selection.year_a, selection.year_b
        ),
    };
    let mut builder = ReportContentBuilder::new(config.decimals);
    if let Some(date) = args.generated_on {
        builder = builder.with_date(date);
    }
    let doc = builder.build(
        &rows,
        &selection.sector,
        selection.year_a,
        selection.year_b,
        chart,
    );

    let json_path = out_dir.join(format!("report_{stem}.json"));
    output::write_json(&json_path, &doc)?;
    let markdown = output::render_markdown(&doc);
    let md_path = out_dir.join(format!("report_{stem}.md"));
    std::fs::write(&md_path, &markdown).with_context(|| format!("failed to write {}", md_path.display()))?;

    println!("{markdown}");
    println!("(Report content exported to {} and {})\n", json_path.display(), md_path.display());
    Ok(())
}

fn handle_costs(args: CostArgs) -> Result<()> {
    let mut config = load_config(&args.input)?;
    if let Some(price) = args.unit_price {
        config.pricing.unit_price = price;
    }
    let records = load_records(&args.input, &config)?;
    ensure_sector(&records, &args.sector)?;
    prepare_out_dir(&args.input.out_dir)?;

    let rows = costs::estimate_costs(&records, &args.sector, args.year, &config.pricing);
    let path = args
        .input
        .out_dir
        .join(format!("costs_{}_{}.csv", slug(&args.sector), args.year));
    output::write_csv(&path, &rows)?;

    println!("Cost Estimation: {} ({})\n", args.sector, args.year);
    output::preview_table_rows(&costs::display_rows(&rows, &config.pricing), rows.len());
    println!(
        "Total: {}{}\n",
        config.pricing.currency_symbol,
        format_number(costs::total_cost(&rows), 2)
    );
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let records = load_records(&args.input, &config)?;
    let out_dir = &args.input.out_dir;
    prepare_out_dir(out_dir)?;

    let years = records.years();
    println!("Sectors: {}", records.sectors().join(", "));
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        println!("Years: {first}–{last} ({} distinct)\n", years.len());
    }

    let year = match args.year.or_else(|| years.last().copied()) {
        Some(year) => year,
        None => return Ok(()),
    };

    let totals = records.sector_totals(year);
    let totals_path = out_dir.join(format!("sector_totals_{year}.csv"));
    output::write_csv(&totals_path, &totals)?;
    println!("Sector totals ({year})\n");
    output::preview_table_rows(&totals, totals.len());

    let heat = records.fuel_sector_matrix(year);
    output::write_json(&out_dir.join(format!("fuel_sector_{year}.json")), &heat)?;
    println!("Fuel vs sector ({year}, ktoe)\n");
    println!("{}\n", output::render_matrix(&heat, "Fuel"));

    if let Some(sector) = &args.sector {
        ensure_sector(&records, sector)?;
        let by_year = records.fuel_year_matrix(sector);
        let path = out_dir.join(format!("fuel_year_{}.json", slug(sector)));
        output::write_json(&path, &by_year)?;
        println!("({} fuel-by-year matrix exported to {})\n", sector, path.display());
    }
    Ok(())
}
