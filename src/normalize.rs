//! Wide-to-long reshaping of the consumption table.
//!
//! Three input shapes are supported (see [`Layout`]); all of them end up as a
//! de-duplicated `Vec<ConsumptionRecord>`. Bad cells and headerless blocks are
//! skipped and counted in a [`NormalizeReport`] rather than failing the run.

use crate::config::{Layout, PipelineConfig};
use crate::error::Result;
use crate::loader::RawWideTable;
use crate::types::{ColumnKey, ConsumptionRecord, FlatRow, RecordKey};
use crate::util::{clean_label, parse_f64_safe, parse_year_safe};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// What one normalization pass kept and threw away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub data_rows: usize,
    pub empty_rows: usize,
    pub empty_columns: usize,
    pub blocks: usize,
    pub blocks_missing_year: usize,
    /// `(year, value)` pairs dropped because either side was missing or
    /// unparseable.
    pub skipped_cells: usize,
    /// Whole rows dropped (no sector/fuel label, or a bad flat row).
    pub skipped_rows: usize,
    pub duplicates_overwritten: usize,
    pub records: usize,
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records from {} data rows ({} empty rows, {} empty columns dropped; \
             {} cells and {} rows skipped; {} of {} blocks without a Year column; \
             {} duplicates overwritten)",
            self.records,
            self.data_rows,
            self.empty_rows,
            self.empty_columns,
            self.skipped_cells,
            self.skipped_rows,
            self.blocks_missing_year,
            self.blocks,
            self.duplicates_overwritten
        )
    }
}

/// Insertion-ordered record buffer enforcing `(year, sector, fuel)`
/// uniqueness. A repeated key replaces the earlier value in place.
#[derive(Default)]
struct RecordSink {
    records: Vec<ConsumptionRecord>,
    index: HashMap<RecordKey, usize>,
    overwritten: usize,
}

impl RecordSink {
    fn push(&mut self, record: ConsumptionRecord) {
        let key = record.key();
        match self.index.get(&key) {
            Some(&i) => {
                debug!(
                    year = key.year,
                    sector = %key.sector,
                    fuel = %key.fuel,
                    "duplicate key; keeping later value"
                );
                self.records[i] = record;
                self.overwritten += 1;
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    fn finish(self, mut report: NormalizeReport) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        report.duplicates_overwritten = self.overwritten;
        report.records = self.records.len();
        (self.records, report)
    }
}

/// A run of adjacent columns sharing one outer (sector) label.
struct SectorBlock {
    sector: String,
    columns: Vec<(usize, ColumnKey)>,
}

pub struct TableNormalizer {
    layout: Layout,
    header_row: usize,
    marker: Regex,
    stop_marker: Option<String>,
}

impl TableNormalizer {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            layout: config.layout,
            header_row: config.header_row,
            marker: config.marker_regex()?,
            stop_marker: config
                .stop_marker
                .as_ref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        })
    }

    /// Reshape `raw` according to the configured layout.
    pub fn normalize(&self, raw: &RawWideTable) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        let (records, report) = match self.layout {
            Layout::SectorBlocks => self.normalize_sector_blocks(raw),
            Layout::YearColumns => self.normalize_year_columns(raw),
            Layout::Flat => self.normalize_flat_grid(raw),
        };
        info!(
            layout = ?self.layout,
            records = report.records,
            skipped_cells = report.skipped_cells,
            blocks_missing_year = report.blocks_missing_year,
            "normalized table"
        );
        (records, report)
    }

    /// Re-read a flat `Year,Sector,Fuel,Consumption_ktoe` table. Running this
    /// over the written output of any normalization reproduces that output.
    fn normalize_flat_grid(&self, raw: &RawWideTable) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        let rows = flat_rows_from_grid(raw, self.header_row);
        let body = raw.height().saturating_sub(self.header_row + 1);
        let (records, mut report) = self.normalize_flat(&rows);
        report.empty_rows = body - rows.len();
        (records, report)
    }

    fn normalize_flat(&self, rows: &[FlatRow]) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        let mut report = NormalizeReport {
            data_rows: rows.len(),
            ..NormalizeReport::default()
        };
        let mut sink = RecordSink::default();
        for row in rows {
            let year = parse_year_safe(row.year.as_deref(), &self.marker);
            let sector = clean_label(row.sector.as_deref());
            let fuel = clean_label(row.fuel.as_deref());
            let value = parse_f64_safe(row.consumption_ktoe.as_deref(), &self.marker);
            match (year, sector, fuel, value) {
                (Some(year), Some(sector), Some(fuel), Some(consumption_ktoe)) => {
                    sink.push(ConsumptionRecord {
                        year,
                        sector,
                        fuel,
                        consumption_ktoe,
                    });
                }
                _ => report.skipped_rows += 1,
            }
        }
        sink.finish(report)
    }

    fn normalize_sector_blocks(&self, raw: &RawWideTable) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        let mut report = NormalizeReport::default();
        let mut sink = RecordSink::default();
        let outer_row = self.header_row;
        let inner_row = self.header_row + 1;
        if raw.height() <= inner_row {
            warn!(
                rows = raw.height(),
                header_row = outer_row,
                "table ends before its header rows"
            );
            return sink.finish(report);
        }

        let width = raw.width();
        let body = inner_row + 1..raw.height();
        let data_rows: Vec<usize> = body
            .clone()
            .filter(|&r| (0..width).any(|c| raw.cell(r, c).is_some()))
            .collect();
        report.data_rows = data_rows.len();
        report.empty_rows = body.len() - data_rows.len();

        let keys = column_keys(raw, outer_row, inner_row, width);
        let live: Vec<usize> = (0..width)
            .filter(|&c| data_rows.iter().any(|&r| raw.cell(r, c).is_some()))
            .collect();
        report.empty_columns = width - live.len();

        let blocks = group_blocks(&keys, &live);
        report.blocks = blocks.len();

        for block in &blocks {
            let Some(&(year_col, _)) = block.columns.iter().find(|(_, key)| key.is_year()) else {
                warn!(sector = %block.sector, "sector block has no Year column; skipping");
                report.blocks_missing_year += 1;
                continue;
            };
            for (col, key) in block.columns.iter().filter(|(_, key)| !key.is_year()) {
                for &r in &data_rows {
                    let year = parse_year_safe(raw.cell(r, year_col), &self.marker);
                    let value = parse_f64_safe(raw.cell(r, *col), &self.marker);
                    match (year, value) {
                        (Some(year), Some(consumption_ktoe)) => sink.push(ConsumptionRecord {
                            year,
                            sector: block.sector.clone(),
                            fuel: key.inner.clone(),
                            consumption_ktoe,
                        }),
                        _ => report.skipped_cells += 1,
                    }
                }
            }
        }
        sink.finish(report)
    }

    fn normalize_year_columns(&self, raw: &RawWideTable) -> (Vec<ConsumptionRecord>, NormalizeReport) {
        let mut report = NormalizeReport::default();
        let mut sink = RecordSink::default();
        let header = self.header_row;
        if raw.height() <= header {
            warn!(rows = raw.height(), header_row = header, "table ends before its header row");
            return sink.finish(report);
        }

        let width = raw.width();
        let year_cols: Vec<(usize, i32)> = (2..width)
            .filter_map(|c| {
                let label = clean_label(raw.cell(header, c))?;
                let stripped = self.marker.replace_all(&label, "");
                let digits = stripped.trim();
                if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
                    digits.parse::<i32>().ok().map(|y| (c, y))
                } else {
                    None
                }
            })
            .collect();
        report.blocks = 1;
        report.empty_columns = width.saturating_sub(2) - year_cols.len();

        for r in header + 1..raw.height() {
            if let (Some(stop), Some(first)) = (&self.stop_marker, raw.cell(r, 0)) {
                if first.to_lowercase().contains(stop.as_str()) {
                    debug!(row = r, marker = %stop, "stop marker reached");
                    break;
                }
            }
            if (0..width).all(|c| raw.cell(r, c).is_none()) {
                report.empty_rows += 1;
                continue;
            }
            report.data_rows += 1;
            let (Some(sector), Some(fuel)) = (clean_label(raw.cell(r, 0)), clean_label(raw.cell(r, 1))) else {
                report.skipped_rows += 1;
                continue;
            };
            for &(col, year) in &year_cols {
                match parse_f64_safe(raw.cell(r, col), &self.marker) {
                    Some(consumption_ktoe) => sink.push(ConsumptionRecord {
                        year,
                        sector: sector.clone(),
                        fuel: fuel.clone(),
                        consumption_ktoe,
                    }),
                    None => report.skipped_cells += 1,
                }
            }
        }
        sink.finish(report)
    }
}

/// Two-level key per column. Blank outer cells inherit the label to their
/// left (merged header cells); a column without both levels has no key.
fn column_keys(raw: &RawWideTable, outer_row: usize, inner_row: usize, width: usize) -> Vec<Option<ColumnKey>> {
    let mut current_outer: Option<String> = None;
    (0..width)
        .map(|c| {
            if let Some(label) = clean_label(raw.cell(outer_row, c)) {
                current_outer = Some(label);
            }
            let outer = current_outer.clone()?;
            let inner = clean_label(raw.cell(inner_row, c))?;
            Some(ColumnKey { outer, inner })
        })
        .collect()
}

fn group_blocks(keys: &[Option<ColumnKey>], live: &[usize]) -> Vec<SectorBlock> {
    let mut blocks: Vec<SectorBlock> = Vec::new();
    for &c in live {
        let Some(key) = &keys[c] else { continue };
        match blocks.last_mut() {
            Some(block) if block.sector == key.outer => block.columns.push((c, key.clone())),
            _ => blocks.push(SectorBlock {
                sector: key.outer.clone(),
                columns: vec![(c, key.clone())],
            }),
        }
    }
    blocks
}

/// View a grid whose header row names `Year`, `Sector`, `Fuel` and
/// `Consumption_ktoe` as flat rows.
fn flat_rows_from_grid(raw: &RawWideTable, header_row: usize) -> Vec<FlatRow> {
    let find = |name: &str| {
        (0..raw.width()).find(|&c| {
            clean_label(raw.cell(header_row, c)).is_some_and(|l| l.eq_ignore_ascii_case(name))
        })
    };
    let (year, sector, fuel, value) = (
        find("Year"),
        find("Sector"),
        find("Fuel"),
        find("Consumption_ktoe"),
    );
    let owned = |r: usize, c: Option<usize>| c.and_then(|c| raw.cell(r, c)).map(str::to_string);
    (header_row + 1..raw.height())
        .filter(|&r| (0..raw.width()).any(|c| raw.cell(r, c).is_some()))
        .map(|r| FlatRow {
            year: owned(r, year),
            sector: owned(r, sector),
            fuel: owned(r, fuel),
            consumption_ktoe: owned(r, value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn normalizer(layout: Layout, header_row: usize) -> TableNormalizer {
        let config = PipelineConfig {
            layout,
            header_row,
            ..PipelineConfig::default()
        };
        TableNormalizer::new(&config).unwrap()
    }

    /// Two sector blocks with merged (blank) outer header cells, a footnote
    /// marker, a blank row and a blank column.
    fn sample_wide() -> RawWideTable {
        RawWideTable::from_rows(&[
            vec!["Table C: final energy consumption", "", "", "", "", "", ""],
            vec!["", "", "", "", "", "", ""],
            vec!["Industry", "", "", "", " Transport ", "", ""],
            vec!["Year", "Coal", " Natural gas ", "", "Year", "Petroleum", "Coal"],
            vec!["1970", "100", "50", "", "1970", "300", "[x]"],
            vec!["1971", "110", "1,050[x]", "", "1971", "310", "5"],
            vec!["", "", "", "", "", "", ""],
            vec!["1972.0", "", "60", "", "1972", "320", "6"],
        ])
    }

    fn find<'a>(records: &'a [ConsumptionRecord], year: i32, sector: &str, fuel: &str) -> Option<&'a ConsumptionRecord> {
        records
            .iter()
            .find(|r| r.year == year && r.sector == sector && r.fuel == fuel)
    }

    #[test]
    fn reshapes_sector_blocks_into_records() {
        let (records, report) = normalizer(Layout::SectorBlocks, 2).normalize(&sample_wide());

        assert_eq!(report.blocks, 2);
        assert_eq!(report.empty_rows, 1);
        assert_eq!(report.empty_columns, 1);
        assert_eq!(report.data_rows, 3);
        // Industry/Coal 1972 (blank) and Transport/Coal 1970 ([x]) are skipped.
        assert_eq!(report.skipped_cells, 2);
        assert_eq!(records.len(), 10);
        assert_eq!(report.records, 10);

        assert_eq!(find(&records, 1970, "Industry", "Coal").unwrap().consumption_ktoe, 100.0);
        assert_eq!(find(&records, 1971, "Industry", "Natural gas").unwrap().consumption_ktoe, 1050.0);
        assert_eq!(find(&records, 1972, "Industry", "Natural gas").unwrap().consumption_ktoe, 60.0);
        assert_eq!(find(&records, 1971, "Transport", "Coal").unwrap().consumption_ktoe, 5.0);
        assert!(find(&records, 1970, "Transport", "Coal").is_none());
        assert!(find(&records, 1972, "Industry", "Coal").is_none());
    }

    #[test]
    fn output_follows_block_then_row_order() {
        let (records, _) = normalizer(Layout::SectorBlocks, 2).normalize(&sample_wide());
        let first: Vec<(i32, &str, &str)> = records
            .iter()
            .take(3)
            .map(|r| (r.year, r.sector.as_str(), r.fuel.as_str()))
            .collect();
        assert_eq!(
            first,
            vec![(1970, "Industry", "Coal"), (1971, "Industry", "Coal"), (1970, "Industry", "Natural gas")]
        );
    }

    #[test]
    fn triples_are_unique() {
        let (records, _) = normalizer(Layout::SectorBlocks, 2).normalize(&sample_wide());
        let keys: HashSet<RecordKey> = records.iter().map(ConsumptionRecord::key).collect();
        assert_eq!(keys.len(), records.len());
    }

    #[test]
    fn block_without_year_column_is_skipped_alone() {
        let raw = RawWideTable::from_rows(&[
            vec!["Domestic", "", "Services", ""],
            vec!["Year", "Electricity", "Period", "Electricity"],
            vec!["2020", "900", "2020", "400"],
        ]);
        let (records, report) = normalizer(Layout::SectorBlocks, 0).normalize(&raw);
        assert_eq!(report.blocks, 2);
        assert_eq!(report.blocks_missing_year, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sector, "Domestic");
    }

    #[test]
    fn duplicate_years_keep_the_later_row() {
        let raw = RawWideTable::from_rows(&[
            vec!["Domestic", ""],
            vec!["Year", "Electricity"],
            vec!["2020", "900"],
            vec!["2021", "950"],
            vec!["2020", "905"],
        ]);
        let (records, report) = normalizer(Layout::SectorBlocks, 0).normalize(&raw);
        assert_eq!(records.len(), 2);
        assert_eq!(report.duplicates_overwritten, 1);
        // Position of the first occurrence, value of the last.
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].consumption_ktoe, 905.0);
    }

    #[test]
    fn header_rows_past_end_yield_nothing() {
        let raw = RawWideTable::from_rows(&[vec!["only a title"]]);
        let (records, report) = normalizer(Layout::SectorBlocks, 4).normalize(&raw);
        assert!(records.is_empty());
        assert_eq!(report, NormalizeReport::default());
    }

    #[test]
    fn delimiter_in_labels_is_harmless() {
        let raw = RawWideTable::from_rows(&[
            vec!["Iron_and_steel", ""],
            vec!["Year", "Heat_sold"],
            vec!["2000", "12"],
        ]);
        let (records, _) = normalizer(Layout::SectorBlocks, 0).normalize(&raw);
        assert_eq!(records[0].sector, "Iron_and_steel");
        assert_eq!(records[0].fuel, "Heat_sold");
    }

    #[test]
    fn year_columns_layout_stops_at_marker() {
        let raw = RawWideTable::from_rows(&[
            vec!["Sector", "Fuel", "2019", "2020", "Notes"],
            vec!["Industry", "Coal", "10", "12[x]", ""],
            vec!["", "Gas", "5", "6", ""],
            vec!["Industry", "Electricity", "7", "", ""],
            vec!["", "", "", "", ""],
            vec!["Road transport", "Petroleum", "99", "98", ""],
            vec!["Rail", "Electricity", "1", "1", ""],
        ]);
        let config = PipelineConfig {
            layout: Layout::YearColumns,
            header_row: 0,
            stop_marker: Some("road TRANSPORT".to_string()),
            ..PipelineConfig::default()
        };
        let (records, report) = TableNormalizer::new(&config).unwrap().normalize(&raw);

        assert_eq!(records.len(), 3);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.skipped_cells, 1);
        assert_eq!(report.empty_rows, 1);
        assert_eq!(report.empty_columns, 1);
        assert_eq!(find(&records, 2020, "Industry", "Coal").unwrap().consumption_ktoe, 12.0);
        assert!(records.iter().all(|r| r.sector == "Industry"));
    }

    #[test]
    fn renormalizing_written_output_changes_nothing() {
        let (records, _) = normalizer(Layout::SectorBlocks, 2).normalize(&sample_wide());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Standardized_Energy_Data.csv");
        crate::output::write_csv(&path, &records).unwrap();
        let raw = crate::loader::read_raw_table(&path).unwrap();
        let (again, report) = normalizer(Layout::Flat, 0).normalize(&raw);

        assert_eq!(again, records);
        assert_eq!(report.data_rows, records.len());
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.duplicates_overwritten, 0);
    }

    #[test]
    fn flat_layout_honours_header_row_and_counts_bad_rows() {
        let raw = RawWideTable::from_rows(&[
            vec!["Exported table", "", "", ""],
            vec!["fuel", "YEAR", "Consumption_ktoe", "Sector"],
            vec!["Coal", "2020", "10", "Industry"],
            vec!["", "", "", ""],
            vec!["Coal", "twenty", "11", "Industry"],
            vec!["Gas", "2020", "[x]", "Industry"],
        ]);
        let (records, report) = normalizer(Layout::Flat, 1).normalize(&raw);

        assert_eq!(records.len(), 1);
        assert_eq!(find(&records, 2020, "Industry", "Coal").unwrap().consumption_ktoe, 10.0);
        assert_eq!(report.data_rows, 3);
        assert_eq!(report.empty_rows, 1);
        assert_eq!(report.skipped_rows, 2);
    }

    #[test]
    fn flat_rows_are_cleaned_and_deduplicated() {
        let row = |y: &str, s: &str, f: &str, v: &str| FlatRow {
            year: Some(y.to_string()),
            sector: Some(s.to_string()),
            fuel: Some(f.to_string()),
            consumption_ktoe: Some(v.to_string()),
        };
        let rows = vec![
            row("2020", " Industry ", "Coal ", "10[x]"),
            row("2020", "Industry", "Coal", "11"),
            row("2021", "Industry", "Coal", "[x]"),
            row("bad", "Industry", "Coal", "3"),
        ];
        let (records, report) = normalizer(Layout::Flat, 0).normalize_flat(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].consumption_ktoe, 11.0);
        assert_eq!(records[0].sector, "Industry");
        assert_eq!(report.skipped_rows, 2);
        assert_eq!(report.duplicates_overwritten, 1);
    }
}
