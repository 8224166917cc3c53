// The normalized record set and the read-only views built on top of it.
//
// A `RecordSet` is assembled once from normalizer output and never mutated,
// so any number of report or chart requests can borrow it at the same time.
use crate::types::{ConsumptionRecord, Matrix, SectorTotal};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<ConsumptionRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<ConsumptionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ConsumptionRecord] {
        &self.records
    }

    /// Distinct sectors, sorted.
    pub fn sectors(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.sector.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }

    pub fn has_sector(&self, sector: &str) -> bool {
        self.records.iter().any(|r| r.sector == sector)
    }

    /// One chronological series per fuel for `sector`.
    pub fn sector_series(&self, sector: &str) -> BTreeMap<String, Vec<&ConsumptionRecord>> {
        let mut map: BTreeMap<String, Vec<&ConsumptionRecord>> = BTreeMap::new();
        for r in self.records.iter().filter(|r| r.sector == sector) {
            map.entry(r.fuel.clone()).or_default().push(r);
        }
        for series in map.values_mut() {
            series.sort_by_key(|r| r.year);
        }
        map
    }

    /// Fuel mix of one sector in one year, in fuel order.
    pub fn composition(&self, sector: &str, year: i32) -> Vec<&ConsumptionRecord> {
        let mut rows: Vec<&ConsumptionRecord> = self
            .records
            .iter()
            .filter(|r| r.sector == sector && r.year == year)
            .collect();
        rows.sort_by(|a, b| a.fuel.cmp(&b.fuel));
        rows
    }

    /// Total consumption per sector for `year`, sorted by sector name.
    pub fn sector_totals(&self, year: i32) -> Vec<SectorTotal> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for r in self.records.iter().filter(|r| r.year == year) {
            *totals.entry(r.sector.as_str()).or_insert(0.0) += r.consumption_ktoe;
        }
        totals
            .into_iter()
            .map(|(sector, total_ktoe)| SectorTotal {
                sector: sector.to_string(),
                total_ktoe,
            })
            .collect()
    }

    /// Fuel (rows) by sector (columns) for one year.
    pub fn fuel_sector_matrix(&self, year: i32) -> Matrix {
        pivot(
            self.records.iter().filter(|r| r.year == year),
            |r| r.fuel.clone(),
            |r| r.sector.clone(),
        )
    }

    /// Fuel (rows) by year (columns) for one sector.
    pub fn fuel_year_matrix(&self, sector: &str) -> Matrix {
        pivot(
            self.records.iter().filter(|r| r.sector == sector),
            |r| r.fuel.clone(),
            |r| r.year,
        )
    }
}

/// Sum `consumption_ktoe` into a grid keyed by the two key functions.
/// Both axes come out in key order.
fn pivot<'a, I, R, C, RK, CK>(records: I, row_of: R, col_of: C) -> Matrix
where
    I: Iterator<Item = &'a ConsumptionRecord>,
    R: Fn(&ConsumptionRecord) -> RK,
    C: Fn(&ConsumptionRecord) -> CK,
    RK: Ord + Clone + ToString,
    CK: Ord + Clone + ToString,
{
    let mut sums: BTreeMap<(RK, CK), f64> = BTreeMap::new();
    let mut rows: BTreeSet<RK> = BTreeSet::new();
    let mut cols: BTreeSet<CK> = BTreeSet::new();
    for r in records {
        let (row, col) = (row_of(r), col_of(r));
        rows.insert(row.clone());
        cols.insert(col.clone());
        *sums.entry((row, col)).or_insert(0.0) += r.consumption_ktoe;
    }
    let cells = rows
        .iter()
        .map(|row| {
            cols.iter()
                .map(|col| sums.get(&(row.clone(), col.clone())).copied())
                .collect()
        })
        .collect();
    Matrix {
        row_labels: rows.iter().map(ToString::to_string).collect(),
        column_labels: cols.iter().map(ToString::to_string).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, sector: &str, fuel: &str, v: f64) -> ConsumptionRecord {
        ConsumptionRecord {
            year,
            sector: sector.to_string(),
            fuel: fuel.to_string(),
            consumption_ktoe: v,
        }
    }

    fn sample() -> RecordSet {
        RecordSet::new(vec![
            rec(2001, "Transport", "Petroleum", 40.0),
            rec(2000, "Industry", "Coal", 10.0),
            rec(2000, "Industry", "Gas", 5.0),
            rec(1999, "Industry", "Coal", 8.0),
            rec(2000, "Transport", "Petroleum", 30.0),
        ])
    }

    fn cell(m: &Matrix, row: &str, column: &str) -> Option<f64> {
        let r = m.row_labels.iter().position(|l| l == row)?;
        let c = m.column_labels.iter().position(|l| l == column)?;
        m.cells[r][c]
    }

    #[test]
    fn lists_sectors_and_years_sorted() {
        let set = sample();
        assert_eq!(set.sectors(), vec!["Industry", "Transport"]);
        assert_eq!(set.years(), vec![1999, 2000, 2001]);
        assert!(set.has_sector("Industry"));
        assert!(!set.has_sector("Domestic"));
    }

    #[test]
    fn sector_series_is_chronological_per_fuel() {
        let set = sample();
        let series = set.sector_series("Industry");
        let coal: Vec<i32> = series["Coal"].iter().map(|r| r.year).collect();
        assert_eq!(coal, vec![1999, 2000]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn sector_totals_sum_one_year() {
        let totals = sample().sector_totals(2000);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].sector, "Industry");
        assert_eq!(totals[0].total_ktoe, 15.0);
        assert_eq!(totals[1].total_ktoe, 30.0);
    }

    #[test]
    fn fuel_sector_matrix_marks_missing_cells() {
        let m = sample().fuel_sector_matrix(2000);
        assert_eq!(m.row_labels, vec!["Coal", "Gas", "Petroleum"]);
        assert_eq!(m.column_labels, vec!["Industry", "Transport"]);
        assert_eq!(cell(&m, "Coal", "Industry"), Some(10.0));
        assert_eq!(cell(&m, "Coal", "Transport"), None);
    }

    #[test]
    fn fuel_year_matrix_orders_years_numerically() {
        let set = RecordSet::new(vec![
            rec(999, "Industry", "Coal", 1.0),
            rec(1000, "Industry", "Coal", 2.0),
            rec(-5, "Industry", "Coal", 3.0),
        ]);
        let m = set.fuel_year_matrix("Industry");
        assert_eq!(m.column_labels, vec!["-5", "999", "1000"]);
        assert_eq!(m.cells[0], vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn composition_filters_sector_and_year() {
        let set = sample();
        let mix: Vec<&str> = set
            .composition("Industry", 2000)
            .iter()
            .map(|r| r.fuel.as_str())
            .collect();
        assert_eq!(mix, vec!["Coal", "Gas"]);
    }
}
