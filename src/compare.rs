// Year-over-year comparison of one sector's fuels.
use crate::error::{PipelineError, Result};
use crate::types::{ComparisonRow, ConsumptionRecord};
use crate::util::pct_change;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The largest percentage movers among the fuel-level rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Movers<'a> {
    pub top_increase: &'a ComparisonRow,
    pub top_decrease: &'a ComparisonRow,
}

/// Reject a comparison of a year with itself.
pub fn ensure_distinct_years(year_a: i32, year_b: i32) -> Result<()> {
    if year_a == year_b {
        Err(PipelineError::InvalidYearPair(year_a))
    } else {
        Ok(())
    }
}

/// Per-fuel deltas for `sector` between `year_a` (base) and `year_b`.
///
/// Fuels are full-outer-joined: a fuel missing in one year counts as `0.0`
/// there. Rows are sorted by `delta_abs` descending, ties by fuel name.
pub fn compare(
    records: &[ConsumptionRecord],
    sector: &str,
    year_a: i32,
    year_b: i32,
) -> Result<Vec<ComparisonRow>> {
    ensure_distinct_years(year_a, year_b)?;

    let mut joined: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for r in records.iter().filter(|r| r.sector == sector) {
        if r.year == year_a {
            joined.entry(r.fuel.as_str()).or_insert((0.0, 0.0)).0 = r.consumption_ktoe;
        } else if r.year == year_b {
            joined.entry(r.fuel.as_str()).or_insert((0.0, 0.0)).1 = r.consumption_ktoe;
        }
    }

    let mut rows: Vec<ComparisonRow> = joined
        .into_iter()
        .map(|(fuel, (value_a, value_b))| ComparisonRow {
            fuel: fuel.to_string(),
            value_a,
            value_b,
            delta_abs: value_b - value_a,
            delta_pct: pct_change(value_a, value_b),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.delta_abs
            .partial_cmp(&a.delta_abs)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.fuel.cmp(&b.fuel))
    });
    Ok(rows)
}

/// Subtotal rows ("Total", "Total petroleum", ...) are not fuel movers.
pub fn is_subtotal(fuel: &str) -> bool {
    fuel.to_lowercase().contains("total")
}

/// Highest and lowest `delta_pct` among rows that have one and are not
/// subtotals. `None` when no such row exists.
///
/// Ties keep the first row in input order.
pub fn rank_movers(rows: &[ComparisonRow]) -> Option<Movers<'_>> {
    let mut ranked = rows
        .iter()
        .filter(|r| !is_subtotal(&r.fuel))
        .filter_map(|r| r.delta_pct.map(|p| (p, r)));

    let (first_pct, first) = ranked.next()?;
    let (mut max_pct, mut top_increase) = (first_pct, first);
    let (mut min_pct, mut top_decrease) = (first_pct, first);
    for (pct, row) in ranked {
        if pct > max_pct {
            max_pct = pct;
            top_increase = row;
        }
        if pct < min_pct {
            min_pct = pct;
            top_decrease = row;
        }
    }
    Some(Movers {
        top_increase,
        top_decrease,
    })
}
