// Trailing-mean spike detection over one (sector, fuel) series.
use crate::config::AnomalyConfig;
use crate::records::RecordSet;
use crate::types::{AnomalyFlag, ConsumptionRecord};
use crate::util::average;
use tracing::debug;

/// Flag points exceeding `threshold` times the mean of the `window`
/// preceding data points.
///
/// The series is sorted by year here, so any input order works. The window
/// is positional: gaps in calendar years are not filled, and the first
/// `window` points can never be flagged. The comparison is multiplicative,
/// so a zero baseline with a positive value is flagged without dividing.
pub fn detect(series: &[&ConsumptionRecord], window: usize, threshold: f64) -> Vec<AnomalyFlag> {
    if window == 0 {
        return Vec::new();
    }
    let mut sorted: Vec<&ConsumptionRecord> = series.to_vec();
    sorted.sort_by_key(|r| r.year);

    let values: Vec<f64> = sorted.iter().map(|r| r.consumption_ktoe).collect();
    let mut flags = Vec::new();
    for i in window..sorted.len() {
        let baseline_mean = average(&values[i - window..i]);
        if values[i] > threshold * baseline_mean {
            let r = sorted[i];
            flags.push(AnomalyFlag {
                sector: r.sector.clone(),
                fuel: r.fuel.clone(),
                year: r.year,
                consumption_ktoe: r.consumption_ktoe,
                baseline_mean,
            });
        }
    }
    flags
}

/// Run [`detect`] on every fuel series of `sector`.
///
/// Flags come out grouped by fuel name, chronologically within a fuel.
pub fn detect_sector(records: &RecordSet, sector: &str, config: &AnomalyConfig) -> Vec<AnomalyFlag> {
    let flags: Vec<AnomalyFlag> = records
        .sector_series(sector)
        .values()
        .flat_map(|series| detect(series, config.window, config.threshold))
        .collect();
    debug!(
        sector,
        window = config.window,
        threshold = config.threshold,
        flags = flags.len(),
        "anomaly detection finished"
    );
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(start: i32, values: &[f64]) -> Vec<ConsumptionRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ConsumptionRecord {
                year: start + i as i32,
                sector: "Industry".to_string(),
                fuel: "Gas".to_string(),
                consumption_ktoe: *v,
            })
            .collect()
    }

    fn refs(records: &[ConsumptionRecord]) -> Vec<&ConsumptionRecord> {
        records.iter().collect()
    }

    #[test]
    fn flags_value_above_threshold() {
        let s = series(2000, &[10.0, 10.0, 10.0, 10.0, 10.0, 13.0]);
        let flags = detect(&refs(&s), 5, 1.2);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].year, 2005);
        assert_eq!(flags[0].consumption_ktoe, 13.0);
        assert_eq!(flags[0].baseline_mean, 10.0);
    }

    #[test]
    fn value_equal_to_threshold_is_not_flagged() {
        let s = series(2000, &[10.0, 10.0, 10.0, 10.0, 10.0, 12.0]);
        assert!(detect(&refs(&s), 5, 1.2).is_empty());
    }

    #[test]
    fn first_window_points_are_never_flagged() {
        // Huge jumps inside the first window have no baseline yet.
        let s = series(2000, &[1.0, 100.0, 1000.0, 10000.0, 100000.0, 1.0, 1.0]);
        let flags = detect(&refs(&s), 5, 1.2);
        assert!(flags.iter().all(|f| f.year >= 2005));
    }

    #[test]
    fn short_series_yields_nothing() {
        let s = series(2000, &[1.0, 50.0, 90.0]);
        assert!(detect(&refs(&s), 5, 1.2).is_empty());
        assert!(detect(&[], 5, 1.2).is_empty());
    }

    #[test]
    fn zero_baseline_with_positive_value_flags() {
        let s = series(2000, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.5]);
        let flags = detect(&refs(&s), 5, 1.2);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].baseline_mean, 0.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let s = series(2000, &[10.0, 10.0, 10.0, 10.0, 10.0, 13.0]);
        let mut shuffled = refs(&s);
        shuffled.reverse();
        shuffled.swap(1, 4);
        assert_eq!(detect(&shuffled, 5, 1.2), detect(&refs(&s), 5, 1.2));
    }

    #[test]
    fn window_counts_data_points_not_calendar_years() {
        let mut s = series(2000, &[10.0, 10.0, 10.0, 10.0, 10.0]);
        s.push(ConsumptionRecord {
            year: 2020,
            ..s[0].clone()
        });
        s[5].consumption_ktoe = 13.0;
        let flags = detect(&refs(&s), 5, 1.2);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].year, 2020);
    }

    #[test]
    fn zero_window_flags_nothing() {
        let s = series(2000, &[1.0, 2.0]);
        assert!(detect(&refs(&s), 0, 1.2).is_empty());
    }

    #[test]
    fn detect_sector_runs_each_fuel() {
        let mut all = series(2000, &[10.0, 10.0, 10.0, 10.0, 10.0, 13.0]);
        let mut coal = series(2000, &[5.0, 5.0, 5.0, 5.0, 5.0, 9.0]);
        for r in &mut coal {
            r.fuel = "Coal".to_string();
        }
        all.extend(coal);
        all.push(ConsumptionRecord {
            year: 2005,
            sector: "Transport".to_string(),
            fuel: "Gas".to_string(),
            consumption_ktoe: 1.0e6,
        });
        let set = RecordSet::new(all);

        let flags = detect_sector(&set, "Industry", &AnomalyConfig::default());
        let fuels: Vec<&str> = flags.iter().map(|f| f.fuel.as_str()).collect();
        assert_eq!(fuels, vec!["Coal", "Gas"]);
        assert!(flags.iter().all(|f| f.sector == "Industry"));
    }
}
