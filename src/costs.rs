use crate::config::PricingConfig;
use crate::records::RecordSet;
use crate::types::{CostDisplayRow, CostRow};
use crate::util::format_number;

/// Cost of each fuel consumed by `sector` in `year`, in fuel order.
///
/// `cost = consumption_ktoe * conversion_factor * unit_price`
pub fn estimate_costs(records: &RecordSet, sector: &str, year: i32, pricing: &PricingConfig) -> Vec<CostRow> {
    records
        .composition(sector, year)
        .into_iter()
        .map(|r| CostRow {
            fuel: r.fuel.clone(),
            consumption_ktoe: r.consumption_ktoe,
            cost: r.consumption_ktoe * pricing.conversion_factor * pricing.unit_price,
        })
        .collect()
}

pub fn total_cost(rows: &[CostRow]) -> f64 {
    rows.iter().map(|r| r.cost).sum()
}

/// Console rendering: whole ktoe, currency with two decimals.
pub fn display_rows(rows: &[CostRow], pricing: &PricingConfig) -> Vec<CostDisplayRow> {
    rows.iter()
        .map(|r| CostDisplayRow {
            fuel: r.fuel.clone(),
            consumption_ktoe: format_number(r.consumption_ktoe, 0),
            cost: format!("{}{}", pricing.currency_symbol, format_number(r.cost, 2)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConsumptionRecord;

    fn set() -> RecordSet {
        let rec = |year: i32, fuel: &str, v: f64| ConsumptionRecord {
            year,
            sector: "Domestic".to_string(),
            fuel: fuel.to_string(),
            consumption_ktoe: v,
        };
        RecordSet::new(vec![
            rec(2023, "Natural gas", 20000.0),
            rec(2023, "Electricity", 10.0),
            rec(2022, "Electricity", 99.0),
        ])
    }

    #[test]
    fn applies_conversion_and_price() {
        let pricing = PricingConfig {
            conversion_factor: 1000.0,
            unit_price: 0.5,
            currency_symbol: "£".to_string(),
        };
        let rows = estimate_costs(&set(), "Domestic", 2023, &pricing);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fuel, "Electricity");
        assert_eq!(rows[0].cost, 5000.0);
        assert_eq!(rows[1].cost, 10_000_000.0);
        assert_eq!(total_cost(&rows), 10_005_000.0);
    }

    #[test]
    fn default_pricing_matches_dashboard() {
        let rows = estimate_costs(&set(), "Domestic", 2023, &PricingConfig::default());
        assert!((rows[0].cost - 10.0 * 11_630.0 * 0.34).abs() < 1e-6);
    }

    #[test]
    fn display_formats_whole_ktoe_and_currency() {
        let pricing = PricingConfig::default();
        let rows = vec![CostRow {
            fuel: "Natural gas".to_string(),
            consumption_ktoe: 20000.4,
            cost: 79_080_000.0,
        }];
        let shown = display_rows(&rows, &pricing);
        assert_eq!(shown[0].consumption_ktoe, "20,000");
        assert_eq!(shown[0].cost, "£79,080,000.00");
    }

    #[test]
    fn missing_sector_or_year_is_empty() {
        assert!(estimate_costs(&set(), "Transport", 2023, &PricingConfig::default()).is_empty());
        assert!(estimate_costs(&set(), "Domestic", 1990, &PricingConfig::default()).is_empty());
    }
}
