//! Report content assembly.
//!
//! [`ReportContentBuilder`] turns comparison rows into an ordered list of
//! [`ContentBlock`]s. It never draws anything: the resulting
//! [`ReportDocument`] is serialized and handed to whatever renders the
//! PDF or screen view.

use crate::compare::{rank_movers, Movers};
use crate::narrative::{cause_or_generic, Direction};
use crate::types::ComparisonRow;
use crate::util::{format_number, format_pct, pct_change};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

pub const DISCLAIMER: &str = "Figures are derived from published final energy consumption \
statistics and may be revised. Highlighted causes are indicative domain notes, not the \
result of a causal analysis.";

/// Pre-rendered change-magnitude chart supplied by the plotting side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartImage {
    pub path: PathBuf,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_a: f64,
    pub total_b: f64,
    pub change_pct: Option<f64>,
}

impl Kpis {
    /// Totals over every row, subtotals included.
    pub fn from_rows(rows: &[ComparisonRow]) -> Self {
        let total_a: f64 = rows.iter().map(|r| r.value_a).sum();
        let total_b: f64 = rows.iter().map(|r| r.value_b).sum();
        Self {
            total_a,
            total_b,
            change_pct: pct_change(total_a, total_b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Title {
        text: String,
    },
    KpiSummary {
        text: String,
        kpis: Kpis,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Image(ChartImage),
    Highlight {
        fuel: String,
        direction: Direction,
        text: String,
    },
    InsufficientData {
        text: String,
    },
    Disclaimer {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub sector: String,
    pub year_a: i32,
    pub year_b: i32,
    pub generated_on: NaiveDate,
    pub blocks: Vec<ContentBlock>,
}

pub struct ReportContentBuilder {
    decimals: usize,
    generated_on: NaiveDate,
}

impl ReportContentBuilder {
    pub fn new(decimals: usize) -> Self {
        Self {
            decimals,
            generated_on: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, generated_on: NaiveDate) -> Self {
        self.generated_on = generated_on;
        self
    }

    pub fn build(
        &self,
        rows: &[ComparisonRow],
        sector: &str,
        year_a: i32,
        year_b: i32,
        chart_image: ChartImage,
    ) -> ReportDocument {
        let kpis = Kpis::from_rows(rows);
        let mut blocks = vec![
            ContentBlock::Title {
                text: format!("{sector}: Energy Consumption Comparison {year_a} vs {year_b}"),
            },
            ContentBlock::KpiSummary {
                text: self.kpi_text(&kpis, year_a, year_b),
                kpis,
            },
            self.table(rows, year_a, year_b),
            ContentBlock::Image(chart_image),
        ];

        match rank_movers(rows) {
            Some(Movers {
                top_increase,
                top_decrease,
            }) => {
                blocks.push(self.highlight(Direction::Increase, top_increase, year_a, year_b));
                blocks.push(self.highlight(Direction::Decrease, top_decrease, year_a, year_b));
            }
            None => blocks.push(ContentBlock::InsufficientData {
                text: format!(
                    "Insufficient data: no fuel in {sector} has a non-zero {year_a} base, \
                     so no percentage change can be ranked."
                ),
            }),
        }

        blocks.push(ContentBlock::Disclaimer {
            text: format!("{DISCLAIMER} Generated on {}.", self.generated_on.format("%Y-%m-%d")),
        });

        ReportDocument {
            sector: sector.to_string(),
            year_a,
            year_b,
            generated_on: self.generated_on,
            blocks,
        }
    }

    fn kpi_text(&self, kpis: &Kpis, year_a: i32, year_b: i32) -> String {
        let change = match kpis.change_pct {
            Some(_) => format!("{}%", format_pct(kpis.change_pct, self.decimals)),
            None => format_pct(None, self.decimals),
        };
        format!(
            "Total consumption: {} ktoe in {year_a}, {} ktoe in {year_b}. Overall change: {change}.",
            format_number(kpis.total_a, self.decimals),
            format_number(kpis.total_b, self.decimals),
        )
    }

    fn table(&self, rows: &[ComparisonRow], year_a: i32, year_b: i32) -> ContentBlock {
        let headers = vec![
            "Fuel".to_string(),
            format!("ktoe {year_a}"),
            format!("ktoe {year_b}"),
            "Δ ktoe".to_string(),
            "Δ %".to_string(),
        ];
        let rows = rows
            .iter()
            .map(|r| {
                vec![
                    r.fuel.clone(),
                    format_number(r.value_a, self.decimals),
                    format_number(r.value_b, self.decimals),
                    format_number(r.delta_abs, self.decimals),
                    format_pct(r.delta_pct, self.decimals),
                ]
            })
            .collect();
        ContentBlock::Table { headers, rows }
    }

    /// `slot` is the end of the ranking the row came from; the label follows
    /// the row's own direction, so a top "increase" that fell reads as the
    /// smallest decrease.
    fn highlight(&self, slot: Direction, row: &ComparisonRow, year_a: i32, year_b: i32) -> ContentBlock {
        // Ranked rows always carry a percentage.
        let pct = row.delta_pct.unwrap_or_default();
        let direction = Direction::of(pct);
        let label = match (slot, direction) {
            (Direction::Increase, Direction::Increase) => "Largest increase",
            (Direction::Increase, Direction::Decrease) => "Smallest decrease",
            (Direction::Decrease, Direction::Decrease) => "Largest decrease",
            (Direction::Decrease, Direction::Increase) => "Smallest increase",
        };
        let verb = match direction {
            Direction::Increase => "rose",
            Direction::Decrease => "fell",
        };
        let text = format!(
            "{label}: {} consumption {verb} by {}% between {year_a} and {year_b} ({} ktoe). {}",
            row.fuel,
            format_pct(Some(pct.abs()), self.decimals),
            format_number(row.delta_abs, self.decimals),
            cause_or_generic(&row.fuel, direction),
        );
        ContentBlock::Highlight {
            fuel: row.fuel.clone(),
            direction,
            text,
        }
    }
}
