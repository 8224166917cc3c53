use crate::error::Result;
use crate::report::{ContentBlock, ReportDocument};
use crate::types::Matrix;
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "wrote json");
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows\n", rows.len() - max_rows);
    }
}

fn markdown_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut records: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    records.push(headers.to_vec());
    records.extend(rows.iter().cloned());
    Builder::from_iter(records)
        .build()
        .with(Style::markdown())
        .to_string()
}

/// Heatmap data as a Markdown grid; empty cells stay blank.
pub fn render_matrix(matrix: &Matrix, corner: &str) -> String {
    let mut headers = vec![corner.to_string()];
    headers.extend(matrix.column_labels.iter().cloned());
    let rows: Vec<Vec<String>> = matrix
        .row_labels
        .iter()
        .zip(&matrix.cells)
        .map(|(label, cells)| {
            let mut row = vec![label.clone()];
            row.extend(
                cells
                    .iter()
                    .map(|c| c.map(|v| format_number(v, 0)).unwrap_or_default()),
            );
            row
        })
        .collect();
    markdown_grid(&headers, &rows)
}

/// Plain-text rendering of a report for console preview. The real layout
/// is done by whoever consumes the JSON document.
pub fn render_markdown(doc: &ReportDocument) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        let text = match block {
            ContentBlock::Title { text } => format!("# {text}\n\n"),
            ContentBlock::KpiSummary { text, .. } => format!("**{text}**\n\n"),
            ContentBlock::Table { headers, rows } => format!("{}\n\n", markdown_grid(headers, rows)),
            ContentBlock::Image(chart) => format!("![{}]({})\n\n", chart.caption, chart.path.display()),
            ContentBlock::Highlight { text, .. } => format!("- {text}\n\n"),
            ContentBlock::InsufficientData { text } => format!("> {text}\n\n"),
            ContentBlock::Disclaimer { text } => format!("_{text}_\n"),
        };
        out.push_str(&text);
    }
    out
}
