use crate::error::Result;
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

/// The input grid exactly as read, before any header interpretation.
///
/// Blank cells are `None`. Rows may have different lengths; readers should go
/// through [`RawWideTable::cell`] which pads with `None`.
#[derive(Debug, Clone, Default)]
pub struct RawWideTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawWideTable {
    #[cfg(test)]
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| non_blank(c.as_ref())).collect())
            .collect();
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Read a CSV export of the spreadsheet as a headerless grid.
///
/// Cells that are not valid UTF-8 (Excel exports in cp1252 put `£` or `–`
/// in title rows) are decoded lossily instead of failing the read.
pub fn read_raw_table(path: &Path) -> Result<RawWideTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    let mut lossy_cells = 0usize;
    for result in rdr.byte_records() {
        let record = result?;
        let row = record
            .iter()
            .map(|bytes| {
                let text = String::from_utf8_lossy(bytes);
                if matches!(text, Cow::Owned(_)) {
                    lossy_cells += 1;
                }
                non_blank(&text)
            })
            .collect();
        rows.push(row);
    }
    let table = RawWideTable { rows };
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        lossy_cells,
        "read raw table"
    );
    Ok(table)
}
