use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{ImportError, Result};

/// Cell markers read as missing values, the same set a pandas `read_csv`
/// treats as NaN by default.
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    NA_MARKERS.contains(&cell.trim())
}

/// A CSV file held in memory with a header row.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(&path.display().to_string(), file)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        debug!(table = name, columns = headers.len(), rows = rows.len(), "Loaded table");
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        let wanted = column.trim();
        self.headers
            .iter()
            .position(|h| h == wanted)
            .ok_or_else(|| ImportError::MissingColumn {
                table: self.name.clone(),
                column: wanted.to_string(),
            })
    }

    /// Parses a whole column as numbers; missing cells come back as `None`.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells.get(idx).map(String::as_str).unwrap_or("");
                parse_number(cell, column, row + 1)
            })
            .collect()
    }
}

/// Text of a cell, `None` when absent or a missing-value marker.
pub fn cell_text(cells: &[String], idx: usize) -> Option<&str> {
    cells
        .get(idx)
        .map(String::as_str)
        .filter(|c| !is_missing(c))
}

pub fn parse_number(cell: &str, column: &str, row: usize) -> Result<Option<f64>> {
    if is_missing(cell) {
        return Ok(None);
    }
    let value = cell
        .trim()
        .parse::<f64>()
        .map_err(|_| ImportError::InvalidNumber {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}
