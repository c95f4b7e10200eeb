//! Tabular rule sheets
//!
//! The business keeps its AQL tables and non-conformity rules in
//! spreadsheets. This module reads them either as CSV exports or, with the
//! `xlsx` feature, straight from the workbook (first worksheet).

use crate::error::{Error, Result};
use std::path::Path;

/// Header row plus data rows, all cells as trimmed strings
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Read from a file, choosing the reader from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => {
                let content = std::fs::read_to_string(path)?;
                Self::from_csv_str(&content)
            }
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "ods" => Self::from_workbook(path),
            _ => Err(Error::Table(format!(
                "unsupported table format: {}",
                path.display()
            ))),
        }
    }

    /// Parse CSV text. The first non-empty record is the header.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}');
        let mut records = parse_csv(content).into_iter();

        let headers = records
            .next()
            .ok_or_else(|| Error::Table("empty table".into()))?;
        let rows = records.collect();

        Ok(Self { headers, rows })
    }

    /// Read the first worksheet of a workbook
    #[cfg(feature = "xlsx")]
    pub fn from_workbook(path: &Path) -> Result<Self> {
        use calamine::{open_workbook_auto, Reader};

        let mut workbook =
            open_workbook_auto(path).map_err(|e| Error::Table(format!("{}: {}", path.display(), e)))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Table(format!("{}: no worksheet", path.display())))?
            .map_err(|e| Error::Table(format!("{}: {}", path.display(), e)))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()));

        let headers = rows
            .next()
            .ok_or_else(|| Error::Table(format!("{}: empty worksheet", path.display())))?;

        Ok(Self {
            headers,
            rows: rows.collect(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the first header containing any of the candidates
    /// (case-insensitive)
    pub fn column(&self, candidates: &[&str]) -> Option<usize> {
        self.headers.iter().position(|header| {
            let header = header.to_lowercase();
            candidates
                .iter()
                .any(|c| header.contains(&c.to_lowercase()))
        })
    }

    /// Like [`Sheet::column`], but a missing column is an error
    pub fn require_column(&self, name: &str, candidates: &[&str]) -> Result<usize> {
        self.column(candidates)
            .ok_or_else(|| Error::Table(format!("missing column: {}", name)))
    }
}

/// Cell accessor tolerant of short rows
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Split CSV text into records of trimmed cells
///
/// Double-quote aware: `""` inside quotes is a literal quote and a quoted
/// cell may span several lines. Blank lines are skipped.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut blank = true;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            '\r' if chars.peek() == Some(&'\n') => continue,
            ',' if !in_quotes => record.push(take_field(&mut field)),
            '\n' if !in_quotes => {
                record.push(take_field(&mut field));
                if blank {
                    record.clear();
                } else {
                    records.push(std::mem::take(&mut record));
                }
                blank = true;
                continue;
            }
            _ => field.push(c),
        }
        if !c.is_whitespace() {
            blank = false;
        }
    }

    record.push(take_field(&mut field));
    if !blank {
        records.push(record);
    }
    records
}

fn take_field(field: &mut String) -> String {
    let value = field.trim().to_string();
    field.clear();
    value
}
