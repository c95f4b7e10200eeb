//! AQL sampling tables
//!
//! The evaluator only needs "level + lot size -> sample size and accept
//! numbers". That question is asked through [`AqlLookup`] so callers can
//! plug in their own source. [`AqlTable`] is the in-crate implementation:
//! the ISO 2859-1 single sampling plan (normal inspection) built in, or the
//! business's own accept/reject sheet loaded from CSV/XLSX.

use crate::error::{Error, Result};
use crate::sheet::{cell, Sheet};
use crate::types::AqlLevel;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// The lookup source could not answer (unreachable, corrupt, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("AQL lookup unavailable: {0}")]
pub struct LookupError(pub String);

/// Sampling plan for one level and lot size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqlPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_letter: Option<char>,
    pub sample_size: u32,
    /// Accept numbers per column. `None` means the cell is empty.
    pub critical: Option<u32>,
    pub major_1_5: Option<u32>,
    pub major_2_5: Option<u32>,
    pub minor_4_0: Option<u32>,
}

impl AqlPlan {
    /// Accept number of the major column matching an AQL value
    pub fn major_limit(&self, aql: f64) -> Option<u32> {
        if same_aql(aql, 1.5) {
            self.major_1_5
        } else if same_aql(aql, 2.5) {
            self.major_2_5
        } else {
            None
        }
    }

    /// Accept number of the minor column (only AQL 4.0 is tabulated)
    pub fn minor_limit(&self, aql: f64) -> Option<u32> {
        if same_aql(aql, 4.0) {
            self.minor_4_0
        } else {
            None
        }
    }
}

pub fn same_aql(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Injected source of sampling plans
///
/// `Ok(None)` means the source has no row for that level and lot size.
pub trait AqlLookup: Sync {
    fn lookup(&self, level: AqlLevel, lot_size: u32) -> std::result::Result<Option<AqlPlan>, LookupError>;
}

/// One row: a level, a lot-size range, and its plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqlRow {
    pub level: AqlLevel,
    pub lot_min: u32,
    /// `None` for the open-ended last range ("500,001 et plus")
    pub lot_max: Option<u32>,
    pub plan: AqlPlan,
}

impl AqlRow {
    fn covers(&self, level: AqlLevel, lot_size: u32) -> bool {
        self.level == level
            && lot_size >= self.lot_min
            && self.lot_max.map_or(true, |max| lot_size <= max)
    }
}

/// Table of sampling plans; the first matching row wins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AqlTable {
    rows: Vec<AqlRow>,
}

// ISO 2859-1 table 1: lot ranges and code letters per level, in the
// column order S1 S2 S3 S4 I II III.
const ISO_LOT_RANGES: [(u32, Option<u32>, &str); 15] = [
    (2, Some(8), "AAAAAAB"),
    (9, Some(15), "AAAAABC"),
    (16, Some(25), "AABBBCD"),
    (26, Some(50), "ABBCCDE"),
    (51, Some(90), "BBCCCEF"),
    (91, Some(150), "BBCDDFG"),
    (151, Some(280), "BCDEEGH"),
    (281, Some(500), "BCDEFHJ"),
    (501, Some(1200), "CCEFGJK"),
    (1201, Some(3200), "CDEGHKL"),
    (3201, Some(10000), "CDFGJLM"),
    (10001, Some(35000), "CDFHKMN"),
    (35001, Some(150000), "DEGJLNP"),
    (150001, Some(500000), "DEGJMPQ"),
    (500001, None, "DEHKNQR"),
];

const ISO_LEVEL_COLUMNS: [AqlLevel; 7] = [
    AqlLevel::S1,
    AqlLevel::S2,
    AqlLevel::S3,
    AqlLevel::S4,
    AqlLevel::I,
    AqlLevel::II,
    AqlLevel::III,
];

// ISO 2859-1 table 2-A: (letter, sample size, Ac 1.5, Ac 2.5, Ac 4.0),
// arrows resolved to the accept number they point to.
const ISO_PLANS: [(char, u32, u32, u32, u32); 16] = [
    ('A', 2, 0, 0, 0),
    ('B', 3, 0, 0, 0),
    ('C', 5, 0, 0, 0),
    ('D', 8, 0, 0, 1),
    ('E', 13, 0, 1, 1),
    ('F', 20, 1, 1, 2),
    ('G', 32, 1, 2, 3),
    ('H', 50, 2, 3, 5),
    ('J', 80, 3, 5, 7),
    ('K', 125, 5, 7, 10),
    ('L', 200, 7, 10, 14),
    ('M', 315, 10, 14, 21),
    ('N', 500, 14, 21, 21),
    ('P', 800, 21, 21, 21),
    ('Q', 1250, 21, 21, 21),
    ('R', 2000, 21, 21, 21),
];

impl AqlTable {
    pub fn new(rows: Vec<AqlRow>) -> Self {
        Self { rows }
    }

    /// Built-in ISO 2859-1 normal inspection, all seven levels
    pub fn standard() -> Self {
        let mut rows = Vec::with_capacity(ISO_LOT_RANGES.len() * ISO_LEVEL_COLUMNS.len());

        for (lot_min, lot_max, letters) in ISO_LOT_RANGES {
            for (level, letter) in ISO_LEVEL_COLUMNS.iter().zip(letters.chars()) {
                let Some(&(_, sample_size, ac_1_5, ac_2_5, ac_4_0)) =
                    ISO_PLANS.iter().find(|p| p.0 == letter)
                else {
                    continue;
                };

                rows.push(AqlRow {
                    level: *level,
                    lot_min,
                    lot_max,
                    plan: AqlPlan {
                        code_letter: Some(letter),
                        sample_size,
                        critical: Some(0),
                        major_1_5: Some(ac_1_5),
                        major_2_5: Some(ac_2_5),
                        minor_4_0: Some(ac_4_0),
                    },
                });
            }
        }

        Self { rows }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let sheet = Sheet::from_path(path)?;
        let table = Self::from_sheet(&sheet).map_err(|e| match e {
            Error::Table(msg) => Error::Table(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), rows = table.len(), "loaded AQL table");
        Ok(table)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_sheet(&Sheet::from_csv_str(content)?)
    }

    /// Build from an accept/reject sheet
    ///
    /// Expected columns (matched by substring, case-insensitive): lot size
    /// ("Taille du Lot"), level, optional code letter ("Lettre"), sample
    /// size ("Échantillon à prélever"), then the accept cells
    /// "Critical (AQL 0)", "Major (AQL 1.5)", "Major (AQL 2.5)",
    /// "Minor (AQL 4.0)". A level cell such as "S1-S4" yields one row per
    /// level. Rows that cannot be read are skipped with a warning.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self> {
        let lot_col = sheet.require_column("lot size", &["taille du lot", "lot size", "lot"])?;
        let level_col = sheet.require_column("level", &["level", "niveau"])?;
        let sample_col =
            sheet.require_column("sample size", &["chantillon", "sample"])?;
        let letter_col = sheet.column(&["lettre", "letter", "code"]);
        let critical_col = sheet.column(&["critical", "critique", "aql 0)"]);
        let major_1_5_col = sheet.column(&["aql 1.5", "aql 1,5"]);
        let major_2_5_col = sheet.column(&["aql 2.5", "aql 2,5"]);
        let minor_col = sheet.column(&["aql 4", "minor", "mineur"]);

        if major_1_5_col.is_none() && major_2_5_col.is_none() && minor_col.is_none() {
            return Err(Error::Table("no accept-number column (AQL 1.5 / 2.5 / 4.0)".into()));
        }

        let mut rows = Vec::new();
        for (line, row) in sheet.rows().iter().enumerate() {
            let Some((lot_min, lot_max)) = parse_lot_range(cell(row, lot_col)) else {
                tracing::warn!(line = line + 2, value = cell(row, lot_col), "skipping AQL row: unreadable lot size");
                continue;
            };
            let levels = parse_levels(cell(row, level_col));
            if levels.is_empty() {
                tracing::warn!(line = line + 2, value = cell(row, level_col), "skipping AQL row: unknown level");
                continue;
            }
            let Some(sample_size) = parse_count(cell(row, sample_col)) else {
                tracing::warn!(line = line + 2, value = cell(row, sample_col), "skipping AQL row: unreadable sample size");
                continue;
            };

            let plan = AqlPlan {
                code_letter: letter_col.and_then(|c| cell(row, c).chars().find(|ch| ch.is_ascii_alphabetic())),
                sample_size,
                critical: accept(row, critical_col),
                major_1_5: accept(row, major_1_5_col),
                major_2_5: accept(row, major_2_5_col),
                minor_4_0: accept(row, minor_col),
            };

            rows.extend(levels.into_iter().map(|level| AqlRow {
                level,
                lot_min,
                lot_max,
                plan: plan.clone(),
            }));
        }

        if rows.is_empty() {
            return Err(Error::Table("no usable AQL rows".into()));
        }

        Ok(Self { rows })
    }

    /// Append another table; rows of `self` keep precedence
    pub fn merge(mut self, other: AqlTable) -> Self {
        self.rows.extend(other.rows);
        self
    }

    pub fn rows(&self) -> &[AqlRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Levels with at least one row, in [`AqlLevel::ALL`] order
    pub fn levels(&self) -> Vec<AqlLevel> {
        AqlLevel::ALL
            .into_iter()
            .filter(|level| self.rows.iter().any(|r| r.level == *level))
            .collect()
    }

    pub fn find(&self, level: AqlLevel, lot_size: u32) -> Option<&AqlPlan> {
        self.rows
            .iter()
            .find(|row| row.covers(level, lot_size))
            .map(|row| &row.plan)
    }
}

impl AqlLookup for AqlTable {
    fn lookup(&self, level: AqlLevel, lot_size: u32) -> std::result::Result<Option<AqlPlan>, LookupError> {
        Ok(self.find(level, lot_size).cloned())
    }
}

/// Parse a lot-size cell: "2 – 8", "1,201 - 3,200", "500,001 et plus"
fn parse_lot_range(value: &str) -> Option<(u32, Option<u32>)> {
    lazy_static::lazy_static! {
        static ref NUMBER_RE: Regex = Regex::new(r"\d{1,3}(?:[,.\u{a0}\u{202f} ]\d{3})+|\d+").unwrap();
        static ref OPEN_RE: Regex = Regex::new(r"(?i)plus|over|more|above|\+|≥|>").unwrap();
    }

    let numbers: Vec<u32> = NUMBER_RE
        .find_iter(value)
        .filter_map(|m| parse_count(m.as_str()))
        .collect();

    match numbers.as_slice() {
        [min, max, ..] if min <= max => Some((*min, Some(*max))),
        [min] if OPEN_RE.is_match(value) => Some((*min, None)),
        [exact] => Some((*exact, Some(*exact))),
        _ => None,
    }
}

/// Parse a level cell: "II", "S3", "S1-S4", "I / II"
fn parse_levels(value: &str) -> Vec<AqlLevel> {
    lazy_static::lazy_static! {
        static ref SPECIAL_RANGE_RE: Regex =
            Regex::new(r"(?i)^S\s*([1-4])\s*(?:-|–|à|to)\s*S?\s*([1-4])$").unwrap();
    }

    let mut levels = Vec::new();
    for part in value.split([',', '/', ';']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(caps) = SPECIAL_RANGE_RE.captures(part) {
            let from: u8 = caps[1].parse().unwrap_or(1);
            let to: u8 = caps[2].parse().unwrap_or(4);
            for n in from..=to {
                if let Some(level) = AqlLevel::from_code(&format!("S{}", n)) {
                    levels.push(level);
                }
            }
        } else if let Some(level) = AqlLevel::from_code(part) {
            levels.push(level);
        }
    }

    levels.dedup();
    levels
}

/// Parse an accept cell: "Ac=0/Re=1", "Ac = 2", "3". Dashes and blanks are empty.
fn parse_accept(value: &str) -> Option<u32> {
    lazy_static::lazy_static! {
        static ref AC_RE: Regex = Regex::new(r"(?i)ac\s*[=:]?\s*(\d+)").unwrap();
    }

    match AC_RE.captures(value) {
        Some(caps) => caps[1].parse().ok(),
        None => parse_count(value),
    }
}

fn accept(row: &[String], col: Option<usize>) -> Option<u32> {
    col.and_then(|c| parse_accept(cell(row, c)))
}

/// Integer with optional thousands separators
fn parse_count(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
