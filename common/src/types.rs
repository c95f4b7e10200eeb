//! FRI extraction record types
//!
//! The shape produced by the extraction step (LLM structured output) for a
//! Final Random Inspection report:
//! - FriExtraction: the full record
//! - InspectionResult: tri-state pass/fail/in-waiting used everywhere
//! - AqlLevel: general (I–III) and special (S1–S4) inspection levels

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of an inspection component, a step, or a whole report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    #[serde(alias = "PASS", alias = "Pass")]
    Pass,
    #[serde(alias = "FAIL", alias = "Fail")]
    Fail,
    #[serde(alias = "IN_WAITING", alias = "In waiting", alias = "in waiting", alias = "pending")]
    InWaiting,
}

impl InspectionResult {
    pub fn is_pass(self) -> bool {
        self == InspectionResult::Pass
    }

    /// Aggregation rank: FAIL > IN_WAITING > PASS
    fn rank(self) -> u8 {
        match self {
            InspectionResult::Pass => 0,
            InspectionResult::InWaiting => 1,
            InspectionResult::Fail => 2,
        }
    }

    /// Combine two outcomes, keeping the dominant one
    pub fn combine(self, other: InspectionResult) -> InspectionResult {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// Combine any number of outcomes. An empty input is PASS.
    pub fn all<I: IntoIterator<Item = InspectionResult>>(results: I) -> InspectionResult {
        results
            .into_iter()
            .fold(InspectionResult::Pass, InspectionResult::combine)
    }

    /// Lenient parse of a decision cell ("Pass", "FAIL", "In waiting")
    pub fn parse_loose(value: &str) -> Option<InspectionResult> {
        let normalized = value.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "pass" | "ok" | "accepted" => Some(InspectionResult::Pass),
            "fail" | "ko" | "rejected" | "refused" => Some(InspectionResult::Fail),
            "in waiting" | "waiting" | "pending" | "on hold" => Some(InspectionResult::InWaiting),
            _ => None,
        }
    }
}

impl fmt::Display for InspectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionResult::Pass => write!(f, "PASS"),
            InspectionResult::Fail => write!(f, "FAIL"),
            InspectionResult::InWaiting => write!(f, "IN_WAITING"),
        }
    }
}

/// AQL inspection level (general I–III, special S1–S4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqlLevel {
    I,
    II,
    III,
    #[serde(alias = "S-1")]
    S1,
    #[serde(alias = "S-2")]
    S2,
    #[serde(alias = "S-3")]
    S3,
    #[serde(alias = "S-4")]
    S4,
}

impl AqlLevel {
    pub const ALL: [AqlLevel; 7] = [
        AqlLevel::I,
        AqlLevel::II,
        AqlLevel::III,
        AqlLevel::S1,
        AqlLevel::S2,
        AqlLevel::S3,
        AqlLevel::S4,
    ];

    pub fn is_special(self) -> bool {
        matches!(self, AqlLevel::S1 | AqlLevel::S2 | AqlLevel::S3 | AqlLevel::S4)
    }

    pub fn code(self) -> &'static str {
        match self {
            AqlLevel::I => "I",
            AqlLevel::II => "II",
            AqlLevel::III => "III",
            AqlLevel::S1 => "S1",
            AqlLevel::S2 => "S2",
            AqlLevel::S3 => "S3",
            AqlLevel::S4 => "S4",
        }
    }

    /// Parse a level code ("II", "S-3", "s3")
    pub fn from_code(code: &str) -> Option<AqlLevel> {
        let code = code.trim().to_uppercase().replace(['-', ' '], "");
        AqlLevel::ALL.into_iter().find(|level| level.code() == code)
    }
}

impl fmt::Display for AqlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for AqlLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AqlLevel::from_code(s)
            .ok_or_else(|| format!("Unknown AQL level: {}. Use I, II, III or S1-S4", s))
    }
}

/// Desiccant product checked on the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SilicaGelType {
    #[serde(rename = "Silica Gel")]
    SilicaGel,
    #[serde(rename = "Dri Caly Micro Pak", alias = "Dri Clay Micro Pak")]
    DriClay,
    #[serde(rename = "Calcium Chlorid", alias = "Calcium Chloride")]
    CalciumChloride,
}

/// Where the desiccant was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SilicaGelLocation {
    Export,
    Inner,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub laboratory: String,
    pub id_report: String,
    pub date_report: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    /// GTIN with the trailing grade letter (e.g. "3256540123456-A")
    pub gtin: String,
    pub export_carton: String,
    /// Must be EAN-128 or a variant spelling
    pub format_export_carton: String,
    /// Must be EAN-13 or a variant spelling
    pub format_packaging: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_label: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub supplier_label: String,
    #[serde(default)]
    pub supplier_ref: String,
    #[serde(default)]
    pub manufacturer_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilicaGel {
    pub carton: SilicaGelLocation,
    pub quantity: u32,
    pub white_transparent: bool,
    pub name: SilicaGelType,
}

/// Ordered vs presented quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quantity {
    pub order_quantity: u32,
    pub order_carton: u32,
    pub presented_quantity: u32,
    pub presented_carton: u32,
}

impl Quantity {
    /// Field-wise sum, used to reconcile per-order lines with the aggregate
    pub fn add(self, other: Quantity) -> Quantity {
        Quantity {
            order_quantity: self.order_quantity.saturating_add(other.order_quantity),
            order_carton: self.order_carton.saturating_add(other.order_carton),
            presented_quantity: self.presented_quantity.saturating_add(other.presented_quantity),
            presented_carton: self.presented_carton.saturating_add(other.presented_carton),
        }
    }
}

/// One purchase order on the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub po: String,
    pub lec: String,
    pub quantity: Quantity,
}

/// Aggregate across all orders (or the single order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTotal {
    #[serde(default)]
    pub po: Option<String>,
    #[serde(default)]
    pub lec: Option<String>,
    pub total_quantity: Quantity,
}

/// Order information: either a lone total, or per-order lines plus total
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandInformations {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub command_total: Option<CommandTotal>,
}

/// Validated view over [`CommandInformations`]
#[derive(Debug, Clone, Copy)]
pub enum OrderLines<'a> {
    Single(&'a CommandTotal),
    Multiple {
        commands: &'a [Command],
        total: &'a CommandTotal,
    },
}

impl<'a> OrderLines<'a> {
    pub fn total(&self) -> &'a CommandTotal {
        match self {
            OrderLines::Single(total) => total,
            OrderLines::Multiple { total, .. } => total,
        }
    }
}

impl CommandInformations {
    /// Resolve which quantity records are populated
    ///
    /// # Errors
    /// `Error::Contract` when no quantity record exists at all, or when
    /// per-order lines come without their aggregate.
    pub fn order_lines(&self) -> Result<OrderLines<'_>> {
        match (self.commands.is_empty(), self.command_total.as_ref()) {
            (true, Some(total)) => Ok(OrderLines::Single(total)),
            (false, Some(total)) => Ok(OrderLines::Multiple {
                commands: &self.commands,
                total,
            }),
            (true, None) => Err(Error::Contract(
                "command_informations has neither command_total nor commands".into(),
            )),
            (false, None) => Err(Error::Contract(
                "command_informations lists commands without a command_total aggregate".into(),
            )),
        }
    }
}

/// The seven inspection criteria reported by the laboratory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionConclusion {
    pub style_material: InspectionResult,
    pub function_test: InspectionResult,
    pub workmanship: InspectionResult,
    pub shipping_mark: InspectionResult,
    pub packaging_label: InspectionResult,
    pub measurement: InspectionResult,
    pub barcode_grade: InspectionResult,
}

impl InspectionConclusion {
    /// Criteria in report order, keyed by field name
    pub fn criteria(&self) -> [(&'static str, InspectionResult); 7] {
        [
            ("style_material", self.style_material),
            ("function_test", self.function_test),
            ("workmanship", self.workmanship),
            ("shipping_mark", self.shipping_mark),
            ("packaging_label", self.packaging_label),
            ("measurement", self.measurement),
            ("barcode_grade", self.barcode_grade),
        ]
    }

    /// Every criterion set to PASS
    pub fn all_pass() -> Self {
        Self {
            style_material: InspectionResult::Pass,
            function_test: InspectionResult::Pass,
            workmanship: InspectionResult::Pass,
            shipping_mark: InspectionResult::Pass,
            packaging_label: InspectionResult::Pass,
            measurement: InspectionResult::Pass,
            barcode_grade: InspectionResult::Pass,
        }
    }
}

/// Free-text remarks. Unclassified remarks land in `nc_remarks`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nc_remarks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub informative_remarks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: Vec<String>,
}

impl Notes {
    /// Every remark with its field path, in field order
    pub fn entries(&self) -> Vec<(String, &str)> {
        let groups: [(&str, &Vec<String>); 3] = [
            ("nc_remarks", &self.nc_remarks),
            ("informative_remarks", &self.informative_remarks),
            ("notes", &self.notes),
        ];

        groups
            .iter()
            .flat_map(|(name, items)| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, text)| !text.trim().is_empty())
                    .map(move |(i, text)| (format!("notes.{}[{}]", name, i), text.as_str()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Defect counts for one described defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    pub defect_description: String,
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

/// AQL values per severity (SIPLEC: critical 0, major 1.5 or 2.5, minor 4.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AqlCategory {
    pub critical: f64,
    pub major: f64,
    pub minor: f64,
}

/// Accept numbers (AC) per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefectLimits {
    pub critical: u32,
    pub major: u32,
    pub minor: u32,
}

/// One AQL sampling block of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqlCheck {
    pub level: AqlLevel,
    pub sample_size: u32,
    /// Only reported for the general check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_opened_carton: Option<u32>,
    pub category: AqlCategory,
    /// AC values as written by the laboratory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_allowed: Option<DefectLimits>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub defect_description: Vec<Defect>,
}

impl AqlCheck {
    /// Defects found, summed per severity over all described defects
    pub fn defect_totals(&self) -> DefectLimits {
        self.defect_description
            .iter()
            .fold(DefectLimits::default(), |acc, d| DefectLimits {
                critical: acc.critical.saturating_add(d.critical),
                major: acc.major.saturating_add(d.major),
                minor: acc.minor.saturating_add(d.minor),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aql {
    pub general_check: AqlCheck,
    #[serde(default)]
    pub special_check: Option<AqlCheck>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShippingMarks {
    #[serde(default)]
    pub barcode_conformity_inner_carton: String,
    /// Gencode must be present on the 4 main faces
    #[serde(default)]
    pub barcode_conformity_master_carton: String,
}

/// Complete extraction output for one FRI report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriExtraction {
    pub report: ReportInfo,
    pub barcode: Barcode,
    pub product: Product,
    #[serde(default)]
    pub silica_gel: Option<SilicaGel>,
    pub command_informations: CommandInformations,
    pub inspection_conclusion: InspectionConclusion,
    /// The laboratory's declared overall result
    pub overall_inspection_conclusion: InspectionResult,
    #[serde(default)]
    pub notes: Notes,
    pub aql: Aql,
    #[serde(default)]
    pub shipping_marks: ShippingMarks,
}

impl FriExtraction {
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(json)?;
        Ok(record)
    }

    pub fn lab_result(&self) -> InspectionResult {
        self.overall_inspection_conclusion
    }
}

/// LLM output sometimes carries `null` where a list is expected
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
