//! Rule checkers
//!
//! Stateless predicates, one per business concern. Each takes a slice of
//! the record and returns the outcome plus the issues that explain it.
//! Bad business data never errors: it becomes a FAIL with an issue.

use crate::analysis::{Severity, StepId, ValidationIssue};
use crate::aql::{same_aql, AqlLookup, AqlPlan};
use crate::types::{
    AqlCheck, Command, CommandTotal, InspectionConclusion, InspectionResult, Quantity, ShippingMarks,
    SilicaGel,
};
use regex::Regex;

/// Result of one checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub result: InspectionResult,
    pub issues: Vec<ValidationIssue>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            result: InspectionResult::Pass,
            issues: Vec::new(),
        }
    }

    /// FAIL when any issue is blocking, PASS otherwise
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let result = if issues.iter().any(ValidationIssue::is_blocking) {
            InspectionResult::Fail
        } else {
            InspectionResult::Pass
        };
        Self { result, issues }
    }

    pub fn is_pass(&self) -> bool {
        self.result.is_pass()
    }

    /// Conjunction of two outcomes, issues kept in order
    pub fn and(mut self, other: RuleOutcome) -> Self {
        self.result = self.result.combine(other.result);
        self.issues.extend(other.issues);
        self
    }
}

// ============================================
// Barcode
// ============================================

/// Grade letter found at the end of a GTIN string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtinGrade {
    Accepted(char),
    Rejected(char),
    Unparseable,
}

/// Extract the trailing grade letter ("3256540123456-A",
/// "3256540123456 (B)", "3256540123456 grade A.")
///
/// The grade is the last letter standing on its own after the digits;
/// trailing whitespace, `.`, `)` and `]` are ignored.
pub fn parse_gtin_grade(gtin: &str) -> GtinGrade {
    lazy_static::lazy_static! {
        static ref GRADE_RE: Regex =
            Regex::new(r"\d(?:.*[^A-Za-z])?(?P<grade>[A-Za-z])[\s.)\]]*$").unwrap();
    }

    let grade = GRADE_RE
        .captures(gtin.trim())
        .and_then(|caps| caps["grade"].chars().next())
        .map(|c| c.to_ascii_uppercase());

    match grade {
        Some(g @ ('A' | 'B')) => GtinGrade::Accepted(g),
        Some(g @ ('C' | 'D' | 'E')) => GtinGrade::Rejected(g),
        _ => GtinGrade::Unparseable,
    }
}

pub fn check_gtin_grade(gtin: &str) -> RuleOutcome {
    let field = "barcode.gtin";
    let issue = match parse_gtin_grade(gtin) {
        GtinGrade::Accepted(_) => return RuleOutcome::pass(),
        GtinGrade::Rejected(grade) => ValidationIssue::blocking(
            StepId::GeneralInfo,
            field,
            format!("GTIN grade {} is not acceptable", grade),
        )
        .observed(grade)
        .expected("A or B"),
        GtinGrade::Unparseable => ValidationIssue::blocking(
            StepId::GeneralInfo,
            field,
            "GTIN grade unparseable: no trailing grade letter A-E",
        )
        .observed(gtin)
        .expected("GTIN followed by grade A or B"),
    };

    RuleOutcome::from_issues(vec![issue])
}

/// Barcode symbology expected on a packaging level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EanClass {
    /// Consumer packaging
    Ean13,
    /// Export carton
    Ean128,
}

impl EanClass {
    pub fn label(self) -> &'static str {
        match self {
            EanClass::Ean13 => "EAN-13",
            EanClass::Ean128 => "EAN-128",
        }
    }

    /// Accepted spellings, already normalized
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            EanClass::Ean13 => &["EAN13", "CODE13", "GTIN13", "JAN13", "UPCEAN13"],
            EanClass::Ean128 => &["EAN128", "CODE128", "GS1128", "UCC128", "UCCEAN128"],
        }
    }
}

fn normalize_symbology(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.' | '/'))
        .flat_map(char::to_uppercase)
        .collect()
}

/// `synonym` occurs in `normalized` and is not the prefix of a longer
/// number ("EAN13" never matches inside "EAN130")
fn contains_symbology(normalized: &str, synonym: &str) -> bool {
    normalized
        .match_indices(synonym)
        .any(|(i, m)| !normalized[i + m.len()..].starts_with(|c: char| c.is_ascii_digit()))
}

/// Accepts decorated spellings such as "EAN-13 (GTIN)" or "EAN13 barcode"
pub fn check_ean_format(value: &str, class: EanClass, field: &str) -> RuleOutcome {
    let normalized = normalize_symbology(value);
    if class
        .synonyms()
        .iter()
        .any(|synonym| contains_symbology(&normalized, synonym))
    {
        return RuleOutcome::pass();
    }

    RuleOutcome::from_issues(vec![ValidationIssue::blocking(
        StepId::GeneralInfo,
        field,
        format!("Barcode format must be {}", class.label()),
    )
    .observed(value)
    .expected(class.label())])
}

// ============================================
// Desiccant
// ============================================

pub fn check_silica_gel(silica_gel: Option<&SilicaGel>) -> RuleOutcome {
    let Some(gel) = silica_gel else {
        return RuleOutcome::from_issues(vec![ValidationIssue::blocking(
            StepId::GeneralInfo,
            "silica_gel",
            "Missing silica gel",
        )
        .observed("absent")
        .expected("silica gel packet present")]);
    };

    let mut issues = Vec::new();
    if gel.quantity == 0 {
        issues.push(
            ValidationIssue::blocking(
                StepId::GeneralInfo,
                "silica_gel.quantity",
                "Silica gel declared with zero packets",
            )
            .observed(0)
            .expected("at least 1"),
        );
    }
    if !gel.white_transparent {
        issues.push(
            ValidationIssue::blocking(
                StepId::GeneralInfo,
                "silica_gel.white_transparent",
                "Silica gel must be white or transparent",
            )
            .observed(false)
            .expected(true),
        );
    }

    RuleOutcome::from_issues(issues)
}

// ============================================
// Shipping marks
// ============================================

/// Master carton gencode on the 4 main faces. Only ever warns.
pub fn check_shipping_marks(marks: &ShippingMarks) -> RuleOutcome {
    let value = marks.barcode_conformity_master_carton.to_lowercase();
    let four_faces = value.contains('4') || value.contains("four") || value.contains("quatre");
    if four_faces {
        return RuleOutcome::pass();
    }

    RuleOutcome::from_issues(vec![ValidationIssue::warning(
        StepId::GeneralInfo,
        "shipping_marks.barcode_conformity_master_carton",
        "Master carton must carry the gencode on its 4 main faces",
    )
    .observed(&marks.barcode_conformity_master_carton)
    .expected("gencode on 4 faces")])
}

// ============================================
// Quantity
// ============================================

/// One blocking issue per mismatched dimension
pub fn check_quantity(quantity: &Quantity, field_prefix: &str) -> RuleOutcome {
    let mut issues = Vec::new();

    if quantity.order_quantity != quantity.presented_quantity {
        issues.push(
            ValidationIssue::blocking(
                StepId::Quantity,
                format!("{}.presented_quantity", field_prefix),
                "Presented product quantity differs from ordered quantity",
            )
            .observed(quantity.presented_quantity)
            .expected(quantity.order_quantity),
        );
    }
    if quantity.order_carton != quantity.presented_carton {
        issues.push(
            ValidationIssue::blocking(
                StepId::Quantity,
                format!("{}.presented_carton", field_prefix),
                "Presented carton count differs from ordered carton count",
            )
            .observed(quantity.presented_carton)
            .expected(quantity.order_carton),
        );
    }

    RuleOutcome::from_issues(issues)
}

/// Per-order lines should add up to the aggregate. Warns only.
pub fn check_order_totals(commands: &[Command], total: &CommandTotal) -> RuleOutcome {
    let sum = commands
        .iter()
        .fold(Quantity::default(), |acc, c| acc.add(c.quantity));
    let expected = total.total_quantity;

    let dimensions = [
        ("order_quantity", sum.order_quantity, expected.order_quantity),
        ("order_carton", sum.order_carton, expected.order_carton),
        ("presented_quantity", sum.presented_quantity, expected.presented_quantity),
        ("presented_carton", sum.presented_carton, expected.presented_carton),
    ];

    let issues = dimensions
        .into_iter()
        .filter(|(_, summed, total)| summed != total)
        .map(|(name, summed, total)| {
            ValidationIssue::warning(
                StepId::Quantity,
                format!("command_informations.command_total.total_quantity.{}", name),
                format!("Sum of per-order {} does not match the total", name),
            )
            .observed(summed)
            .expected(total)
        })
        .collect();

    RuleOutcome::from_issues(issues)
}

// ============================================
// Inspection conclusion
// ============================================

pub fn check_inspection_criteria(conclusion: &InspectionConclusion) -> RuleOutcome {
    let issues = conclusion
        .criteria()
        .into_iter()
        .filter(|(_, result)| !result.is_pass())
        .map(|(name, result)| {
            ValidationIssue::blocking(
                StepId::InspectionConclusion,
                format!("inspection_conclusion.{}", name),
                format!("Inspection criterion {} is not PASS", name),
            )
            .observed(result)
            .expected(InspectionResult::Pass)
        })
        .collect();

    RuleOutcome::from_issues(issues)
}

// ============================================
// AQL
// ============================================

/// Which AQL block is checked; decides the allowed level class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqlBlock {
    General,
    Special,
}

impl AqlBlock {
    fn field(self) -> &'static str {
        match self {
            AqlBlock::General => "aql.general_check",
            AqlBlock::Special => "aql.special_check",
        }
    }
}

/// Missing lookup data: a FAIL, never a silent pass
fn indeterminate(field: String, reason: String) -> ValidationIssue {
    ValidationIssue::blocking(StepId::Aql, field, format!("AQL adequacy indeterminate: {}", reason))
}

/// Sample size and defect tolerances of one AQL block
///
/// `lot_size` is the presented product quantity of the aggregate record.
pub fn check_aql(block: &AqlCheck, kind: AqlBlock, lot_size: u32, lookup: &dyn AqlLookup) -> RuleOutcome {
    let prefix = kind.field();
    let mut issues = Vec::new();

    if block.level.is_special() != (kind == AqlBlock::Special) {
        let expected = match kind {
            AqlBlock::General => "I, II or III",
            AqlBlock::Special => "S1, S2, S3 or S4",
        };
        issues.push(
            ValidationIssue::blocking(
                StepId::Aql,
                format!("{}.level", prefix),
                format!("Inspection level {} does not belong to this check", block.level),
            )
            .observed(block.level)
            .expected(expected),
        );
    }

    issues.extend(check_aql_category(block, prefix));

    let plan = match lookup.lookup(block.level, lot_size) {
        Ok(Some(plan)) => plan,
        Ok(None) => {
            issues.push(indeterminate(
                prefix.to_string(),
                format!("no sampling plan for level {} and lot size {}", block.level, lot_size),
            ));
            return RuleOutcome::from_issues(issues);
        }
        Err(e) => {
            tracing::warn!(level = %block.level, lot_size, error = %e, "AQL lookup failed");
            issues.push(indeterminate(prefix.to_string(), e.to_string()));
            return RuleOutcome::from_issues(issues);
        }
    };

    if block.sample_size < plan.sample_size {
        issues.push(
            ValidationIssue::blocking(
                StepId::Aql,
                format!("{}.sample_size", prefix),
                format!(
                    "Sample size too small for level {} and lot size {}",
                    block.level, lot_size
                ),
            )
            .observed(block.sample_size)
            .expected(format!(">= {}", plan.sample_size)),
        );
    }

    issues.extend(check_defect_tiers(block, &plan, prefix));

    RuleOutcome::from_issues(issues)
}

/// AQL values must be critical 0, major 1.5 or 2.5, minor 4.0
fn check_aql_category(block: &AqlCheck, prefix: &str) -> Vec<ValidationIssue> {
    let category = &block.category;
    let checks = [
        ("critical", category.critical, same_aql(category.critical, 0.0), "0"),
        (
            "major",
            category.major,
            same_aql(category.major, 1.5) || same_aql(category.major, 2.5),
            "1.5 or 2.5",
        ),
        ("minor", category.minor, same_aql(category.minor, 4.0), "4.0"),
    ];

    checks
        .into_iter()
        .filter(|(_, _, ok, _)| !ok)
        .map(|(tier, value, _, expected)| {
            ValidationIssue::blocking(
                StepId::Aql,
                format!("{}.category.{}", prefix, tier),
                format!("AQL value for {} defects is not accepted", tier),
            )
            .observed(value)
            .expected(expected)
        })
        .collect()
}

fn check_defect_tiers(block: &AqlCheck, plan: &AqlPlan, prefix: &str) -> Vec<ValidationIssue> {
    let found = block.defect_totals();
    let mut issues = Vec::new();

    // Critical tolerance is zero whatever the table says
    let tiers = [
        ("critical", found.critical, Some(0), 0.0),
        ("major", found.major, plan.major_limit(block.category.major), block.category.major),
        ("minor", found.minor, plan.minor_limit(block.category.minor), block.category.minor),
    ];

    for (tier, count, limit, aql) in tiers {
        let Some(limit) = limit else {
            issues.push(indeterminate(
                format!("{}.maximum_allowed.{}", prefix, tier),
                format!("no accept number for {} AQL {} in the table", tier, aql),
            ));
            continue;
        };

        if count > limit {
            issues.push(
                ValidationIssue::blocking(
                    StepId::Aql,
                    format!("{}.defect_description.{}", prefix, tier),
                    format!("{} defects ({}) exceed the accept number ({})", capitalize(tier), count, limit),
                )
                .observed(count)
                .expected(format!("<= {}", limit)),
            );
        }

        let declared = block.maximum_allowed.map(|m| match tier {
            "critical" => m.critical,
            "major" => m.major,
            _ => m.minor,
        });
        if let Some(declared) = declared.filter(|d| *d != limit) {
            issues.push(
                ValidationIssue::new(
                    StepId::Aql,
                    Severity::Warning,
                    format!("{}.maximum_allowed.{}", prefix, tier),
                    format!("Laboratory accept number for {} defects differs from the table", tier),
                )
                .observed(declared)
                .expected(limit),
            );
        }
    }

    issues
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aql::{AqlTable, LookupError};
    use crate::testing::sample_record;
    use crate::types::{AqlLevel, Defect, DefectLimits, SilicaGelLocation, SilicaGelType};

    struct Unavailable;

    impl AqlLookup for Unavailable {
        fn lookup(&self, _: AqlLevel, _: u32) -> Result<Option<AqlPlan>, LookupError> {
            Err(LookupError("connection refused".into()))
        }
    }

    // ============================================
    // GTIN
    // ============================================

    #[test]
    fn test_gtin_grade_accepted() {
        assert!(check_gtin_grade("3256540123456-A").is_pass());
        assert!(check_gtin_grade("3256540123456-B").is_pass());
        assert!(check_gtin_grade("3256540123456 (b)").is_pass());
        assert!(check_gtin_grade("3256540123456_A").is_pass());
        assert!(check_gtin_grade("3256540123456A").is_pass());
    }

    #[test]
    fn test_gtin_grade_with_words_and_punctuation() {
        assert_eq!(parse_gtin_grade("3256540123456 grade A"), GtinGrade::Accepted('A'));
        assert_eq!(parse_gtin_grade("3256540123456 Grade: b"), GtinGrade::Accepted('B'));
        assert_eq!(parse_gtin_grade("3256540123456-A."), GtinGrade::Accepted('A'));
        assert_eq!(parse_gtin_grade("3256540123456 [B] "), GtinGrade::Accepted('B'));
        assert_eq!(parse_gtin_grade("3256540123456 grade D."), GtinGrade::Rejected('D'));
        // a trailing word is not a grade
        assert_eq!(parse_gtin_grade("3256540123456 grade"), GtinGrade::Unparseable);
    }

    #[test]
    fn test_gtin_grade_rejected() {
        let outcome = check_gtin_grade("3256540123456-C");
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues.len(), 1);
        let issue = &outcome.issues[0];
        assert_eq!(issue.field, "barcode.gtin");
        assert_eq!(issue.severity, Severity::Blocking);
        assert_eq!(issue.expected_value.as_deref(), Some("A or B"));
        assert_eq!(issue.observed_value.as_deref(), Some("C"));
    }

    #[test]
    fn test_gtin_grade_unparseable() {
        for gtin in ["3256540123456", "", "3256540123456-F", "grade A"] {
            let outcome = check_gtin_grade(gtin);
            assert_eq!(outcome.result, InspectionResult::Fail, "{}", gtin);
            assert!(outcome.issues[0].message.contains("unparseable"), "{}", gtin);
        }
    }

    // ============================================
    // EAN
    // ============================================

    #[test]
    fn test_ean_synonyms() {
        for value in ["EAN-13", "ean13", "Code 13", "GTIN-13", "UPC/EAN-13"] {
            assert!(check_ean_format(value, EanClass::Ean13, "f").is_pass(), "{}", value);
        }
        for value in ["EAN-128", "GS1-128", "Code 128", "UCC/EAN-128", "ucc.128"] {
            assert!(check_ean_format(value, EanClass::Ean128, "f").is_pass(), "{}", value);
        }
        for value in ["EAN-13 (GTIN)", "EAN13 barcode", "Barcode: EAN 13"] {
            assert!(check_ean_format(value, EanClass::Ean13, "f").is_pass(), "{}", value);
        }
        for value in ["GS1-128 (SSCC)", "EAN128 label"] {
            assert!(check_ean_format(value, EanClass::Ean128, "f").is_pass(), "{}", value);
        }
    }

    #[test]
    fn test_ean_128_never_counts_as_13() {
        for value in ["EAN128", "EAN-128 label", "EAN 130"] {
            assert!(!check_ean_format(value, EanClass::Ean13, "f").is_pass(), "{}", value);
        }
    }

    #[test]
    fn test_ean_wrong_class() {
        let outcome = check_ean_format("Code-39", EanClass::Ean13, "barcode.format_packaging");
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues[0].field, "barcode.format_packaging");
        assert_eq!(outcome.issues[0].observed_value.as_deref(), Some("Code-39"));
        assert_eq!(outcome.issues[0].expected_value.as_deref(), Some("EAN-13"));

        assert!(!check_ean_format("EAN-13", EanClass::Ean128, "f").is_pass());
        assert!(!check_ean_format("EAN-128", EanClass::Ean13, "f").is_pass());
        assert!(!check_ean_format("", EanClass::Ean13, "f").is_pass());
    }

    // ============================================
    // Silica gel / shipping marks
    // ============================================

    #[test]
    fn test_silica_gel() {
        let mut gel = SilicaGel {
            carton: SilicaGelLocation::Export,
            quantity: 1,
            white_transparent: true,
            name: SilicaGelType::DriClay,
        };
        assert!(check_silica_gel(Some(&gel)).is_pass());

        gel.white_transparent = false;
        let outcome = check_silica_gel(Some(&gel));
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.issues[0].message.contains("white or transparent"));

        gel.quantity = 0;
        assert_eq!(check_silica_gel(Some(&gel)).issues.len(), 2);

        let outcome = check_silica_gel(None);
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues[0].message, "Missing silica gel");
    }

    #[test]
    fn test_shipping_marks_warning_only() {
        let mut marks = ShippingMarks::default();
        marks.barcode_conformity_master_carton = "Gencode on four faces".into();
        assert!(check_shipping_marks(&marks).issues.is_empty());

        marks.barcode_conformity_master_carton = "Gencode on 2 faces".into();
        let outcome = check_shipping_marks(&marks);
        assert!(outcome.is_pass());
        assert_eq!(outcome.issues[0].severity, Severity::Warning);
    }

    // ============================================
    // Quantity
    // ============================================

    #[test]
    fn test_quantity_carton_mismatch_only() {
        let q = Quantity {
            order_quantity: 100,
            order_carton: 10,
            presented_quantity: 100,
            presented_carton: 9,
        };
        let outcome = check_quantity(&q, "command_informations.command_total.total_quantity");
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(
            outcome.issues[0].field,
            "command_informations.command_total.total_quantity.presented_carton"
        );
    }

    #[test]
    fn test_quantity_both_mismatch() {
        let q = Quantity {
            order_quantity: 100,
            order_carton: 10,
            presented_quantity: 90,
            presented_carton: 9,
        };
        assert_eq!(check_quantity(&q, "q").issues.len(), 2);
    }

    #[test]
    fn test_order_totals_warn() {
        let line = |n| Command {
            po: "PO".into(),
            lec: "LEC".into(),
            quantity: Quantity {
                order_quantity: n,
                order_carton: 1,
                presented_quantity: n,
                presented_carton: 1,
            },
        };
        let total = CommandTotal {
            po: None,
            lec: None,
            total_quantity: Quantity {
                order_quantity: 300,
                order_carton: 2,
                presented_quantity: 300,
                presented_carton: 2,
            },
        };
        assert!(check_order_totals(&[line(100), line(200)], &total).issues.is_empty());

        let outcome = check_order_totals(&[line(100), line(150)], &total);
        assert!(outcome.is_pass());
        assert_eq!(outcome.issues.len(), 2);
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Warning));
    }

    // ============================================
    // Inspection conclusion
    // ============================================

    #[test]
    fn test_criteria_one_issue_per_failure() {
        let mut conclusion = InspectionConclusion::all_pass();
        assert!(check_inspection_criteria(&conclusion).is_pass());

        conclusion.workmanship = InspectionResult::Fail;
        conclusion.measurement = InspectionResult::InWaiting;
        let outcome = check_inspection_criteria(&conclusion);
        assert_eq!(outcome.result, InspectionResult::Fail);
        let fields: Vec<_> = outcome.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["inspection_conclusion.workmanship", "inspection_conclusion.measurement"]
        );
    }

    // ============================================
    // AQL
    // ============================================

    #[test]
    fn test_aql_within_limits() {
        let record = sample_record();
        let table = AqlTable::standard();
        let outcome = check_aql(&record.aql.general_check, AqlBlock::General, 5000, &table);
        assert!(outcome.is_pass(), "{:?}", outcome.issues);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_aql_sample_too_small() {
        let mut block = sample_record().aql.general_check;
        block.sample_size = 125;
        let outcome = check_aql(&block, AqlBlock::General, 5000, &AqlTable::standard());
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues[0].field, "aql.general_check.sample_size");
        assert_eq!(outcome.issues[0].expected_value.as_deref(), Some(">= 200"));
    }

    #[test]
    fn test_aql_defects_exceed_limits() {
        let mut block = sample_record().aql.general_check;
        block.defect_description = vec![Defect {
            defect_description: "Broken handle".into(),
            critical: 1,
            major: 11,
            minor: 0,
        }];
        let outcome = check_aql(&block, AqlBlock::General, 5000, &AqlTable::standard());
        let fields: Vec<_> = outcome.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "aql.general_check.defect_description.critical",
                "aql.general_check.defect_description.major",
            ]
        );
        assert!(outcome.issues[1].message.contains("(11)"));
        assert!(outcome.issues[1].message.contains("(10)"));
    }

    #[test]
    fn test_aql_major_column_follows_category() {
        let mut block = sample_record().aql.general_check;
        block.maximum_allowed = None;
        block.defect_description = vec![Defect {
            defect_description: "Dent".into(),
            critical: 0,
            major: 8,
            minor: 0,
        }];
        // AQL 2.5 at letter L allows 10, AQL 1.5 allows 7
        assert!(check_aql(&block, AqlBlock::General, 5000, &AqlTable::standard()).is_pass());
        block.category.major = 1.5;
        assert!(!check_aql(&block, AqlBlock::General, 5000, &AqlTable::standard()).is_pass());
    }

    #[test]
    fn test_aql_lookup_not_found_is_indeterminate() {
        let block = sample_record().aql.general_check;
        let outcome = check_aql(&block, AqlBlock::General, 1, &AqlTable::standard());
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert!(outcome.issues[0].message.contains("indeterminate"));
    }

    #[test]
    fn test_aql_lookup_failure_is_indeterminate() {
        let block = sample_record().aql.general_check;
        let outcome = check_aql(&block, AqlBlock::General, 5000, &Unavailable);
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.issues[0].message.contains("connection refused"));
    }

    #[test]
    fn test_aql_missing_table_cell_is_indeterminate() {
        let csv = "Taille du Lot,Level,Échantillon à prélever,Major (AQL 2.5),Minor (AQL 4.0)\n\"3,201 – 10,000\",II,200,-,Ac=14/Re=15\n";
        let table = AqlTable::from_csv_str(csv).unwrap();
        let block = sample_record().aql.general_check;
        let outcome = check_aql(&block, AqlBlock::General, 5000, &table);
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "aql.general_check.maximum_allowed.major"
                && i.message.contains("indeterminate")));
    }

    #[test]
    fn test_aql_wrong_level_class_and_category() {
        let mut block = sample_record().aql.special_check.unwrap();
        block.level = AqlLevel::II;
        block.category.major = 6.5;
        let outcome = check_aql(&block, AqlBlock::Special, 5000, &AqlTable::standard());
        assert_eq!(outcome.result, InspectionResult::Fail);
        assert_eq!(outcome.issues[0].field, "aql.special_check.level");
        assert_eq!(outcome.issues[1].field, "aql.special_check.category.major");
    }

    #[test]
    fn test_aql_declared_limits_differ_warns() {
        let mut block = sample_record().aql.general_check;
        block.maximum_allowed = Some(DefectLimits {
            critical: 0,
            major: 7,
            minor: 14,
        });
        let outcome = check_aql(&block, AqlBlock::General, 5000, &AqlTable::standard());
        assert!(outcome.is_pass());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].severity, Severity::Warning);
        assert_eq!(outcome.issues[0].field, "aql.general_check.maximum_allowed.major");
    }
}
