//! Verdict classifier
//!
//! Compares the laboratory's declared result with the automated one.

use crate::analysis::{AnalysisResult, ValidationIssue};
use crate::types::InspectionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictType {
    #[serde(alias = "vrai_pass")]
    TruePass,
    #[serde(alias = "vrai_fail")]
    TrueFail,
    #[serde(alias = "faux_pass")]
    FalsePass,
    #[serde(alias = "faux_fail")]
    FalseFail,
    #[serde(alias = "in_waiting_resolved")]
    PendingResolved,
}

impl VerdictType {
    pub const ALL: [VerdictType; 5] = [
        VerdictType::TruePass,
        VerdictType::TrueFail,
        VerdictType::FalsePass,
        VerdictType::FalseFail,
        VerdictType::PendingResolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VerdictType::TruePass => "TRUE_PASS",
            VerdictType::TrueFail => "TRUE_FAIL",
            VerdictType::FalsePass => "FALSE_PASS",
            VerdictType::FalseFail => "FALSE_FAIL",
            VerdictType::PendingResolved => "PENDING_RESOLVED",
        }
    }
}

impl fmt::Display for VerdictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub lab_result: InspectionResult,
    pub automated_result: InspectionResult,
    pub verdict_type: VerdictType,
    pub requires_human_review: bool,
    pub message: String,
    pub blocking_issues: Vec<ValidationIssue>,
}

impl Verdict {
    /// Classify against an analysis; blocking issues are taken from it
    pub fn from_analysis(lab_result: InspectionResult, analysis: &AnalysisResult) -> Self {
        classify(lab_result, analysis.automated_result, analysis.blocking_issues())
    }
}

/// The classification table
///
/// A lab PASS or FAIL against an automated IN_WAITING counts as a
/// disagreement (FALSE_PASS / FALSE_FAIL).
pub fn verdict_type(lab: InspectionResult, automated: InspectionResult) -> (VerdictType, bool) {
    use crate::types::InspectionResult::{Fail, InWaiting, Pass};

    match (lab, automated) {
        (Pass, Pass) => (VerdictType::TruePass, false),
        (Fail, Fail) => (VerdictType::TrueFail, false),
        (Pass, Fail | InWaiting) => (VerdictType::FalsePass, true),
        (Fail, Pass | InWaiting) => (VerdictType::FalseFail, true),
        (InWaiting, automated) => (VerdictType::PendingResolved, automated != Pass),
    }
}

pub fn classify(
    lab_result: InspectionResult,
    automated_result: InspectionResult,
    blocking_issues: Vec<ValidationIssue>,
) -> Verdict {
    let (verdict_type, requires_human_review) = verdict_type(lab_result, automated_result);
    let message = message(
        verdict_type,
        lab_result,
        automated_result,
        requires_human_review,
        &blocking_issues,
    );

    Verdict {
        lab_result,
        automated_result,
        verdict_type,
        requires_human_review,
        message,
        blocking_issues,
    }
}

fn message(
    verdict_type: VerdictType,
    lab: InspectionResult,
    automated: InspectionResult,
    review: bool,
    blocking: &[ValidationIssue],
) -> String {
    let head = match verdict_type {
        VerdictType::TruePass => "Laboratory and automated validation agree: PASS".to_string(),
        VerdictType::TrueFail => format!(
            "Laboratory and automated validation agree: FAIL ({} blocking issue(s))",
            blocking.len()
        ),
        VerdictType::FalsePass => format!(
            "Laboratory declared PASS but automated validation is {}",
            automated
        ),
        VerdictType::FalseFail => format!(
            "Laboratory declared FAIL but automated validation is {}",
            automated
        ),
        VerdictType::PendingResolved => format!(
            "Laboratory left the report {}; automated validation resolves it to {}",
            lab, automated
        ),
    };

    if !review {
        return head;
    }

    let mut fields: Vec<&str> = Vec::new();
    for issue in blocking {
        if !fields.contains(&issue.field.as_str()) {
            fields.push(&issue.field);
        }
    }

    if fields.is_empty() {
        format!("{}. 0 blocking issues. Human review required.", head)
    } else {
        format!(
            "{}. {} blocking issue(s) on {}. Human review required.",
            head,
            blocking.len(),
            fields.join(", ")
        )
    }
}
