//! Evaluation output: issues, step results and the per-record analysis

use crate::types::InspectionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six validation steps, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    RemarksAnalysis,
    GeneralInfo,
    Quantity,
    InspectionConclusion,
    Aql,
    Decision,
}

impl StepId {
    pub const ALL: [StepId; 6] = [
        StepId::RemarksAnalysis,
        StepId::GeneralInfo,
        StepId::Quantity,
        StepId::InspectionConclusion,
        StepId::Aql,
        StepId::Decision,
    ];

    pub fn number(self) -> u8 {
        match self {
            StepId::RemarksAnalysis => 1,
            StepId::GeneralInfo => 2,
            StepId::Quantity => 3,
            StepId::InspectionConclusion => 4,
            StepId::Aql => 5,
            StepId::Decision => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepId::RemarksAnalysis => "Remarks analysis",
            StepId::GeneralInfo => "General information",
            StepId::Quantity => "Quantity",
            StepId::InspectionConclusion => "Inspection conclusion",
            StepId::Aql => "AQL",
            StepId::Decision => "Decision",
        }
    }

    pub fn from_number(n: u8) -> Option<StepId> {
        StepId::ALL.into_iter().find(|s| s.number() == n)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Warning,
    Info,
}

/// One discrepancy found while evaluating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub step: StepId,
    pub severity: Severity,
    /// Dotted path into the record (e.g. "barcode.gtin")
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        step: StepId,
        severity: Severity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step,
            severity,
            field: field.into(),
            message: message.into(),
            observed_value: None,
            expected_value: None,
        }
    }

    pub fn blocking(step: StepId, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, Severity::Blocking, field, message)
    }

    pub fn warning(step: StepId, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, Severity::Warning, field, message)
    }

    pub fn observed(mut self, value: impl ToString) -> Self {
        self.observed_value = Some(value.to_string());
        self
    }

    pub fn expected(mut self, value: impl ToString) -> Self {
        self.expected_value = Some(value.to_string());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: StepId,
    pub step_name: String,
    pub result: InspectionResult,
    pub issues: Vec<ValidationIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl StepResult {
    pub fn new(step: StepId, result: InspectionResult, issues: Vec<ValidationIssue>) -> Self {
        Self {
            step,
            step_name: step.label().to_string(),
            result,
            issues,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// The six step results of one record plus the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub step_1_remarks_analysis: StepResult,
    pub step_2_general_info: StepResult,
    pub step_3_quantity: StepResult,
    pub step_4_inspection_conclusion: StepResult,
    pub step_5_aql: StepResult,
    pub step_6_decision: StepResult,
    /// Every issue of steps 1–6, in step order
    pub all_issues: Vec<ValidationIssue>,
    pub automated_result: InspectionResult,
}

impl AnalysisResult {
    /// Assemble from the six steps; `all_issues` is derived here
    pub fn new(steps: [StepResult; 6]) -> Self {
        let [s1, s2, s3, s4, s5, s6] = steps;
        let all_issues = [&s1, &s2, &s3, &s4, &s5, &s6]
            .iter()
            .flat_map(|s| s.issues.iter().cloned())
            .collect();
        let automated_result = s6.result;

        Self {
            step_1_remarks_analysis: s1,
            step_2_general_info: s2,
            step_3_quantity: s3,
            step_4_inspection_conclusion: s4,
            step_5_aql: s5,
            step_6_decision: s6,
            all_issues,
            automated_result,
        }
    }

    pub fn steps(&self) -> [&StepResult; 6] {
        [
            &self.step_1_remarks_analysis,
            &self.step_2_general_info,
            &self.step_3_quantity,
            &self.step_4_inspection_conclusion,
            &self.step_5_aql,
            &self.step_6_decision,
        ]
    }

    pub fn step(&self, id: StepId) -> &StepResult {
        self.steps()[usize::from(id.number() - 1)]
    }

    pub fn blocking_issues(&self) -> Vec<ValidationIssue> {
        self.all_issues
            .iter()
            .filter(|i| i.is_blocking())
            .cloned()
            .collect()
    }
}
