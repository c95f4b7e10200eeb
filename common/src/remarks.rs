//! Remark override catalog
//!
//! Negotiated exceptions written as free text in the report remarks
//! ("weight difference", "EAN-128 on two non-adjacent faces", ...) replace
//! the mechanical outcome. The catalog is an ordered rule table: rules are
//! tried in order and the first match wins.

use crate::analysis::{Severity, StepId, ValidationIssue};
use crate::error::{Error, Result};
use crate::sheet::{cell, Sheet};
use crate::types::{InspectionResult, Notes};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkRule {
    pub name: String,
    /// Every keyword must occur
    #[serde(default)]
    pub all_of: Vec<String>,
    /// At least one keyword must occur (ignored when empty)
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Only match when the laboratory declared this result
    #[serde(default)]
    pub lab_result: Option<InspectionResult>,
    pub automated_result: InspectionResult,
    pub severity: Severity,
    /// Later step whose outcome is replaced; none means step 1 itself
    #[serde(default)]
    pub target: Option<StepId>,
    #[serde(default)]
    pub comment: String,
}

impl RemarkRule {
    fn validate(&self) -> Result<()> {
        if self.all_of.is_empty() && self.any_of.is_empty() {
            return Err(Error::Config(format!("remark rule {} has no keywords", self.name)));
        }
        if let Some(target) = self.target {
            if matches!(target, StepId::RemarksAnalysis | StepId::Decision) {
                return Err(Error::Config(format!(
                    "remark rule {} targets {}, only steps 2 to 5 can be overridden",
                    self.name, target
                )));
            }
        }
        Ok(())
    }

    /// `text` must already be normalized
    fn matches(&self, text: &str, lab_result: InspectionResult) -> bool {
        if self.lab_result.is_some_and(|expected| expected != lab_result) {
            return false;
        }

        let all = self.all_of.iter().all(|k| text.contains(&normalize(k)));
        let any = self.any_of.is_empty() || self.any_of.iter().any(|k| text.contains(&normalize(k)));
        (!self.all_of.is_empty() || !self.any_of.is_empty()) && all && any
    }

    fn keywords(&self) -> impl Iterator<Item = &String> {
        self.all_of.iter().chain(self.any_of.iter())
    }
}

/// A matched rule, located in the remarks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkOverride {
    pub rule: String,
    /// Remark field that triggered the rule (e.g. "notes.nc_remarks[0]")
    pub field: String,
    pub remark: String,
    pub automated_result: InspectionResult,
    pub severity: Severity,
    pub target: Option<StepId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl RemarkOverride {
    /// The step 1 issue recording this override
    pub fn to_issue(&self) -> ValidationIssue {
        let effect = match self.target {
            Some(target) => format!("{} set to {}", target, self.automated_result),
            None => format!("outcome set to {}", self.automated_result),
        };
        let mut message = format!("Remark matches override rule {}: {}", self.rule, effect);
        if !self.comment.is_empty() {
            message.push_str(&format!(" ({})", self.comment));
        }

        ValidationIssue::new(StepId::RemarksAnalysis, self.severity, &self.field, message)
            .observed(&self.remark)
            .expected(self.automated_result)
    }
}

/// Ordered list of remark rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkCatalog {
    rules: Vec<RemarkRule>,
}

impl RemarkCatalog {
    pub fn new(rules: Vec<RemarkRule>) -> Result<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// The SIPLEC exceptions known to the engine
    pub fn builtin() -> Self {
        use crate::types::InspectionResult::{Fail, InWaiting, Pass};

        let rule = |name: &str,
                    all_of: &[&str],
                    any_of: &[&str],
                    lab_result: Option<InspectionResult>,
                    automated_result: InspectionResult,
                    severity: Severity,
                    target: Option<StepId>,
                    comment: &str| RemarkRule {
            name: name.to_string(),
            all_of: all_of.iter().map(|s| s.to_string()).collect(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            lab_result,
            automated_result,
            severity,
            target,
            comment: comment.to_string(),
        };

        let rules = vec![
            rule(
                "ean128_non_adjacent_faces",
                &["non adjacent"],
                &["ean 128", "ean128", "gs1 128", "gs1128", "code 128", "ucc 128"],
                None,
                Fail,
                Severity::Blocking,
                None,
                "EAN-128 must be printed on two adjacent faces",
            ),
            rule(
                "unclear_marking",
                &[],
                &[
                    "unclear marking",
                    "marking unclear",
                    "marking is unclear",
                    "marking not clear",
                    "marking is not clear",
                    "illegible marking",
                    "marking illegible",
                    "marquage illisible",
                    "marquage peu lisible",
                    "marquage pas clair",
                ],
                Some(InWaiting),
                Fail,
                Severity::Blocking,
                None,
                "",
            ),
            rule(
                "weight_difference",
                &[],
                &[
                    "weight difference",
                    "difference of weight",
                    "difference in weight",
                    "weight discrepancy",
                    "différence de poids",
                    "écart de poids",
                    "ecart de poids",
                ],
                Some(Fail),
                Pass,
                Severity::Info,
                Some(StepId::Quantity),
                "weight difference accepted",
            ),
            // Lab decision varies for this one while SIPLEC always refuses.
            // Keywords still to be confirmed against real report text.
            rule(
                "missing_gencode",
                &["gencode"],
                &["missing", "absent", "not found", "not present", "manquant"],
                None,
                Fail,
                Severity::Blocking,
                None,
                "gencode missing on carton",
            ),
            rule(
                "pending_customer_approval",
                &[],
                &[
                    "awaiting customer",
                    "waiting for customer",
                    "pending customer",
                    "customer approval",
                    "customer confirmation",
                    "awaiting buyer",
                    "pending buyer",
                    "buyer approval",
                    "waiting for client",
                    "attente client",
                    "attente du client",
                ],
                None,
                InWaiting,
                Severity::Warning,
                None,
                "decision left to the customer",
            ),
        ];

        Self { rules }
    }

    /// JSON: either a bare array of rules or `{"rules": [...]}`
    ///
    /// The form is chosen from the first character, so a parse error
    /// describes the form that was actually written.
    pub fn from_json(json: &str) -> Result<Self> {
        let rules = if json.trim_start().starts_with('[') {
            serde_json::from_str::<Vec<RemarkRule>>(json)?
        } else {
            serde_json::from_str::<RemarkCatalog>(json)?.rules
        };
        Self::new(rules)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build from the non-conformity rule table
    ///
    /// Columns: family of non compliance, product category, cause of
    /// non-compliance, laboratory decision, SIPLEC decision, comments. The
    /// cause text is the phrase to look for. Rows whose SIPLEC decision is
    /// not PASS / FAIL / IN WAITING are skipped.
    pub fn from_nc_rules(sheet: &Sheet) -> Result<Self> {
        let family_col = sheet.column(&["family", "famille"]);
        let category_col = sheet.column(&["product category", "categorie"]);
        let cause_col = sheet.require_column("cause", &["cause"])?;
        let lab_col = sheet.column(&["labaroatory", "laboratory", "laboratoire"]);
        let siplec_col = sheet.require_column("siplec decision", &["siplec"])?;
        let comment_col = sheet.column(&["comment", "commentaire"]);

        let optional = |row: &[String], col: Option<usize>| {
            col.map(|c| cell(row, c).to_string()).unwrap_or_default()
        };

        let mut rules = Vec::new();
        for (line, row) in sheet.rows().iter().enumerate() {
            let row = row.as_slice();
            let cause = cell(row, cause_col);
            if cause.is_empty() {
                continue;
            }
            let Some(automated_result) = InspectionResult::parse_loose(cell(row, siplec_col)) else {
                tracing::warn!(
                    line = line + 2,
                    value = cell(row, siplec_col),
                    "skipping NC rule: unknown SIPLEC decision"
                );
                continue;
            };

            let family = optional(row, family_col);
            let category = optional(row, category_col);
            let name = [family.as_str(), category.as_str(), cause]
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| normalize(s).replace(' ', "_"))
                .collect::<Vec<_>>()
                .join("/");

            rules.push(RemarkRule {
                name,
                all_of: vec![cause.to_string()],
                any_of: Vec::new(),
                // "Not always FAIL" and blanks do not restrict the match
                lab_result: lab_col.and_then(|c| InspectionResult::parse_loose(cell(row, c))),
                automated_result,
                severity: severity_for(automated_result),
                target: None,
                comment: optional(row, comment_col),
            });
        }

        tracing::debug!(rules = rules.len(), "loaded NC rules");
        Self::new(rules)
    }

    pub fn from_nc_rules_path(path: &Path) -> Result<Self> {
        let sheet = Sheet::from_path(path)?;
        Self::from_nc_rules(&sheet)
    }

    /// Append another catalog; rules of `self` are tried first
    pub fn merge(mut self, other: RemarkCatalog) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn rules(&self) -> &[RemarkRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching the remarks, if any
    pub fn resolve(&self, notes: &Notes, lab_result: InspectionResult) -> Option<RemarkOverride> {
        let entries: Vec<(String, String)> = notes
            .entries()
            .into_iter()
            .map(|(field, text)| (field, normalize(text)))
            .collect();
        if entries.is_empty() {
            return None;
        }

        let text = entries
            .iter()
            .map(|(_, t)| t.as_str())
            .collect::<Vec<_>>()
            .join(" | ");

        let rule = self.rules.iter().find(|r| r.matches(&text, lab_result))?;

        // Point at the first remark carrying one of the rule's keywords
        let raw = notes.entries();
        let position = entries
            .iter()
            .position(|(_, t)| rule.keywords().any(|k| t.contains(&normalize(k))))
            .unwrap_or(0);
        let (field, remark) = raw
            .get(position)
            .map(|(f, r)| (f.clone(), r.to_string()))
            .unwrap_or_else(|| ("notes".to_string(), text.clone()));

        tracing::debug!(rule = %rule.name, field = %field, "remark override matched");

        Some(RemarkOverride {
            rule: rule.name.clone(),
            field,
            remark,
            automated_result: rule.automated_result,
            severity: rule.severity,
            target: rule.target,
            comment: rule.comment.clone(),
        })
    }
}

fn severity_for(result: InspectionResult) -> Severity {
    match result {
        InspectionResult::Fail => Severity::Blocking,
        InspectionResult::InWaiting => Severity::Warning,
        InspectionResult::Pass => Severity::Info,
    }
}

/// Lowercase, `-`/`_` as spaces, whitespace collapsed
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
