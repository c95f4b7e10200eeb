//! Step evaluator
//!
//! Steps 1 to 5 of the validation. Every step always runs and keeps all of
//! its issues; step 6 is produced by the decision aggregator.

use crate::analysis::{StepId, StepResult};
use crate::aql::AqlLookup;
use crate::remarks::{RemarkCatalog, RemarkOverride};
use crate::rules::{self, AqlBlock, EanClass, RuleOutcome};
use crate::types::{FriExtraction, InspectionResult, OrderLines};

fn finish(step: StepId, outcome: RuleOutcome, passed: &str) -> StepResult {
    let rationale = describe(&outcome, passed);
    StepResult::new(step, outcome.result, outcome.issues).with_rationale(rationale)
}

fn describe(outcome: &RuleOutcome, passed: &str) -> String {
    let blocking: Vec<&str> = outcome
        .issues
        .iter()
        .filter(|i| i.is_blocking())
        .map(|i| i.field.as_str())
        .collect();

    if blocking.is_empty() {
        let notes = outcome.issues.len();
        if notes == 0 {
            passed.to_string()
        } else {
            format!("{} ({} non-blocking note(s))", passed, notes)
        }
    } else {
        format!("{} blocking issue(s): {}", blocking.len(), blocking.join(", "))
    }
}

/// Step 1: match the remarks against the override catalog
///
/// An override without target is this step's own outcome. An override with
/// a target leaves this step PASS and is applied by the aggregator.
pub fn remarks_analysis(
    record: &FriExtraction,
    catalog: &RemarkCatalog,
) -> (StepResult, Option<RemarkOverride>) {
    let step = StepId::RemarksAnalysis;

    if record.notes.is_empty() {
        let result = StepResult::new(step, InspectionResult::Pass, Vec::new())
            .with_rationale("No remarks on the report");
        return (result, None);
    }

    let Some(found) = catalog.resolve(&record.notes, record.lab_result()) else {
        let result = StepResult::new(step, InspectionResult::Pass, Vec::new())
            .with_rationale("No remark matches an override rule");
        return (result, None);
    };

    let (outcome, rationale) = match found.target {
        None => (
            found.automated_result,
            format!("Rule {} sets the outcome to {}", found.rule, found.automated_result),
        ),
        Some(target) => (
            InspectionResult::Pass,
            format!(
                "Rule {} replaces the outcome of {} with {}",
                found.rule, target, found.automated_result
            ),
        ),
    };

    let result = StepResult::new(step, outcome, vec![found.to_issue()]).with_rationale(rationale);
    (result, Some(found))
}

/// Step 2: GTIN grade, barcode formats, desiccant; shipping marks warn only
pub fn general_info(record: &FriExtraction) -> StepResult {
    let barcode = &record.barcode;

    let outcome = rules::check_gtin_grade(&barcode.gtin)
        .and(rules::check_ean_format(
            &barcode.format_packaging,
            EanClass::Ean13,
            "barcode.format_packaging",
        ))
        .and(rules::check_ean_format(
            &barcode.format_export_carton,
            EanClass::Ean128,
            "barcode.format_export_carton",
        ))
        .and(rules::check_silica_gel(record.silica_gel.as_ref()))
        .and(rules::check_shipping_marks(&record.shipping_marks));

    finish(StepId::GeneralInfo, outcome, "Barcode, formats and silica gel conform")
}

/// Step 3: ordered vs presented, per order when there are several
pub fn quantity(lines: &OrderLines<'_>) -> StepResult {
    let outcome = match lines {
        OrderLines::Single(total) => rules::check_quantity(
            &total.total_quantity,
            "command_informations.command_total.total_quantity",
        ),
        OrderLines::Multiple { commands, total } => commands
            .iter()
            .enumerate()
            .map(|(i, command)| {
                rules::check_quantity(
                    &command.quantity,
                    &format!("command_informations.commands[{}].quantity", i),
                )
            })
            .fold(RuleOutcome::pass(), RuleOutcome::and)
            .and(rules::check_order_totals(commands, total)),
    };

    finish(StepId::Quantity, outcome, "Presented quantities match the order")
}

/// Step 4: the seven laboratory criteria
pub fn inspection_conclusion(record: &FriExtraction) -> StepResult {
    let outcome = rules::check_inspection_criteria(&record.inspection_conclusion);
    finish(StepId::InspectionConclusion, outcome, "All seven criteria are PASS")
}

/// Step 5: AQL adequacy of the general block, and of the special block when present
pub fn aql(record: &FriExtraction, lot_size: u32, lookup: &dyn AqlLookup) -> StepResult {
    let mut outcome = rules::check_aql(&record.aql.general_check, AqlBlock::General, lot_size, lookup);

    if let Some(special) = &record.aql.special_check {
        outcome = outcome.and(rules::check_aql(special, AqlBlock::Special, lot_size, lookup));
    }

    finish(StepId::Aql, outcome, "Sampling and defects within AQL limits")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Severity;
    use crate::aql::AqlTable;
    use crate::testing::sample_record;
    use crate::types::{Command, Quantity};

    #[test]
    fn test_sample_record_steps_pass() {
        let record = sample_record();
        let lines = record.command_informations.order_lines().unwrap();
        let table = AqlTable::standard();

        let (step1, found) = remarks_analysis(&record, &RemarkCatalog::builtin());
        assert!(found.is_none());
        for step in [
            step1,
            general_info(&record),
            quantity(&lines),
            inspection_conclusion(&record),
            aql(&record, 5000, &table),
        ] {
            assert_eq!(step.result, InspectionResult::Pass, "{:?}", step);
            assert!(step.issues.is_empty(), "{:?}", step.issues);
        }
    }

    #[test]
    fn test_general_info_collects_all_issues() {
        let mut record = sample_record();
        record.barcode.gtin = "3256540123456-D".into();
        record.barcode.format_packaging = "Code-39".into();
        record.silica_gel = None;
        record.shipping_marks.barcode_conformity_master_carton = "2 faces".into();

        let step = general_info(&record);
        assert_eq!(step.result, InspectionResult::Fail);
        assert_eq!(step.issues.len(), 4);
        assert_eq!(step.issues[3].severity, Severity::Warning);
        assert!(step.rationale.unwrap().starts_with("3 blocking issue(s)"));
    }

    #[test]
    fn test_shipping_mark_warning_keeps_pass() {
        let mut record = sample_record();
        record.shipping_marks.barcode_conformity_master_carton = String::new();
        let step = general_info(&record);
        assert_eq!(step.result, InspectionResult::Pass);
        assert_eq!(step.issues.len(), 1);
    }

    #[test]
    fn test_quantity_multiple_orders_each_checked() {
        let mut record = sample_record();
        let line = |po: &str, ordered, presented| Command {
            po: po.into(),
            lec: "LEC".into(),
            quantity: Quantity {
                order_quantity: ordered,
                order_carton: 10,
                presented_quantity: presented,
                presented_carton: 10,
            },
        };
        record.command_informations.commands = vec![line("A", 3000, 3000), line("B", 2000, 2000)];
        if let Some(total) = record.command_informations.command_total.as_mut() {
            total.total_quantity.order_carton = 20;
            total.total_quantity.presented_carton = 20;
        }

        let lines = record.command_informations.order_lines().unwrap();
        assert!(matches!(lines, OrderLines::Multiple { .. }));
        assert!(quantity(&lines).issues.is_empty());

        record.command_informations.commands[1] = line("B", 2000, 1900);
        let lines = record.command_informations.order_lines().unwrap();
        let step = quantity(&lines);
        assert_eq!(step.result, InspectionResult::Fail);
        assert_eq!(
            step.issues[0].field,
            "command_informations.commands[1].quantity.presented_quantity"
        );
        // the summed presented quantity no longer matches the total either
        assert_eq!(step.issues[1].severity, Severity::Warning);
    }

    #[test]
    fn test_remarks_override_without_target() {
        let mut record = sample_record();
        record.notes.nc_remarks = vec!["EAN 128 on two non adjacent faces".into()];
        let (step, found) = remarks_analysis(&record, &RemarkCatalog::builtin());
        assert_eq!(step.result, InspectionResult::Fail);
        assert_eq!(step.issues.len(), 1);
        assert_eq!(found.unwrap().target, None);
    }

    #[test]
    fn test_remarks_override_with_target_keeps_step_pass() {
        let mut record = sample_record();
        record.overall_inspection_conclusion = InspectionResult::Fail;
        record.notes.notes = vec!["Weight difference noted".into()];
        let (step, found) = remarks_analysis(&record, &RemarkCatalog::builtin());
        assert_eq!(step.result, InspectionResult::Pass);
        assert_eq!(step.issues[0].severity, Severity::Info);
        assert_eq!(found.unwrap().target, Some(StepId::Quantity));
    }

    #[test]
    fn test_aql_special_block_checked() {
        let mut record = sample_record();
        if let Some(special) = record.aql.special_check.as_mut() {
            special.sample_size = 8;
        }
        let step = aql(&record, 5000, &AqlTable::standard());
        assert_eq!(step.result, InspectionResult::Fail);
        assert_eq!(step.issues[0].field, "aql.special_check.sample_size");

        record.aql.special_check = None;
        assert_eq!(aql(&record, 5000, &AqlTable::standard()).result, InspectionResult::Pass);
    }
}
