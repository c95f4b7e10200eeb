//! Evaluation entry point

use crate::analysis::AnalysisResult;
use crate::aql::AqlLookup;
use crate::decision;
use crate::error::Result;
use crate::remarks::RemarkCatalog;
use crate::steps;
use crate::types::FriExtraction;
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// Everything produced for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub analysis: AnalysisResult,
    pub verdict: Verdict,
}

/// Run the six steps and classify the outcome against the lab's result
///
/// # Errors
/// `Error::Contract` when the record has no usable quantity records. No
/// partial result is returned in that case.
pub fn evaluate(
    record: &FriExtraction,
    lookup: &dyn AqlLookup,
    catalog: &RemarkCatalog,
) -> Result<Evaluation> {
    let lines = record.command_informations.order_lines()?;
    let lot_size = lines.total().total_quantity.presented_quantity;

    let (step1, remark) = steps::remarks_analysis(record, catalog);
    let step2 = steps::general_info(record);
    let step3 = steps::quantity(&lines);
    let step4 = steps::inspection_conclusion(record);
    let step5 = steps::aql(record, lot_size, lookup);

    for step in [&step1, &step2, &step3, &step4, &step5] {
        tracing::debug!(
            report = %record.report.id_report,
            step = step.step.number(),
            result = %step.result,
            issues = step.issues.len(),
            "step evaluated"
        );
    }

    let step6 = decision::aggregate([&step1, &step2, &step3, &step4, &step5], remark.as_ref());
    let analysis = AnalysisResult::new([step1, step2, step3, step4, step5, step6]);
    let verdict = Verdict::from_analysis(record.lab_result(), &analysis);

    tracing::info!(
        report = %record.report.id_report,
        lab = %verdict.lab_result,
        automated = %verdict.automated_result,
        verdict = %verdict.verdict_type,
        "record evaluated"
    );

    Ok(Evaluation { analysis, verdict })
}
