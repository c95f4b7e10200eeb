//! Decision aggregator (step 6)

use crate::analysis::{StepId, StepResult};
use crate::remarks::RemarkOverride;
use crate::types::InspectionResult;

/// Outcomes of steps 1 to 5 once a targeted remark override is applied
pub fn effective_outcomes(
    steps: [&StepResult; 5],
    remark: Option<&RemarkOverride>,
) -> [(StepId, InspectionResult); 5] {
    steps.map(|step| {
        let result = match remark {
            Some(found) if found.target == Some(step.step) => found.automated_result,
            _ => step.result,
        };
        (step.step, result)
    })
}

/// Combine steps 1 to 5 into the automated result: FAIL > IN_WAITING > PASS
pub fn aggregate(steps: [&StepResult; 5], remark: Option<&RemarkOverride>) -> StepResult {
    let outcomes = effective_outcomes(steps, remark);
    let result = InspectionResult::all(outcomes.iter().map(|(_, r)| *r));

    let mut rationale = if result.is_pass() {
        "Steps 1 to 5 all PASS".to_string()
    } else {
        let deciding: Vec<String> = outcomes
            .iter()
            .filter(|(_, r)| *r == result)
            .map(|(id, _)| format!("step {}", id.number()))
            .collect();
        format!("{} decided by {}", result, deciding.join(", "))
    };

    if let Some(found) = remark {
        if let Some(target) = found.target {
            let replaced = steps
                .iter()
                .find(|s| s.step == target)
                .map(|s| s.result);
            if let Some(mechanical) = replaced {
                rationale.push_str(&format!(
                    "; remark rule {} replaced step {} {} with {}",
                    found.rule,
                    target.number(),
                    mechanical,
                    found.automated_result
                ));
            }
        }
    }

    StepResult::new(StepId::Decision, result, Vec::new()).with_rationale(rationale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Severity;
    use crate::types::InspectionResult::{Fail, InWaiting, Pass};

    fn steps(results: [InspectionResult; 5]) -> Vec<StepResult> {
        StepId::ALL
            .iter()
            .zip(results)
            .map(|(id, r)| StepResult::new(*id, r, Vec::new()))
            .collect()
    }

    fn refs(steps: &[StepResult]) -> [&StepResult; 5] {
        [&steps[0], &steps[1], &steps[2], &steps[3], &steps[4]]
    }

    fn weight_override() -> RemarkOverride {
        RemarkOverride {
            rule: "weight_difference".into(),
            field: "notes.nc_remarks[0]".into(),
            remark: "Weight difference".into(),
            automated_result: Pass,
            severity: Severity::Info,
            target: Some(StepId::Quantity),
            comment: String::new(),
        }
    }

    #[test]
    fn test_all_pass() {
        let s = steps([Pass; 5]);
        let decision = aggregate(refs(&s), None);
        assert_eq!(decision.step, StepId::Decision);
        assert_eq!(decision.result, Pass);
        assert!(decision.issues.is_empty());
    }

    #[test]
    fn test_precedence() {
        let s = steps([Pass, InWaiting, Pass, Pass, Pass]);
        assert_eq!(aggregate(refs(&s), None).result, InWaiting);

        let s = steps([InWaiting, Pass, Fail, Pass, Pass]);
        let decision = aggregate(refs(&s), None);
        assert_eq!(decision.result, Fail);
        assert_eq!(decision.rationale.as_deref(), Some("FAIL decided by step 3"));
    }

    #[test]
    fn test_every_combination_is_the_dominant_outcome() {
        let values = [Pass, Fail, InWaiting];
        for a in values {
            for b in values {
                for c in values {
                    let s = steps([a, b, c, Pass, Pass]);
                    let expected = if [a, b, c].contains(&Fail) {
                        Fail
                    } else if [a, b, c].contains(&InWaiting) {
                        InWaiting
                    } else {
                        Pass
                    };
                    assert_eq!(aggregate(refs(&s), None).result, expected);
                }
            }
        }
    }

    #[test]
    fn test_targeted_override_replaces_step() {
        let s = steps([Pass, Pass, Fail, Pass, Pass]);
        let found = weight_override();
        let decision = aggregate(refs(&s), Some(&found));
        assert_eq!(decision.result, Pass);
        assert!(decision
            .rationale
            .unwrap()
            .contains("replaced step 3 FAIL with PASS"));
    }

    #[test]
    fn test_targeted_override_does_not_mask_other_steps() {
        let s = steps([Pass, Fail, Fail, Pass, Pass]);
        let found = weight_override();
        let outcomes = effective_outcomes(refs(&s), Some(&found));
        assert_eq!(outcomes[2], (StepId::Quantity, Pass));
        assert_eq!(aggregate(refs(&s), Some(&found)).result, Fail);
    }
}
