//! Evaluation of many records at once

use crate::error::{FriError, Result};
use crate::scanner::InputFile;
use chrono::Local;
use fri_verdict_common::{
    evaluate, parse_extractions, AqlLookup, Evaluation, FriExtraction, RemarkCatalog, VerdictType,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One record read from an input file
#[derive(Debug, Clone)]
pub struct RecordInput {
    pub source: PathBuf,
    /// Position in the file (files may hold an array of records)
    pub index: usize,
    pub record: FriExtraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub source: PathBuf,
    pub index: usize,
    pub id_report: String,
    /// SHA-256 of the record as evaluated
    pub fingerprint: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// An input that produced no evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    pub source: PathBuf,
    pub index: Option<usize>,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Worker threads, 0 = rayon's global pool
    pub jobs: usize,
    pub progress: bool,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: String,
    pub total: usize,
    pub evaluated: usize,
    pub failed: usize,
    /// Keyed by TRUE_PASS, FALSE_FAIL, ...
    pub verdicts: BTreeMap<String, usize>,
    pub requires_human_review: Vec<String>,
    pub failures: Vec<RecordFailure>,
}

/// Read every record of the input files
///
/// Unreadable files are reported as failures and skipped.
pub fn load_inputs(files: &[InputFile]) -> (Vec<RecordInput>, Vec<RecordFailure>) {
    let mut inputs = Vec::new();
    let mut failures = Vec::new();

    for file in files {
        let records = std::fs::read_to_string(&file.path)
            .map_err(fri_verdict_common::Error::from)
            .and_then(|content| parse_extractions(&content));

        match records {
            Ok(records) => {
                inputs.extend(records.into_iter().enumerate().map(|(index, record)| RecordInput {
                    source: file.path.clone(),
                    index,
                    record,
                }));
            }
            Err(e) => {
                tracing::warn!(file = %file.path.display(), error = %e, "skipping input");
                failures.push(RecordFailure {
                    source: file.path.clone(),
                    index: None,
                    error: e.to_string(),
                });
            }
        }
    }

    (inputs, failures)
}

/// Evaluate every record, in parallel, keeping the input order
pub fn evaluate_all(
    inputs: &[RecordInput],
    lookup: &dyn AqlLookup,
    catalog: &RemarkCatalog,
    options: BatchOptions,
) -> Result<BatchReport> {
    let progress = progress_bar(inputs.len() as u64, options.progress);

    let run = || -> Vec<std::result::Result<RecordOutcome, RecordFailure>> {
        inputs
            .par_iter()
            .map(|input| {
                let result = evaluate_one(input, lookup, catalog);
                progress.inc(1);
                result
            })
            .collect()
    };

    let results = if options.jobs > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| FriError::Config(format!("thread pool: {}", e)))?;
        pool.install(run)
    } else {
        run()
    };
    progress.finish_and_clear();

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(failure) => report.failures.push(failure),
        }
    }
    Ok(report)
}

fn evaluate_one(
    input: &RecordInput,
    lookup: &dyn AqlLookup,
    catalog: &RemarkCatalog,
) -> std::result::Result<RecordOutcome, RecordFailure> {
    let failure = |error: String| RecordFailure {
        source: input.source.clone(),
        index: Some(input.index),
        error,
    };

    let fingerprint = fingerprint(&input.record).map_err(|e| failure(e.to_string()))?;
    let evaluation = evaluate(&input.record, lookup, catalog).map_err(|e| {
        tracing::warn!(
            file = %input.source.display(),
            index = input.index,
            error = %e,
            "record not evaluated"
        );
        failure(e.to_string())
    })?;

    Ok(RecordOutcome {
        source: input.source.clone(),
        index: input.index,
        id_report: input.record.report.id_report.clone(),
        fingerprint,
        evaluation,
    })
}

/// Hex SHA-256 of the record's JSON form
pub fn fingerprint(record: &FriExtraction) -> Result<String> {
    let bytes = serde_json::to_vec(record)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} records ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

impl BatchReport {
    pub fn summary(&self, load_failures: &[RecordFailure]) -> Summary {
        let mut verdicts: BTreeMap<String, usize> = VerdictType::ALL
            .iter()
            .map(|v| (v.as_str().to_string(), 0))
            .collect();
        for outcome in &self.outcomes {
            *verdicts
                .entry(outcome.evaluation.verdict.verdict_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let requires_human_review = self
            .outcomes
            .iter()
            .filter(|o| o.evaluation.verdict.requires_human_review)
            .map(|o| o.label())
            .collect();

        let failures: Vec<RecordFailure> = load_failures
            .iter()
            .chain(self.failures.iter())
            .cloned()
            .collect();

        let summary = Summary {
            generated_at: Local::now().to_rfc3339(),
            total: self.outcomes.len() + failures.len(),
            evaluated: self.outcomes.len(),
            failed: failures.len(),
            verdicts,
            requires_human_review,
            failures,
        };

        tracing::info!(
            evaluated = summary.evaluated,
            failed = summary.failed,
            review = summary.requires_human_review.len(),
            "batch evaluated"
        );
        summary
    }
}

impl RecordOutcome {
    /// Report id, or the file name when the report has none
    pub fn label(&self) -> String {
        if !self.id_report.trim().is_empty() {
            return self.id_report.trim().to_string();
        }
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "record".to_string());
        if self.index == 0 {
            stem
        } else {
            format!("{}-{}", stem, self.index + 1)
        }
    }
}
