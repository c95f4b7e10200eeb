//! Result documents: one `<report>.verdict.json` per record plus
//! `verdict-summary.json`, or a single file for a single record.

use crate::batch::{BatchReport, RecordOutcome, Summary};
use crate::error::Result;
use crate::scanner::SUMMARY_FILE;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Where results go for a given `-o` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Folder(PathBuf),
}

impl OutputTarget {
    /// A path with an extension is a file, but only for a single record
    pub fn resolve(output: &Path, records: usize) -> Self {
        if records == 1 && !output.is_dir() && output.extension().is_some() {
            OutputTarget::File(output.to_path_buf())
        } else {
            OutputTarget::Folder(output.to_path_buf())
        }
    }
}

/// Write the results; returns the files written
pub fn export_results(
    report: &BatchReport,
    summary: &Summary,
    target: &OutputTarget,
    pretty: bool,
) -> Result<Vec<PathBuf>> {
    match target {
        OutputTarget::File(path) => {
            let mut written = Vec::new();
            if let Some(outcome) = report.outcomes.first() {
                write_json(path, outcome, pretty)?;
                written.push(path.clone());
            }
            Ok(written)
        }
        OutputTarget::Folder(dir) => write_folder(report, summary, dir, pretty),
    }
}

fn write_folder(
    report: &BatchReport,
    summary: &Summary,
    dir: &Path,
    pretty: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(report.outcomes.len() + 1);
    for outcome in &report.outcomes {
        let path = dir.join(output_file_name(outcome, &mut used));
        write_json(&path, outcome, pretty)?;
        written.push(path);
    }

    let summary_path = dir.join(SUMMARY_FILE);
    write_json(&summary_path, summary, pretty)?;
    written.push(summary_path);

    tracing::debug!(folder = %dir.display(), files = written.len(), "results written");
    Ok(written)
}

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_json(value, pretty)?)?;
    Ok(())
}

/// `<label>.verdict.json`, made file-system safe and unique in the run
fn output_file_name(outcome: &RecordOutcome, used: &mut HashSet<String>) -> String {
    let base: String = outcome
        .label()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let base = if base.is_empty() { "record".to_string() } else { base };

    let mut name = base.clone();
    let mut n = 2;
    while !used.insert(name.to_lowercase()) {
        name = format!("{}-{}", base, n);
        n += 1;
    }
    format!("{}.verdict.json", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{evaluate_all, BatchOptions, RecordInput};
    use fri_verdict_common::testing::sample_record;
    use fri_verdict_common::{AqlTable, RemarkCatalog};

    fn report(ids: &[&str]) -> BatchReport {
        let inputs: Vec<RecordInput> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut record = sample_record();
                record.report.id_report = id.to_string();
                RecordInput {
                    source: PathBuf::from("reports.json"),
                    index: i,
                    record,
                }
            })
            .collect();
        evaluate_all(
            &inputs,
            &AqlTable::standard(),
            &RemarkCatalog::builtin(),
            BatchOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_target_resolution() {
        assert_eq!(
            OutputTarget::resolve(Path::new("out/result.json"), 1),
            OutputTarget::File(PathBuf::from("out/result.json"))
        );
        assert_eq!(
            OutputTarget::resolve(Path::new("out/result.json"), 2),
            OutputTarget::Folder(PathBuf::from("out/result.json"))
        );
        assert_eq!(
            OutputTarget::resolve(Path::new("out"), 1),
            OutputTarget::Folder(PathBuf::from("out"))
        );
    }

    #[test]
    fn test_file_names_are_safe_and_unique() {
        let report = report(&["BV/2024 01", "BV/2024 01", ""]);
        let mut used = HashSet::new();
        let names: Vec<String> = report
            .outcomes
            .iter()
            .map(|o| output_file_name(o, &mut used))
            .collect();

        assert_eq!(names[0], "BV_2024_01.verdict.json");
        assert_eq!(names[1], "BV_2024_01-2.verdict.json");
        assert_eq!(names[2], "reports-3.verdict.json");
    }

    #[test]
    fn test_write_folder() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(&["R1", "R2"]);
        let summary = report.summary(&[]);

        let written = export_results(
            &report,
            &summary,
            &OutputTarget::Folder(dir.path().join("out")),
            true,
        )
        .unwrap();

        assert_eq!(written.len(), 3);
        assert!(dir.path().join("out").join("R1.verdict.json").exists());
        let content = std::fs::read_to_string(dir.path().join("out").join(SUMMARY_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["evaluated"], 2);
        assert_eq!(value["verdicts"]["TRUE_PASS"], 2);
    }

    #[test]
    fn test_write_single_file_compact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let report = report(&["R1"]);
        let summary = report.summary(&[]);

        export_results(&report, &summary, &OutputTarget::File(path.clone()), false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["id_report"], "R1");
        assert_eq!(value["verdict"]["verdict_type"], "true_pass");
        assert_eq!(value["analysis"]["automated_result"], "pass");
        assert_eq!(value["fingerprint"].as_str().unwrap().len(), 64);
    }
}
