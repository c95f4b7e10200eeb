use crate::error::{FriError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub file_name: String,
}

/// Extraction JSON or raw model responses
const INPUT_EXTENSIONS: &[&str] = &["json", "txt"];

/// Files this tool writes itself
const OUTPUT_SUFFIX: &str = ".verdict.json";
pub const SUMMARY_FILE: &str = "verdict-summary.json";

/// A single file, or the extraction files of a folder sorted by name
pub fn scan_inputs(path: &Path, recursive: bool) -> Result<Vec<InputFile>> {
    if path.is_file() {
        return Ok(vec![InputFile::new(path)]);
    }

    if !path.exists() {
        return Err(if path.extension().is_some() {
            FriError::FileNotFound(path.display().to_string())
        } else {
            FriError::FolderNotFound(path.display().to_string())
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs: Vec<InputFile> = WalkDir::new(path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_input_file(e.path()))
        .map(|e| InputFile::new(e.path()))
        .collect();

    inputs.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(folder = %path.display(), count = inputs.len(), "inputs scanned");
    Ok(inputs)
}

impl InputFile {
    fn new(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            file_name,
        }
    }
}

fn is_input_file(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_lowercase(),
        None => return false,
    };
    if name.ends_with(OUTPUT_SUFFIX) || name == SUMMARY_FILE || name.starts_with('.') {
        return false;
    }

    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            INPUT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_input_file() {
        assert!(is_input_file(Path::new("report.json")));
        assert!(is_input_file(Path::new("REPORT.JSON")));
        assert!(is_input_file(Path::new("response.txt")));
        assert!(!is_input_file(Path::new("report.pdf")));
        assert!(!is_input_file(Path::new("report.verdict.json")));
        assert!(!is_input_file(Path::new("verdict-summary.json")));
        assert!(!is_input_file(Path::new(".hidden.json")));
    }

    #[test]
    fn test_scan_not_found() {
        assert!(matches!(
            scan_inputs(Path::new("/nonexistent/folder"), false),
            Err(FriError::FolderNotFound(_))
        ));
        assert!(matches!(
            scan_inputs(Path::new("/nonexistent/report.json"), false),
            Err(FriError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_scan_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.json");
        fs::write(&file, "{}").unwrap();

        let inputs = scan_inputs(&file, false).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].file_name, "one.json");
    }

    #[test]
    fn test_scan_folder_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.txt", "c.verdict.json", "verdict-summary.json", "notes.md"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.json"), "{}").unwrap();

        let names: Vec<String> = scan_inputs(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|i| i.file_name)
            .collect();
        assert_eq!(names, vec!["a.txt", "b.json"]);

        let recursive = scan_inputs(dir.path(), true).unwrap();
        assert_eq!(recursive.len(), 3);
        assert_eq!(recursive[2].file_name, "d.json");
    }
}
