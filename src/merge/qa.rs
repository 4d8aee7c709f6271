//! Checks of the merged files: every QA column must be present and hold at
//! least one value.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use std::fs;
use std::path::Path;

use crate::merge::io_common::{file_extension, simplify_file_name};
use crate::merge::io_excel::read_excel_table;
use crate::merge::*;

use survey_reconcile::discovery::is_lock_file;
use survey_reconcile::Dataset;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaFinding {
    pub file: String,
    /// QA columns absent from the file.
    pub missing: Vec<String>,
    /// QA columns present but without any value.
    pub empty: Vec<String>,
    /// Set when the file could not be read.
    pub error: Option<String>,
}

impl QaFinding {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.empty.is_empty() && self.error.is_none()
    }
}

/// Column names are compared trimmed and lower-cased.
pub fn check_dataset(file: &str, dataset: &Dataset, qa_columns: &[String]) -> QaFinding {
    let mut finding = QaFinding {
        file: file.to_string(),
        ..QaFinding::default()
    };
    for name in qa_columns {
        let wanted = name.trim().to_lowercase();
        let column = dataset
            .columns()
            .iter()
            .find(|c| c.name.trim().to_lowercase() == wanted);
        match column {
            None => finding.missing.push(wanted),
            Some(c) if c.values.iter().all(|v| v.is_missing()) => finding.empty.push(wanted),
            Some(_) => {}
        }
    }
    finding
}

/// Checks every workbook of the directory. Returns one finding per file.
pub fn run_qa(dir: &Path, qa_columns: &[String]) -> MergeResult<Vec<QaFinding>> {
    let entries = fs::read_dir(dir).context(ListingDirSnafu {
        path: path_str(dir),
    })?;
    let mut files: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.context(ListingDirSnafu {
            path: path_str(dir),
        })?;
        let p = path_str(&entry.path());
        if entry.path().is_file()
            && file_extension(&p).as_deref() == Some("xlsx")
            && !is_lock_file(&p)
        {
            files.push(p);
        }
    }
    files.sort();

    let mut findings: Vec<QaFinding> = Vec::new();
    for p in files.iter() {
        let name = simplify_file_name(p);
        let finding = match read_excel_table(p) {
            Ok(ds) => check_dataset(&name, &ds, qa_columns),
            Err(e) => QaFinding {
                file: name.clone(),
                error: Some(e.to_string()),
                ..QaFinding::default()
            },
        };
        if let Some(e) = finding.error.as_ref() {
            warn!("run_qa: {}: could not be read: {}", name, e);
        }
        if !finding.missing.is_empty() {
            warn!("run_qa: {}: missing columns: {}", name, finding.missing.join(", "));
        }
        if !finding.empty.is_empty() {
            warn!("run_qa: {}: columns without values: {}", name, finding.empty.join(", "));
        }
        findings.push(finding);
    }

    let with_issues = findings.iter().filter(|f| !f.is_clean()).count();
    info!(
        "run_qa: {} files checked, {} with issues",
        findings.len(),
        with_issues
    );
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::merge::io_xlsx::write_xlsx;
    use survey_reconcile::Cell;

    fn columns(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_and_empty() {
        let ds = Dataset::from_rows(
            &columns(&["ID", " Year", "firm"]),
            vec![
                vec![Cell::Int(1), Cell::Empty, Cell::Text("a".to_string())],
                vec![Cell::Int(2), Cell::Float(f64::NAN), Cell::Empty],
            ],
        );
        let f = check_dataset("x.xlsx", &ds, &columns(&["id", "year", "firm", "area"]));
        assert_eq!(f.missing, vec!["area"]);
        assert_eq!(f.empty, vec!["year"]);
        assert!(!f.is_clean());
    }

    #[test]
    fn directory_scan() {
        let dir = tempfile::tempdir().unwrap();
        let ds = Dataset::from_rows(&columns(&["id"]), vec![vec![Cell::Int(1)]]);
        write_xlsx(&dir.path().join("b.xlsx").display().to_string(), &ds).unwrap();
        std::fs::write(dir.path().join("a.xlsx"), "broken").unwrap();
        std::fs::write(dir.path().join("~$b.xlsx"), "lock").unwrap();
        std::fs::write(dir.path().join("notes.csv"), "id\n1\n").unwrap();

        let findings = run_qa(dir.path(), &columns(&["id"])).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].file, "a.xlsx");
        assert!(findings[0].error.is_some());
        assert_eq!(findings[1].file, "b.xlsx");
        assert!(findings[1].is_clean());
    }
}
