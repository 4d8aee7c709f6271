use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;

use survey_reconcile::pipeline::{run_pipeline, DataSource, PipelineError, RunSummary};
use survey_reconcile::Dataset;

use crate::args::Args;
use crate::merge::config_reader::*;
use crate::merge::io_common::{file_extension, output_file_name};
use crate::merge::qa::{run_qa, QaFinding};

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_xlsx;
pub mod qa;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MergeError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("No worksheet or no header row in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningCsv {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing CSV file {path}"))]
    CsvParse { source: csv::Error, path: String },
    #[snafu(display("No header row in CSV file {path}"))]
    EmptyCsv { path: String },
    #[snafu(display("File {path} is neither UTF-8 nor CP949"))]
    Encoding { path: String },
    #[snafu(display("Unsupported file type: {path}"))]
    UnsupportedFile { path: String },
    #[snafu(display("Dataset too large for a worksheet: {rows} rows, {columns} columns"))]
    SheetTooLarge { rows: usize, columns: usize },
    #[snafu(display("Error writing workbook {path}"))]
    WritingXlsx {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error creating directory {path}"))]
    CreatingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error listing directory {path}"))]
    ListingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Missing setting: {name} (use the command line or the configuration file)"))]
    MissingSetting { name: String },
    #[snafu(display("Invalid year {year:?}: expected two digits"))]
    InvalidYear { year: String },
    #[snafu(display("No guide document found in {path}"))]
    NoGuides { path: String },
    #[snafu(display("No data file in {path} matches a guide and a target year"))]
    NoInputs { path: String },
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Access to the guide, input and output directories.
pub struct FsSource {
    settings: MergeSettings,
}

impl FsSource {
    pub fn new(settings: MergeSettings) -> FsSource {
        FsSource { settings }
    }
}

fn path_str(p: &Path) -> String {
    p.display().to_string()
}

fn list_files(dir: &Path, recursive: bool, res: &mut Vec<String>) -> MergeResult<()> {
    let entries = fs::read_dir(dir).context(ListingDirSnafu {
        path: path_str(dir),
    })?;
    for entry in entries {
        let entry = entry.context(ListingDirSnafu {
            path: path_str(dir),
        })?;
        let p = entry.path();
        if p.is_dir() {
            if recursive {
                list_files(&p, recursive, res)?;
            }
        } else {
            res.push(path_str(&p));
        }
    }
    Ok(())
}

impl DataSource for FsSource {
    type Error = MergeError;

    fn list_guides(&mut self) -> MergeResult<Vec<String>> {
        let mut res = Vec::new();
        list_files(&self.settings.guide_dir, false, &mut res)?;
        debug!("list_guides: {:?}", res);
        Ok(res)
    }

    fn list_inputs(&mut self) -> MergeResult<Vec<String>> {
        let mut res = Vec::new();
        list_files(&self.settings.input_dir, true, &mut res)?;
        debug!("list_inputs: {} files", res.len());
        Ok(res)
    }

    fn load_table(&mut self, path: &str) -> MergeResult<Dataset> {
        match file_extension(path).as_deref() {
            Some("csv") => io_csv::read_csv_table(path),
            Some("xlsx") | Some("xls") => io_excel::read_excel_table(path),
            _ => UnsupportedFileSnafu { path }.fail(),
        }
    }

    fn load_columns(&mut self, path: &str) -> MergeResult<Vec<String>> {
        match file_extension(path).as_deref() {
            Some("csv") => io_csv::read_csv_header(path),
            Some("xlsx") | Some("xls") => io_excel::read_excel_header(path),
            _ => UnsupportedFileSnafu { path }.fail(),
        }
    }

    fn save(&mut self, category: &str, dataset: &Dataset) -> MergeResult<String> {
        let dir = &self.settings.output_dir;
        fs::create_dir_all(dir).context(CreatingDirSnafu {
            path: path_str(dir),
        })?;
        let p = dir.join(output_file_name(&self.settings.output_file_name, category));
        let path = path_str(&p);
        io_xlsx::write_xlsx(&path, dataset)?;
        Ok(path)
    }
}

fn from_pipeline_error(e: PipelineError<MergeError>, settings: &MergeSettings) -> MergeError {
    match e {
        PipelineError::Listing(e) => e,
        PipelineError::NoGuides => MergeError::NoGuides {
            path: path_str(&settings.guide_dir),
        },
        PipelineError::NoInputs => MergeError::NoInputs {
            path: path_str(&settings.input_dir),
        },
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SucceededCategory {
    pub category: String,
    pub output: String,
    pub rows: usize,
    pub columns: usize,
    #[serde(rename = "skippedFiles")]
    pub skipped_files: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FailedCategory {
    pub category: String,
    pub reason: String,
    pub detail: String,
}

fn build_summary_js(summary: &RunSummary, qa: &Option<Vec<QaFinding>>) -> JSValue {
    let succeeded: Vec<SucceededCategory> = summary
        .succeeded
        .iter()
        .map(|r| SucceededCategory {
            category: r.category.clone(),
            output: r.location.clone(),
            rows: r.num_rows,
            columns: r.num_columns,
            skipped_files: r.skipped_files.clone(),
        })
        .collect();
    let failed: Vec<FailedCategory> = summary
        .failed
        .iter()
        .map(|f| FailedCategory {
            category: f.category.clone(),
            reason: f.reason.tag().to_string(),
            detail: f.reason.to_string(),
        })
        .collect();
    let mut js = json!({
        "attempted": summary.attempted,
        "succeeded": succeeded,
        "failed": failed,
        "skippedInputs": summary.skipped_inputs,
    });
    if let Some(findings) = qa {
        js["qa"] = json!(findings);
    }
    js
}

fn write_summary(js: &JSValue, out: &Option<String>) -> MergeResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingSummarySnafu {})?;
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(path) => {
            fs::write(path, pretty).context(WritingSummarySnafu { path })?;
            info!("write_summary: summary written to {:?}", path);
        }
    }
    Ok(())
}

/// Runs the merge of all the categories, then the QA pass if requested, and
/// writes the summary.
pub fn run_merge(args: &Args) -> MergeResult<RunSummary> {
    let config = match args.config.as_ref() {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let settings = resolve_settings(args, config)?;
    info!("run_merge: settings: {:?}", settings);

    let mut source = FsSource::new(settings.clone());
    let summary = run_pipeline(&mut source, &settings.pipeline)
        .map_err(|e| from_pipeline_error(e, &settings))?;

    for f in summary.failed.iter() {
        warn!("run_merge: {}: {}", f.category, f.reason);
    }

    let qa = if settings.run_qa {
        Some(run_qa(&settings.output_dir, &settings.qa_columns)?)
    } else {
        None
    };

    let js = build_summary_js(&summary, &qa);
    write_summary(&js, &settings.summary_out)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_xlsxwriter::Workbook;
    use survey_reconcile::Cell;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Writes a guide with the label column first, the required codes in
    /// column 1 and the derived codes in column 2.
    fn write_guide(path: &Path, rows: &[[&str; 3]]) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        for (c, h) in ["변수레이블", "required", "derived"].iter().enumerate() {
            ws.write_string(0, c as u16, *h).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_empty() {
                    ws.write_string(r as u32 + 1, c as u16, *v).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }

    fn args(root: &Path) -> Args {
        Args {
            input_dir: Some(path_str(&root.join("data"))),
            guide_dir: Some(path_str(&root.join("guides"))),
            output_dir: Some(path_str(&root.join("out"))),
            required_columns: Some(vec![1]),
            forbidden_columns: Some(vec![2]),
            summary_out: Some(path_str(&root.join("summary.json"))),
            ..Args::default()
        }
    }

    #[test]
    fn full_run_on_disk() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("guides")).unwrap();
        fs::create_dir_all(root.join("data").join("2023")).unwrap();
        write_guide(
            &root.join("guides").join("KPC_NCSI_Hospital_guide.xlsx"),
            &[["id", "", ""], ["Q1", "LV1", "xLV1"], ["Q2", "", "xLV1"]],
        );
        fs::write(
            root.join("data").join("24_Hospital_raw.csv"),
            "id,Q1,Q2,lv1\n3,5,,2\n",
        )
        .unwrap();
        let (cp949, _, _) = encoding_rs::EUC_KR.encode("id,Q1,Q2,LV1,메모\n1,3,5,1,좋음\n2,4,,1,\n");
        fs::write(
            root.join("data").join("2023").join("23_Hospital_raw.csv"),
            cp949,
        )
        .unwrap();
        fs::write(root.join("data").join("notes.txt"), "ignored").unwrap();

        let mut a = args(root);
        a.qa = true;
        let summary = run_merge(&a).unwrap();
        assert_eq!(summary.attempted, vec!["Hospital"]);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.skipped_inputs, 1);

        let output = root.join("out").join("KPC_NCSI_Hospital_DATA.xlsx");
        let ds = io_excel::read_excel_table(&path_str(&output)).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "LV1", "xLV1", "Q1", "Q2"]);
        assert_eq!(
            ds.column("id").unwrap().values,
            vec![Cell::Float(1.0), Cell::Float(2.0), Cell::Float(3.0)]
        );
        assert_eq!(
            ds.column("xLV1").unwrap().values,
            vec![Cell::Float(4.0), Cell::Float(4.0), Cell::Float(5.0)]
        );
        assert_eq!(
            ds.column("LV1").unwrap().values,
            vec![Cell::Float(1.0), Cell::Float(1.0), Cell::Float(2.0)]
        );

        let js: JSValue =
            serde_json::from_str(&fs::read_to_string(root.join("summary.json")).unwrap()).unwrap();
        assert_eq!(js["succeeded"][0]["category"], "Hospital");
        assert_eq!(js["succeeded"][0]["rows"], 3);
        assert_eq!(js["qa"][0]["missing"][0], "year");
    }

    #[test]
    fn failed_categories_are_reported() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("guides")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        write_guide(
            &root.join("guides").join("KPC_NCSI_Bank_guide.xlsx"),
            &[["Q1", "LV1", "xLV1"]],
        );
        write_guide(
            &root.join("guides").join("KPC_NCSI_Retail_guide.xlsx"),
            &[["Q1", "LV1", ""]],
        );
        fs::write(root.join("data").join("24_Bank_raw.csv"), "Q1,LV1,xlv1\n1,2,3\n").unwrap();
        fs::write(root.join("data").join("24_Retail_raw.csv"), "Q1\n1\n").unwrap();

        let summary = run_merge(&args(root)).unwrap();
        assert!(summary.succeeded.is_empty());
        let js: JSValue =
            serde_json::from_str(&fs::read_to_string(root.join("summary.json")).unwrap()).unwrap();
        assert_eq!(js["failed"][0]["category"], "Bank");
        assert_eq!(js["failed"][0]["reason"], "forbidden variables present");
        assert_eq!(js["failed"][1]["category"], "Retail");
        assert_eq!(js["failed"][1]["reason"], "required variables missing");
        assert!(js.get("qa").is_none());
        assert!(!root.join("out").exists());
    }

    #[test]
    fn repeated_header_is_merged() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("guides")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        write_guide(
            &root.join("guides").join("KPC_NCSI_Bank_guide.xlsx"),
            &[["Q1", "LV1", ""]],
        );
        fs::write(
            root.join("data").join("24_Bank_raw.csv"),
            "Q1,LV1,memo,memo\n1,2,a,b\n",
        )
        .unwrap();

        let summary = run_merge(&args(root)).unwrap();
        assert!(summary.failed.is_empty());
        assert_eq!(summary.succeeded.len(), 1);
        let output = root.join("out").join("KPC_NCSI_Bank_DATA.xlsx");
        let ds = io_excel::read_excel_table(&path_str(&output)).unwrap();
        assert_eq!(ds.column_names(), vec!["LV1", "Q1"]);
    }

    #[test]
    fn run_level_errors() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("guides")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        assert!(matches!(
            run_merge(&args(root)),
            Err(MergeError::NoGuides { .. })
        ));

        write_guide(
            &root.join("guides").join("KPC_NCSI_Bank_guide.xlsx"),
            &[["Q1", "", ""]],
        );
        fs::write(root.join("data").join("19_Bank_raw.csv"), "Q1\n1\n").unwrap();
        assert!(matches!(
            run_merge(&args(root)),
            Err(MergeError::NoInputs { .. })
        ));

        let mut a = args(root);
        a.input_dir = None;
        assert!(matches!(
            run_merge(&a),
            Err(MergeError::MissingSetting { .. })
        ));
    }
}
