use crate::args::Args;
use crate::merge::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use survey_reconcile::pipeline::PipelineSettings;
use survey_reconcile::GuideLayout;

pub const DEFAULT_TARGET_YEARS: [&str; 3] = ["24", "23", "22"];
pub const DEFAULT_VARIABLE_LABEL_COLUMN: &str = "변수레이블";
pub const DEFAULT_REQUIRED_CODE_COLUMNS: [usize; 2] = [4, 6];
pub const DEFAULT_FORBIDDEN_CODE_COLUMNS: [usize; 2] = [8, 10];
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "KPC_NCSI_{category}_DATA.xlsx";
pub const DEFAULT_QA_COLUMNS: [&str; 10] = [
    "id", "year", "sector", "industry", "firm", "firm1", "area", "gender", "age", "age1",
];

/// The JSON configuration file. Every entry is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(rename = "inputDirectory")]
    pub input_directory: Option<String>,
    #[serde(rename = "guideDirectory")]
    pub guide_directory: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "targetYears")]
    pub target_years: Option<Vec<String>>,
    #[serde(rename = "variableLabelColumn")]
    pub variable_label_column: Option<String>,
    #[serde(rename = "requiredCodeColumns")]
    pub required_code_columns: Option<Vec<usize>>,
    #[serde(rename = "forbiddenCodeColumns")]
    pub forbidden_code_columns: Option<Vec<usize>>,
    /// File name of the outputs. `{category}` is replaced by the category.
    #[serde(rename = "outputFileName")]
    pub output_file_name: Option<String>,
    #[serde(rename = "qaRequiredColumns")]
    pub qa_required_columns: Option<Vec<String>>,
}

/// Everything a run needs, after merging the file, the flags and the defaults.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MergeSettings {
    pub input_dir: PathBuf,
    pub guide_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pipeline: PipelineSettings,
    pub output_file_name: String,
    pub qa_columns: Vec<String>,
    pub run_qa: bool,
    pub summary_out: Option<String>,
}

/// Reads a configuration file. Also returns the directory against which
/// relative paths of the file are resolved.
pub fn read_config(path: &str) -> MergeResult<(MergeConfig, PathBuf)> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    let config: MergeConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let base = Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    info!("read_config: {:?}", config);
    Ok((config, base))
}

fn resolve_dir(
    flag: &Option<String>,
    from_file: &Option<String>,
    base: &Path,
    name: &str,
) -> MergeResult<PathBuf> {
    match (flag, from_file) {
        (Some(p), _) => Ok(PathBuf::from(p)),
        (None, Some(p)) => Ok(base.join(p)),
        (None, None) => MissingSettingSnafu { name }.fail(),
    }
}

fn check_years(years: Vec<String>) -> MergeResult<Vec<String>> {
    years
        .into_iter()
        .map(|y| y.trim().to_string())
        .map(|y| {
            if y.len() == 2 && y.chars().all(|c| c.is_ascii_digit()) {
                Ok(y)
            } else {
                InvalidYearSnafu { year: y }.fail()
            }
        })
        .collect()
}

/// Merges the command line, the configuration file and the defaults, in
/// that order of precedence.
pub fn resolve_settings(
    args: &Args,
    config: Option<(MergeConfig, PathBuf)>,
) -> MergeResult<MergeSettings> {
    let (config, base) = config.unwrap_or_default();

    let input_dir = resolve_dir(&args.input_dir, &config.input_directory, &base, "input directory")?;
    let guide_dir = resolve_dir(&args.guide_dir, &config.guide_directory, &base, "guide directory")?;
    let output_dir = resolve_dir(
        &args.output_dir,
        &config.output_directory,
        &base,
        "output directory",
    )?;

    let target_years = check_years(
        args.years
            .clone()
            .or(config.target_years)
            .unwrap_or_else(|| DEFAULT_TARGET_YEARS.iter().map(|s| s.to_string()).collect()),
    )?;
    let layout = GuideLayout {
        variable_label_column: args
            .var_label_column
            .clone()
            .or(config.variable_label_column)
            .unwrap_or_else(|| DEFAULT_VARIABLE_LABEL_COLUMN.to_string()),
        required_code_columns: args
            .required_columns
            .clone()
            .or(config.required_code_columns)
            .unwrap_or_else(|| DEFAULT_REQUIRED_CODE_COLUMNS.to_vec()),
        forbidden_code_columns: args
            .forbidden_columns
            .clone()
            .or(config.forbidden_code_columns)
            .unwrap_or_else(|| DEFAULT_FORBIDDEN_CODE_COLUMNS.to_vec()),
    };

    Ok(MergeSettings {
        input_dir,
        guide_dir,
        output_dir,
        pipeline: PipelineSettings {
            layout,
            target_years,
        },
        output_file_name: config
            .output_file_name
            .unwrap_or_else(|| DEFAULT_OUTPUT_FILE_NAME.to_string()),
        qa_columns: config
            .qa_required_columns
            .unwrap_or_else(|| DEFAULT_QA_COLUMNS.iter().map(|s| s.to_string()).collect()),
        run_qa: args.qa,
        summary_out: args.summary_out.clone(),
    })
}
