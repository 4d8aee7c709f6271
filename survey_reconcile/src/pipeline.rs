//! Sequencing of the reconciliation over all the categories.
//!
//! All the file access goes through a [DataSource], so that the whole
//! sequence can run against in-memory tables.

use log::{debug, error, info, warn};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;

use crate::builder::DatasetBuilder;
use crate::config::*;
use crate::discovery::{group_inputs, index_guides, year_number};
use crate::guide::parse_guide;
use crate::reconcile_category;
use crate::validate::{observed_columns, validate};

/// Listing, loading and saving of tables.
pub trait DataSource {
    type Error: Error + 'static;

    /// All the candidate guide documents.
    fn list_guides(&mut self) -> Result<Vec<String>, Self::Error>;

    /// All the candidate data files.
    fn list_inputs(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Loads a full table. The header is the first row, trimmed.
    fn load_table(&mut self, path: &str) -> Result<Dataset, Self::Error>;

    /// Reads only the column names of a table.
    fn load_columns(&mut self, path: &str) -> Result<Vec<String>, Self::Error> {
        self.load_table(path).map(|t| t.column_names())
    }

    /// Stores the result of a category and returns where it went.
    fn save(&mut self, category: &str, dataset: &Dataset) -> Result<String, Self::Error>;
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelineSettings {
    pub layout: GuideLayout,
    /// Two-character year tokens, in the order the files are inspected for validation.
    pub target_years: Vec<String>,
}

/// Why a category was not produced.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FailureReason {
    GuideLoad(String),
    ColumnRead,
    RequiredMissing(BTreeSet<String>),
    ForbiddenPresent(BTreeSet<String>),
    DataLoad,
    Concat(ReconcileError),
    Reconcile(ReconcileError),
    Save(String),
}

impl FailureReason {
    pub fn tag(&self) -> &'static str {
        match self {
            FailureReason::GuideLoad(_) => "guide load failure",
            FailureReason::ColumnRead => "column read failure",
            FailureReason::RequiredMissing(_) => "required variables missing",
            FailureReason::ForbiddenPresent(_) => "forbidden variables present",
            FailureReason::DataLoad => "data load failure",
            FailureReason::Concat(_) => "concat failure",
            FailureReason::Reconcile(_) => "reconcile failure",
            FailureReason::Save(_) => "save failure",
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::GuideLoad(msg) | FailureReason::Save(msg) => {
                write!(f, "{}: {}", self.tag(), msg)
            }
            FailureReason::RequiredMissing(labels) | FailureReason::ForbiddenPresent(labels) => {
                write!(f, "{}: {:?}", self.tag(), labels)
            }
            FailureReason::Concat(err) | FailureReason::Reconcile(err) => {
                write!(f, "{}: {}", self.tag(), err)
            }
            FailureReason::ColumnRead | FailureReason::DataLoad => write!(f, "{}", self.tag()),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryReport {
    pub category: String,
    pub location: String,
    pub num_rows: usize,
    pub num_columns: usize,
    /// Data files that could not be loaded and were left out.
    pub skipped_files: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FailedCategory {
    pub category: String,
    pub reason: FailureReason,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunSummary {
    pub attempted: Vec<String>,
    pub succeeded: Vec<CategoryReport>,
    pub failed: Vec<FailedCategory>,
    /// Listed data files that matched no target year, no extension or no guide.
    pub skipped_inputs: usize,
}

/// Errors that stop the whole run.
#[derive(Debug)]
pub enum PipelineError<E> {
    Listing(E),
    NoGuides,
    NoInputs,
}

impl<E: Error + 'static> Error for PipelineError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Listing(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: Display> Display for PipelineError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Listing(e) => write!(f, "could not list the source files: {}", e),
            PipelineError::NoGuides => write!(f, "no guide document found"),
            PipelineError::NoInputs => write!(f, "no data file matches a guide and a target year"),
        }
    }
}

/// Runs every category that has both a guide and data files.
///
/// A failing category is recorded in the summary and the run continues.
pub fn run_pipeline<S: DataSource>(
    source: &mut S,
    settings: &PipelineSettings,
) -> Result<RunSummary, PipelineError<S::Error>> {
    let guide_paths = source.list_guides().map_err(PipelineError::Listing)?;
    let guides = index_guides(&guide_paths);
    if guides.is_empty() {
        error!("run_pipeline: no guide among {} files", guide_paths.len());
        return Err(PipelineError::NoGuides);
    }

    let input_paths = source.list_inputs().map_err(PipelineError::Listing)?;
    let (groups, skipped_inputs) = group_inputs(&input_paths, &guides, &settings.target_years);
    if groups.is_empty() {
        error!(
            "run_pipeline: none of the {} data files matches a guide and a target year",
            input_paths.len()
        );
        return Err(PipelineError::NoInputs);
    }
    for category in guides.keys().filter(|c| !groups.contains_key(*c)) {
        info!("run_pipeline: no data for category {:?}", category);
    }

    let mut summary = RunSummary {
        skipped_inputs,
        ..RunSummary::default()
    };
    for (category, files_by_year) in groups.iter() {
        info!("run_pipeline: processing category {:?}", category);
        summary.attempted.push(category.clone());
        // Always present: groups only hold categories with a guide.
        let guide_path = match guides.get(category) {
            Some(p) => p,
            None => continue,
        };
        match process_category(source, settings, category, guide_path, files_by_year) {
            Ok(report) => {
                info!(
                    "run_pipeline: category {:?} written to {:?} ({} rows, {} columns)",
                    category, report.location, report.num_rows, report.num_columns
                );
                summary.succeeded.push(report);
            }
            Err(reason) => {
                error!("run_pipeline: category {:?} failed: {}", category, reason);
                summary.failed.push(FailedCategory {
                    category: category.clone(),
                    reason,
                });
            }
        }
    }
    info!(
        "run_pipeline: {} attempted, {} succeeded, {} failed",
        summary.attempted.len(),
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary)
}

fn process_category<S: DataSource>(
    source: &mut S,
    settings: &PipelineSettings,
    category: &str,
    guide_path: &str,
    files_by_year: &BTreeMap<String, Vec<String>>,
) -> Result<CategoryReport, FailureReason> {
    let guide_sheet = source
        .load_table(guide_path)
        .map_err(|e| FailureReason::GuideLoad(e.to_string()))?;
    let guide = parse_guide(&guide_sheet, &settings.layout)
        .map_err(|e| FailureReason::GuideLoad(e.to_string()))?;

    // Columns of every file, in the order of the target years.
    let mut tables: HashMap<String, Dataset> = HashMap::new();
    let mut columns: Vec<Vec<String>> = Vec::new();
    for year in settings.target_years.iter() {
        for path in files_by_year.get(year).map(|v| v.as_slice()).unwrap_or_default() {
            match source.load_table(path) {
                Ok(table) => {
                    columns.push(table.column_names());
                    tables.insert(path.clone(), table);
                }
                Err(e) => {
                    warn!(
                        "process_category: could not load {:?}, reading the header only: {}",
                        path, e
                    );
                    match source.load_columns(path) {
                        Ok(names) => columns.push(names),
                        Err(e) => warn!("process_category: skipping {:?}: {}", path, e),
                    }
                }
            }
        }
    }
    if columns.is_empty() {
        return Err(FailureReason::ColumnRead);
    }

    let actual = observed_columns(columns.iter().map(|c| c.as_slice()));
    match validate(&guide.required_labels, &guide.forbidden_labels, &actual) {
        ValidationOutcome::Pass => {}
        ValidationOutcome::MissingRequired(missing) => {
            return Err(FailureReason::RequiredMissing(missing))
        }
        ValidationOutcome::ForbiddenPresent(present) => {
            return Err(FailureReason::ForbiddenPresent(present))
        }
    }

    // Loading, oldest year first.
    let mut years: Vec<(u32, &String)> = files_by_year
        .keys()
        .filter_map(|y| year_number(y).map(|n| (n, y)))
        .collect();
    years.sort();
    let mut builder = DatasetBuilder::new();
    let mut skipped_files: Vec<String> = Vec::new();
    for (number, year) in years {
        for path in files_by_year.get(year).map(|v| v.as_slice()).unwrap_or_default() {
            let table = match tables.remove(path) {
                Some(t) => Ok(t),
                None => source.load_table(path),
            };
            match table {
                Ok(t) => {
                    debug!("process_category: {:?} loaded for year {}", path, year);
                    builder.add_frame(number, t);
                }
                Err(e) => {
                    warn!("process_category: skipping {:?}: {}", path, e);
                    skipped_files.push(path.clone());
                }
            }
        }
    }
    if builder.num_frames() == 0 {
        return Err(FailureReason::DataLoad);
    }
    let dataset = builder.build().map_err(FailureReason::Concat)?;
    let dataset = reconcile_category(&guide, dataset).map_err(FailureReason::Reconcile)?;

    let location = source
        .save(category, &dataset)
        .map_err(|e| FailureReason::Save(e.to_string()))?;
    Ok(CategoryReport {
        category: category.to_string(),
        location,
        num_rows: dataset.num_rows(),
        num_columns: dataset.num_columns(),
        skipped_files,
    })
}
