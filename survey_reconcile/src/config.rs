// ********* Tabular data structures ***********

use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;

/// The content of one cell, as produced by the loaders.
///
/// Blank and whitespace-only text is expected to be loaded as `Empty`.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// A missing cell is either empty or a NaN float.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric coercion. Anything that cannot be read as a number is `None`,
    /// which callers must treat as missing (and not as zero).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_nan() => None,
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        }
    }

    /// The trimmed text of a present cell.
    pub fn as_text(&self) -> Option<String> {
        let s = match self {
            Cell::Empty => return None,
            Cell::Float(f) if f.is_nan() => return None,
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        };
        Some(s)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

/// A column-major table. All the columns have the same length.
///
/// Column names are not required to be unique: lookups by name return the
/// first match.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Dataset {
    pub fn new(num_rows: usize) -> Dataset {
        Dataset {
            columns: Vec::new(),
            num_rows,
        }
    }

    /// Builds a dataset from a header and row-major data. Header names are trimmed.
    /// Short rows are padded with empty cells, extra cells are dropped.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Cell>>) -> Dataset {
        let num_rows = rows.len();
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column {
                name: h.trim().to_string(),
                values: Vec::with_capacity(num_rows),
            })
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for col in columns.iter_mut() {
                col.values.push(cells.next().unwrap_or(Cell::Empty));
            }
        }
        Dataset { columns, num_rows }
    }

    /// Builds a dataset from already assembled columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Dataset, ReconcileError> {
        let num_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(c) = columns.iter().find(|c| c.values.len() != num_rows) {
            return Err(ReconcileError::ColumnLength {
                column: c.name.clone(),
                expected: num_rows,
                found: c.values.len(),
            });
        }
        Ok(Dataset { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) -> Result<(), ReconcileError> {
        if values.len() != self.num_rows {
            return Err(ReconcileError::ColumnLength {
                column: name.to_string(),
                expected: self.num_rows,
                found: values.len(),
            });
        }
        self.columns.push(Column {
            name: name.to_string(),
            values,
        });
        Ok(())
    }

    /// Keeps the given columns, in the given order. Names that are not present are skipped.
    pub fn select(mut self, names: &[String]) -> Dataset {
        let mut slots: Vec<Option<Column>> = self.columns.drain(..).map(Some).collect();
        let mut columns: Vec<Column> = Vec::with_capacity(names.len());
        for name in names {
            let found = slots
                .iter_mut()
                .find(|slot| matches!(slot, Some(c) if c.name == *name));
            if let Some(slot) = found {
                if let Some(c) = slot.take() {
                    columns.push(c);
                }
            }
        }
        Dataset {
            columns,
            num_rows: self.num_rows,
        }
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.num_rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// The names that appear more than once, in order of first repetition.
    pub fn duplicate_column_names(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for c in self.columns.iter() {
            if !seen.insert(c.name.as_str()) && !res.contains(&c.name) {
                res.push(c.name.clone());
            }
        }
        res
    }
}

// ********* Guide structures ***********

/// Where to find things in a guide document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GuideLayout {
    /// Name of the column holding the variable labels.
    pub variable_label_column: String,
    /// Zero-based positions of the columns with the codes that must be present in the inputs.
    pub required_code_columns: Vec<usize>,
    /// Zero-based positions of the columns with the codes that must not be present in the inputs.
    pub forbidden_code_columns: Vec<usize>,
}

impl GuideLayout {
    /// Required then forbidden positions, in that order.
    pub fn code_columns(&self) -> Vec<usize> {
        let mut res = self.required_code_columns.clone();
        res.extend(self.forbidden_code_columns.iter().copied());
        res
    }
}

/// Mapping from a code, as spelled in the guide, to the variable labels it covers.
///
/// Codes are kept in order of first appearance and the labels of each code
/// are de-duplicated, in order of first appearance.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CodeMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl CodeMapping {
    pub fn with_label(mut self, code: &str, label: &str) -> CodeMapping {
        match self.entries.iter().position(|(c, _)| c == code) {
            Some(idx) => {
                let labels = &mut self.entries[idx].1;
                if !labels.iter().any(|l| l == label) {
                    labels.push(label.to_string());
                }
            }
            None => self
                .entries
                .push((code.to_string(), vec![label.to_string()])),
        }
        self
    }

    pub fn get(&self, code: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, labels)| labels.as_slice())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(c, labels)| (c.as_str(), labels.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything extracted from a guide document. Immutable once parsed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Guide {
    pub required_labels: BTreeSet<String>,
    pub forbidden_labels: BTreeSet<String>,
    pub code_to_labels: CodeMapping,
    /// Raw codes, in column-then-row order of the code columns.
    pub priority_codes: Vec<String>,
    /// The variable labels, de-duplicated, in guide order.
    pub target_base_columns: Vec<String>,
}

// ******** Outcomes and errors *********

/// The result of the validation gate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ValidationOutcome {
    Pass,
    /// Some required labels are absent from every input file.
    MissingRequired(BTreeSet<String>),
    /// Some forbidden labels are already present in the inputs.
    ForbiddenPresent(BTreeSet<String>),
}

impl ValidationOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ValidationOutcome::Pass)
    }
}

/// Errors that prevent a category from being reconciled.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReconcileError {
    MissingLabelColumn { column: String },
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
    DuplicateColumns { columns: Vec<String> },
    NoFrames,
}

impl Error for ReconcileError {}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::MissingLabelColumn { column } => {
                write!(f, "variable label column {:?} not found in guide", column)
            }
            ReconcileError::ColumnLength {
                column,
                expected,
                found,
            } => write!(
                f,
                "column {:?} has {} values, expected {}",
                column, found, expected
            ),
            ReconcileError::DuplicateColumns { columns } => {
                write!(f, "duplicated column names: {:?}", columns)
            }
            ReconcileError::NoFrames => write!(f, "no data to concatenate"),
        }
    }
}
