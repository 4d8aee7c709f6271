//! Extraction of the validation sets, the code mapping, the priority list and
//! the target columns from a guide document.

use log::{debug, info, warn};

use std::collections::{BTreeSet, HashSet};

use crate::code::{is_code, normalize_if_code};
use crate::config::*;

/// Parses a guide document that has already been loaded as a table.
///
/// Code column positions beyond the width of the guide are skipped. A missing
/// variable label column is an error: no partial guide is ever returned.
pub fn parse_guide(sheet: &Dataset, layout: &GuideLayout) -> Result<Guide, ReconcileError> {
    let labels = sheet.column(layout.variable_label_column.as_str()).ok_or(
        ReconcileError::MissingLabelColumn {
            column: layout.variable_label_column.clone(),
        },
    )?;

    let required_labels = validation_labels(sheet, &layout.required_code_columns);
    let forbidden_labels = validation_labels(sheet, &layout.forbidden_code_columns);
    info!(
        "parse_guide: {} required labels, {} forbidden labels",
        required_labels.len(),
        forbidden_labels.len()
    );

    let code_columns = layout.code_columns();
    let code_to_labels = code_mapping(sheet, labels, &code_columns);
    let priority_codes = priority_codes(sheet, &code_columns, &code_to_labels);
    debug!(
        "parse_guide: mapping: {:?} priority: {:?}",
        code_to_labels, priority_codes
    );

    let target_base_columns = target_columns(labels);
    if target_base_columns.is_empty() {
        warn!(
            "parse_guide: no variable label found in column {:?}",
            layout.variable_label_column
        );
    }
    info!(
        "parse_guide: {} codes, {} target columns",
        code_to_labels.len(),
        target_base_columns.len()
    );

    Ok(Guide {
        required_labels,
        forbidden_labels,
        code_to_labels,
        priority_codes,
        target_base_columns,
    })
}

/// The normalized, non-empty values found in the given code columns.
pub fn validation_labels(sheet: &Dataset, positions: &[usize]) -> BTreeSet<String> {
    positions
        .iter()
        .filter_map(|idx| sheet.column_at(*idx))
        .flat_map(|col| col.values.iter())
        .filter_map(Cell::as_text)
        .map(|s| normalize_if_code(&s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// For every row with a label, links the label to each code cell of the row.
/// The codes are kept as they are spelled in the guide (trimmed).
fn code_mapping(sheet: &Dataset, labels: &Column, code_columns: &[usize]) -> CodeMapping {
    let columns: Vec<&Column> = code_columns
        .iter()
        .filter_map(|idx| sheet.column_at(*idx))
        .collect();
    labels
        .values
        .iter()
        .enumerate()
        .filter_map(|(row, cell)| {
            cell.as_text()
                .filter(|label| !label.is_empty())
                .map(|label| (row, label))
        })
        .flat_map(|(row, label)| {
            columns
                .iter()
                .filter_map(move |col| col.values.get(row).and_then(Cell::as_text))
                .filter(|code| is_code(code))
                .map(move |code| (code, label.clone()))
        })
        .fold(CodeMapping::default(), |acc, (code, label)| {
            acc.with_label(&code, &label)
        })
}

/// All the code cells, column after column, keeping the first occurrence of
/// each code that made it into the mapping.
fn priority_codes(sheet: &Dataset, code_columns: &[usize], mapping: &CodeMapping) -> Vec<String> {
    let (res, _) = code_columns
        .iter()
        .filter_map(|idx| sheet.column_at(*idx))
        .flat_map(|col| col.values.iter())
        .filter_map(Cell::as_text)
        .filter(|code| is_code(code) && mapping.contains(code))
        .fold(
            (Vec::new(), HashSet::new()),
            |(mut res, mut seen): (Vec<String>, HashSet<String>), code| {
                if seen.insert(code.clone()) {
                    res.push(code);
                }
                (res, seen)
            },
        );
    res
}

fn target_columns(labels: &Column) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    labels
        .values
        .iter()
        .filter_map(Cell::as_text)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
