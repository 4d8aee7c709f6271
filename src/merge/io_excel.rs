use calamine::{open_workbook_auto, DataType, Range, Reader};
use log::{debug, info};
use snafu::prelude::*;

use crate::merge::io_common::{header_names, simplify_file_name};
use crate::merge::*;

use survey_reconcile::{Cell, Dataset};

fn first_sheet(path: &str) -> MergeResult<Range<DataType>> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    let range = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    Ok(range)
}

/// The number of blank columns left of the range. Calamine starts a range at
/// its first used cell, while the guide positions count from column A.
fn leading_columns(range: &Range<DataType>) -> usize {
    range.start().map(|(_, col)| col as usize).unwrap_or(0)
}

fn read_header(range: &Range<DataType>, path: &str) -> MergeResult<Vec<String>> {
    let header = range.rows().next().context(EmptyExcelSnafu { path })?;
    let raw: Vec<String> = std::iter::repeat(String::new())
        .take(leading_columns(range))
        .chain(header.iter().map(read_header_cell))
        .collect();
    Ok(header_names(raw, path))
}

fn read_header_cell(cell: &DataType) -> String {
    match read_cell(cell) {
        Cell::Empty => "".to_string(),
        c => c.as_text().unwrap_or_default(),
    }
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        // Whitespace-only text is missing, as in the CSV reader.
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Float(*f),
        DataType::Int(i) => Cell::Int(*i),
        DataType::Bool(b) => Cell::Bool(*b),
        // Serial date, as stored in the workbook.
        DataType::DateTime(f) => Cell::Float(*f),
        DataType::Error(_) => Cell::Empty,
        #[allow(unreachable_patterns)]
        c => Cell::Text(c.to_string()),
    }
}

/// Reads the first worksheet. The first row is the header.
pub fn read_excel_table(path: &str) -> MergeResult<Dataset> {
    let range = first_sheet(path)?;
    let headers = read_header(&range, path)?;
    debug!("read_excel_table: header: {:?}", headers);

    let offset = leading_columns(&range);
    let rows: Vec<Vec<Cell>> = range
        .rows()
        .skip(1)
        .map(|row| {
            std::iter::repeat(Cell::Empty)
                .take(offset)
                .chain(row.iter().map(read_cell))
                .collect()
        })
        .collect();
    info!(
        "read_excel_table: {}: {} rows, {} columns",
        simplify_file_name(path),
        rows.len(),
        headers.len()
    );
    Ok(Dataset::from_rows(&headers, rows))
}

pub fn read_excel_header(path: &str) -> MergeResult<Vec<String>> {
    let range = first_sheet(path)?;
    read_header(&range, path)
}
