// Writing of the merged datasets.

use log::info;
use rust_xlsxwriter::{Format, Workbook};
use snafu::prelude::*;

use crate::merge::io_common::simplify_file_name;
use crate::merge::*;

use survey_reconcile::{Cell, Dataset};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Writes a dataset to a single worksheet, with a bold header row. Missing
/// cells are left blank.
pub fn write_xlsx(path: &str, dataset: &Dataset) -> MergeResult<()> {
    let num_rows = dataset.num_rows();
    let num_columns = dataset.num_columns();
    ensure!(
        num_rows < MAX_ROWS && num_columns <= MAX_COLUMNS,
        SheetTooLargeSnafu {
            rows: num_rows,
            columns: num_columns
        }
    );

    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    let header_format = Format::new().set_bold();
    for (c, col) in dataset.columns().iter().enumerate() {
        let c = c as u16;
        ws.write_string_with_format(0, c, &col.name, &header_format)
            .context(WritingXlsxSnafu { path })?;
        for (r, cell) in col.values.iter().enumerate() {
            let r = (r + 1) as u32;
            match cell {
                Cell::Empty => {}
                Cell::Float(f) if f.is_nan() => {}
                Cell::Float(f) => {
                    ws.write_number(r, c, *f)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Int(i) => {
                    ws.write_number(r, c, *i as f64)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Bool(b) => {
                    ws.write_boolean(r, c, *b)
                        .context(WritingXlsxSnafu { path })?;
                }
                Cell::Text(s) => {
                    ws.write_string(r, c, s)
                        .context(WritingXlsxSnafu { path })?;
                }
            }
        }
    }
    workbook.save(path).context(WritingXlsxSnafu { path })?;
    info!(
        "write_xlsx: {}: {} rows, {} columns",
        simplify_file_name(path),
        num_rows,
        num_columns
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::merge::io_excel::read_excel_table;

    #[test]
    fn written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx").display().to_string();
        let headers = vec!["id".to_string(), "xLV1".to_string(), "memo".to_string()];
        let ds = Dataset::from_rows(
            &headers,
            vec![
                vec![Cell::Int(1), Cell::Float(2.5), Cell::Text("a".to_string())],
                vec![Cell::Int(2), Cell::Float(f64::NAN), Cell::Empty],
                vec![Cell::Int(3), Cell::Empty, Cell::Bool(false)],
            ],
        );
        write_xlsx(&path, &ds).unwrap();

        let back = read_excel_table(&path).unwrap();
        assert_eq!(back.column_names(), headers);
        assert_eq!(back.num_rows(), 3);
        assert_eq!(
            back.column("xLV1").unwrap().values,
            vec![Cell::Float(2.5), Cell::Empty, Cell::Empty]
        );
        assert_eq!(
            back.column("memo").unwrap().values,
            vec![Cell::Text("a".to_string()), Cell::Empty, Cell::Bool(false)]
        );
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.xlsx").display().to_string();
        let ds = Dataset::from_rows(&["a".to_string()], vec![]);
        assert!(matches!(
            write_xlsx(&path, &ds),
            Err(MergeError::WritingXlsx { .. })
        ));
    }
}
