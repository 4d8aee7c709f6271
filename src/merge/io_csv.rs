// Primitives for reading CSV files.

use std::borrow::Cow;
use std::fs;

use log::{debug, info};
use snafu::prelude::*;

use crate::merge::{
    io_common::{header_names, parse_field, simplify_file_name},
    *,
};

use survey_reconcile::{Cell, Dataset};

/// Reads the whole file as text. UTF-8 is tried first, then CP949.
pub fn read_csv_text(path: &str) -> MergeResult<String> {
    let bytes = fs::read(path).context(OpeningCsvSnafu { path })?;
    decode(bytes, path)
}

fn decode(bytes: Vec<u8>, path: &str) -> MergeResult<String> {
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.trim_start_matches('\u{feff}').to_string()),
        Err(e) => {
            info!(
                "read_csv_text: {} is not UTF-8, trying CP949",
                simplify_file_name(path)
            );
            let bytes = e.into_bytes();
            let (decoded, had_errors) = encoding_rs::EUC_KR.decode_without_bom_handling(&bytes);
            if had_errors {
                return EncodingSnafu { path }.fail();
            }
            Ok(match decoded {
                Cow::Borrowed(s) => s.to_string(),
                Cow::Owned(s) => s,
            })
        }
    }
}

fn records(content: &str) -> csv::StringRecordsIntoIter<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes())
        .into_records()
}

/// Reads the first record only.
pub fn read_csv_header(path: &str) -> MergeResult<Vec<String>> {
    let content = read_csv_text(path)?;
    let header = records(&content)
        .next()
        .context(EmptyCsvSnafu { path })?
        .context(CsvParseSnafu { path })?;
    Ok(header_names(header.iter().map(|s| s.to_string()).collect(), path))
}

pub fn read_csv_table(path: &str) -> MergeResult<Dataset> {
    let content = read_csv_text(path)?;
    let mut iter = records(&content);
    let header = iter
        .next()
        .context(EmptyCsvSnafu { path })?
        .context(CsvParseSnafu { path })?;
    let headers = header_names(header.iter().map(|s| s.to_string()).collect(), path);
    debug!("read_csv_table: header: {:?}", headers);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for line_r in iter {
        let line = line_r.context(CsvParseSnafu { path })?;
        rows.push(line.iter().map(parse_field).collect());
    }
    info!(
        "read_csv_table: {}: {} rows, {} columns",
        simplify_file_name(path),
        rows.len(),
        headers.len()
    );
    Ok(Dataset::from_rows(&headers, rows))
}
