//! Synthesis of the derived `xLV` columns.

use log::{debug, info, warn};

use crate::code::{canonical_code, is_derived};
use crate::config::*;

/// Adds one column per derived code of the mapping, equal to the row-wise mean
/// of the mapped label columns.
///
/// Codes are visited in mapping order. A code is skipped when its canonical
/// name is already a column (including one synthesized earlier in this pass),
/// or when none of its labels is a column.
pub fn synthesize_aggregates(
    mut dataset: Dataset,
    mapping: &CodeMapping,
) -> Result<Dataset, ReconcileError> {
    let mut generated = 0;
    for (code, labels) in mapping.iter() {
        let canonical = match canonical_code(code) {
            Some(c) if is_derived(&c) => c,
            _ => continue,
        };
        if dataset.contains(&canonical) {
            debug!("synthesize_aggregates: {} already present, skipping", canonical);
            continue;
        }
        let sources: Vec<&Column> = labels
            .iter()
            .filter_map(|label| dataset.column(label))
            .collect();
        if sources.is_empty() {
            warn!(
                "synthesize_aggregates: none of the labels {:?} of {} is a column, not generated",
                labels, canonical
            );
            continue;
        }
        debug!(
            "synthesize_aggregates: {} <- {:?}",
            canonical,
            sources.iter().map(|c| c.name.as_str()).collect::<Vec<&str>>()
        );
        let values = row_means(&sources, dataset.num_rows());
        dataset.push_column(&canonical, values)?;
        generated += 1;
    }
    info!(
        "synthesize_aggregates: {} columns generated, {} columns in total",
        generated,
        dataset.num_columns()
    );
    Ok(dataset)
}

/// The mean of the numeric cells of each row. Rows without any number are missing.
fn row_means(sources: &[&Column], num_rows: usize) -> Vec<Cell> {
    (0..num_rows)
        .map(|row| {
            let (sum, count) = sources
                .iter()
                .filter_map(|c| c.values.get(row).and_then(Cell::as_number))
                .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
            if count == 0 {
                Cell::Empty
            } else {
                Cell::Float(sum / count as f64)
            }
        })
        .collect()
}
