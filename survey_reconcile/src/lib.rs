/*!
Reconciliation of multi-year survey exports against a per-category guide.

A guide document lists, for every variable of a category, the `LV` codes the
data files must contain and the derived `xLV` codes that are computed from
other variables. [reconcile_category] turns the concatenated data files of a
category into the dataset described by its guide, and [pipeline::run_pipeline]
runs the whole sequence over every category found by a [pipeline::DataSource].

See the [manual] for the guide format and the command line.
*/

mod config;

pub mod aggregate;
pub mod builder;
pub mod code;
pub mod discovery;
pub mod guide;
pub mod manual;
pub mod merge;
pub mod pipeline;
pub mod reorder;
pub mod validate;

use log::{debug, info};

use std::collections::HashSet;

pub use crate::code::normalize_if_code;
pub use crate::config::*;

use crate::aggregate::synthesize_aggregates;
use crate::code::canonical_code;
use crate::merge::merge_case_variants;
use crate::reorder::reorder_by_guide;

/// The only columns kept in an output: the guide variables and the canonical
/// form of every mapped code.
pub fn final_column_set(guide: &Guide) -> HashSet<String> {
    guide
        .target_base_columns
        .iter()
        .cloned()
        .chain(
            guide
                .code_to_labels
                .codes()
                .map(|c| canonical_code(c).unwrap_or_else(|| c.trim().to_string())),
        )
        .collect()
}

/// Keeps the columns of the final set, in their current order.
pub fn retain_final_columns(dataset: Dataset, guide: &Guide) -> Dataset {
    let keep = final_column_set(guide);
    let (kept, dropped): (Vec<String>, Vec<String>) = dataset
        .column_names()
        .into_iter()
        .partition(|n| keep.contains(n));
    if !dropped.is_empty() {
        debug!(
            "retain_final_columns: dropping {} columns not in the guide: {:?}",
            dropped.len(),
            dropped
        );
    }
    dataset.select(&kept)
}

/// Synthesis of the derived codes, merge of the case variants, restriction
/// to the final column set and ordering, in that order.
///
/// The dataset is expected to have passed the validation gate.
pub fn reconcile_category(guide: &Guide, dataset: Dataset) -> Result<Dataset, ReconcileError> {
    info!(
        "reconcile_category: {} rows, {} columns",
        dataset.num_rows(),
        dataset.num_columns()
    );
    let dataset = synthesize_aggregates(dataset, &guide.code_to_labels)?;
    let dataset = merge_case_variants(dataset)?;
    let dataset = retain_final_columns(dataset, guide);
    let dataset = reorder_by_guide(dataset, guide);
    info!(
        "reconcile_category: done, {} columns",
        dataset.num_columns()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::guide::parse_guide;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn text(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn guide(rows: &[[&str; 3]]) -> Guide {
        let sheet = Dataset::from_rows(
            &strings(&["label", "lv", "xlv"]),
            rows.iter()
                .map(|r| r.iter().map(|s| text(s)).collect())
                .collect(),
        );
        let layout = GuideLayout {
            variable_label_column: "label".to_string(),
            required_code_columns: vec![1],
            forbidden_code_columns: vec![2],
        };
        parse_guide(&sheet, &layout).unwrap()
    }

    #[test]
    fn clean_data_round_trip() {
        init();
        let g = guide(&[["A", "", ""], ["B", "", ""], ["C", "", ""]]);
        let ds = Dataset::from_rows(
            &strings(&["B", "C", "A"]),
            vec![
                vec![Cell::Int(2), Cell::Int(3), Cell::Int(1)],
                vec![Cell::Empty, text("c"), Cell::Float(1.5)],
            ],
        );
        let res = reconcile_category(&g, ds).unwrap();
        assert_eq!(res.column_names(), g.target_base_columns);
        assert_eq!(
            res.column("A").unwrap().values,
            vec![Cell::Int(1), Cell::Float(1.5)]
        );
    }

    #[test]
    fn full_sequence() {
        init();
        let g = guide(&[
            ["Q1", "LV1", "xLV1"],
            ["Q2", "LV2", "xLV1"],
            ["Q3", "", "xLV3"],
        ]);
        let ds = Dataset::from_rows(
            &strings(&["id", "Q2", "lv2", "Q1", "LV1", "LV2", "Q3"]),
            vec![
                vec![
                    Cell::Int(1),
                    Cell::Int(4),
                    Cell::Empty,
                    Cell::Int(2),
                    Cell::Int(7),
                    Cell::Int(9),
                    Cell::Empty,
                ],
                vec![
                    Cell::Int(2),
                    Cell::Empty,
                    Cell::Int(5),
                    Cell::Int(6),
                    Cell::Int(8),
                    Cell::Int(1),
                    Cell::Empty,
                ],
            ],
        );
        let res = reconcile_category(&g, ds).unwrap();
        // "id" is not in the guide; xLV3 has no numeric source.
        assert_eq!(
            res.column_names(),
            vec!["LV1", "xLV1", "Q1", "LV2", "Q2", "xLV3", "Q3"]
        );
        assert_eq!(
            res.column("xLV1").unwrap().values,
            vec![Cell::Float(3.0), Cell::Float(6.0)]
        );
        assert_eq!(
            res.column("LV2").unwrap().values,
            vec![Cell::Int(9), Cell::Int(5)]
        );
        assert_eq!(res.column("xLV3").unwrap().values, vec![Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn final_set() {
        let g = guide(&[["Q1", " lv1 ", "xlv1"], ["Q2", "", ""]]);
        let mut set: Vec<String> = final_column_set(&g).into_iter().collect();
        set.sort();
        assert_eq!(set, strings(&["LV1", "Q1", "Q2", "xLV1"]));
    }
}
