//! Final column order: the guide variables as the backbone, with every code
//! placed right before the first variable it covers.

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

use crate::code::canonical_code;
use crate::config::*;

/// Computes the final order of the given columns.
///
/// * `columns` the columns of the dataset, codes already in canonical form
/// * `base_order` the guide variable labels
/// * `mapping` raw code -> variable labels
/// * `priority` raw codes, in guide order
pub fn column_order(
    columns: &[String],
    base_order: &[String],
    mapping: &CodeMapping,
    priority: &[String],
) -> Vec<String> {
    let current: HashSet<&str> = columns.iter().map(|s| s.as_str()).collect();
    let base: Vec<&str> = base_order
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && current.contains(s))
        .collect();

    // Canonical codes present in the dataset, in priority order. When several
    // spellings share a canonical code, the labels of the last spelling are used.
    let mut present_codes: Vec<String> = Vec::new();
    let mut spelling: HashMap<String, &str> = HashMap::new();
    for raw in priority.iter() {
        if let Some(c) = canonical_code(raw) {
            if current.contains(c.as_str()) {
                if !present_codes.contains(&c) {
                    present_codes.push(c.clone());
                }
                spelling.insert(c, raw.as_str());
            }
        }
    }

    let mut anchored: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut unanchored: Vec<&str> = Vec::new();
    for code in present_codes.iter() {
        let labels: Vec<&str> = spelling
            .get(code)
            .and_then(|raw| mapping.get(raw))
            .map(|ls| ls.iter().map(|l| l.trim()).collect())
            .unwrap_or_default();
        match base.iter().find(|b| labels.contains(*b)) {
            Some(anchor) => anchored.entry(*anchor).or_default().push(code.as_str()),
            None => unanchored.push(code.as_str()),
        }
    }
    debug!(
        "column_order: anchored: {:?} unanchored: {:?}",
        anchored, unanchored
    );

    let mut order: Vec<String> = Vec::with_capacity(columns.len());
    let mut emitted: HashSet<&str> = HashSet::new();
    for col in base.iter() {
        for code in anchored.get(col).map(|v| v.as_slice()).unwrap_or_default() {
            if emitted.insert(*code) {
                order.push(code.to_string());
            }
        }
        if emitted.insert(*col) {
            order.push(col.to_string());
        }
    }
    for code in unanchored.iter() {
        if emitted.insert(*code) {
            order.push(code.to_string());
        }
    }

    let remaining: Vec<&str> = columns
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !emitted.contains(s))
        .collect();
    if !remaining.is_empty() {
        warn!(
            "column_order: columns not placed by the guide, appended at the end: {:?}",
            remaining
        );
        order.extend(remaining.iter().map(|s| s.to_string()));
    }
    order
}

/// Applies [column_order] to a dataset.
pub fn reorder_by_guide(dataset: Dataset, guide: &Guide) -> Dataset {
    let order = column_order(
        &dataset.column_names(),
        &guide.target_base_columns,
        &guide.code_to_labels,
        &guide.priority_codes,
    );
    info!("reorder_by_guide: {} columns", order.len());
    dataset.select(&order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn codes_before_their_anchor() {
        let mapping = CodeMapping::default()
            .with_label("LV1", "B")
            .with_label("LV2", "Z");
        let order = column_order(
            &strings(&["C", "LV2", "A", "LV1", "B"]),
            &strings(&["A", "B", "C"]),
            &mapping,
            &strings(&["LV1", "LV2"]),
        );
        assert_eq!(order, strings(&["A", "LV1", "B", "C", "LV2"]));
    }

    #[test]
    fn first_anchor_wins() {
        let mapping = CodeMapping::default()
            .with_label("xLV1", "C")
            .with_label("xLV1", "B")
            .with_label("LV1", "C");
        let order = column_order(
            &strings(&["A", "B", "C", "LV1", "xLV1"]),
            &strings(&["A", "B", "C"]),
            &mapping,
            &strings(&["xLV1", "LV1"]),
        );
        assert_eq!(order, strings(&["A", "xLV1", "B", "LV1", "C"]));
    }

    #[test]
    fn priority_order_within_an_anchor() {
        let mapping = CodeMapping::default()
            .with_label("lv2", "A")
            .with_label("LV1", "A");
        let order = column_order(
            &strings(&["A", "LV1", "LV2"]),
            &strings(&["A"]),
            &mapping,
            &strings(&["lv2", "LV1"]),
        );
        assert_eq!(order, strings(&["LV2", "LV1", "A"]));
    }

    #[test]
    fn absent_columns_and_leftovers() {
        let mapping = CodeMapping::default().with_label("LV1", "A");
        let order = column_order(
            &strings(&["B", "extra", "A"]),
            &strings(&["A", "missing", "B"]),
            &mapping,
            &strings(&["LV1"]),
        );
        // LV1 is not in the dataset, "extra" is not in the guide.
        assert_eq!(order, strings(&["A", "B", "extra"]));
    }

    #[test]
    fn last_spelling_provides_the_labels() {
        let mapping = CodeMapping::default()
            .with_label("LV1", "A")
            .with_label("lv1", "B");
        let order = column_order(
            &strings(&["A", "B", "LV1"]),
            &strings(&["A", "B"]),
            &mapping,
            &strings(&["LV1", "lv1"]),
        );
        assert_eq!(order, strings(&["A", "LV1", "B"]));
    }

    #[test]
    fn clean_data_is_unchanged() {
        let guide = Guide {
            required_labels: Default::default(),
            forbidden_labels: Default::default(),
            code_to_labels: CodeMapping::default(),
            priority_codes: vec![],
            target_base_columns: strings(&["A", "B", "C"]),
        };
        let headers = strings(&["C", "A", "B"]);
        let ds = Dataset::from_rows(&headers, vec![vec![Cell::Int(3), Cell::Int(1), Cell::Int(2)]]);
        let res = reorder_by_guide(ds, &guide);
        assert_eq!(res.column_names(), guide.target_base_columns);
        assert_eq!(
            res.row(0).unwrap(),
            vec![&Cell::Int(1), &Cell::Int(2), &Cell::Int(3)]
        );
    }
}
