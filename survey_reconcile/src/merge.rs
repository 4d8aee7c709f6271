//! Merging of the columns that spell the same code with different cases.

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

use crate::code::canonical_code;
use crate::config::*;

/// Collapses every group of columns sharing a canonical code into a single
/// column named after the code.
///
/// Within a group, the leftmost column provides the values and the following
/// columns only fill the cells that are still missing. Each group takes the
/// position of its leftmost column. Other columns are untouched.
pub fn merge_case_variants(dataset: Dataset) -> Result<Dataset, ReconcileError> {
    let original: Vec<String> = dataset.column_names();
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut others: Vec<usize> = Vec::new();
    for (idx, name) in original.iter().enumerate() {
        match canonical_code(name) {
            Some(c) => groups.entry(c).or_default().push(idx),
            None => others.push(idx),
        }
    }

    let mut slots: Vec<Option<Column>> = dataset.into_columns().into_iter().map(Some).collect();

    // Codes first (sorted), then the other columns. This is only the fallback order.
    let mut built: Vec<Column> = Vec::with_capacity(groups.len() + others.len());
    let mut merged_groups = 0;
    for (canonical, members) in groups.iter() {
        let mut values: Option<Vec<Cell>> = None;
        for idx in members.iter() {
            let col = match slots[*idx].take() {
                Some(c) => c,
                None => continue,
            };
            values = Some(match values {
                None => col.values,
                Some(acc) => coalesce(acc, col.values),
            });
        }
        if members.len() > 1 {
            debug!(
                "merge_case_variants: {:?} -> {}",
                members.iter().map(|i| original[*i].as_str()).collect::<Vec<&str>>(),
                canonical
            );
            merged_groups += 1;
        }
        if let Some(values) = values {
            built.push(Column {
                name: canonical.clone(),
                values,
            });
        }
    }
    for idx in others.iter() {
        if let Some(col) = slots[*idx].take() {
            built.push(col);
        }
    }
    info!(
        "merge_case_variants: {} groups merged, {} columns",
        merged_groups,
        built.len()
    );

    let order = first_occurrence_order(&original, &built);
    Dataset::from_columns(built).map(|ds| ds.select(&order))
}

/// The target name of every original column, in order, keeping the first
/// occurrence. Built columns not reached this way are appended.
fn first_occurrence_order(original: &[String], built: &[Column]) -> Vec<String> {
    let available: HashSet<&str> = built.iter().map(|c| c.name.as_str()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(built.len());
    for name in original.iter() {
        let target = canonical_code(name).unwrap_or_else(|| name.clone());
        if available.contains(target.as_str()) && placed.insert(target.clone()) {
            order.push(target);
        }
    }
    let orphans: Vec<String> = built
        .iter()
        .map(|c| c.name.clone())
        .filter(|n| !placed.contains(n))
        .collect();
    if !orphans.is_empty() {
        warn!(
            "merge_case_variants: columns lost while rebuilding the order, appended at the end: {:?}",
            orphans
        );
        order.extend(orphans);
    }
    order
}

/// Fills the missing cells of `first` with the cells of `second`.
fn coalesce(mut first: Vec<Cell>, second: Vec<Cell>) -> Vec<Cell> {
    for (a, b) in first.iter_mut().zip(second) {
        if a.is_missing() && !b.is_missing() {
            *a = b;
        }
    }
    first
}
