pub use crate::config::*;

use log::{debug, info};

use std::collections::HashMap;

/// A builder for the dataset of a category.
///
/// Frames are added in load order, each tagged with the year of its file.
///
/// ```
/// use survey_reconcile::builder::DatasetBuilder;
/// use survey_reconcile::{Cell, Dataset, ReconcileError};
///
/// let headers = vec!["Q1".to_string()];
/// let mut builder = DatasetBuilder::new();
/// builder.add_frame(24, Dataset::from_rows(&headers, vec![vec![Cell::Int(5)]]));
/// builder.add_frame(23, Dataset::from_rows(&headers, vec![vec![Cell::Int(3)]]));
///
/// let ds = builder.build()?;
/// assert_eq!(ds.column("Q1").unwrap().values, vec![Cell::Int(3), Cell::Int(5)]);
/// # Ok::<(), ReconcileError>(())
/// ```
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    _frames: Vec<(u32, Dataset)>,
}

impl DatasetBuilder {
    pub fn new() -> DatasetBuilder {
        DatasetBuilder {
            _frames: Vec::new(),
        }
    }

    pub fn add_frame(&mut self, year: u32, frame: Dataset) {
        debug!(
            "add_frame: year {}: {} rows, {} columns",
            year,
            frame.num_rows(),
            frame.num_columns()
        );
        self._frames.push((year, frame));
    }

    pub fn num_frames(&self) -> usize {
        self._frames.len()
    }

    /// Outer concatenation of all the frames, rows sorted by year.
    ///
    /// The sort is stable: the rows of the same year keep their load order.
    pub fn build(self) -> Result<Dataset, ReconcileError> {
        if self._frames.is_empty() {
            return Err(ReconcileError::NoFrames);
        }
        let duplicates: Vec<String> = self
            ._frames
            .iter()
            .flat_map(|(_, f)| f.duplicate_column_names())
            .fold(Vec::new(), |mut acc, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });
        if !duplicates.is_empty() {
            return Err(ReconcileError::DuplicateColumns {
                columns: duplicates,
            });
        }

        let mut frames = self._frames;
        frames.sort_by_key(|(year, _)| *year);

        // Union of the columns, in order of first appearance.
        let mut names: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (_, frame) in frames.iter() {
            for name in frame.column_names() {
                if !positions.contains_key(&name) {
                    positions.insert(name.clone(), names.len());
                    names.push(name);
                }
            }
        }

        let total_rows: usize = frames.iter().map(|(_, f)| f.num_rows()).sum();
        let mut values: Vec<Vec<Cell>> = names
            .iter()
            .map(|_| Vec::with_capacity(total_rows))
            .collect();
        for (_, frame) in frames {
            let num_rows = frame.num_rows();
            let mut filled = vec![false; names.len()];
            for col in frame.into_columns() {
                if let Some(idx) = positions.get(&col.name) {
                    values[*idx].extend(col.values);
                    filled[*idx] = true;
                }
            }
            for (idx, done) in filled.iter().enumerate() {
                if !done {
                    values[idx].extend(std::iter::repeat(Cell::Empty).take(num_rows));
                }
            }
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column { name, values })
            .collect();
        let res = Dataset::from_columns(columns)?;
        info!(
            "build: {} rows, {} columns",
            res.num_rows(),
            res.num_columns()
        );
        Ok(res)
    }
}
