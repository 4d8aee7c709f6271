//! The validation gate: required labels must be present in the inputs, and
//! forbidden labels must not be.

use log::{debug, error, info};

use std::collections::BTreeSet;

use crate::code::normalize_if_code;
use crate::config::ValidationOutcome;

/// The union of the normalized column names of all the given files.
pub fn observed_columns<'a, I>(files: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    files
        .into_iter()
        .flat_map(|names| names.iter())
        .map(|n| normalize_if_code(n))
        .filter(|n| !n.is_empty())
        .collect()
}

/// Runs the gate. The forbidden check is only evaluated when the required
/// check passes.
pub fn validate(
    required: &BTreeSet<String>,
    forbidden: &BTreeSet<String>,
    actual: &BTreeSet<String>,
) -> ValidationOutcome {
    debug!(
        "validate: required: {:?} forbidden: {:?} actual: {:?}",
        required, forbidden, actual
    );
    let missing: BTreeSet<String> = required.difference(actual).cloned().collect();
    if !missing.is_empty() {
        error!("validate: required labels missing from the inputs: {:?}", missing);
        return ValidationOutcome::MissingRequired(missing);
    }
    let present: BTreeSet<String> = forbidden.intersection(actual).cloned().collect();
    if !present.is_empty() {
        error!(
            "validate: labels that must be derived are already present in the inputs: {:?}",
            present
        );
        return ValidationOutcome::ForbiddenPresent(present);
    }
    info!("validate: passed ({} columns observed)", actual.len());
    ValidationOutcome::Pass
}
