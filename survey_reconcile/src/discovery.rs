//! Filename rules for the guides and the data files.
//!
//! Only names are inspected here. Listing the directories is the job of the
//! [crate::pipeline::DataSource].

use log::{debug, info, warn};

use std::collections::BTreeMap;
use std::path::Path;

pub const GUIDE_EXTENSIONS: [&str; 1] = ["xlsx"];
pub const INPUT_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Files grouped by category, then by year token.
pub type InputGroups = BTreeMap<String, BTreeMap<String, Vec<String>>>;

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Spreadsheet programs leave `~$` files next to the open documents.
pub fn is_lock_file(path: &str) -> bool {
    file_name(path).starts_with("~$")
}

/// The token between the last two underscores of the file name, without
/// extension. `KPC_NCSI_Hospital_2024.xlsx` belongs to `Hospital`.
pub fn category_from_file_name(path: &str) -> Option<String> {
    let stem = Path::new(file_name(path))
        .file_stem()
        .and_then(|s| s.to_str())?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    let category = parts[parts.len() - 2].trim();
    if category.is_empty() {
        None
    } else {
        Some(category.to_string())
    }
}

/// The first two characters of the file name, when both are digits.
pub fn year_token(path: &str) -> Option<&str> {
    let name = file_name(path);
    let token = name.get(0..2)?;
    if token.chars().all(|c| c.is_ascii_digit()) {
        Some(token)
    } else {
        None
    }
}

/// The numeric value of a year token, used to sort the rows.
pub fn year_number(token: &str) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok()
}

/// Guide path for every category. Paths are considered in sorted order, and
/// the last guide of a category wins.
pub fn index_guides(paths: &[String]) -> BTreeMap<String, String> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    let mut res: BTreeMap<String, String> = BTreeMap::new();
    for path in sorted {
        if is_lock_file(path) || !has_extension(path, &GUIDE_EXTENSIONS) {
            debug!("index_guides: ignoring {:?}", path);
            continue;
        }
        let category = match category_from_file_name(path) {
            Some(c) => c,
            None => {
                warn!("index_guides: no category in guide name {:?}", path);
                continue;
            }
        };
        if let Some(previous) = res.insert(category.clone(), path.clone()) {
            warn!(
                "index_guides: two guides for category {:?}: {:?} replaced by {:?}",
                category, previous, path
            );
        }
    }
    info!("index_guides: {} categories: {:?}", res.len(), res.keys());
    res
}

/// Groups the data files by category and year. Returns the groups and the
/// number of files that were not selected.
pub fn group_inputs(
    paths: &[String],
    guides: &BTreeMap<String, String>,
    target_years: &[String],
) -> (InputGroups, usize) {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    let mut groups: InputGroups = BTreeMap::new();
    let mut skipped = 0;
    for path in sorted {
        let selected = if is_lock_file(path) || !has_extension(path, &INPUT_EXTENSIONS) {
            None
        } else {
            year_token(path)
                .filter(|y| target_years.iter().any(|t| t == y))
                .and_then(|y| {
                    category_from_file_name(path)
                        .filter(|c| guides.contains_key(c))
                        .map(|c| (c, y.to_string()))
                })
        };
        match selected {
            Some((category, year)) => {
                debug!("group_inputs: {:?} -> {} / {}", path, category, year);
                groups
                    .entry(category)
                    .or_default()
                    .entry(year)
                    .or_default()
                    .push(path.clone());
            }
            None => {
                debug!("group_inputs: skipping {:?}", path);
                skipped += 1;
            }
        }
    }
    info!(
        "group_inputs: {} categories with data, {} files skipped",
        groups.len(),
        skipped
    );
    (groups, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn category() {
        assert_eq!(
            category_from_file_name("guides/KPC_NCSI_Hospital_2024.xlsx"),
            Some("Hospital".to_string())
        );
        assert_eq!(
            category_from_file_name("24_Bank_raw.csv"),
            Some("Bank".to_string())
        );
        assert_eq!(
            category_from_file_name("a_ Retail _b.xls"),
            Some("Retail".to_string())
        );
        assert_eq!(category_from_file_name("Hospital_2024.xlsx"), None);
        assert_eq!(category_from_file_name("a__b.xlsx"), None);
    }

    #[test]
    fn years() {
        assert_eq!(year_token("data/2023/23_Bank_x.csv"), Some("23"));
        assert_eq!(year_token("x23_Bank_x.csv"), None);
        assert_eq!(year_token("2"), None);
        assert_eq!(year_token("가나_Bank_x.csv"), None);
        assert_eq!(year_number("07"), Some(7));
        assert_eq!(year_number("ab"), None);
    }

    #[test]
    fn guides_last_one_wins() {
        let guides = index_guides(&strings(&[
            "g/v2_NCSI_Bank_guide.xlsx",
            "g/v1_NCSI_Bank_guide.xlsx",
            "g/~$v3_NCSI_Bank_guide.xlsx",
            "g/NCSI_Hospital_guide.XLSX",
            "g/NCSI_Retail_guide.csv",
            "g/README.xlsx",
        ]));
        assert_eq!(guides.len(), 2);
        assert_eq!(guides["Bank"], "g/v2_NCSI_Bank_guide.xlsx");
        assert_eq!(guides["Hospital"], "g/NCSI_Hospital_guide.XLSX");
    }

    #[test]
    fn inputs_grouping() {
        let guides = index_guides(&strings(&["NCSI_Bank_g.xlsx", "NCSI_Hospital_g.xlsx"]));
        let years = strings(&["24", "23"]);
        let (groups, skipped) = group_inputs(
            &strings(&[
                "d/24_Bank_b.xlsx",
                "d/24_Bank_a.CSV",
                "d/23_Bank_a.xls",
                "d/22_Bank_a.csv",
                "d/24_Retail_a.csv",
                "d/24_Hospital_a.sav",
                "d/~$24_Hospital_a.xlsx",
                "d/24_Hospital_a.xlsx",
            ]),
            &guides,
            &years,
        );
        assert_eq!(skipped, 4);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["Bank"]["24"],
            strings(&["d/24_Bank_a.CSV", "d/24_Bank_b.xlsx"])
        );
        assert_eq!(groups["Bank"]["23"], strings(&["d/23_Bank_a.xls"]));
        assert_eq!(groups["Hospital"]["24"], strings(&["d/24_Hospital_a.xlsx"]));
    }
}
