use log::warn;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use survey_reconcile::Cell;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The lower-cased extension of a path.
pub fn file_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn output_file_name(template: &str, category: &str) -> String {
    template.replace("{category}", category)
}

/// Header names, trimmed. Blank names are replaced by `Unnamed: <position>`
/// and the k-th repeat of a name is renamed `<name>.<k>`, so that no two
/// columns of a file share a name.
pub fn header_names(raw: Vec<String>, path: &str) -> Vec<String> {
    let trimmed: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(idx, s)| {
            let t = s.trim();
            if t.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                t.to_string()
            }
        })
        .collect();
    let mut taken: HashSet<String> = trimmed.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut names: Vec<String> = Vec::with_capacity(trimmed.len());
    for name in trimmed.into_iter() {
        if seen.insert(name.clone()) {
            names.push(name);
            continue;
        }
        let k = repeats.entry(name.clone()).or_insert(0);
        let mut renamed = name.clone();
        while taken.contains(&renamed) {
            *k += 1;
            renamed = format!("{}.{}", name, k);
        }
        warn!(
            "header_names: {}: duplicated column {} renamed {}",
            simplify_file_name(path),
            name,
            renamed
        );
        taken.insert(renamed.clone());
        seen.insert(renamed.clone());
        names.push(renamed);
    }
    names
}

/// Interprets a text field. Blank and whitespace-only fields are missing,
/// integers and decimals are read as numbers, everything else stays text.
/// A whitespace-only field therefore does not block the case merge from
/// filling the cell with a later column's value.
pub fn parse_field(s: &str) -> Cell {
    let t = s.trim();
    if t.is_empty() {
        return Cell::Empty;
    }
    if let Ok(i) = t.parse::<i64>() {
        return Cell::Int(i);
    }
    match t.parse::<f64>() {
        Ok(f) if f.is_finite() => Cell::Float(f),
        _ => Cell::Text(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        assert_eq!(parse_field(" 12 "), Cell::Int(12));
        assert_eq!(parse_field("2.5"), Cell::Float(2.5));
        assert_eq!(parse_field("  "), Cell::Empty);
        assert_eq!(parse_field("inf"), Cell::Text("inf".to_string()));
        assert_eq!(parse_field("좋음"), Cell::Text("좋음".to_string()));
    }

    #[test]
    fn headers() {
        let h = header_names(
            vec![" id".to_string(), "".to_string(), "Q1 ".to_string()],
            "x.csv",
        );
        assert_eq!(h, vec!["id", "Unnamed: 1", "Q1"]);
    }

    #[test]
    fn repeated_headers_are_numbered() {
        let raw = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<String>>();
        assert_eq!(
            header_names(raw(&["Q1", "memo", "memo ", "memo"]), "x.csv"),
            vec!["Q1", "memo", "memo.1", "memo.2"]
        );
        // An existing name is never reused.
        assert_eq!(
            header_names(raw(&["memo", "memo.1", "memo"]), "x.csv"),
            vec!["memo", "memo.1", "memo.2"]
        );
    }

    #[test]
    fn names() {
        assert_eq!(file_extension("a/b/24_Bank_x.XLSX"), Some("xlsx".to_string()));
        assert_eq!(file_extension("a/b/README"), None);
        assert_eq!(simplify_file_name("a/b/24_Bank_x.csv"), "24_Bank_x.csv");
        assert_eq!(
            output_file_name("KPC_NCSI_{category}_DATA.xlsx", "Bank"),
            "KPC_NCSI_Bank_DATA.xlsx"
        );
    }
}
