//! Recognition of the `LV` / `xLV` family of variable codes.

use std::sync::LazyLock;

use regex::Regex;

/// Case-insensitive code pattern: an optional leading `x`, `LV`, then digits.
static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(x?lv)([0-9]+)$").expect("Invalid code regex"));

/// The canonical prefix of the derived (aggregate) codes.
pub const DERIVED_PREFIX: &str = "xLV";

/// True if the trimmed name is spelled like a code, in any case.
pub fn is_code(name: &str) -> bool {
    CODE_PATTERN.is_match(name.trim())
}

/// The canonical spelling (`LV<digits>` or `xLV<digits>`) of a code, or `None`
/// if the name is not a code.
pub fn canonical_code(name: &str) -> Option<String> {
    let caps = CODE_PATTERN.captures(name.trim())?;
    let digits = caps.get(2)?.as_str();
    if digits.is_empty() {
        return None;
    }
    let prefix = caps.get(1)?.as_str();
    if prefix.len() == 3 {
        Some(format!("xLV{}", digits))
    } else {
        Some(format!("LV{}", digits))
    }
}

/// Canonical form for codes, trimmed original for everything else.
pub fn normalize_if_code(name: &str) -> String {
    canonical_code(name).unwrap_or_else(|| name.trim().to_string())
}

/// True for the canonical spelling of a derived code.
pub fn is_derived(canonical: &str) -> bool {
    canonical.starts_with(DERIVED_PREFIX)
}
