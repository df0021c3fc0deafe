use std::collections::BTreeMap;

/// Collects keys from the first map that are not present in the second map.
pub fn collect_missing_keys<'a>(
    first: &'a BTreeMap<String, String>,
    second: &'a BTreeMap<String, String>,
) -> Vec<&'a str> {
    first
        .iter()
        .filter(|(key, _)| !second.contains_key(key.as_str()))
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Collects keys that are missing in the second map or hold a different value there.
pub fn collect_missing_or_different_keys<'a>(
    first: &'a BTreeMap<String, String>,
    second: &'a BTreeMap<String, String>,
) -> Vec<&'a str> {
    first
        .iter()
        .filter(|(key, value)| second.get(key.as_str()) != Some(value))
        .map(|(key, _)| key.as_str())
        .collect()
}

pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}
