//! Utility functions and helpers.

pub mod http;

/// Collapse whitespace runs (including non-breaking spaces) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the comma-separated values inside the first `( ... )` of a string.
///
/// Single quotes are dropped, so `go('202','1')` yields `["202", "1"]`.
pub fn extract_call_params(attr: &str) -> Option<Vec<String>> {
    let open = attr.find('(')?;
    let close = open + attr[open..].find(')')?;
    Some(
        attr[open + 1..close]
            .split(',')
            .map(|s| s.replace('\'', "").trim().to_string())
            .collect(),
    )
}
