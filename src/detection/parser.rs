//! Version string normalization.

use regex::Regex;

/// Extract the first dotted numeric version from a raw string.
///
/// Handles the shapes the registry and version resources produce:
///
/// - `16.0.17328.20142` -> `16.0.17328.20142`
/// - `Version 2402 (Build 17328.20142)` -> `17328.20142`
/// - `15.0.4569.1506 ` -> `15.0.4569.1506`
///
/// Returns `None` when no dotted number is present.
pub(crate) fn normalize_version(raw: &str) -> Option<String> {
    let re = Regex::new(r"\d+(?:\.\d+){1,3}").expect("Invalid regex pattern");
    re.find(raw).map(|m| m.as_str().to_string())
}
