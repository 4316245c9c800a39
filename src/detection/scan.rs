//! Generic uninstall scan driven by wildcard predicates.

use super::from_uninstall_key;
use crate::catalog::{Catalog, MatchField, MatchRule, UNINSTALL_ROOTS};
use crate::detected::UNKNOWN_PRODUCT_ID;
use crate::state::{join_key, RegistryKey, StateProvider};
use crate::{DetectedProduct, DetectionMethod};
use regex::Regex;

/// The fields of an uninstall entry the predicates see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UninstallEntry {
    pub display_name: String,
    pub uninstall_command: String,
    pub key_name: String,
}

impl UninstallEntry {
    pub fn from_key(key: &RegistryKey) -> Self {
        Self {
            display_name: key.value("DisplayName").unwrap_or_default().to_string(),
            uninstall_command: key.value("UninstallString").unwrap_or_default().to_string(),
            key_name: key.name().to_string(),
        }
    }

    fn field(&self, field: MatchField) -> &str {
        match field {
            MatchField::DisplayName => &self.display_name,
            MatchField::UninstallCommand => &self.uninstall_command,
            MatchField::KeyName => &self.key_name,
        }
    }
}

/// A compiled set of [`MatchRule`]s; matches when any rule does.
#[derive(Debug, Clone)]
pub(crate) struct WildcardSet {
    rules: Vec<(MatchField, Regex)>,
}

impl WildcardSet {
    pub fn compile(rules: &[MatchRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match wildcard_regex(rule.pattern) {
                Ok(re) => Some((rule.field, re)),
                Err(e) => {
                    tracing::warn!(
                        pattern = rule.pattern,
                        error = %e,
                        "skipping invalid match rule"
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn matches(&self, entry: &UninstallEntry) -> bool {
        self.rules
            .iter()
            .any(|(field, re)| re.is_match(entry.field(*field)))
    }
}

/// `*` matches any run of characters; everything else is literal.
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    Regex::new(&format!("(?i)^{}$", body.join(".*")))
}

/// Enumerate every uninstall entry and keep those matching the catalog's
/// include rules and none of its exclude rules.
pub(crate) fn uninstall_scan<S: StateProvider>(
    state: &S,
    catalog: &Catalog,
) -> Vec<DetectedProduct> {
    let include = WildcardSet::compile(catalog.scan.include);
    let exclude = WildcardSet::compile(catalog.scan.exclude);

    let mut found = Vec::new();
    for root in UNINSTALL_ROOTS {
        let mut names = state.subkeys(root);
        names.sort_by_key(|n| n.to_ascii_lowercase());
        for name in names {
            let Some(key) = state.read_key(&join_key(root, &name)) else {
                continue;
            };
            let entry = UninstallEntry::from_key(&key);
            if include.matches(&entry) && !exclude.matches(&entry) {
                tracing::debug!(catalog = catalog.name, key = %key.path, "generic scan match");
                found.push(from_uninstall_key(
                    UNKNOWN_PRODUCT_ID,
                    &key,
                    DetectionMethod::GenericUninstallScan,
                ));
            }
        }
    }
    found
}
