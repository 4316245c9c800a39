//! Store packages in the suite namespace.

use super::{normalize_version, UninstallEntry, WildcardSet};
use crate::catalog::{Catalog, MatchRule};
use crate::state::StateProvider;
use crate::{DetectedProduct, DetectionMethod};

/// Source key prefix for store-origin products.
pub(crate) const STORE_SOURCE_PREFIX: &str = "appx:";

/// Detect installed packages matching the catalog's store rule.
pub(crate) fn store_packages<S: StateProvider>(
    state: &S,
    catalog: &Catalog,
) -> Vec<DetectedProduct> {
    let Some(rule) = catalog.store_packages else {
        return Vec::new();
    };
    let include = name_set(rule.include);
    let exclude = name_set(rule.exclude);

    let mut packages = state.store_packages();
    packages.sort_by(|a, b| a.package_full_name.cmp(&b.package_full_name));

    packages
        .into_iter()
        .filter(|pkg| {
            let entry = UninstallEntry {
                key_name: pkg.name.clone(),
                ..Default::default()
            };
            include.matches(&entry) && !exclude.matches(&entry)
        })
        .map(|pkg| {
            let mut product = DetectedProduct::new(
                pkg.name.clone(),
                format!("{STORE_SOURCE_PREFIX}{}", pkg.package_full_name),
                DetectionMethod::StorePackage,
            );
            product.display_name = Some(pkg.name);
            product.version = pkg.version.as_deref().and_then(normalize_version);
            product
        })
        .collect()
}

fn name_set(patterns: &[&'static str]) -> WildcardSet {
    let rules: Vec<MatchRule> = patterns.iter().copied().map(MatchRule::key_name).collect();
    WildcardSet::compile(&rules)
}
