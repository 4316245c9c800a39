//! Catalog lookups under the uninstall namespaces.

use super::from_uninstall_key;
use crate::catalog::{Catalog, UNINSTALL_ROOTS};
use crate::state::{join_key, StateProvider};
use crate::{DetectedProduct, DetectionMethod};

/// Look up every catalog id directly under each uninstall root.
pub(crate) fn exact_key<S: StateProvider>(state: &S, catalog: &Catalog) -> Vec<DetectedProduct> {
    let mut found = Vec::new();
    for root in UNINSTALL_ROOTS {
        for id in catalog.product_ids {
            if let Some(key) = state.read_key(&join_key(root, id)) {
                tracing::debug!(catalog = catalog.name, key = %key.path, "exact key present");
                found.push(from_uninstall_key(id, &key, DetectionMethod::ExactKey));
            }
        }
    }
    found
}

/// Look up every catalog id suffixed with `" - <lang>"`.
pub(crate) fn localized_key<S: StateProvider>(
    state: &S,
    catalog: &Catalog,
    languages: &[String],
) -> Vec<DetectedProduct> {
    let mut found = Vec::new();
    for root in UNINSTALL_ROOTS {
        for id in catalog.product_ids {
            for lang in languages {
                let path = join_key(root, &format!("{id} - {lang}"));
                if let Some(key) = state.read_key(&path) {
                    tracing::debug!(
                        catalog = catalog.name,
                        key = %key.path,
                        "localized key present"
                    );
                    found.push(from_uninstall_key(id, &key, DetectionMethod::LocalizedKey));
                }
            }
        }
    }
    found
}
