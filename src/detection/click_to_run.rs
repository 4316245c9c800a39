//! Click-to-run configuration node.

use super::normalize_version;
use crate::catalog::{Catalog, CLICK_TO_RUN_CONFIG};
use crate::state::{join_key, StateProvider};
use crate::{DetectedProduct, DetectionMethod};

/// One product per release id listed in `ProductReleaseIds` that the
/// catalog's release filter accepts.
///
/// The source key is the configuration node plus the release id, so each
/// listed product stays distinct from the others and from its uninstall key.
pub(crate) fn click_to_run<S: StateProvider>(state: &S, catalog: &Catalog) -> Vec<DetectedProduct> {
    let Some(config) = state.read_key(CLICK_TO_RUN_CONFIG) else {
        return Vec::new();
    };
    let Some(release_ids) = config.value("ProductReleaseIds") else {
        return Vec::new();
    };

    let platform = config.value("Platform");
    let version = config
        .value("VersionToReport")
        .and_then(normalize_version);

    let mut found: Vec<DetectedProduct> = Vec::new();
    for id in release_ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !catalog.release_filter.accepts(id, catalog.product_ids) {
            continue;
        }
        let source_key = join_key(&config.path, id);
        if found.iter().any(|p| p.source_key.eq_ignore_ascii_case(&source_key)) {
            continue;
        }
        let mut product = DetectedProduct::new(id, source_key, DetectionMethod::ClickToRunConfig);
        product.display_name = Some(match platform {
            Some(platform) => format!("{id} ({platform})"),
            None => id.to_string(),
        });
        product.version = version.clone();
        found.push(product);
    }
    tracing::debug!(catalog = catalog.name, count = found.len(), "click-to-run release ids");
    found
}
