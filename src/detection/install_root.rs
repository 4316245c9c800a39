//! Legacy major-version install roots.

use crate::catalog::{Catalog, InstallRoot};
use crate::detected::UNKNOWN_PRODUCT_ID;
use crate::state::StateProvider;
use crate::{DetectedProduct, DetectionMethod};
use std::path::Path;

const NATIVE_SOFTWARE: &str = r"HKLM\SOFTWARE\";
const WOW_SOFTWARE: &str = r"HKLM\SOFTWARE\WOW6432Node\";

/// Detect each install root whose path value exists on disk, in both the
/// native and 32-bit registry views.
pub(crate) fn install_root<S: StateProvider>(state: &S, catalog: &Catalog) -> Vec<DetectedProduct> {
    let mut found = Vec::new();
    for root in catalog.install_roots {
        for key_path in views(root) {
            let Some(key) = state.read_key(&key_path) else {
                continue;
            };
            let Some(dir) = key.value(root.value) else {
                continue;
            };
            if !state.path_exists(Path::new(dir.trim_matches('"'))) {
                tracing::debug!(version = root.version, dir, "install root registered but missing");
                continue;
            }
            let mut product = DetectedProduct::new(
                UNKNOWN_PRODUCT_ID,
                key.path.clone(),
                DetectionMethod::InstallRootKey,
            );
            product.display_name = Some(format!("Office {} ({})", root.version, dir));
            product.version = Some(root.version.to_string());
            found.push(product);
        }
    }
    found
}

fn views(root: &InstallRoot) -> Vec<String> {
    let mut paths = vec![root.key.to_string()];
    if let Some(rest) = root.key.strip_prefix(NATIVE_SOFTWARE) {
        paths.push(format!("{WOW_SOFTWARE}{rest}"));
    }
    paths
}
