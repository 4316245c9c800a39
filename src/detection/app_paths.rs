//! Flagship executables registered under App Paths.

use super::normalize_version;
use crate::catalog::{Catalog, APP_PATHS_ROOT};
use crate::detected::UNKNOWN_PRODUCT_ID;
use crate::state::{join_key, RegistryKey, StateProvider};
use crate::{DetectedProduct, DetectionMethod};
use std::path::PathBuf;

/// Detect each catalog executable whose App Paths entry points at a file
/// that exists on disk. The version comes from the binary's version resource.
pub(crate) fn app_paths<S: StateProvider>(state: &S, catalog: &Catalog) -> Vec<DetectedProduct> {
    let mut found = Vec::new();
    for exe in catalog.app_paths {
        let Some(key) = state.read_key(&join_key(APP_PATHS_ROOT, exe)) else {
            continue;
        };
        let Some(target) = executable_path(&key, exe) else {
            continue;
        };
        if !state.path_exists(&target) {
            tracing::debug!(exe, path = %target.display(), "app path registered but file missing");
            continue;
        }

        let mut product = DetectedProduct::new(
            UNKNOWN_PRODUCT_ID,
            key.path.clone(),
            DetectionMethod::AppPathExecutable,
        );
        product.display_name = Some(exe.to_string());
        product.version = state
            .file_version(&target)
            .and_then(|v| normalize_version(&v));
        found.push(product);
    }
    found
}

/// Resolve the executable from the default value, or `Path` + name.
fn executable_path(key: &RegistryKey, exe: &str) -> Option<PathBuf> {
    if let Some(default) = key.default_value() {
        return Some(PathBuf::from(default.trim_matches('"')));
    }
    key.value("Path").map(|dir| {
        let dir = dir.trim_matches('"').trim_end_matches('\\');
        PathBuf::from(format!("{dir}\\{exe}"))
    })
}
