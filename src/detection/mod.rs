//! Detection heuristics.
//!
//! Each heuristic reads a [`StateProvider`] and returns the products it can
//! see, in a stable order. Merging and de-duplication happen in
//! [`Detector`](crate::Detector).
//!
//! - `exact_key` / `localized_key`: catalog ids under the uninstall namespaces
//! - `click_to_run`: release ids listed in the click-to-run configuration
//! - `app_paths`: flagship executables registered under App Paths
//! - `install_root`: legacy major-version install roots
//! - `uninstall_scan`: wildcard predicates over every uninstall entry
//! - `store_packages`: packaged apps in the suite namespace

mod app_paths;
mod click_to_run;
mod install_root;
mod keys;
mod parser;
mod scan;
mod store;

pub(crate) use app_paths::app_paths;
pub(crate) use click_to_run::click_to_run;
pub(crate) use install_root::install_root;
pub(crate) use keys::{exact_key, localized_key};
pub(crate) use parser::normalize_version;
pub(crate) use scan::{uninstall_scan, UninstallEntry, WildcardSet};
pub(crate) use store::store_packages;

use crate::state::RegistryKey;
use crate::{DetectedProduct, DetectionMethod};

/// Build a product from an uninstall entry, copying its descriptive values.
pub(crate) fn from_uninstall_key(
    product_id: &str,
    key: &RegistryKey,
    method: DetectionMethod,
) -> DetectedProduct {
    let mut product = DetectedProduct::new(product_id, key.path.clone(), method);
    product.display_name = key.value("DisplayName").map(str::to_string);
    product.version = key
        .value("DisplayVersion")
        .map(|v| normalize_version(v).unwrap_or_else(|| v.to_string()));
    product.install_date = key.value("InstallDate").map(str::to_string);
    product
}
