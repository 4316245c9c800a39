//! Detection result types.

use crate::state::key_name;
use crate::DetectionMethod;
use serde::{Deserialize, Serialize};

/// Product id used when a heuristic cannot name the SKU.
pub const UNKNOWN_PRODUCT_ID: &str = "unknown";

/// One recognized installation signal.
///
/// Records are created fresh on every detection run and never persisted.
/// Two records with the same `source_key` describe the same installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedProduct {
    /// Catalog code such as `O365ProPlusRetail`, or `"unknown"`.
    pub product_id: String,
    pub display_name: Option<String>,
    pub version: Option<String>,
    pub install_date: Option<String>,
    /// Unique origin of the signal (registry path, package name).
    pub source_key: String,
    pub detection_method: DetectionMethod,
}

impl DetectedProduct {
    pub(crate) fn new(
        product_id: impl Into<String>,
        source_key: impl Into<String>,
        detection_method: DetectionMethod,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            display_name: None,
            version: None,
            install_date: None,
            source_key: source_key.into(),
            detection_method,
        }
    }

    /// Whether the record came from the store-package heuristic.
    pub fn is_store_origin(&self) -> bool {
        self.detection_method == DetectionMethod::StorePackage
    }

    /// Whether the signal is shared by every edition on the machine
    /// (flagship executable, install root) instead of naming a product.
    pub fn is_shared_signal(&self) -> bool {
        matches!(
            self.detection_method,
            DetectionMethod::AppPathExecutable | DetectionMethod::InstallRootKey
        )
    }

    /// Release id the deployment tool accepts in a `<Product ID=..>` element.
    ///
    /// Generic-scan hits carry no catalog id; their uninstall key name is the
    /// release id when it looks like one (`HomeStudent2019Retail - en-us`).
    ///
    /// ```rust
    /// use office_deploy::{DetectedProduct, DetectionMethod};
    ///
    /// let product = DetectedProduct {
    ///     product_id: "unknown".to_string(),
    ///     display_name: None,
    ///     version: None,
    ///     install_date: None,
    ///     source_key: r"HKLM\SOFTWARE\Uninstall\HomeStudent2019Retail - en-us".to_string(),
    ///     detection_method: DetectionMethod::GenericUninstallScan,
    /// };
    /// assert_eq!(product.release_id().as_deref(), Some("HomeStudent2019Retail"));
    /// ```
    pub fn release_id(&self) -> Option<String> {
        match self.detection_method {
            DetectionMethod::StorePackage => None,
            _ if self.product_id != UNKNOWN_PRODUCT_ID => Some(self.product_id.clone()),
            DetectionMethod::GenericUninstallScan => {
                let name = key_name(&self.source_key);
                let base = name.split(" - ").next().unwrap_or(name).trim();
                let looks_like_id = !base.is_empty()
                    && base.chars().all(|c| c.is_ascii_alphanumeric())
                    && (base.ends_with("Retail") || base.ends_with("Volume"));
                looks_like_id.then(|| base.to_string())
            }
            _ => None,
        }
    }

    /// One-line description for reports.
    pub fn summary(&self) -> String {
        format!(
            "{} (version {}) [{} via {}]",
            self.display_name.as_deref().unwrap_or(&self.product_id),
            self.version.as_deref().unwrap_or("unknown"),
            self.source_key,
            self.detection_method
        )
    }
}

/// Merged result of one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// `true` when at least one product was detected.
    pub found: bool,
    /// De-duplicated products, in heuristic merge order.
    pub products: Vec<DetectedProduct>,
}

impl Detection {
    pub fn new(products: Vec<DetectedProduct>) -> Self {
        Self {
            found: !products.is_empty(),
            products,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Distinct release ids, sorted, for scoping a removal configuration.
    pub fn release_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .products
            .iter()
            .filter_map(DetectedProduct::release_id)
            .collect();
        ids.sort_by_key(|id| id.to_ascii_lowercase());
        ids.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        ids
    }

    /// Store-origin records.
    pub fn store_packages(&self) -> impl Iterator<Item = &DetectedProduct> {
        self.products.iter().filter(|p| p.is_store_origin())
    }
}
