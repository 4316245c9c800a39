//! The multi-heuristic product detector.

use crate::catalog::{self, Catalog};
use crate::detection::{
    app_paths, click_to_run, exact_key, install_root, localized_key, store_packages,
    uninstall_scan,
};
use crate::state::StateProvider;
use crate::{DetectOptions, DetectedProduct, Detection, ProductFamily};
use std::collections::HashSet;

/// Runs every detection heuristic against a [`StateProvider`] and merges the
/// results.
///
/// # Detection Process
///
/// 1. ExactKey: catalog ids under the uninstall namespaces
/// 2. LocalizedKey: catalog ids with a `" - <lang>"` suffix
/// 3. ClickToRunConfig: release ids listed in the click-to-run node
/// 4. AppPathExecutable: registered flagship binaries present on disk
/// 5. InstallRootKey: major-version install roots present on disk
/// 6. GenericUninstallScan: wildcard match over every uninstall entry
///
/// Every heuristic runs, even after an earlier one found something, since
/// each surfaces different metadata. Results are then collapsed by
/// `source_key`; the first record for a key wins.
///
/// # Example
///
/// ```rust
/// use office_deploy::{DetectOptions, Detector, ProductFamily, SnapshotState};
///
/// let state = SnapshotState::default().with_key(
///     r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\O365ProPlusRetail",
///     &[("DisplayName", "Microsoft 365 Apps for enterprise")],
/// );
/// let detector = Detector::new(&state, DetectOptions::default());
/// let detection = detector.detect_family(ProductFamily::Suite);
/// assert!(detection.found);
/// ```
pub struct Detector<S> {
    state: S,
    options: DetectOptions,
}

impl<S: StateProvider> Detector<S> {
    pub fn new(state: S, options: DetectOptions) -> Self {
        Self { state, options }
    }

    /// The underlying state provider.
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    /// Detect products from `catalog`, trying `languages` for localized keys.
    pub fn detect(&self, catalog: &Catalog, languages: &[String]) -> Detection {
        let heuristics = [
            exact_key(&self.state, catalog),
            localized_key(&self.state, catalog, languages),
            click_to_run(&self.state, catalog),
            app_paths(&self.state, catalog),
            install_root(&self.state, catalog),
            uninstall_scan(&self.state, catalog),
        ];
        let detection = merge(heuristics);
        tracing::debug!(
            catalog = catalog.name,
            found = detection.found,
            count = detection.len(),
            "detection complete"
        );
        detection
    }

    /// Detect one product family with the configured languages.
    pub fn detect_family(&self, family: ProductFamily) -> Detection {
        self.detect(family.catalog(), &self.options.languages)
    }

    /// Detect home, personal and OEM SKUs, including store packages.
    pub fn detect_consumer_subset(&self) -> Detection {
        let catalog = &catalog::CONSUMER;
        let languages = &self.options.languages;
        let heuristics = [
            exact_key(&self.state, catalog),
            localized_key(&self.state, catalog, languages),
            click_to_run(&self.state, catalog),
            app_paths(&self.state, catalog),
            install_root(&self.state, catalog),
            uninstall_scan(&self.state, catalog),
            store_packages(&self.state, catalog),
        ];
        merge(heuristics)
    }
}

/// Concatenate heuristic results, dropping repeated source keys.
///
/// Registry paths are case-insensitive, so keys are compared that way.
pub(crate) fn merge<I>(heuristics: I) -> Detection
where
    I: IntoIterator<Item = Vec<DetectedProduct>>,
{
    let mut seen = HashSet::new();
    let mut products = Vec::new();
    for product in heuristics.into_iter().flatten() {
        if seen.insert(product.source_key.to_ascii_lowercase()) {
            products.push(product);
        } else {
            tracing::trace!(
                source_key = %product.source_key,
                method = %product.detection_method,
                "duplicate detection collapsed"
            );
        }
    }
    Detection::new(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{APP_PATHS_ROOT, CLICK_TO_RUN_CONFIG};
    use crate::state::{join_key, SnapshotState};
    use crate::DetectionMethod;

    const ROOT: &str = r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    const WORD: &str = r"C:\Program Files\Microsoft Office\root\Office16\WINWORD.EXE";
    const C2R_UNINSTALL: &str = concat!(
        r#""C:\Program Files\Common Files\Microsoft Shared\ClickToRun\"#,
        r#"OfficeClickToRun.exe" scenario=install"#
    );

    fn full_state() -> SnapshotState {
        SnapshotState::default()
            .with_key(
                &format!(r"{ROOT}\O365ProPlusRetail - en-us"),
                &[
                    ("DisplayName", "Microsoft 365 Apps for enterprise - en-us"),
                    ("DisplayVersion", "16.0.17328.20142"),
                    ("UninstallString", C2R_UNINSTALL),
                ],
            )
            .with_key(
                CLICK_TO_RUN_CONFIG,
                &[
                    ("ProductReleaseIds", "O365ProPlusRetail,VisioProRetail"),
                    ("Platform", "x64"),
                    ("VersionToReport", "16.0.17328.20142"),
                ],
            )
            .with_key(&join_key(APP_PATHS_ROOT, "WINWORD.EXE"), &[("", WORD)])
            .with_key(
                r"HKLM\SOFTWARE\Microsoft\Office\16.0\Common\InstallRoot",
                &[("Path", r"C:\Program Files\Microsoft Office\root\Office16\")],
            )
            .with_file(WORD, Some("16.0.17328.20142"))
    }

    fn product(key: &str, method: DetectionMethod) -> DetectedProduct {
        DetectedProduct::new("x", key, method)
    }

    #[test]
    fn test_runs_every_heuristic() {
        let state = full_state();
        let detector = Detector::new(&state, DetectOptions::default());
        let detection = detector.detect_family(ProductFamily::Suite);

        let methods: Vec<_> = detection.products.iter().map(|p| p.detection_method).collect();
        assert_eq!(
            methods,
            vec![
                DetectionMethod::LocalizedKey,
                DetectionMethod::ClickToRunConfig,
                DetectionMethod::AppPathExecutable,
                DetectionMethod::InstallRootKey,
            ]
        );
        assert!(detection.found);
    }

    #[test]
    fn test_generic_scan_overlap_is_collapsed() {
        // The localized key is also a generic-scan hit with the same source key.
        let state = full_state();
        let detector = Detector::new(&state, DetectOptions::default());
        let detection = detector.detect_family(ProductFamily::Suite);

        let localized = detection
            .products
            .iter()
            .filter(|p| p.source_key.ends_with("O365ProPlusRetail - en-us"))
            .collect::<Vec<_>>();
        assert_eq!(localized.len(), 1);
        assert_eq!(localized[0].detection_method, DetectionMethod::LocalizedKey);
        assert_eq!(localized[0].product_id, "O365ProPlusRetail");
    }

    #[test]
    fn test_detect_is_idempotent() {
        let state = full_state();
        let detector = Detector::new(&state, DetectOptions::default());
        for family in ProductFamily::all() {
            assert_eq!(detector.detect_family(family), detector.detect_family(family));
        }
        assert_eq!(detector.detect_consumer_subset(), detector.detect_consumer_subset());
    }

    #[test]
    fn test_merge_keeps_first_record_and_ignores_case() {
        let merged = merge([
            vec![product(r"HKLM\A", DetectionMethod::ExactKey)],
            vec![
                product(r"hklm\a", DetectionMethod::GenericUninstallScan),
                product(r"HKLM\B", DetectionMethod::GenericUninstallScan),
            ],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.products[0].detection_method, DetectionMethod::ExactKey);
    }

    #[test]
    fn test_merge_order_independent_key_set() {
        let a = vec![
            product("K1", DetectionMethod::ExactKey),
            product("K2", DetectionMethod::ExactKey),
        ];
        let b = vec![
            product("K2", DetectionMethod::GenericUninstallScan),
            product("K3", DetectionMethod::GenericUninstallScan),
        ];

        let keys = |d: Detection| {
            let mut keys: Vec<_> = d.products.into_iter().map(|p| p.source_key).collect();
            keys.sort();
            keys
        };
        assert_eq!(keys(merge([a.clone(), b.clone()])), keys(merge([b, a])));
    }

    #[test]
    fn test_nothing_installed() {
        let state = SnapshotState::default();
        let detector = Detector::new(&state, DetectOptions::default());
        for family in ProductFamily::all() {
            assert!(!detector.detect_family(family).found);
        }
        assert!(!detector.detect_consumer_subset().found);
    }

    #[test]
    fn test_add_on_detected_from_click_to_run_only() {
        let state = full_state();
        let detector = Detector::new(&state, DetectOptions::default());
        let visio = detector.detect_family(ProductFamily::Visio);
        assert_eq!(visio.len(), 1);
        assert_eq!(visio.products[0].product_id, "VisioProRetail");
        assert!(!detector.detect_family(ProductFamily::Project).found);
    }
}
