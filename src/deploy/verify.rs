//! Post-stage verification by re-running detection.

use crate::state::StateProvider;
use crate::{is_suite_installed, Detection, Detector, ProductFamily};

/// Result of one verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Whether the host is in the expected state.
    pub ok: bool,
    /// The detection the verdict was based on.
    pub detection: Detection,
}

impl Verification {
    /// Short description of what was still (or not) found.
    pub fn detail(&self) -> String {
        if self.detection.is_empty() {
            "no products detected".to_string()
        } else {
            let names: Vec<String> = self
                .detection
                .products
                .iter()
                .map(|p| {
                    p.display_name
                        .clone()
                        .unwrap_or_else(|| p.product_id.clone())
                })
                .collect();
            format!("{} detected: {}", names.len(), names.join(", "))
        }
    }
}

/// Confirms the outcome of install and removal stages.
///
/// Verification never changes anything; a failed check is reported and the
/// run continues without compensating actions.
pub struct Verifier<'a, S> {
    detector: &'a Detector<S>,
}

impl<'a, S: StateProvider> Verifier<'a, S> {
    pub fn new(detector: &'a Detector<S>) -> Self {
        Self { detector }
    }

    /// The main suite is present.
    ///
    /// Evidence shared with consumer editions does not count while a
    /// consumer edition is installed.
    pub fn installed(&self) -> Verification {
        let detection = self.detector.detect_family(ProductFamily::Suite);
        Verification {
            ok: is_suite_installed(&detection, || self.detector.detect_consumer_subset()),
            detection,
        }
    }

    /// No product of `family` remains.
    pub fn removed(&self, family: ProductFamily) -> Verification {
        let detection = self.detector.detect_family(family);
        Verification {
            ok: !detection.found,
            detection,
        }
    }

    /// No consumer SKU or store package remains.
    pub fn consumer_removed(&self) -> Verification {
        let detection = self.detector.detect_consumer_subset();
        Verification {
            ok: !detection.found,
            detection,
        }
    }
}
