//! The policy engine: operator intent plus detection in, one action out.

use crate::catalog;
use crate::detection::{UninstallEntry, WildcardSet};
use crate::{DetectedProduct, Detection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw operator flags, before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentFlags {
    pub detect_only: bool,
    pub skip_if_installed: bool,
    pub force: bool,
    pub uninstall_existing: bool,
    pub remove_consumer_office: bool,
}

/// The single validated action selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Intent {
    /// Install unless already present (also what `--skip-if-installed` asks for).
    Default,
    Force,
    UninstallExisting,
    DetectOnly,
}

/// What a run will do. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Action {
    Install,
    SkipAlreadyInstalled,
    ForceInstall,
    UninstallThenInstall,
    DetectOnlyReport,
}

impl Action {
    /// Whether the action reaches the install stage.
    pub fn installs(&self) -> bool {
        matches!(
            self,
            Self::Install | Self::ForceInstall | Self::UninstallThenInstall
        )
    }

    /// Whether the action runs the uninstall stage first.
    pub fn uninstalls_first(&self) -> bool {
        matches!(self, Self::UninstallThenInstall)
    }

    /// Whether the action may change the host at all.
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::DetectOnlyReport)
    }
}

/// A decided action plus the orthogonal consumer-removal modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub action: Action,
    /// Remove consumer SKUs before `action` runs.
    pub remove_consumer_office: bool,
}

/// Errors from validating operator intent.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    /// More than one mutually exclusive selector was given.
    #[error("Conflicting options: {} are mutually exclusive", .selectors.join(", "))]
    ConflictingSelectors {
        selectors: Vec<&'static str>,
        fix: String,
    },
}

impl PolicyError {
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::ConflictingSelectors { fix, .. } => fix,
        }
    }
}

impl IntentFlags {
    /// Validate the selectors into exactly one [`Intent`].
    ///
    /// `--force`, `--uninstall-existing`, `--skip-if-installed` and
    /// `--detect-only` exclude each other; any two together are rejected.
    ///
    /// ```rust
    /// use office_deploy::{Intent, IntentFlags};
    ///
    /// let flags = IntentFlags { force: true, ..Default::default() };
    /// assert_eq!(flags.resolve(), Ok(Intent::Force));
    ///
    /// let flags = IntentFlags { force: true, detect_only: true, ..Default::default() };
    /// assert!(flags.resolve().is_err());
    /// ```
    pub fn resolve(&self) -> Result<Intent, PolicyError> {
        let selected: Vec<(&'static str, Intent)> = [
            ("--detect-only", self.detect_only, Intent::DetectOnly),
            ("--skip-if-installed", self.skip_if_installed, Intent::Default),
            ("--force", self.force, Intent::Force),
            ("--uninstall-existing", self.uninstall_existing, Intent::UninstallExisting),
        ]
        .into_iter()
        .filter(|(_, set, _)| *set)
        .map(|(name, _, intent)| (name, intent))
        .collect();

        match selected.as_slice() {
            [] => Ok(Intent::Default),
            [(_, intent)] => Ok(*intent),
            _ => {
                let selectors: Vec<&'static str> = selected.iter().map(|(name, _)| *name).collect();
                Err(PolicyError::ConflictingSelectors {
                    fix: format!("Pass only one of {}", selectors.join(", ")),
                    selectors,
                })
            }
        }
    }
}

/// Decide the action from detection and a validated intent.
///
/// | intent | installed | action |
/// |---|---|---|
/// | DetectOnly | any | DetectOnlyReport |
/// | any other | no | Install |
/// | Default | yes | SkipAlreadyInstalled |
/// | Force | yes | ForceInstall |
/// | UninstallExisting | yes | UninstallThenInstall |
pub fn decide(is_installed: bool, intent: Intent) -> Action {
    match (intent, is_installed) {
        (Intent::DetectOnly, _) => Action::DetectOnlyReport,
        (_, false) => Action::Install,
        (Intent::Default, true) => Action::SkipAlreadyInstalled,
        (Intent::Force, true) => Action::ForceInstall,
        (Intent::UninstallExisting, true) => Action::UninstallThenInstall,
    }
}

/// Validate flags and decide in one step.
///
/// Consumer removal is never planned for a detect-only run, since that run
/// must not change the host.
pub fn plan(is_installed: bool, flags: &IntentFlags) -> Result<Plan, PolicyError> {
    let intent = flags.resolve()?;
    let action = decide(is_installed, intent);
    if flags.remove_consumer_office && !action.mutates() {
        tracing::warn!("--remove-consumer-office ignored in detect-only mode");
    }
    Ok(Plan {
        action,
        remove_consumer_office: flags.remove_consumer_office && action.mutates(),
    })
}

/// Products that belong to the consumer subset, by consumer catalog id or
/// consumer display-name markers.
pub fn classify_consumer(products: &[DetectedProduct]) -> Vec<&DetectedProduct> {
    let markers = WildcardSet::compile(catalog::consumer_markers());
    products
        .iter()
        .filter(|p| {
            if p.is_store_origin() {
                return true;
            }
            let listed = catalog::CONSUMER
                .product_ids
                .iter()
                .any(|id| id.eq_ignore_ascii_case(&p.product_id));
            let entry = UninstallEntry {
                display_name: p.display_name.clone().unwrap_or_default(),
                uninstall_command: String::new(),
                key_name: crate::state::key_name(&p.source_key).to_string(),
            };
            listed || markers.matches(&entry)
        })
        .collect()
}

/// Whether a suite detection means the business suite is really present.
///
/// The flagship executable and the install root are shared by every
/// click-to-run edition, so when they are the only evidence they count only
/// if no consumer edition is installed to explain them. `consumer` runs the
/// consumer detection lazily, for that case only.
pub fn is_suite_installed<F>(suite: &Detection, consumer: F) -> bool
where
    F: FnOnce() -> Detection,
{
    if !suite.found {
        return false;
    }
    if suite.products.iter().any(|p| !p.is_shared_signal()) {
        return true;
    }
    let consumer = consumer();
    let editions = classify_consumer(&consumer.products);
    if editions.is_empty() {
        return true;
    }
    tracing::info!(
        consumer_editions = editions.len(),
        "shared suite signals attributed to a consumer edition"
    );
    false
}
