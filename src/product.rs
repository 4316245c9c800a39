//! Product families and detection method tags.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::catalog::{self, Catalog};

/// A commercial product family the deployment tool can install or remove.
///
/// Each family owns a fixed [`Catalog`] of identifiers and heuristics used by
/// the detector, and a matching uninstall configuration file name expected in
/// the working directory.
///
/// # Example
///
/// ```rust
/// use office_deploy::ProductFamily;
///
/// for family in ProductFamily::all() {
///     println!("{}: {}", family.display_name(), family.uninstall_config_name());
/// }
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
)]
pub enum ProductFamily {
    /// The main productivity suite (Word, Excel, PowerPoint, Outlook).
    Suite,
    /// The diagramming add-on.
    Visio,
    /// The project-management add-on.
    Project,
}

impl ProductFamily {
    /// Human-readable name for log lines and reports.
    ///
    /// ```rust
    /// use office_deploy::ProductFamily;
    ///
    /// assert_eq!(ProductFamily::Suite.display_name(), "Microsoft 365 Apps");
    /// assert_eq!(ProductFamily::Visio.display_name(), "Visio");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Suite => "Microsoft 365 Apps",
            Self::Visio => "Visio",
            Self::Project => "Project",
        }
    }

    /// File name of the uninstall configuration for this family, relative to
    /// the working directory.
    pub fn uninstall_config_name(&self) -> &'static str {
        match self {
            Self::Suite => "uninstall-office.xml",
            Self::Visio => "uninstall-visio.xml",
            Self::Project => "uninstall-project.xml",
        }
    }

    /// Detection catalog for this family.
    pub fn catalog(&self) -> &'static Catalog {
        match self {
            Self::Suite => &catalog::SUITE,
            Self::Visio => &catalog::VISIO,
            Self::Project => &catalog::PROJECT,
        }
    }

    /// Iterator over all families, in uninstall order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

/// How a [`DetectedProduct`](crate::DetectedProduct) was found.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum DetectionMethod {
    /// Catalog identifier found directly under an uninstall namespace.
    ExactKey,
    /// Catalog identifier with a `" - <lang>"` suffix.
    LocalizedKey,
    /// Listed in the click-to-run `ProductReleaseIds` value.
    ClickToRunConfig,
    /// Application path entry whose executable exists on disk.
    AppPathExecutable,
    /// Major-version install root whose path exists on disk.
    InstallRootKey,
    /// Fuzzy match while enumerating every uninstall entry.
    GenericUninstallScan,
    /// Installed store package in the suite's namespace.
    StorePackage,
}
