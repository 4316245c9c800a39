//! Read-only access to the host's installed-software catalog.
//!
//! Detection never touches the registry directly. It goes through a
//! [`StateProvider`], so the heuristics run unchanged against the live
//! registry ([`RegistryState`], Windows only) or an in-memory
//! [`SnapshotState`] loaded from JSON or built in tests.

#[cfg(windows)]
mod registry;
mod snapshot;

#[cfg(windows)]
pub use registry::RegistryState;
pub use snapshot::{Snapshot, SnapshotState};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A registry key and its string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryKey {
    /// Full key path, e.g. `HKLM\SOFTWARE\...\Uninstall\O365ProPlusRetail`.
    pub path: String,
    /// String values by name. The default value is stored under `""`.
    pub values: BTreeMap<String, String>,
}

impl RegistryKey {
    /// Look up a value by name, ignoring ASCII case. Empty strings read as absent.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The key's default value.
    pub fn default_value(&self) -> Option<&str> {
        self.value("")
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        key_name(&self.path)
    }
}

/// An installed store (packaged) application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorePackage {
    /// Package family name, e.g. `Microsoft.Office.OneNote`.
    pub name: String,
    /// Fully qualified package name, unique per installation.
    pub package_full_name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Query interface over the installed-software catalog.
///
/// All methods are infallible lookups: a missing key, unreadable value or
/// failed enumeration reads as absent. Detection treats absence and access
/// failure the same way.
pub trait StateProvider {
    /// Read a key and its string values.
    fn read_key(&self, path: &str) -> Option<RegistryKey>;

    /// Names (not full paths) of the direct subkeys of `path`.
    fn subkeys(&self, path: &str) -> Vec<String>;

    /// Whether a file or directory exists.
    fn path_exists(&self, path: &Path) -> bool;

    /// Product version from a binary's embedded version resource.
    fn file_version(&self, path: &Path) -> Option<String>;

    /// Installed store packages for all users.
    fn store_packages(&self) -> Vec<StorePackage>;
}

impl<T: StateProvider + ?Sized> StateProvider for &T {
    fn read_key(&self, path: &str) -> Option<RegistryKey> {
        (**self).read_key(path)
    }

    fn subkeys(&self, path: &str) -> Vec<String> {
        (**self).subkeys(path)
    }

    fn path_exists(&self, path: &Path) -> bool {
        (**self).path_exists(path)
    }

    fn file_version(&self, path: &Path) -> Option<String> {
        (**self).file_version(path)
    }

    fn store_packages(&self) -> Vec<StorePackage> {
        (**self).store_packages()
    }
}

impl<T: StateProvider + ?Sized> StateProvider for Arc<T> {
    fn read_key(&self, path: &str) -> Option<RegistryKey> {
        (**self).read_key(path)
    }

    fn subkeys(&self, path: &str) -> Vec<String> {
        (**self).subkeys(path)
    }

    fn path_exists(&self, path: &Path) -> bool {
        (**self).path_exists(path)
    }

    fn file_version(&self, path: &Path) -> Option<String> {
        (**self).file_version(path)
    }

    fn store_packages(&self) -> Vec<StorePackage> {
        (**self).store_packages()
    }
}

impl<T: StateProvider + ?Sized> StateProvider for Box<T> {
    fn read_key(&self, path: &str) -> Option<RegistryKey> {
        (**self).read_key(path)
    }

    fn subkeys(&self, path: &str) -> Vec<String> {
        (**self).subkeys(path)
    }

    fn path_exists(&self, path: &Path) -> bool {
        (**self).path_exists(path)
    }

    fn file_version(&self, path: &Path) -> Option<String> {
        (**self).file_version(path)
    }

    fn store_packages(&self) -> Vec<StorePackage> {
        (**self).store_packages()
    }
}

/// Join a registry path and a child name.
pub fn join_key(parent: &str, child: &str) -> String {
    format!("{}\\{}", parent.trim_end_matches('\\'), child)
}

/// Last segment of a registry path.
pub fn key_name(path: &str) -> &str {
    path.trim_end_matches('\\')
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}
