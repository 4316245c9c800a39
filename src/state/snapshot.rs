//! In-memory catalog state, loadable from JSON.

use super::{RegistryKey, StateProvider, StorePackage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Serializable catalog contents.
///
/// ```json
/// {
///   "keys": {
///     "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\O365ProPlusRetail - en-us": {
///       "DisplayName": "Microsoft 365 Apps for enterprise - en-us",
///       "DisplayVersion": "16.0.17328.20142"
///     }
///   },
///   "files": {
///     "C:\\Program Files\\Microsoft Office\\root\\Office16\\WINWORD.EXE": "16.0.17328.20142"
///   },
///   "store_packages": []
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub keys: BTreeMap<String, BTreeMap<String, String>>,
    /// Existing paths, with the version resource for binaries.
    #[serde(default)]
    pub files: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub store_packages: Vec<StorePackage>,
}

/// A [`StateProvider`] over a [`Snapshot`].
///
/// Lookups ignore ASCII case like the registry does. The snapshot sits behind
/// a lock so a scripted tool runner can mutate it to simulate installs.
#[derive(Debug, Default)]
pub struct SnapshotState {
    inner: RwLock<Snapshot>,
}

impl SnapshotState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Builder form of [`insert_key`](Self::insert_key).
    pub fn with_key(self, path: &str, values: &[(&str, &str)]) -> Self {
        self.insert_key(path, values);
        self
    }

    /// Builder form of [`insert_file`](Self::insert_file).
    pub fn with_file(self, path: &str, version: Option<&str>) -> Self {
        self.insert_file(path, version);
        self
    }

    /// Builder form of [`insert_store_package`](Self::insert_store_package).
    pub fn with_store_package(self, name: &str, full_name: &str) -> Self {
        self.insert_store_package(name, full_name);
        self
    }

    pub fn insert_key(&self, path: &str, values: &[(&str, &str)]) {
        let values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut inner = self.write();
        let existing = inner
            .keys
            .keys()
            .find(|k| k.eq_ignore_ascii_case(path))
            .cloned();
        if let Some(existing) = existing {
            inner.keys.remove(&existing);
        }
        inner.keys.insert(path.to_string(), values);
    }

    /// Remove a key and everything below it.
    pub fn remove_key(&self, path: &str) {
        let prefix = format!("{}\\", path.to_ascii_lowercase());
        self.write().keys.retain(|k, _| {
            let lower = k.to_ascii_lowercase();
            lower != path.to_ascii_lowercase() && !lower.starts_with(&prefix)
        });
    }

    /// Remove every key whose last segment contains `fragment` (ignoring case).
    pub fn remove_keys_containing(&self, fragment: &str) {
        let fragment = fragment.to_ascii_lowercase();
        self.write().keys.retain(|k, _| {
            !super::key_name(k)
                .to_ascii_lowercase()
                .contains(&fragment)
        });
    }

    pub fn insert_file(&self, path: &str, version: Option<&str>) {
        self.write()
            .files
            .insert(path.to_string(), version.map(str::to_string));
    }

    pub fn insert_store_package(&self, name: &str, full_name: &str) {
        self.write().store_packages.push(StorePackage {
            name: name.to_string(),
            package_full_name: full_name.to_string(),
            version: None,
        });
    }

    pub fn remove_store_package(&self, name: &str) {
        self.write()
            .store_packages
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateProvider for SnapshotState {
    fn read_key(&self, path: &str) -> Option<RegistryKey> {
        let path = path.trim_end_matches('\\');
        self.read()
            .keys
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(path))
            .map(|(k, values)| RegistryKey {
                path: k.clone(),
                values: values.clone(),
            })
    }

    fn subkeys(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}\\", path.trim_end_matches('\\').to_ascii_lowercase());
        let mut names: Vec<String> = Vec::new();
        for key in self.read().keys.keys() {
            if !key.to_ascii_lowercase().starts_with(&prefix) {
                continue;
            }
            let rest = &key[prefix.len()..];
            let child = rest.split('\\').next().unwrap_or(rest);
            if !child.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(child)) {
                names.push(child.to_string());
            }
        }
        names
    }

    fn path_exists(&self, path: &Path) -> bool {
        let wanted = path.to_string_lossy();
        let wanted = wanted.trim_end_matches(['\\', '/']);
        self.read().files.keys().any(|f| {
            let f = f.trim_end_matches(['\\', '/']);
            f.eq_ignore_ascii_case(wanted)
                || f.to_ascii_lowercase()
                    .starts_with(&format!("{}\\", wanted.to_ascii_lowercase()))
        })
    }

    fn file_version(&self, path: &Path) -> Option<String> {
        let wanted = path.to_string_lossy();
        self.read()
            .files
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(&wanted))
            .and_then(|(_, v)| v.clone())
    }

    fn store_packages(&self) -> Vec<StorePackage> {
        self.read().store_packages.clone()
    }
}
