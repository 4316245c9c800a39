//! Live registry access on Windows.

use super::{RegistryKey, StateProvider, StorePackage};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use winreg::enums::{
    HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_READ,
    KEY_WOW64_64KEY,
};
use winreg::RegKey;

/// [`StateProvider`] backed by the local machine's registry.
///
/// Keys are opened through the 64-bit view so `WOW6432Node` paths are read
/// literally. Version resources and store packages are queried through
/// PowerShell, whose failure reads as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryState;

impl RegistryState {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, path: &str) -> Option<RegKey> {
        let (hive, rest) = path.split_once('\\').unwrap_or((path, ""));
        let root = match hive.to_ascii_uppercase().as_str() {
            "HKLM" | "HKEY_LOCAL_MACHINE" => RegKey::predef(HKEY_LOCAL_MACHINE),
            "HKCU" | "HKEY_CURRENT_USER" => RegKey::predef(HKEY_CURRENT_USER),
            "HKCR" | "HKEY_CLASSES_ROOT" => RegKey::predef(HKEY_CLASSES_ROOT),
            "HKU" | "HKEY_USERS" => RegKey::predef(HKEY_USERS),
            _ => return None,
        };
        root.open_subkey_with_flags(rest.trim_end_matches('\\'), KEY_READ | KEY_WOW64_64KEY)
            .ok()
    }
}

impl StateProvider for RegistryState {
    fn read_key(&self, path: &str) -> Option<RegistryKey> {
        let key = self.open(path)?;
        let mut values = BTreeMap::new();
        for (name, _) in key.enum_values().filter_map(Result::ok) {
            if let Ok(value) = key.get_value::<String, _>(&name) {
                values.insert(name, value);
            }
        }
        Some(RegistryKey {
            path: path.trim_end_matches('\\').to_string(),
            values,
        })
    }

    fn subkeys(&self, path: &str) -> Vec<String> {
        self.open(path)
            .map(|key| key.enum_keys().filter_map(Result::ok).collect())
            .unwrap_or_default()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn file_version(&self, path: &Path) -> Option<String> {
        let script = format!(
            "(Get-Item -LiteralPath '{}').VersionInfo.ProductVersion",
            path.display().to_string().replace('\'', "''")
        );
        powershell(&script)
            .map(|out| out.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn store_packages(&self) -> Vec<StorePackage> {
        let script = concat!(
            "Get-AppxPackage -AllUsers | ForEach-Object ",
            "{ \"$($_.Name)|$($_.PackageFullName)|$($_.Version)\" }"
        );
        let Some(out) = powershell(script) else {
            return Vec::new();
        };
        out.lines()
            .filter_map(|line| {
                let mut parts = line.trim().splitn(3, '|');
                let name = parts.next()?.to_string();
                let package_full_name = parts.next()?.to_string();
                let version = parts.next().map(str::to_string).filter(|v| !v.is_empty());
                (!name.is_empty()).then_some(StorePackage {
                    name,
                    package_full_name,
                    version,
                })
            })
            .collect()
    }
}

fn powershell(script: &str) -> Option<String> {
    let output = Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", script])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(status = ?output.status.code(), "powershell query failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
