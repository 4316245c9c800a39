//! Detection and deployment options.
//!
//! This module provides [`DetectOptions`] for the detector and
//! [`DeployOptions`] for the orchestrator. Both carry sensible defaults so
//! callers only set what differs.

use crate::catalog::DEFAULT_LANGUAGES;
use std::path::PathBuf;
use std::time::Duration;

/// Download location of the deployment tool's self-extracting package.
pub const DEFAULT_TOOL_URL: &str =
    "https://download.microsoft.com/download/2/7/A/27AF1BE6-DD20-4CB4-B154-EBAB8A7D4A7E/officedeploymenttool_17328-20162.exe";

/// Configuration options for detection.
///
/// # Example
///
/// ```rust
/// use office_deploy::DetectOptions;
///
/// let opts = DetectOptions::default();
/// assert!(opts.languages.iter().any(|l| l == "en-us"));
///
/// let opts = DetectOptions::with_extra_languages(["hu-hu"]);
/// assert!(opts.languages.iter().any(|l| l == "hu-hu"));
/// ```
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Language tags tried for localized uninstall keys.
    ///
    /// Default: the built-in list of common installer languages.
    pub languages: Vec<String>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl DetectOptions {
    /// Defaults plus additional language tags, lowercased and de-duplicated.
    pub fn with_extra_languages<I, L>(extra: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut opts = Self::default();
        for lang in extra {
            let lang = lang.as_ref().trim().to_ascii_lowercase();
            if !lang.is_empty() && !opts.languages.contains(&lang) {
                opts.languages.push(lang);
            }
        }
        opts
    }
}

/// Configuration options for a deployment run.
///
/// # Default Behavior
///
/// The working directory is `office-deploy` under the system temp directory,
/// no restart is scheduled, consumer SKUs are left alone, and the working
/// directory is removed after a verified-successful install.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Operator configuration handed to the deployment tool.
    ///
    /// Required for every action that installs.
    pub config_path: Option<PathBuf>,

    /// Working directory for the tool, its extracted files and generated
    /// removal configurations.
    pub download_dir: PathBuf,

    /// Schedule a restart after a verified-successful install.
    pub restart: bool,

    /// Delay before the scheduled restart.
    ///
    /// Default: 5 minutes
    pub restart_delay: Duration,

    /// Where to fetch the deployment tool from.
    pub tool_url: String,

    /// Delete the working directory after a verified-successful install.
    ///
    /// Default: `true`
    pub cleanup_on_success: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            download_dir: std::env::temp_dir().join("office-deploy"),
            restart: false,
            restart_delay: Duration::from_secs(300),
            tool_url: DEFAULT_TOOL_URL.to_string(),
            cleanup_on_success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_languages() {
        let opts = DetectOptions::default();
        assert_eq!(opts.languages.len(), DEFAULT_LANGUAGES.len());
    }

    #[test]
    fn test_extra_languages_are_normalized_and_deduplicated() {
        let opts = DetectOptions::with_extra_languages(["HU-HU", "en-us", " ", "hu-hu"]);
        assert_eq!(opts.languages.len(), DEFAULT_LANGUAGES.len() + 1);
        assert_eq!(opts.languages.last().map(String::as_str), Some("hu-hu"));
    }

    #[test]
    fn test_deploy_defaults() {
        let opts = DeployOptions::default();
        assert!(opts.config_path.is_none());
        assert!(opts.download_dir.ends_with("office-deploy"));
        assert!(!opts.restart);
        assert_eq!(opts.restart_delay, Duration::from_secs(300));
        assert!(opts.cleanup_on_success);
        assert!(opts.tool_url.starts_with("https://"));
    }
}
