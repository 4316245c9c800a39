//! Pre-flight checks run before anything is changed.
//!
//! This module provides [`check_elevated`] and [`validate_config`]. Both
//! fail with a precheck-category [`DeployError`] carrying a fix suggestion.

use crate::deploy::runner::{ToolInvocation, ToolRunner};
use crate::DeployError;
use std::path::{Path, PathBuf};

/// Check that the process runs with administrative rights.
///
/// Windows: `net session` only succeeds for an elevated token.
/// Elsewhere: `id -u` must print `0`.
pub async fn check_elevated<R: ToolRunner>(runner: &R) -> Result<(), DeployError> {
    if is_elevated(runner).await {
        return Ok(());
    }
    Err(DeployError::NotElevated {
        fix: if cfg!(windows) {
            "Run the command from an elevated (Run as administrator) prompt".to_string()
        } else {
            "Re-run the command as root".to_string()
        },
    })
}

async fn is_elevated<R: ToolRunner>(runner: &R) -> bool {
    let check = if cfg!(windows) {
        ToolInvocation::new("net").arg("session")
    } else {
        ToolInvocation::new("id").arg("-u")
    };
    match runner.run(&check).await {
        Ok(output) if cfg!(windows) => output.success(),
        Ok(output) => output.success() && output.stdout.trim() == "0",
        Err(e) => {
            tracing::debug!(error = %e, "elevation check could not run");
            false
        }
    }
}

/// Validate the operator configuration file.
///
/// The file must exist, parse as XML, have a `Configuration` root, and
/// contain an `Add` or `Remove` element. Its contents are otherwise opaque.
///
/// Returns the path on success.
pub fn validate_config(path: Option<&Path>) -> Result<PathBuf, DeployError> {
    let Some(path) = path else {
        return Err(DeployError::ConfigMissing {
            path: PathBuf::new(),
            fix: "Pass the deployment configuration with --config <path>".to_string(),
        });
    };
    if !path.is_file() {
        return Err(DeployError::ConfigMissing {
            path: path.to_path_buf(),
            fix: format!("Check that {} exists and is a file", path.display()),
        });
    }

    let invalid = |message: String| DeployError::ConfigInvalid {
        path: path.to_path_buf(),
        message,
        fix: "Export a fresh configuration from the Office Customization Tool".to_string(),
    };

    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let text = text.trim_start_matches('\u{feff}');
    let doc = roxmltree::Document::parse(text).map_err(|e| invalid(e.to_string()))?;

    let root = doc.root_element();
    if !root.has_tag_name("Configuration") {
        return Err(invalid(format!(
            "root element is <{}>, expected <Configuration>",
            root.tag_name().name()
        )));
    }
    let has_work = root
        .children()
        .any(|n| n.has_tag_name("Add") || n.has_tag_name("Remove"));
    if !has_work {
        return Err(invalid("no <Add> or <Remove> element".to_string()));
    }

    tracing::debug!(path = %path.display(), "configuration validated");
    Ok(path.to_path_buf())
}
