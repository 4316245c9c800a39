//! Error types for deployment runs.
//!
//! Every fatal condition a run can hit is a [`DeployError`]. Each variant
//! carries an actionable fix suggestion, and maps to one of the
//! [`ErrorCategory`] buckets that decide how the process exits.

use crate::PolicyError;
use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorCategory {
    /// Not elevated, bad configuration, conflicting flags. Nothing was changed.
    Precheck,
    /// The deployment tool could not be downloaded or extracted.
    Acquisition,
    /// An external process could not be started at all.
    Execution,
}

/// Errors that abort a deployment run.
///
/// # Example
///
/// ```rust
/// use office_deploy::DeployError;
///
/// fn handle_error(error: DeployError) {
///     eprintln!("Deployment failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
///     std::process::exit(error.exit_code());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeployError {
    /// The process lacks administrative rights.
    #[error("Administrative privileges are required")]
    NotElevated {
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// No configuration file was given, or it does not exist.
    #[error("Configuration file not found: {}", .path.display())]
    ConfigMissing {
        path: PathBuf,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The configuration file is unreadable or not a deployment configuration.
    #[error("Invalid configuration file {}: {message}", .path.display())]
    ConfigInvalid {
        path: PathBuf,
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The installed-software catalog cannot be read (no registry on this
    /// host, or an unreadable snapshot).
    #[error("Installed-software state unavailable: {message}")]
    StateUnavailable {
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// Mutually exclusive options were combined.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Downloading the deployment tool failed.
    #[error("Failed to download the deployment tool from {url}: {message}")]
    Download {
        url: String,
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// Extracting the deployment tool failed.
    #[error("Failed to extract the deployment tool: {message}")]
    Extraction {
        message: String,
        /// Exit code of the extractor, if it ran.
        exit_code: Option<i32>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// An external process could not be started.
    #[error("Failed to launch {program}: {message}")]
    Launch {
        program: String,
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The working directory could not be prepared.
    #[error("Working directory error at {}: {message}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

impl DeployError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// ```rust
    /// use office_deploy::DeployError;
    ///
    /// let error = DeployError::NotElevated {
    ///     fix: "Run the command from an elevated prompt".to_string(),
    /// };
    /// assert!(error.fix_suggestion().contains("elevated"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::NotElevated { fix } => fix,
            Self::ConfigMissing { fix, .. } => fix,
            Self::ConfigInvalid { fix, .. } => fix,
            Self::StateUnavailable { fix, .. } => fix,
            Self::Policy(e) => e.fix_suggestion(),
            Self::Download { fix, .. } => fix,
            Self::Extraction { fix, .. } => fix,
            Self::Launch { fix, .. } => fix,
            Self::WorkingDirectory { fix, .. } => fix,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotElevated { .. }
            | Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. }
            | Self::StateUnavailable { .. }
            | Self::Policy(_) => ErrorCategory::Precheck,
            Self::Download { .. } | Self::Extraction { .. } | Self::WorkingDirectory { .. } => {
                ErrorCategory::Acquisition
            }
            Self::Launch { .. } => ErrorCategory::Execution,
        }
    }

    /// Process exit code for this error. Every fatal error exits with `1`.
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub(crate) fn launch(program: impl Into<String>, err: &std::io::Error) -> Self {
        let program = program.into();
        let fix = if err.kind() == std::io::ErrorKind::PermissionDenied {
            format!("Check that {program} is executable by the current account")
        } else {
            format!("Check that {program} exists and can run on this machine")
        };
        Self::Launch {
            message: err.to_string(),
            program,
            fix,
        }
    }

    pub(crate) fn working_dir(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        Self::WorkingDirectory {
            fix: format!(
                "Make sure {} is writable, or pass another --download-dir",
                path.display()
            ),
            message: err.to_string(),
            path,
        }
    }
}
