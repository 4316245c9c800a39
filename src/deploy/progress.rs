//! Progress reporting for deployment runs.
//!
//! The orchestrator reports each stage it enters through a caller-supplied
//! callback, so a CLI can print status lines and tests can assert the exact
//! stage sequence.

use crate::{Action, ProductFamily};

/// Stages of a deployment run.
///
/// # Example
///
/// ```rust
/// use office_deploy::DeployProgress;
///
/// fn on_progress(progress: DeployProgress) {
///     match &progress {
///         DeployProgress::Uninstalling { family } => {
///             println!("Uninstalling {}...", family.display_name());
///         }
///         other => println!("{}", other.description()),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployProgress {
    /// The run has decided its action.
    Started { action: Action },

    /// Removing consumer SKUs.
    RemovingConsumer,

    /// Uninstalling one product family.
    Uninstalling { family: ProductFamily },

    /// Downloading and extracting the deployment tool.
    Acquiring,

    /// Running the deployment tool with the operator configuration.
    Installing,

    /// Re-running detection to confirm the outcome of a stage.
    Verifying,

    /// The run finished; `success` reflects the final verification.
    Completed { success: bool },
}

impl DeployProgress {
    /// Get a human-readable description of the current stage.
    ///
    /// ```rust
    /// use office_deploy::DeployProgress;
    ///
    /// assert_eq!(DeployProgress::Acquiring.description(), "Acquiring deployment tool");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Starting deployment",
            Self::RemovingConsumer => "Removing consumer editions",
            Self::Uninstalling { .. } => "Uninstalling existing products",
            Self::Acquiring => "Acquiring deployment tool",
            Self::Installing => "Installing",
            Self::Verifying => "Verifying",
            Self::Completed { .. } => "Deployment complete",
        }
    }

    /// Check if this stage ends the run.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
