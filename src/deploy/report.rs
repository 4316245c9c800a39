//! Outcome of a deployment run.

use crate::{Action, Detection, ProductFamily};
use serde::Serialize;
use std::fmt;

/// A step of the orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    ConsumerRemoval,
    StorePackageRemoval,
    Uninstall(ProductFamily),
    Install,
    Restart,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsumerRemoval => write!(f, "consumer removal"),
            Self::StorePackageRemoval => write!(f, "store package removal"),
            Self::Uninstall(family) => write!(f, "uninstall {}", family.display_name()),
            Self::Install => write!(f, "install"),
            Self::Restart => write!(f, "restart scheduling"),
            Self::Cleanup => write!(f, "working directory cleanup"),
        }
    }
}

/// A non-fatal problem. The run carried on after recording it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeployWarning {
    /// The external tool exited non-zero.
    StageExit { stage: Stage, exit_code: i32 },
    /// A stage could not run (missing configuration, launch failure).
    StageFailed { stage: Stage, message: String },
    /// Detection after a stage did not show the expected state.
    Verification { stage: Stage, detail: String },
}

impl DeployWarning {
    pub fn stage(&self) -> Stage {
        match self {
            Self::StageExit { stage, .. }
            | Self::StageFailed { stage, .. }
            | Self::Verification { stage, .. } => *stage,
        }
    }

    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Verification { .. })
    }
}

impl fmt::Display for DeployWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StageExit { stage, exit_code } => {
                write!(f, "{stage} exited with code {exit_code}")
            }
            Self::StageFailed { stage, message } => write!(f, "{stage} failed: {message}"),
            Self::Verification { stage, detail } => {
                write!(f, "{stage} verification failed: {detail}")
            }
        }
    }
}

/// What happened in one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    /// Exit code of the external tool, if it ran.
    pub exit_code: Option<i32>,
    /// Result of the post-stage detection, if one ran.
    pub verified: Option<bool>,
}

/// Everything a run did, and the exit code it implies.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub action: Action,
    /// Suite detection that drove the decision.
    pub detection: Detection,
    /// Consumer detection, when consumer removal was requested.
    pub consumer: Option<Detection>,
    pub stages: Vec<StageOutcome>,
    pub warnings: Vec<DeployWarning>,
    /// Families whose uninstall did not complete.
    pub failed_families: Vec<ProductFamily>,
    /// Exit code of the install stage's tool run.
    pub install_exit_code: Option<i32>,
    /// Whether the suite was detected after the install stage, or after
    /// consumer removal when the install was skipped.
    pub install_verified: Option<bool>,
}

impl DeployReport {
    pub(crate) fn new(action: Action, detection: Detection) -> Self {
        Self {
            action,
            detection,
            consumer: None,
            stages: Vec::new(),
            warnings: Vec::new(),
            failed_families: Vec::new(),
            install_exit_code: None,
            install_verified: None,
        }
    }

    pub(crate) fn warn(&mut self, warning: DeployWarning) {
        tracing::warn!(stage = %warning.stage(), "{warning}");
        self.warnings.push(warning);
    }

    pub(crate) fn record(&mut self, stage: Stage, exit_code: Option<i32>, verified: Option<bool>) {
        self.stages.push(StageOutcome {
            stage,
            exit_code,
            verified,
        });
    }

    /// Outcome of a stage, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Process exit code.
    ///
    /// Only the suite's final state affects it: `0` without an install or
    /// after a verified install; otherwise the installer's own non-zero code,
    /// or `1` when the installer claimed success or never ran.
    ///
    /// ```rust
    /// use office_deploy::{Action, DeployReport, Detection};
    ///
    /// let mut report = DeployReport::skipped(Action::SkipAlreadyInstalled, Detection::default());
    /// assert_eq!(report.exit_code(), 0);
    ///
    /// report.install_exit_code = Some(17);
    /// report.install_verified = Some(true);
    /// assert_eq!(report.exit_code(), 0);
    ///
    /// report.install_verified = Some(false);
    /// assert_eq!(report.exit_code(), 17);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match (self.install_verified, self.install_exit_code) {
            (None, _) | (Some(true), _) => 0,
            (Some(false), Some(code)) if code != 0 => code,
            (Some(false), _) => 1,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code() == 0
    }

    /// A report for a run that changed nothing.
    pub fn skipped(action: Action, detection: Detection) -> Self {
        Self::new(action, detection)
    }

    /// Plain-text rendering for the console.
    pub fn render(&self) -> String {
        let mut out = format!("Action: {}\n", self.action);
        if self.detection.is_empty() {
            out.push_str("No Office products detected\n");
        } else {
            out.push_str(&format!("Detected {} product(s):\n", self.detection.len()));
            for product in &self.detection.products {
                out.push_str(&format!("  - {}\n", product.summary()));
            }
        }
        if let Some(consumer) = &self.consumer {
            out.push_str(&format!("Consumer editions found: {}\n", consumer.len()));
        }
        for warning in &self.warnings {
            out.push_str(&format!("Warning: {warning}\n"));
        }
        out.push_str(&format!("Exit code: {}\n", self.exit_code()));
        out
    }
}
