//! # office-deploy
//!
//! Detection-driven deployment of the Office suite through the Office
//! Deployment Tool (`setup.exe /configure`).
//!
//! The crate detects what is already installed using several independent
//! registry heuristics, decides one action from that detection and the
//! operator's flags, and carries the action out with verification after
//! every stage.
//!
//! ## Features
//!
//! - `Detector` runs every heuristic against a `StateProvider` and merges
//!   the results by source key
//! - `IntentFlags`, `decide()` and `plan()` turn flags into exactly one `Action`
//! - `Orchestrator` removes consumer editions, uninstalls, installs and
//!   verifies, reporting progress through a callback
//! - `DeployReport` collects stage outcomes and warnings and derives the
//!   process exit code
//!
//! ## Example
//!
//! ```rust
//! use office_deploy::{decide, DetectOptions, Detector, Intent, ProductFamily, SnapshotState};
//!
//! let state = SnapshotState::default().with_key(
//!     r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\O365ProPlusRetail - en-us",
//!     &[
//!         ("DisplayName", "Microsoft 365 Apps for enterprise - en-us"),
//!         ("DisplayVersion", "16.0.17328.20142"),
//!     ],
//! );
//! let detector = Detector::new(&state, DetectOptions::default());
//! let detection = detector.detect_family(ProductFamily::Suite);
//!
//! for product in &detection.products {
//!     println!("{}", product.summary());
//! }
//! let action = decide(detection.found, Intent::Default);
//! assert_eq!(action.to_string(), "SkipAlreadyInstalled");
//! ```

pub mod catalog;
mod deploy;
mod detect;
mod detected;
mod detection;
pub mod logging;
mod options;
mod policy;
mod product;
pub mod state;

pub use deploy::{
    check_elevated, removal_config_xml, store_removal_invocation, validate_config,
    write_removal_config, DeployError, DeployProgress, DeployReport, DeployWarning,
    DownloadAcquirer, ErrorCategory, Orchestrator, ProcessRunner, Stage, StageOutcome,
    ToolAcquirer, ToolInvocation, ToolOutput, ToolRunner, Verification, Verifier,
    CONSUMER_REMOVAL_CONFIG, SETUP_EXE,
};
pub use detect::Detector;
pub use detected::{DetectedProduct, Detection, UNKNOWN_PRODUCT_ID};
pub use options::{DeployOptions, DetectOptions, DEFAULT_TOOL_URL};
pub use policy::{
    classify_consumer, decide, is_suite_installed, plan, Action, Intent, IntentFlags, Plan,
    PolicyError,
};
pub use product::{DetectionMethod, ProductFamily};
#[cfg(windows)]
pub use state::RegistryState;
pub use state::{RegistryKey, Snapshot, SnapshotState, StateProvider, StorePackage};
