//! Deployment execution: prechecks, tool acquisition, the orchestrated
//! stages and their report.
//!
//! # Example
//!
//! ```rust
//! use office_deploy::{DeployError, DeployProgress, ErrorCategory};
//!
//! fn on_progress(progress: DeployProgress) {
//!     println!("{}", progress.description());
//! }
//!
//! fn on_error(error: &DeployError) {
//!     if error.category() == ErrorCategory::Precheck {
//!         eprintln!("Nothing was changed. {}", error.fix_suggestion());
//!     }
//! }
//! ```

mod acquire;
mod errors;
mod executor;
mod precheck;
mod progress;
mod removal;
mod report;
mod runner;
mod verify;

pub use acquire::{DownloadAcquirer, ToolAcquirer, SETUP_EXE};
pub use errors::{DeployError, ErrorCategory};
pub use executor::Orchestrator;
pub use precheck::{check_elevated, validate_config};
pub use progress::DeployProgress;
pub use removal::{
    removal_config_xml, store_removal_invocation, write_removal_config, CONSUMER_REMOVAL_CONFIG,
};
pub use report::{DeployReport, DeployWarning, Stage, StageOutcome};
pub use runner::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use verify::{Verification, Verifier};
