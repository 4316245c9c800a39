//! The deployment orchestrator.
//!
//! This module provides [`Orchestrator`], which turns a detection and the
//! operator's flags into one action and carries it out stage by stage with
//! progress reporting and verification.

use crate::deploy::precheck::validate_config;
use crate::deploy::removal::{store_removal_invocation, write_removal_config};
use crate::deploy::report::{DeployReport, DeployWarning, Stage};
use crate::deploy::runner::{ToolInvocation, ToolOutput, ToolRunner};
use crate::deploy::verify::Verifier;
use crate::deploy::{DeployProgress, ToolAcquirer};
use crate::policy::{classify_consumer, is_suite_installed, plan};
use crate::state::StateProvider;
use crate::{Action, DeployError, DeployOptions, Detection, Detector, IntentFlags, ProductFamily};
use std::path::{Path, PathBuf};

/// File name used for the staged operator configuration when the source has none.
const STAGED_CONFIG: &str = "configuration.xml";

/// Runs a deployment against injected state, process runner and tool source.
///
/// Stages run strictly in order:
/// 1. Detect the suite and decide the [`Action`]
/// 2. Validate the operator configuration (actions that install)
/// 3. Remove consumer editions (when requested)
/// 4. Uninstall existing families (`UninstallThenInstall`)
/// 5. Acquire the deployment tool, run `setup /configure`, verify
/// 6. Schedule a restart and clean up (verified installs only, and no
///    cleanup after an earlier failed verification)
///
/// Only prechecks, acquisition and a failure to launch the installer abort
/// the run. Everything else is recorded as a [`DeployWarning`].
///
/// # Example
///
/// ```rust,no_run
/// use office_deploy::{
///     DeployOptions, DetectOptions, Detector, DownloadAcquirer, IntentFlags, Orchestrator,
///     ProcessRunner, SnapshotState,
/// };
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let options = DeployOptions {
///         config_path: Some("configuration.xml".into()),
///         ..Default::default()
///     };
///     let detector = Detector::new(SnapshotState::default(), DetectOptions::default());
///     let orchestrator = Orchestrator::new(
///         detector,
///         ProcessRunner::new(),
///         DownloadAcquirer::new(&options.tool_url),
///         options,
///     );
///
///     match orchestrator.run(&IntentFlags::default(), |p| println!("{}", p.description())).await {
///         Ok(report) => std::process::exit(report.exit_code()),
///         Err(e) => {
///             eprintln!("Failed: {}. Fix: {}", e, e.fix_suggestion());
///             std::process::exit(e.exit_code());
///         }
///     }
/// }
/// ```
pub struct Orchestrator<S, R, A> {
    detector: Detector<S>,
    runner: R,
    acquirer: A,
    options: DeployOptions,
}

impl<S, R, A> Orchestrator<S, R, A>
where
    S: StateProvider,
    R: ToolRunner,
    A: ToolAcquirer,
{
    pub fn new(detector: Detector<S>, runner: R, acquirer: A, options: DeployOptions) -> Self {
        Self {
            detector,
            runner,
            acquirer,
            options,
        }
    }

    pub fn detector(&self) -> &Detector<S> {
        &self.detector
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Detect, decide and execute.
    ///
    /// Calling this with anything but `detect_only` IS consent to change the
    /// host; elevation is the caller's concern.
    pub async fn run<F>(
        &self,
        flags: &IntentFlags,
        on_progress: F,
    ) -> Result<DeployReport, DeployError>
    where
        F: Fn(DeployProgress),
    {
        let detection = self.detector.detect_family(ProductFamily::Suite);
        log_detection("suite", &detection);

        let installed = is_suite_installed(&detection, || self.detector.detect_consumer_subset());
        let plan = plan(installed, flags)?;
        tracing::info!(
            action = %plan.action,
            remove_consumer_office = plan.remove_consumer_office,
            "action decided"
        );
        on_progress(DeployProgress::Started { action: plan.action });

        let mut report = DeployReport::new(plan.action, detection);
        if plan.action == Action::DetectOnlyReport {
            on_progress(DeployProgress::Completed { success: true });
            return Ok(report);
        }

        let config = if plan.action.installs() {
            Some(validate_config(self.options.config_path.as_deref())?)
        } else {
            None
        };

        let mut tool = None;
        if plan.remove_consumer_office {
            self.remove_consumer(&mut report, &mut tool, &on_progress).await?;
        }

        if plan.action.uninstalls_first() {
            self.uninstall_existing(&mut report, &mut tool, &on_progress).await?;
        }

        match config {
            Some(config) => self.install(&config, &mut report, &mut tool, &on_progress).await?,
            None if plan.remove_consumer_office => {
                self.confirm_still_installed(&mut report, &on_progress);
            }
            None => tracing::info!(outcome = "success", "Office already installed, nothing to do"),
        }

        on_progress(DeployProgress::Completed {
            success: report.succeeded(),
        });
        Ok(report)
    }

    /// The extracted `setup.exe`, acquiring it on first use.
    async fn tool(
        &self,
        cached: &mut Option<PathBuf>,
        on_progress: &dyn Fn(DeployProgress),
    ) -> Result<PathBuf, DeployError> {
        if let Some(path) = cached {
            return Ok(path.clone());
        }
        on_progress(DeployProgress::Acquiring);
        let path = self
            .acquirer
            .acquire(&self.options.download_dir, &self.runner)
            .await?;
        *cached = Some(path.clone());
        Ok(path)
    }

    fn configure(&self, setup: &Path, config: &Path) -> ToolInvocation {
        ToolInvocation::new(setup)
            .arg("/configure")
            .arg(config.display().to_string())
            .current_dir(&self.options.download_dir)
    }

    /// Run a stage whose failure must not abort the run.
    ///
    /// Returns the exit code when the process ran.
    async fn run_best_effort(
        &self,
        stage: Stage,
        invocation: &ToolInvocation,
        report: &mut DeployReport,
    ) -> Option<i32> {
        match self.runner.run(invocation).await {
            Ok(output) => {
                log_output(stage, &output);
                if !output.success() {
                    report.warn(DeployWarning::StageExit {
                        stage,
                        exit_code: output.code(),
                    });
                }
                output.exit_code
            }
            Err(e) => {
                report.warn(DeployWarning::StageFailed {
                    stage,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    async fn remove_consumer(
        &self,
        report: &mut DeployReport,
        tool: &mut Option<PathBuf>,
        on_progress: &dyn Fn(DeployProgress),
    ) -> Result<(), DeployError> {
        on_progress(DeployProgress::RemovingConsumer);
        let consumer = self.detector.detect_consumer_subset();
        log_detection("consumer", &consumer);
        if consumer.is_empty() {
            tracing::info!("no consumer editions detected");
            report.consumer = Some(consumer);
            return Ok(());
        }

        let targets = Detection::new(
            classify_consumer(&consumer.products)
                .into_iter()
                .cloned()
                .collect(),
        );
        let release_ids = targets.release_ids();
        let mut exit_code = None;
        if !release_ids.is_empty() {
            let setup = self.tool(tool, on_progress).await?;
            match write_removal_config(&self.options.download_dir, &release_ids).await {
                Ok(config) => {
                    let invocation = self.configure(&setup, &config);
                    exit_code = self
                        .run_best_effort(Stage::ConsumerRemoval, &invocation, report)
                        .await;
                }
                Err(e) => report.warn(DeployWarning::StageFailed {
                    stage: Stage::ConsumerRemoval,
                    message: e.to_string(),
                }),
            }
        }

        let packages: Vec<String> = targets
            .store_packages()
            .map(|p| p.product_id.clone())
            .collect();
        for name in &packages {
            tracing::info!(package = %name, "removing store package");
            let invocation = store_removal_invocation(name);
            let exit = self
                .run_best_effort(Stage::StorePackageRemoval, &invocation, report)
                .await;
            report.record(Stage::StorePackageRemoval, exit, None);
        }

        on_progress(DeployProgress::Verifying);
        let check = Verifier::new(&self.detector).consumer_removed();
        report.record(Stage::ConsumerRemoval, exit_code, Some(check.ok));
        if check.ok {
            tracing::info!(outcome = "success", "consumer editions removed");
        } else {
            report.warn(DeployWarning::Verification {
                stage: Stage::ConsumerRemoval,
                detail: check.detail(),
            });
        }
        report.consumer = Some(consumer);
        Ok(())
    }

    /// Re-check a skipped install after consumer removal, which may have
    /// taken files the suite shares with the removed edition.
    fn confirm_still_installed(
        &self,
        report: &mut DeployReport,
        on_progress: &dyn Fn(DeployProgress),
    ) {
        on_progress(DeployProgress::Verifying);
        let check = Verifier::new(&self.detector).installed();
        report.install_verified = Some(check.ok);
        if check.ok {
            tracing::info!(outcome = "success", "Office already installed, nothing to do");
            return;
        }
        report.warn(DeployWarning::Verification {
            stage: Stage::ConsumerRemoval,
            detail: "the suite was no longer detected after consumer removal".to_string(),
        });
        tracing::error!("consumer removal left no Office suite installed");
    }

    async fn uninstall_existing(
        &self,
        report: &mut DeployReport,
        tool: &mut Option<PathBuf>,
        on_progress: &dyn Fn(DeployProgress),
    ) -> Result<(), DeployError> {
        let verifier = Verifier::new(&self.detector);
        for family in ProductFamily::all() {
            if !self.detector.detect_family(family).found {
                tracing::debug!(
                    family = %family.display_name(),
                    "not installed, skipping uninstall"
                );
                continue;
            }
            let stage = Stage::Uninstall(family);
            on_progress(DeployProgress::Uninstalling { family });

            let config = self.options.download_dir.join(family.uninstall_config_name());
            if !config.is_file() {
                report.warn(DeployWarning::StageFailed {
                    stage,
                    message: format!("{} not found", config.display()),
                });
                report.record(stage, None, None);
                report.failed_families.push(family);
                continue;
            }

            let setup = self.tool(tool, on_progress).await?;
            let invocation = self.configure(&setup, &config);
            let exit_code = self.run_best_effort(stage, &invocation, report).await;

            on_progress(DeployProgress::Verifying);
            let check = verifier.removed(family);
            report.record(stage, exit_code, Some(check.ok));
            if check.ok {
                tracing::info!(outcome = "success", family = %family.display_name(), "uninstalled");
            } else {
                report.warn(DeployWarning::Verification {
                    stage,
                    detail: check.detail(),
                });
                report.failed_families.push(family);
            }
        }
        Ok(())
    }

    async fn install(
        &self,
        config: &Path,
        report: &mut DeployReport,
        tool: &mut Option<PathBuf>,
        on_progress: &dyn Fn(DeployProgress),
    ) -> Result<(), DeployError> {
        let setup = self.tool(tool, on_progress).await?;
        let staged = self.stage_config(config).await?;

        on_progress(DeployProgress::Installing);
        let output = self.runner.run(&self.configure(&setup, &staged)).await?;
        log_output(Stage::Install, &output);
        if !output.success() {
            report.warn(DeployWarning::StageExit {
                stage: Stage::Install,
                exit_code: output.code(),
            });
        }

        on_progress(DeployProgress::Verifying);
        let check = Verifier::new(&self.detector).installed();
        report.install_exit_code = output.exit_code;
        report.install_verified = Some(check.ok);
        report.record(Stage::Install, output.exit_code, Some(check.ok));

        if !check.ok {
            report.warn(DeployWarning::Verification {
                stage: Stage::Install,
                detail: "the suite was not detected after installation".to_string(),
            });
            tracing::error!(
                exit_code = ?output.exit_code,
                working_dir = %self.options.download_dir.display(),
                "installation could not be verified; working directory kept"
            );
            return Ok(());
        }

        tracing::info!(
            outcome = "success",
            exit_code = ?output.exit_code,
            "Office installed and verified"
        );
        if self.options.restart {
            self.schedule_restart(report).await;
        }
        if !self.options.cleanup_on_success {
            return Ok(());
        }
        if report.warnings.iter().any(DeployWarning::is_verification) {
            tracing::warn!(
                working_dir = %self.options.download_dir.display(),
                "an earlier stage failed verification; working directory kept"
            );
        } else {
            self.cleanup(report).await;
        }
        Ok(())
    }

    /// Copy the operator configuration into the working directory.
    async fn stage_config(&self, config: &Path) -> Result<PathBuf, DeployError> {
        let dir = &self.options.download_dir;
        let name = config
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(STAGED_CONFIG));
        let staged = dir.join(name);
        if same_file(config, &staged) {
            return Ok(staged);
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DeployError::working_dir(dir, &e))?;
        tokio::fs::copy(config, &staged)
            .await
            .map_err(|e| DeployError::working_dir(&staged, &e))?;
        tracing::debug!(path = %staged.display(), "configuration staged");
        Ok(staged)
    }

    async fn schedule_restart(&self, report: &mut DeployReport) {
        let secs = self.options.restart_delay.as_secs();
        let invocation = if cfg!(windows) {
            ToolInvocation::new("shutdown").args([
                "/r".to_string(),
                "/t".to_string(),
                secs.to_string(),
            ])
        } else {
            ToolInvocation::new("shutdown")
                .args(["-r".to_string(), format!("+{}", secs.div_ceil(60))])
        };
        tracing::info!(delay_secs = secs, "scheduling restart");
        let exit_code = self.run_best_effort(Stage::Restart, &invocation, report).await;
        report.record(Stage::Restart, exit_code, None);
    }

    async fn cleanup(&self, report: &mut DeployReport) {
        let dir = &self.options.download_dir;
        let holds_config = self
            .options
            .config_path
            .as_deref()
            .is_some_and(|c| c.starts_with(dir));
        if holds_config {
            tracing::debug!(
                dir = %dir.display(),
                "working directory holds the configuration, kept"
            );
            return;
        }
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                tracing::debug!(dir = %dir.display(), "working directory removed");
                report.record(Stage::Cleanup, None, None);
            }
            Err(e) => report.warn(DeployWarning::StageFailed {
                stage: Stage::Cleanup,
                message: e.to_string(),
            }),
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn log_detection(scope: &str, detection: &Detection) {
    if detection.is_empty() {
        tracing::info!(scope, "no products detected");
        return;
    }
    for product in &detection.products {
        tracing::info!(scope, "detected {}", product.summary());
    }
}

fn log_output(stage: Stage, output: &ToolOutput) {
    tracing::debug!(
        stage = %stage,
        exit_code = ?output.exit_code,
        stdout = %output.stdout.trim(),
        stderr = %output.stderr.trim(),
        "tool finished"
    );
}
