//! End-to-end deployment runs against an in-memory registry.
//!
//! The scripted runner plays the deployment tool: `/configure` with the
//! operator configuration adds the suite's uninstall key, the removal
//! configurations delete the matching keys (consumer removal also drops the
//! click-to-run footprint shared with the suite), and store removals drop the
//! package. No real process is started.

use office_deploy::catalog::{APP_PATHS_ROOT, CLICK_TO_RUN_CONFIG};
use office_deploy::{
    Action, DeployError, DeployOptions, DeployProgress, DeployWarning, DetectOptions,
    DetectionMethod, Detector, IntentFlags, Orchestrator, ProductFamily, SnapshotState, Stage,
    ToolAcquirer, ToolInvocation, ToolOutput, ToolRunner, CONSUMER_REMOVAL_CONFIG, SETUP_EXE,
};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const ROOT: &str = r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
const INSTALL_ROOT: &str = r"HKLM\SOFTWARE\Microsoft\Office\16.0\Common\InstallRoot";
const C2R_CLIENT: &str =
    r"C:\Program Files\Common Files\Microsoft Shared\ClickToRun\OfficeClickToRun.exe";
const WORD: &str = r"C:\Program Files\Microsoft Office\root\Office16\WINWORD.EXE";
const OPERATOR_CONFIG: &str = r#"<Configuration>
  <Add OfficeClientEdition="64" Channel="Current">
    <Product ID="O365ProPlusRetail"><Language ID="en-us" /></Product>
  </Add>
</Configuration>"#;

struct ScriptedRunner {
    state: Arc<SnapshotState>,
    calls: RefCell<Vec<ToolInvocation>>,
    install_exit: i32,
    install_works: bool,
    uninstall_works: bool,
}

impl ScriptedRunner {
    fn new(state: &Arc<SnapshotState>) -> Self {
        Self {
            state: Arc::clone(state),
            calls: RefCell::new(Vec::new()),
            install_exit: 0,
            install_works: true,
            uninstall_works: true,
        }
    }

    fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }
}

impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, DeployError> {
        self.calls.borrow_mut().push(invocation.clone());

        if invocation.program_name() == "powershell" {
            self.state.remove_store_package("Microsoft.Office.OneNote");
            return Ok(ToolOutput::with_code(0));
        }

        let config = invocation.args.get(1).cloned().unwrap_or_default();
        if config.ends_with(CONSUMER_REMOVAL_CONFIG) {
            self.state.remove_keys_containing("HomeStudent");
            self.state.remove_key(CLICK_TO_RUN_CONFIG);
            self.state.remove_key(&format!(r"{APP_PATHS_ROOT}\WINWORD.EXE"));
            self.state.remove_key(INSTALL_ROOT);
        } else if config.ends_with("uninstall-office.xml") {
            if self.uninstall_works {
                self.state.remove_keys_containing("O365ProPlus");
            }
        } else {
            if self.install_works {
                self.state.insert_key(
                    &format!(r"{ROOT}\O365ProPlusRetail"),
                    &[
                        ("DisplayName", "Microsoft 365 Apps for enterprise - en-us"),
                        ("DisplayVersion", "16.0.17328.20142"),
                    ],
                );
            }
            return Ok(ToolOutput::with_code(self.install_exit));
        }
        Ok(ToolOutput::with_code(0))
    }
}

#[derive(Default)]
struct StubAcquirer {
    calls: Cell<usize>,
}

impl ToolAcquirer for StubAcquirer {
    async fn acquire<R: ToolRunner>(
        &self,
        dest: &Path,
        _runner: &R,
    ) -> Result<PathBuf, DeployError> {
        self.calls.set(self.calls.get() + 1);
        std::fs::create_dir_all(dest).unwrap();
        let setup = dest.join(SETUP_EXE);
        std::fs::write(&setup, b"MZ").unwrap();
        Ok(setup)
    }
}

struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    work: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("configuration.xml");
        std::fs::write(&config, OPERATOR_CONFIG).unwrap();
        let work = dir.path().join("work");
        Self {
            _dir: dir,
            config,
            work,
        }
    }

    fn options(&self) -> DeployOptions {
        DeployOptions {
            config_path: Some(self.config.clone()),
            download_dir: self.work.clone(),
            ..Default::default()
        }
    }
}

fn suite_installed(state: &SnapshotState) {
    state.insert_key(
        &format!(r"{ROOT}\O365ProPlusRetail"),
        &[
            ("DisplayName", "Microsoft 365 Apps for enterprise - en-us"),
            ("DisplayVersion", "16.0.16731.20234"),
        ],
    );
}

/// A host with only a click-to-run consumer edition. The flagship app path
/// and install root it registers are the same ones the suite would use.
fn consumer_only_host() -> SnapshotState {
    SnapshotState::default()
        .with_key(
            &format!(r"{ROOT}\HomeStudent2019Retail - en-us"),
            &[
                ("DisplayName", "Microsoft Office Home and Student 2019 - en-us"),
                ("DisplayVersion", "16.0.17328.20142"),
                ("UninstallString", C2R_CLIENT),
            ],
        )
        .with_key(
            CLICK_TO_RUN_CONFIG,
            &[
                ("ProductReleaseIds", "HomeStudent2019Retail"),
                ("Platform", "x64"),
                ("VersionToReport", "16.0.17328.20142"),
            ],
        )
        .with_key(&format!(r"{APP_PATHS_ROOT}\WINWORD.EXE"), &[("", WORD)])
        .with_key(
            INSTALL_ROOT,
            &[("Path", r"C:\Program Files\Microsoft Office\root\Office16\")],
        )
        .with_file(WORD, Some("16.0.17328.20142"))
}

fn orchestrator<'a>(
    state: &Arc<SnapshotState>,
    runner: &'a ScriptedRunner,
    acquirer: &'a StubAcquirer,
    options: DeployOptions,
) -> Orchestrator<Arc<SnapshotState>, &'a ScriptedRunner, &'a StubAcquirer> {
    Orchestrator::new(
        Detector::new(Arc::clone(state), DetectOptions::default()),
        runner,
        acquirer,
        options,
    )
}

#[tokio::test(flavor = "current_thread")]
async fn test_fresh_host_installs() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default());
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let progress = RefCell::new(Vec::new());

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&IntentFlags::default(), |p| progress.borrow_mut().push(p))
        .await
        .unwrap();

    assert_eq!(report.action, Action::Install);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.install_verified, Some(true));
    assert!(report.warnings.is_empty());
    assert_eq!(acquirer.calls.get(), 1);

    let commands = runner.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("setup.exe /configure"));
    assert!(commands[0].ends_with("configuration.xml"));

    assert_eq!(
        progress.into_inner(),
        vec![
            DeployProgress::Started {
                action: Action::Install
            },
            DeployProgress::Acquiring,
            DeployProgress::Installing,
            DeployProgress::Verifying,
            DeployProgress::Completed { success: true },
        ]
    );
    assert!(!fixture.work.exists(), "working directory removed after success");
    assert!(fixture.config.exists(), "operator configuration untouched");
}

#[tokio::test(flavor = "current_thread")]
async fn test_installed_suite_is_skipped() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default());
    suite_installed(&state);
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&IntentFlags::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.action, Action::SkipAlreadyInstalled);
    assert_eq!(report.exit_code(), 0);
    assert!(runner.commands().is_empty());
    assert_eq!(acquirer.calls.get(), 0);
    assert!(report.stages.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_detect_only_lists_products_without_changes() {
    let state = Arc::new(
        SnapshotState::default()
            .with_key(
                &format!(r"{ROOT}\O365ProPlusRetail"),
                &[
                    ("DisplayName", "Microsoft 365 Apps for enterprise - en-us"),
                    ("DisplayVersion", "16.0.17328.20142"),
                ],
            )
            .with_key(
                &format!(r"{ROOT}\ProPlus2019Volume"),
                &[
                    ("DisplayName", "Microsoft Office Professional Plus 2019 - en-us"),
                    ("DisplayVersion", "16.0.10417.20007"),
                ],
            ),
    );
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        detect_only: true,
        ..Default::default()
    };

    // No configuration needed for a report.
    let report = orchestrator(&state, &runner, &acquirer, DeployOptions::default())
        .run(&flags, |_| {})
        .await
        .unwrap();

    assert_eq!(report.action, Action::DetectOnlyReport);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.detection.len(), 2);
    let text = report.render();
    assert!(text.contains("Microsoft 365 Apps for enterprise - en-us (version 16.0.17328.20142)"));
    assert!(
        text.contains("Microsoft Office Professional Plus 2019 - en-us (version 16.0.10417.20007)")
    );
    assert!(runner.commands().is_empty());
    assert_eq!(acquirer.calls.get(), 0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["action"], "DetectOnlyReport");
    assert_eq!(json["detection"]["products"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_consumer_edition_removed_before_install() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default().with_key(
        &format!(r"{ROOT}\HomeStudent2019Retail - en-us"),
        &[
            ("DisplayName", "Microsoft Office Home and Student 2019 - en-us"),
            ("DisplayVersion", "16.0.10730.20102"),
        ],
    ));
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let options = DeployOptions {
        cleanup_on_success: false,
        ..fixture.options()
    };
    let flags = IntentFlags {
        remove_consumer_office: true,
        ..Default::default()
    };

    let report = orchestrator(&state, &runner, &acquirer, options)
        .run(&flags, |_| {})
        .await
        .unwrap();

    // The consumer SKU is not the suite.
    assert_eq!(report.action, Action::Install);
    assert!(report.detection.is_empty());

    let consumer = report.consumer.as_ref().unwrap();
    assert_eq!(consumer.release_ids(), vec!["HomeStudent2019Retail".to_string()]);
    assert_eq!(
        report.stage(Stage::ConsumerRemoval).and_then(|s| s.verified),
        Some(true)
    );

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].ends_with(CONSUMER_REMOVAL_CONFIG));
    assert!(commands[1].ends_with("configuration.xml"));
    assert_eq!(acquirer.calls.get(), 1, "tool acquired once for both stages");

    let removal = std::fs::read_to_string(fixture.work.join(CONSUMER_REMOVAL_CONFIG)).unwrap();
    assert!(removal.contains(r#"<Product ID="HomeStudent2019Retail">"#));
    assert_eq!(removal.matches("<Product ID=").count(), 1);

    assert_eq!(report.exit_code(), 0);
    assert!(fixture.work.join("configuration.xml").exists());
}

#[tokio::test(flavor = "current_thread")]
async fn test_store_package_removal() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default().with_store_package(
        "Microsoft.Office.OneNote",
        "Microsoft.Office.OneNote_16001.14326.21802.0_x64__8wekyb3d8bbwe",
    ));
    suite_installed(&state);
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        remove_consumer_office: true,
        ..Default::default()
    };

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |_| {})
        .await
        .unwrap();

    assert_eq!(report.action, Action::SkipAlreadyInstalled);
    let commands = runner.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("Remove-AppxPackage"));
    assert_eq!(acquirer.calls.get(), 0, "no removal configuration, no tool");
    assert!(report.stage(Stage::StorePackageRemoval).is_some());
    assert_eq!(
        report.stage(Stage::ConsumerRemoval).and_then(|s| s.verified),
        Some(true)
    );
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_verified_install_overrides_tool_exit_code() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default());
    let mut runner = ScriptedRunner::new(&state);
    runner.install_exit = 17;
    let acquirer = StubAcquirer::default();

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&IntentFlags::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.install_exit_code, Some(17));
    assert_eq!(report.install_verified, Some(true));
    assert_eq!(report.exit_code(), 0);
    assert!(report.warnings.contains(&DeployWarning::StageExit {
        stage: Stage::Install,
        exit_code: 17,
    }));
}

#[tokio::test(flavor = "current_thread")]
async fn test_failed_install_propagates_tool_exit_code() {
    let fixture = Fixture::new();
    let state = Arc::new(SnapshotState::default());
    let mut runner = ScriptedRunner::new(&state);
    runner.install_exit = 30088;
    runner.install_works = false;
    let acquirer = StubAcquirer::default();
    let progress = RefCell::new(Vec::new());

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&IntentFlags::default(), |p| progress.borrow_mut().push(p))
        .await
        .unwrap();

    assert_eq!(report.install_verified, Some(false));
    assert_eq!(report.exit_code(), 30088);
    assert!(report.warnings.iter().any(DeployWarning::is_verification));
    assert!(fixture.work.join(SETUP_EXE).exists(), "working directory kept on failure");
    assert_eq!(
        progress.into_inner().last(),
        Some(&DeployProgress::Completed { success: false })
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_uninstall_then_install_with_missing_family_config() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(&fixture.work).unwrap();
    std::fs::write(
        fixture.work.join(ProductFamily::Suite.uninstall_config_name()),
        r#"<Configuration><Remove All="TRUE" /></Configuration>"#,
    )
    .unwrap();

    let state = Arc::new(SnapshotState::default().with_key(
        &format!(r"{ROOT}\VisioProRetail - en-us"),
        &[("DisplayName", "Microsoft Visio - en-us")],
    ));
    suite_installed(&state);
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        uninstall_existing: true,
        ..Default::default()
    };
    let progress = RefCell::new(Vec::new());

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |p| progress.borrow_mut().push(p))
        .await
        .unwrap();

    assert_eq!(report.action, Action::UninstallThenInstall);
    assert_eq!(
        report
            .stage(Stage::Uninstall(ProductFamily::Suite))
            .and_then(|s| s.verified),
        Some(true)
    );
    assert_eq!(report.failed_families, vec![ProductFamily::Visio]);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        DeployWarning::StageFailed {
            stage: Stage::Uninstall(ProductFamily::Visio),
            ..
        }
    )));

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].ends_with("uninstall-office.xml"));
    assert!(commands[1].ends_with("configuration.xml"));

    // A failed family uninstall does not change the exit code.
    assert_eq!(report.exit_code(), 0);

    let progress = progress.into_inner();
    assert!(progress.contains(&DeployProgress::Uninstalling {
        family: ProductFamily::Visio
    }));
    assert!(!progress.contains(&DeployProgress::Uninstalling {
        family: ProductFamily::Project
    }));
}

#[tokio::test(flavor = "current_thread")]
async fn test_invalid_config_changes_nothing() {
    let fixture = Fixture::new();
    std::fs::write(
        &fixture.config,
        "<Configuration><Display Level=\"None\"/></Configuration>",
    )
    .unwrap();
    let state = Arc::new(SnapshotState::default().with_key(
        &format!(r"{ROOT}\HomeStudent2019Retail - en-us"),
        &[("DisplayName", "Microsoft Office Home and Student 2019 - en-us")],
    ));
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        remove_consumer_office: true,
        ..Default::default()
    };

    let err = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::ConfigInvalid { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(runner.commands().is_empty());
    assert_eq!(acquirer.calls.get(), 0);
    assert!(!fixture.work.exists());
}

#[tokio::test(flavor = "current_thread")]
async fn test_snapshot_fixture_from_json() {
    let json = r#"{
        "keys": {
            "HKLM\\SOFTWARE\\Microsoft\\Office\\ClickToRun\\Configuration": {
                "ProductReleaseIds": "O365ProPlusRetail,VisioProRetail",
                "Platform": "x64",
                "VersionToReport": "16.0.17328.20142"
            }
        }
    }"#;
    let state = Arc::new(SnapshotState::from_json(json).unwrap());
    let detector = Detector::new(Arc::clone(&state), DetectOptions::default());

    let suite = detector.detect_family(ProductFamily::Suite);
    assert_eq!(suite.release_ids(), vec!["O365ProPlusRetail".to_string()]);
    let visio = detector.detect_family(ProductFamily::Visio);
    assert_eq!(visio.release_ids(), vec!["VisioProRetail".to_string()]);
    assert!(detector.detect_family(ProductFamily::Project).is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_consumer_only_host_is_not_mistaken_for_the_suite() {
    let fixture = Fixture::new();
    let state = Arc::new(consumer_only_host());
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        remove_consumer_office: true,
        ..Default::default()
    };

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |_| {})
        .await
        .unwrap();

    let methods: Vec<DetectionMethod> = report
        .detection
        .products
        .iter()
        .map(|p| p.detection_method)
        .collect();
    assert_eq!(methods.len(), 2);
    assert!(methods.contains(&DetectionMethod::AppPathExecutable));
    assert!(methods.contains(&DetectionMethod::InstallRootKey));
    assert_eq!(report.action, Action::Install);

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].ends_with(CONSUMER_REMOVAL_CONFIG));
    assert!(commands[1].ends_with("configuration.xml"));
    assert_eq!(report.install_verified, Some(true));
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_skipped_run_fails_when_consumer_removal_takes_the_suite() {
    let fixture = Fixture::new();
    let state = Arc::new(consumer_only_host());
    state.insert_key(
        CLICK_TO_RUN_CONFIG,
        &[
            ("ProductReleaseIds", "O365ProPlusRetail,HomeStudent2019Retail"),
            ("Platform", "x64"),
            ("VersionToReport", "16.0.17328.20142"),
        ],
    );
    let runner = ScriptedRunner::new(&state);
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        remove_consumer_office: true,
        ..Default::default()
    };
    let progress = RefCell::new(Vec::new());

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |p| progress.borrow_mut().push(p))
        .await
        .unwrap();

    assert_eq!(report.action, Action::SkipAlreadyInstalled);
    assert_eq!(
        report.stage(Stage::ConsumerRemoval).and_then(|s| s.verified),
        Some(true)
    );
    assert_eq!(report.install_verified, Some(false));
    assert!(report.warnings.contains(&DeployWarning::Verification {
        stage: Stage::ConsumerRemoval,
        detail: "the suite was no longer detected after consumer removal".to_string(),
    }));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(
        progress.into_inner().last(),
        Some(&DeployProgress::Completed { success: false })
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_failed_uninstall_verification_keeps_working_dir() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(&fixture.work).unwrap();
    std::fs::write(
        fixture.work.join(ProductFamily::Suite.uninstall_config_name()),
        r#"<Configuration><Remove All="TRUE" /></Configuration>"#,
    )
    .unwrap();
    let state = Arc::new(SnapshotState::default());
    suite_installed(&state);
    let mut runner = ScriptedRunner::new(&state);
    runner.uninstall_works = false;
    let acquirer = StubAcquirer::default();
    let flags = IntentFlags {
        uninstall_existing: true,
        ..Default::default()
    };

    let report = orchestrator(&state, &runner, &acquirer, fixture.options())
        .run(&flags, |_| {})
        .await
        .unwrap();

    assert_eq!(report.action, Action::UninstallThenInstall);
    assert_eq!(report.failed_families, vec![ProductFamily::Suite]);
    let uninstall = Stage::Uninstall(ProductFamily::Suite);
    assert!(report.warnings.iter().any(|w| w.is_verification() && w.stage() == uninstall));
    assert_eq!(report.install_verified, Some(true));
    assert_eq!(report.exit_code(), 0);

    assert!(report.stage(Stage::Cleanup).is_none());
    assert!(fixture.work.exists(), "working directory kept for diagnosis");
    assert!(fixture.work.join("uninstall-office.xml").exists());
}
