use clap::Parser;
use office_deploy::logging::{self, LoggingConfig};
use office_deploy::{
    check_elevated, DeployError, DeployOptions, DetectOptions, Detector, DownloadAcquirer,
    IntentFlags, Orchestrator, ProcessRunner, SnapshotState, StateProvider, DEFAULT_TOOL_URL,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Detect, install, repair or replace the Office suite with the Office
/// Deployment Tool.
#[derive(Debug, Parser)]
#[command(name = "office-deploy", version, about)]
struct Cli {
    /// Deployment configuration passed to `setup.exe /configure`
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Working directory for the tool and generated configurations
    #[arg(long, value_name = "PATH", env = "OFFICE_DEPLOY_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Schedule a restart after a verified installation
    #[arg(long)]
    restart: bool,

    /// Seconds before the scheduled restart
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    restart_delay: u64,

    /// Remove home and personal editions first
    #[arg(long)]
    remove_consumer_office: bool,

    /// Reinstall even when the suite is present
    #[arg(long)]
    force: bool,

    /// Uninstall the suite, Visio and Project before installing
    #[arg(long)]
    uninstall_existing: bool,

    /// Do nothing when the suite is present (the default)
    #[arg(long)]
    skip_if_installed: bool,

    /// Report what is installed and exit without changes
    #[arg(long)]
    detect_only: bool,

    /// Directory for the run log
    #[arg(long, value_name = "PATH", env = "OFFICE_DEPLOY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Download location of the deployment tool
    #[arg(
        long,
        value_name = "URL",
        env = "OFFICE_DEPLOY_TOOL_URL",
        default_value = DEFAULT_TOOL_URL
    )]
    tool_url: String,

    /// Extra language tag for localized detection (repeatable)
    #[arg(long = "language", value_name = "TAG")]
    languages: Vec<String>,

    /// Detect against a JSON snapshot instead of the live registry
    #[arg(long, value_name = "PATH")]
    state_snapshot: Option<PathBuf>,

    /// Print the detect-only report as JSON
    #[arg(long)]
    json: bool,

    /// Debug output on the console
    #[arg(short, long)]
    verbose: bool,

    /// Keep the working directory after a successful install
    #[arg(long)]
    keep_download_dir: bool,
}

impl Cli {
    fn intent_flags(&self) -> IntentFlags {
        IntentFlags {
            detect_only: self.detect_only,
            skip_if_installed: self.skip_if_installed,
            force: self.force,
            uninstall_existing: self.uninstall_existing,
            remove_consumer_office: self.remove_consumer_office,
        }
    }

    fn deploy_options(&self) -> DeployOptions {
        let defaults = DeployOptions::default();
        DeployOptions {
            config_path: self.config.clone(),
            download_dir: self.download_dir.clone().unwrap_or(defaults.download_dir),
            restart: self.restart,
            restart_delay: Duration::from_secs(self.restart_delay),
            tool_url: self.tool_url.clone(),
            cleanup_on_success: !self.keep_download_dir,
        }
    }

    fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            log_dir: self.log_dir.clone(),
            ..LoggingConfig::with_verbosity(self.verbose)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let guard = match logging::init(&cli.logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: {e}; logging to the console only");
            let _ = logging::init(&LoggingConfig::with_verbosity(cli.verbose));
            None
        }
    };

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(category = %e.category(), fix = e.fix_suggestion(), "{e}");
            e.exit_code()
        }
    };
    tracing::info!(exit_code = code, "run finished");

    drop(guard);
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<i32, DeployError> {
    let flags = cli.intent_flags();
    flags.resolve()?;

    if let Some(path) = &cli.state_snapshot {
        return deploy(load_snapshot(path)?, cli, flags).await;
    }

    deploy_live(cli, flags).await
}

#[cfg(windows)]
async fn deploy_live(cli: &Cli, flags: IntentFlags) -> Result<i32, DeployError> {
    deploy(office_deploy::RegistryState::new(), cli, flags).await
}

#[cfg(not(windows))]
async fn deploy_live(_cli: &Cli, _flags: IntentFlags) -> Result<i32, DeployError> {
    Err(DeployError::StateUnavailable {
        message: "the Windows registry is not available on this host".to_string(),
        fix: "Run on Windows, or pass --state-snapshot <path>".to_string(),
    })
}

async fn deploy<S: StateProvider>(
    state: S,
    cli: &Cli,
    flags: IntentFlags,
) -> Result<i32, DeployError> {
    let runner = ProcessRunner::new();
    if !flags.detect_only {
        check_elevated(&runner).await?;
    }

    let options = cli.deploy_options();
    let acquirer = DownloadAcquirer::new(&options.tool_url);
    let detector = Detector::new(state, DetectOptions::with_extra_languages(&cli.languages));
    let orchestrator = Orchestrator::new(detector, runner, acquirer, options);

    let report = orchestrator
        .run(&flags, |progress| tracing::info!("{}", progress.description()))
        .await?;

    if flags.detect_only {
        if cli.json {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    tracing::warn!(error = %e, "JSON rendering failed");
                    print!("{}", report.render());
                }
            }
        } else {
            print!("{}", report.render());
        }
    }
    Ok(report.exit_code())
}

fn load_snapshot(path: &Path) -> Result<SnapshotState, DeployError> {
    let fix = format!("Check that {} is a valid state snapshot", path.display());
    let text = std::fs::read_to_string(path).map_err(|e| DeployError::StateUnavailable {
        message: format!("{}: {e}", path.display()),
        fix: fix.clone(),
    })?;
    SnapshotState::from_json(&text).map_err(|e| DeployError::StateUnavailable {
        message: format!("{}: {e}", path.display()),
        fix,
    })
}
