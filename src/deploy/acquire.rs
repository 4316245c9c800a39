//! Acquisition of the deployment tool.

use crate::deploy::runner::{ToolInvocation, ToolRunner};
use crate::DeployError;
use std::path::{Path, PathBuf};

/// Name of the extracted deployment tool entrypoint.
pub const SETUP_EXE: &str = "setup.exe";

/// File name the self-extracting package is saved under.
const PACKAGE_NAME: &str = "officedeploymenttool.exe";

/// Puts a runnable deployment tool into a directory.
///
/// On success the returned path exists and can be passed to a
/// [`ToolRunner`]. Failures are acquisition-category errors and abort the run.
#[allow(async_fn_in_trait)]
pub trait ToolAcquirer {
    async fn acquire<R: ToolRunner>(&self, dest: &Path, runner: &R) -> Result<PathBuf, DeployError>;
}

impl<A: ToolAcquirer> ToolAcquirer for &A {
    async fn acquire<R: ToolRunner>(
        &self,
        dest: &Path,
        runner: &R,
    ) -> Result<PathBuf, DeployError> {
        (**self).acquire(dest, runner).await
    }
}

/// Downloads the self-extracting package and extracts it in place.
///
/// One fetch, no retry.
#[derive(Debug, Clone)]
pub struct DownloadAcquirer {
    url: String,
}

impl DownloadAcquirer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self, target: &Path) -> Result<(), DeployError> {
        let download_error = |message: String| DeployError::Download {
            url: self.url.clone(),
            message,
            fix: "Check network access to the download URL, or pass --tool-url".to_string(),
        };

        tracing::info!(url = %self.url, "downloading deployment tool");
        let response = reqwest::get(&self.url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_error(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;
        if bytes.is_empty() {
            return Err(download_error("empty response body".to_string()));
        }

        tokio::fs::write(target, &bytes)
            .await
            .map_err(|e| DeployError::working_dir(target, &e))?;
        tracing::debug!(path = %target.display(), size = bytes.len(), "package saved");
        Ok(())
    }
}

impl ToolAcquirer for DownloadAcquirer {
    async fn acquire<R: ToolRunner>(
        &self,
        dest: &Path,
        runner: &R,
    ) -> Result<PathBuf, DeployError> {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| DeployError::working_dir(dest, &e))?;

        let package = dest.join(PACKAGE_NAME);
        self.download(&package).await?;

        let extract = ToolInvocation::new(&package)
            .arg("/quiet")
            .arg(format!("/extract:{}", dest.display()))
            .current_dir(dest);
        let output = runner.run(&extract).await.map_err(|e| DeployError::Extraction {
            message: e.to_string(),
            exit_code: None,
            fix: "Check that security software is not blocking the downloaded package".to_string(),
        })?;

        let setup = dest.join(SETUP_EXE);
        if !setup.is_file() {
            return Err(DeployError::Extraction {
                message: format!("{SETUP_EXE} not found in {} after extraction", dest.display()),
                exit_code: output.exit_code,
                fix: "Re-run, or download and extract the deployment tool manually".to_string(),
            });
        }
        tracing::info!(path = %setup.display(), "deployment tool ready");
        Ok(setup)
    }
}
