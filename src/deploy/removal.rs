//! Removal configurations and store package removal commands.

use crate::deploy::runner::ToolInvocation;
use crate::DeployError;
use std::path::{Path, PathBuf};

/// File name of the generated consumer removal configuration.
pub const CONSUMER_REMOVAL_CONFIG: &str = "remove-consumer.xml";

/// A removal configuration listing exactly `release_ids`.
///
/// ```rust
/// use office_deploy::removal_config_xml;
///
/// let xml = removal_config_xml(&["HomeStudent2019Retail".to_string()]);
/// assert!(xml.contains(r#"<Product ID="HomeStudent2019Retail">"#));
/// ```
pub fn removal_config_xml(release_ids: &[String]) -> String {
    let mut xml = String::from("<Configuration>\n  <Remove>\n");
    for id in release_ids {
        xml.push_str(&format!(
            "    <Product ID=\"{}\">\n      <Language ID=\"all\" />\n    </Product>\n",
            escape_attr(id)
        ));
    }
    xml.push_str("  </Remove>\n  <Display Level=\"None\" AcceptEULA=\"TRUE\" />\n");
    xml.push_str("  <Property Name=\"FORCEAPPSHUTDOWN\" Value=\"TRUE\" />\n");
    xml.push_str("</Configuration>\n");
    xml
}

/// Write the consumer removal configuration into `dir`.
pub async fn write_removal_config(
    dir: &Path,
    release_ids: &[String],
) -> Result<PathBuf, DeployError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DeployError::working_dir(dir, &e))?;
    let path = dir.join(CONSUMER_REMOVAL_CONFIG);
    tokio::fs::write(&path, removal_config_xml(release_ids))
        .await
        .map_err(|e| DeployError::working_dir(&path, &e))?;
    tracing::debug!(path = %path.display(), ids = ?release_ids, "removal configuration written");
    Ok(path)
}

/// Command that removes a store package for every user.
pub fn store_removal_invocation(package_name: &str) -> ToolInvocation {
    let name = package_name.replace('\'', "''");
    ToolInvocation::new("powershell").args([
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        format!("Get-AppxPackage -AllUsers -Name '{name}' | Remove-AppxPackage -AllUsers"),
    ])
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
