use anyhow::Result;
use log::debug;

use crate::finder::{Installation, InstallationFinder};
use crate::runtime::Runtime;

/// Print every installation present on disk, preferred first.
#[tracing::instrument(skip(finder))]
pub async fn list<R: Runtime + 'static>(finder: &InstallationFinder<R>, json: bool) -> Result<()> {
    let installations = finder.available_installations_concurrent().await;
    debug!("Found {} installation(s)", installations.len());

    print!("{}", render_list(&installations, json)?);
    Ok(())
}

pub(crate) fn render_list(installations: &[Installation], json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(installations)?));
    }

    if installations.is_empty() {
        return Ok("No PowerShell installations found.\n".to_string());
    }

    let width = installations
        .iter()
        .map(|i| i.display_name.len())
        .max()
        .unwrap_or_default();

    Ok(installations
        .iter()
        .map(|i| format!("{:<width$}  {}\n", i.display_name, i.exe_path.display()))
        .collect())
}
