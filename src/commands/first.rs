use anyhow::{Result, bail};

use crate::finder::{Installation, InstallationFinder};
use crate::runtime::Runtime;

/// Print the preferred installation, failing when there is none.
#[tracing::instrument(skip(finder))]
pub fn first<R: Runtime>(finder: &InstallationFinder<R>, json: bool) -> Result<()> {
    let Some(installation) = finder.first_available_installation() else {
        bail!(
            "No PowerShell installation found (searched for '{}' on {})",
            finder.exe_name(),
            finder.platform().os_family
        );
    };

    print!("{}", render_first(&installation, json)?);
    Ok(())
}

pub(crate) fn render_first(installation: &Installation, json: bool) -> Result<String> {
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(installation)?))
    } else {
        Ok(format!("{}\n", installation.exe_path.display()))
    }
}
