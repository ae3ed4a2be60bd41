use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PWSHFIND_CONFIG";

const CONFIG_DIR_NAME: &str = "pwshfind";
const CONFIG_FILE_NAME: &str = "config.json";

/// User configuration, stored as JSON.
///
/// ```json
/// {
///   "exe_name": "pwsh",
///   "additional_installations": [
///     { "display_name": "Daily build", "exe_path": "/opt/pwsh-daily/pwsh" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Executable to search for instead of `pwsh`.
    pub exe_name: Option<String>,
    /// Probed after the built-in locations, in this order.
    pub additional_installations: Vec<AdditionalInstallation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdditionalInstallation {
    pub display_name: String,
    pub exe_path: PathBuf,
}

impl Config {
    /// `<config dir>/pwshfind/config.json`, if the platform has a config dir.
    pub fn default_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
        runtime
            .config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration.
    ///
    /// An explicit path must be readable. Without one the default location is
    /// used when it exists, otherwise defaults apply.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(runtime, path);
        }

        match Self::default_path(runtime) {
            Some(path) if runtime.exists(&path) => Self::load_from(runtime, &path),
            Some(path) => {
                debug!("Config file not found at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load_from<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        debug!(
            "Loaded config from {:?} with {} additional installation(s)",
            path,
            config.additional_installations.len()
        );
        Ok(config)
    }
}
