use log::debug;
use serde::Serialize;
use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use super::PlatformError;
use crate::runtime::Runtime;

/// Only set on 64-bit Windows, including for 32-bit processes running there.
const PROGRAM_FILES_64_VAR: &str = "ProgramW6432";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Linux,
    MacOS,
}

impl OsFamily {
    /// Path separator used when building candidate paths for this family.
    pub fn separator(self) -> char {
        match self {
            OsFamily::Windows => '\\',
            OsFamily::Linux | OsFamily::MacOS => '/',
        }
    }
}

impl FromStr for OsFamily {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win32" => Ok(OsFamily::Windows),
            "linux" => Ok(OsFamily::Linux),
            "macos" | "darwin" => Ok(OsFamily::MacOS),
            _ => Err(PlatformError::UnsupportedPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self {
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::MacOS => "macos",
        };
        write!(f, "{os}")
    }
}

/// What the finder needs to know about the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformDescriptor {
    pub os_family: OsFamily,
    pub is_os_64bit: bool,
    pub is_process_64bit: bool,
}

impl PlatformDescriptor {
    /// Detect the descriptor of the running process.
    pub fn detect<R: Runtime + ?Sized>(runtime: &R) -> Result<Self, PlatformError> {
        Self::from_parts(
            std::env::consts::OS,
            cfg!(target_pointer_width = "64"),
            runtime,
        )
    }

    /// Derive a descriptor from an explicit host OS identifier and process
    /// bitness, reading environment variables through `runtime`.
    ///
    /// Linux and macOS are always treated as 64-bit operating systems. On
    /// Windows a 32-bit process still reports a 64-bit OS when the 64-bit
    /// Program Files variable is visible to it.
    #[tracing::instrument(skip(runtime))]
    pub fn from_parts<R: Runtime + ?Sized>(
        os: &str,
        is_process_64bit: bool,
        runtime: &R,
    ) -> Result<Self, PlatformError> {
        let os_family = os.parse::<OsFamily>()?;

        let is_os_64bit = match os_family {
            OsFamily::Linux | OsFamily::MacOS => true,
            OsFamily::Windows => {
                is_process_64bit
                    || !matches!(
                        runtime.env_var(PROGRAM_FILES_64_VAR),
                        Err(VarError::NotPresent)
                    )
            }
        };

        let descriptor = Self {
            os_family,
            is_os_64bit,
            is_process_64bit,
        };
        debug!("Detected platform: {:?}", descriptor);
        Ok(descriptor)
    }
}

/// Trait for platform detection (useful for testing)
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Result<PlatformDescriptor, PlatformError>;
}

/// Detects the platform of the running process through a [`Runtime`].
pub struct DefaultPlatformDetector<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> DefaultPlatformDetector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }
}

impl<R: Runtime> PlatformDetector for DefaultPlatformDetector<'_, R> {
    fn detect(&self) -> Result<PlatformDescriptor, PlatformError> {
        PlatformDescriptor::detect(self.runtime)
    }
}
