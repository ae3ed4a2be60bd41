use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A location where an installation might live. Nothing has been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub exe_path: PathBuf,
    pub display_name: String,
    pub supports_rich_arguments: bool,
}

impl Candidate {
    pub fn new(exe_path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            exe_path: exe_path.into(),
            display_name: display_name.into(),
            // Every known install accepts the full argument set today
            supports_rich_arguments: true,
        }
    }

    /// Promote the candidate once its executable was seen on disk.
    pub(crate) fn validated(self) -> Installation {
        Installation {
            exe_path: self.exe_path,
            display_name: self.display_name,
            supports_rich_arguments: self.supports_rich_arguments,
        }
    }
}

/// An installation whose executable was confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installation {
    pub exe_path: PathBuf,
    pub display_name: String,
    pub supports_rich_arguments: bool,
}

impl fmt::Display for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_name, self.exe_path.display())
    }
}
