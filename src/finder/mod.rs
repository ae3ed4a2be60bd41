//! Installation discovery.
//!
//! [`InstallationFinder`] walks the platform's priority table (see
//! `candidates`), resolves each row against the environment and yields the
//! installations whose executable exists. Both "all" and "first" are served
//! by the same lazy iterator, so asking for the first installation stops
//! probing at the first hit.

mod candidates;
mod concurrent;
mod installation;
mod legacy;

use log::{debug, trace};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::{AdditionalInstallation, Config};
use crate::platform::{OsFamily, PlatformDescriptor};
use crate::runtime::Runtime;

use candidates::{Row, platform_rows};

pub use installation::{Candidate, Installation};
pub use legacy::fix_windows_legacy_path;

pub const DEFAULT_EXE_NAME: &str = "pwsh";

pub struct InstallationFinder<R: Runtime> {
    runtime: Arc<R>,
    platform: PlatformDescriptor,
    exe_name: String,
    additional: Vec<AdditionalInstallation>,
}

impl<R: Runtime> InstallationFinder<R> {
    pub fn new(runtime: R, platform: PlatformDescriptor) -> Self {
        Self {
            runtime: Arc::new(runtime),
            platform,
            exe_name: DEFAULT_EXE_NAME.to_string(),
            additional: Vec::new(),
        }
    }

    /// Build a finder honouring the executable name and the additional
    /// installations of `config`.
    pub fn from_config(runtime: R, platform: PlatformDescriptor, config: &Config) -> Self {
        let mut finder = Self::new(runtime, platform);
        if let Some(name) = &config.exe_name {
            finder = finder.with_exe_name(name);
        }
        finder.with_additional_installations(config.additional_installations.iter().cloned())
    }

    /// Search for `name` instead of `pwsh`. A trailing `.exe` is ignored;
    /// Windows candidates add it back.
    pub fn with_exe_name(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        self.exe_name = name.strip_suffix(".exe").unwrap_or(name).to_string();
        self
    }

    /// Installations probed after the platform table, in the given order.
    pub fn with_additional_installations(
        mut self,
        installations: impl IntoIterator<Item = AdditionalInstallation>,
    ) -> Self {
        self.additional.extend(installations);
        self
    }

    pub fn platform(&self) -> PlatformDescriptor {
        self.platform
    }

    pub fn exe_name(&self) -> &str {
        &self.exe_name
    }

    fn rows(&self) -> Vec<Row> {
        let mut rows = platform_rows(&self.platform, &self.exe_name);
        rows.extend(self.additional.iter().map(|install| Row::Configured {
            exe_path: install.exe_path.clone(),
            display_name: install.display_name.clone(),
        }));
        rows
    }

    fn resolved(&self) -> Resolved<'_, R> {
        Resolved {
            runtime: self.runtime.as_ref(),
            os: self.platform.os_family,
            exe_name: &self.exe_name,
            rows: self.rows().into_iter().enumerate(),
            pending: Vec::new().into_iter(),
            row: 0,
            seen: HashSet::new(),
        }
    }

    /// Resolved, de-duplicated candidates in priority order. Nothing is
    /// checked for existence. A Program Files row contributes one candidate
    /// per version directory, highest first.
    pub fn candidates(&self) -> Candidates<'_, R> {
        Candidates {
            resolved: self.resolved(),
        }
    }

    /// Lazily yield every installation present on disk, in priority order.
    /// Each row contributes at most one installation.
    pub fn available_installations(&self) -> Installations<'_, R> {
        Installations {
            runtime: self.runtime.as_ref(),
            resolved: self.resolved(),
            found_row: None,
        }
    }

    /// The preferred installation, probing no further than the first hit.
    #[tracing::instrument(skip(self))]
    pub fn first_available_installation(&self) -> Option<Installation> {
        self.available_installations().next()
    }

    /// Map a Windows PowerShell path seen through `SysWOW64` or `Sysnative` to
    /// its `System32` form. Paths are returned unchanged on other platforms.
    pub fn fix_windows_legacy_path(&self, path: &str) -> String {
        match self.platform.os_family {
            OsFamily::Windows => fix_windows_legacy_path(path),
            OsFamily::Linux | OsFamily::MacOS => path.to_string(),
        }
    }
}

/// Key used to detect duplicate executables. Windows paths are compared
/// case-insensitively, with either separator and repeated separators folded.
fn dedup_key(path: &Path, os: OsFamily) -> String {
    let text = path.to_string_lossy();
    match os {
        OsFamily::Windows => {
            let mut key = String::with_capacity(text.len());
            for (idx, ch) in text.char_indices() {
                let ch = if ch == '/' { '\\' } else { ch };
                // Keep the leading pair of a UNC prefix
                if ch == '\\' && idx > 1 && key.ends_with('\\') {
                    continue;
                }
                key.extend(ch.to_lowercase());
            }
            key
        }
        OsFamily::Linux | OsFamily::MacOS => text.into_owned(),
    }
}

/// Candidates tagged with the index of the row they came from.
struct Resolved<'a, R: Runtime> {
    runtime: &'a R,
    os: OsFamily,
    exe_name: &'a str,
    rows: std::iter::Enumerate<std::vec::IntoIter<Row>>,
    pending: std::vec::IntoIter<Candidate>,
    row: usize,
    seen: HashSet<String>,
}

impl<R: Runtime> Iterator for Resolved<'_, R> {
    type Item = (usize, Candidate);

    fn next(&mut self) -> Option<(usize, Candidate)> {
        loop {
            for candidate in self.pending.by_ref() {
                if !self.seen.insert(dedup_key(&candidate.exe_path, self.os)) {
                    trace!("Skipping duplicate candidate {:?}", candidate.exe_path);
                    continue;
                }
                return Some((self.row, candidate));
            }
            let (row, entry) = self.rows.next()?;
            self.row = row;
            self.pending = entry.resolve(self.runtime, self.os, self.exe_name).into_iter();
        }
    }
}

/// Iterator over resolved candidates. See [`InstallationFinder::candidates`].
pub struct Candidates<'a, R: Runtime> {
    resolved: Resolved<'a, R>,
}

impl<R: Runtime> Iterator for Candidates<'_, R> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        self.resolved.next().map(|(_, candidate)| candidate)
    }
}

/// Iterator over installations present on disk. See
/// [`InstallationFinder::available_installations`].
pub struct Installations<'a, R: Runtime> {
    runtime: &'a R,
    resolved: Resolved<'a, R>,
    found_row: Option<usize>,
}

impl<R: Runtime> Iterator for Installations<'_, R> {
    type Item = Installation;

    fn next(&mut self) -> Option<Installation> {
        for (row, candidate) in self.resolved.by_ref() {
            if self.found_row == Some(row) {
                trace!("Row already satisfied, skipping {:?}", candidate.exe_path);
                continue;
            }
            if self.runtime.exists(&candidate.exe_path) {
                debug!(
                    "Found {} at {:?}",
                    candidate.display_name, candidate.exe_path
                );
                self.found_row = Some(row);
                return Some(candidate.validated());
            }
            trace!("{:?} does not exist", candidate.exe_path);
        }
        None
    }
}
