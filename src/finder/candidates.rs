//! The per-platform priority table and its resolution into candidates.
//!
//! A [`Row`] describes where an installation may live in terms of environment
//! variables and directory conventions. Resolving a row reads the environment
//! (and, for Program Files and Store installs, lists one directory) but never
//! checks whether the executable itself exists; that is the finder's job.
//!
//! A row may resolve to several alternatives. Program Files rows yield one
//! path per version directory, highest first, and the finder keeps the first
//! one present on disk.

use log::{debug, trace};
use std::env::VarError;
use std::path::{Path, PathBuf};

use super::installation::Candidate;
use super::legacy::{SYSNATIVE, SYSTEM32, SYSWOW64};
use crate::platform::{OsFamily, PlatformDescriptor};
use crate::runtime::Runtime;

const PROGRAM_FILES_VAR: &str = "ProgramFiles";
const PROGRAM_FILES_X86_VAR: &str = "ProgramFiles(x86)";
const PROGRAM_W6432_VAR: &str = "ProgramW6432";
const LOCAL_APP_DATA_VAR: &str = "LOCALAPPDATA";
const WINDIR_VAR: &str = "windir";

const STORE_STABLE_PREFIX: &str = "Microsoft.PowerShell_";
const STORE_PREVIEW_PREFIX: &str = "Microsoft.PowerShellPreview_";
const PREVIEW_SUFFIX: &str = "-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    Stable,
    Preview,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Channel::Stable => "",
            Channel::Preview => " Preview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bitness {
    X64,
    X86,
}

impl Bitness {
    fn label(self) -> &'static str {
        match self {
            Bitness::X64 => "x64",
            Bitness::X86 => "x86",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Row {
    /// An absolute path known up front (Unix installs).
    Fixed {
        exe_path: String,
        display_name: &'static str,
    },
    /// `<Program Files root>\PowerShell\<version>\<name>.exe`
    ProgramFiles {
        root_var: &'static str,
        bitness: Bitness,
        channel: Channel,
    },
    /// `%LOCALAPPDATA%\Microsoft\WindowsApps\<package>\<name>.exe`
    Store { channel: Channel },
    /// `%windir%\<system dir>\WindowsPowerShell\v1.0\powershell.exe`
    Legacy {
        system_dir: &'static str,
        bitness: Bitness,
    },
    /// Supplied by the user configuration.
    Configured {
        exe_path: PathBuf,
        display_name: String,
    },
}

/// Build the priority-ordered rows for `platform`.
pub(crate) fn platform_rows(platform: &PlatformDescriptor, exe_name: &str) -> Vec<Row> {
    match platform.os_family {
        OsFamily::Windows => windows_rows(platform),
        OsFamily::Linux => vec![
            fixed(format!("/usr/bin/{exe_name}"), "PowerShell"),
            fixed(format!("/snap/bin/{exe_name}"), "PowerShell Snap"),
            fixed(
                format!("/usr/bin/{exe_name}{PREVIEW_SUFFIX}"),
                "PowerShell Preview",
            ),
            fixed(
                format!("/snap/bin/{exe_name}{PREVIEW_SUFFIX}"),
                "PowerShell Preview Snap",
            ),
        ],
        OsFamily::MacOS => vec![
            fixed(format!("/usr/local/bin/{exe_name}"), "PowerShell"),
            fixed(
                format!("/usr/local/bin/{exe_name}{PREVIEW_SUFFIX}"),
                "PowerShell Preview",
            ),
        ],
    }
}

fn fixed(exe_path: String, display_name: &'static str) -> Row {
    Row::Fixed {
        exe_path,
        display_name,
    }
}

fn windows_rows(platform: &PlatformDescriptor) -> Vec<Row> {
    // The "native" view is whatever the process sees without redirection
    let native = if platform.is_process_64bit {
        Bitness::X64
    } else {
        Bitness::X86
    };

    let (alternate_program_files, alternate_system_dir) = if platform.is_process_64bit {
        (
            Some((PROGRAM_FILES_X86_VAR, Bitness::X86)),
            Some((SYSWOW64, Bitness::X86)),
        )
    } else if platform.is_os_64bit {
        (
            Some((PROGRAM_W6432_VAR, Bitness::X64)),
            Some((SYSNATIVE, Bitness::X64)),
        )
    } else {
        (None, None)
    };

    let program_files = |(root_var, bitness): (&'static str, Bitness), channel| {
        Row::ProgramFiles {
            root_var,
            bitness,
            channel,
        }
    };
    let native_program_files = (PROGRAM_FILES_VAR, native);

    let mut rows = vec![program_files(native_program_files, Channel::Stable)];
    if let Some(alternate) = alternate_program_files {
        rows.push(program_files(alternate, Channel::Stable));
    }
    rows.push(Row::Store {
        channel: Channel::Stable,
    });
    rows.push(program_files(native_program_files, Channel::Preview));
    rows.push(Row::Store {
        channel: Channel::Preview,
    });
    if let Some(alternate) = alternate_program_files {
        rows.push(program_files(alternate, Channel::Preview));
    }
    rows.push(Row::Legacy {
        system_dir: SYSTEM32,
        bitness: native,
    });
    if let Some((system_dir, bitness)) = alternate_system_dir {
        rows.push(Row::Legacy {
            system_dir,
            bitness,
        });
    }
    rows
}

impl Row {
    /// Turn the row into its concrete alternatives, most preferred first.
    /// Empty when a variable or directory it depends on is missing.
    pub(crate) fn resolve<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        os: OsFamily,
        exe_name: &str,
    ) -> Vec<Candidate> {
        match self {
            Row::ProgramFiles {
                root_var,
                bitness,
                channel,
            } => {
                let Some(root) = env_root(runtime, root_var) else {
                    return Vec::new();
                };
                let base = join(os, &root, &["PowerShell"]);
                let exe_file = format!("{exe_name}.exe");
                let display_name = format!("PowerShell{} ({})", channel.label(), bitness.label());
                version_dirs(runtime, &base, *channel)
                    .iter()
                    .map(|version_dir| {
                        Candidate::new(
                            join(os, &base, &[version_dir.as_str(), exe_file.as_str()]),
                            display_name.as_str(),
                        )
                    })
                    .collect()
            }
            _ => self.resolve_single(runtime, os, exe_name).into_iter().collect(),
        }
    }

    fn resolve_single<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        os: OsFamily,
        exe_name: &str,
    ) -> Option<Candidate> {
        match self {
            Row::Fixed {
                exe_path,
                display_name,
            } => Some(Candidate::new(exe_path.as_str(), *display_name)),
            Row::ProgramFiles { .. } => None,
            Row::Store { channel } => {
                let local_app_data = env_root(runtime, LOCAL_APP_DATA_VAR)?;
                let apps_dir = join(os, &local_app_data, &["Microsoft", "WindowsApps"]);
                let prefix = match channel {
                    Channel::Stable => STORE_STABLE_PREFIX,
                    Channel::Preview => STORE_PREVIEW_PREFIX,
                };
                let package = store_package_dir(runtime, &apps_dir, prefix)?;
                let exe_file = format!("{exe_name}.exe");
                Some(Candidate::new(
                    join(os, &apps_dir, &[package.as_str(), exe_file.as_str()]),
                    format!("PowerShell{} (Store)", channel.label()),
                ))
            }
            Row::Legacy {
                system_dir,
                bitness,
            } => {
                let windir = env_root(runtime, WINDIR_VAR)?;
                Some(Candidate::new(
                    join(
                        os,
                        &windir,
                        &[*system_dir, "WindowsPowerShell", "v1.0", "powershell.exe"],
                    ),
                    format!("Windows PowerShell ({})", bitness.label()),
                ))
            }
            Row::Configured {
                exe_path,
                display_name,
            } => Some(Candidate::new(exe_path.clone(), display_name.as_str())),
        }
    }
}

fn env_root<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    match runtime.env_var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        Ok(_) | Err(VarError::NotPresent) => {
            trace!("{} is not set, skipping candidate", key);
            None
        }
        Err(VarError::NotUnicode(_)) => {
            debug!("{} is not valid unicode, skipping candidate", key);
            None
        }
    }
}

/// Join path segments with the separator of `os`, whatever the host is.
pub(crate) fn join(os: OsFamily, base: &str, parts: &[&str]) -> String {
    let separator = os.separator();
    let mut joined = base.trim_end_matches(['\\', '/']).to_string();
    for part in parts {
        joined.push(separator);
        joined.push_str(part);
    }
    joined
}

/// Last path segment, splitting on both separators so Windows paths work on
/// any host.
fn leaf_name(path: &Path) -> String {
    let text = path.to_string_lossy();
    text.trim_end_matches(['\\', '/'])
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn list_dir_names<R: Runtime + ?Sized>(runtime: &R, dir: &str) -> Option<Vec<String>> {
    match runtime.read_dir(Path::new(dir)) {
        Ok(entries) => Some(entries.iter().map(|entry| leaf_name(entry)).collect()),
        Err(e) => {
            debug!("Cannot list {}, skipping candidate: {:#}", dir, e);
            None
        }
    }
}

/// Parse `6` (stable) or `7-preview` (preview) version directory names.
fn parse_version_dir(name: &str, channel: Channel) -> Option<u32> {
    let number = match channel {
        Channel::Stable => name,
        Channel::Preview => name.strip_suffix(PREVIEW_SUFFIX)?,
    };
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

/// Version directories of `channel` under `base`, highest version first.
fn version_dirs<R: Runtime + ?Sized>(runtime: &R, base: &str, channel: Channel) -> Vec<String> {
    let Some(names) = list_dir_names(runtime, base) else {
        return Vec::new();
    };
    let mut versions: Vec<(u32, String)> = names
        .into_iter()
        .filter_map(|name| parse_version_dir(&name, channel).map(|version| (version, name)))
        .collect();
    versions.sort_by(|a, b| b.0.cmp(&a.0));

    if versions.is_empty() {
        trace!("No {:?} version directory under {}", channel, base);
    }
    versions.into_iter().map(|(_, name)| name).collect()
}

fn store_package_dir<R: Runtime + ?Sized>(
    runtime: &R,
    apps_dir: &str,
    prefix: &str,
) -> Option<String> {
    let mut packages: Vec<String> = list_dir_names(runtime, apps_dir)?
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();
    packages.sort();
    packages.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Machine, platform};

    fn display_names(rows: &[Row], runtime: &impl Runtime, os: OsFamily) -> Vec<String> {
        rows.iter()
            .flat_map(|row| row.resolve(runtime, os, "pwsh"))
            .map(|candidate| candidate.display_name)
            .collect()
    }

    #[test]
    fn test_join_uses_descriptor_separator() {
        assert_eq!(
            join(OsFamily::Windows, r"C:\Program Files\", &["PowerShell", "6"]),
            r"C:\Program Files\PowerShell\6"
        );
        assert_eq!(
            join(OsFamily::Linux, "/usr/bin/", &["pwsh"]),
            "/usr/bin/pwsh"
        );
    }

    #[test]
    fn test_leaf_name_handles_both_separators() {
        assert_eq!(leaf_name(Path::new(r"C:\Program Files\PowerShell\6")), "6");
        assert_eq!(leaf_name(Path::new("/opt/microsoft/powershell/7")), "7");
        assert_eq!(
            leaf_name(Path::new(r"C:\Apps\Microsoft.PowerShell_8wekyb3d8bbwe\")),
            "Microsoft.PowerShell_8wekyb3d8bbwe"
        );
    }

    #[test]
    fn test_parse_version_dir() {
        assert_eq!(parse_version_dir("6", Channel::Stable), Some(6));
        assert_eq!(parse_version_dir("10", Channel::Stable), Some(10));
        assert_eq!(parse_version_dir("7-preview", Channel::Stable), None);
        assert_eq!(parse_version_dir("+8", Channel::Stable), None);
        assert_eq!(parse_version_dir("", Channel::Stable), None);
        assert_eq!(parse_version_dir("7-preview", Channel::Preview), Some(7));
        assert_eq!(parse_version_dir("7", Channel::Preview), None);
        assert_eq!(parse_version_dir("-preview", Channel::Preview), None);
        assert_eq!(parse_version_dir("7-rc", Channel::Preview), None);
    }

    #[test]
    fn test_windows_64bit_process_rows() {
        let rows = platform_rows(&platform::windows_x64(), "pwsh");
        assert_eq!(
            rows,
            vec![
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_VAR,
                    bitness: Bitness::X64,
                    channel: Channel::Stable,
                },
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_X86_VAR,
                    bitness: Bitness::X86,
                    channel: Channel::Stable,
                },
                Row::Store {
                    channel: Channel::Stable,
                },
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_VAR,
                    bitness: Bitness::X64,
                    channel: Channel::Preview,
                },
                Row::Store {
                    channel: Channel::Preview,
                },
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_X86_VAR,
                    bitness: Bitness::X86,
                    channel: Channel::Preview,
                },
                Row::Legacy {
                    system_dir: SYSTEM32,
                    bitness: Bitness::X64,
                },
                Row::Legacy {
                    system_dir: SYSWOW64,
                    bitness: Bitness::X86,
                },
            ]
        );
    }

    #[test]
    fn test_windows_32bit_process_on_64bit_os_rows() {
        let rows = platform_rows(&platform::windows_wow64(), "pwsh");
        assert_eq!(rows.len(), 8);
        assert_eq!(
            rows[0],
            Row::ProgramFiles {
                root_var: PROGRAM_FILES_VAR,
                bitness: Bitness::X86,
                channel: Channel::Stable,
            }
        );
        assert_eq!(
            rows[1],
            Row::ProgramFiles {
                root_var: PROGRAM_W6432_VAR,
                bitness: Bitness::X64,
                channel: Channel::Stable,
            }
        );
        assert_eq!(
            rows[6..],
            [
                Row::Legacy {
                    system_dir: SYSTEM32,
                    bitness: Bitness::X86,
                },
                Row::Legacy {
                    system_dir: SYSNATIVE,
                    bitness: Bitness::X64,
                },
            ]
        );
    }

    #[test]
    fn test_windows_32bit_os_rows() {
        let rows = platform_rows(&platform::windows_x86(), "pwsh");
        assert_eq!(
            rows,
            vec![
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_VAR,
                    bitness: Bitness::X86,
                    channel: Channel::Stable,
                },
                Row::Store {
                    channel: Channel::Stable,
                },
                Row::ProgramFiles {
                    root_var: PROGRAM_FILES_VAR,
                    bitness: Bitness::X86,
                    channel: Channel::Preview,
                },
                Row::Store {
                    channel: Channel::Preview,
                },
                Row::Legacy {
                    system_dir: SYSTEM32,
                    bitness: Bitness::X86,
                },
            ]
        );
    }

    #[test]
    fn test_unix_rows_use_exe_name() {
        let linux: Vec<Row> = platform_rows(&platform::linux(), "pwsh-lts");
        assert_eq!(
            linux,
            vec![
                fixed("/usr/bin/pwsh-lts".into(), "PowerShell"),
                fixed("/snap/bin/pwsh-lts".into(), "PowerShell Snap"),
                fixed("/usr/bin/pwsh-lts-preview".into(), "PowerShell Preview"),
                fixed("/snap/bin/pwsh-lts-preview".into(), "PowerShell Preview Snap"),
            ]
        );

        let macos = platform_rows(&platform::macos(), "pwsh");
        assert_eq!(
            macos,
            vec![
                fixed("/usr/local/bin/pwsh".into(), "PowerShell"),
                fixed("/usr/local/bin/pwsh-preview".into(), "PowerShell Preview"),
            ]
        );
    }

    fn exe_paths(candidates: &[Candidate]) -> Vec<PathBuf> {
        candidates.iter().map(|c| c.exe_path.clone()).collect()
    }

    #[test]
    fn test_program_files_orders_versions_highest_first() {
        let (runtime, probes) = Machine::windows_x64()
            .dir(
                r"C:\Program Files\PowerShell",
                &["6", "7", "10", "7-preview", "8-preview", "junk", "+11"],
            )
            .into_runtime();

        let stable = Row::ProgramFiles {
            root_var: PROGRAM_FILES_VAR,
            bitness: Bitness::X64,
            channel: Channel::Stable,
        };
        let candidates = stable.resolve(&runtime, OsFamily::Windows, "pwsh");
        assert_eq!(
            exe_paths(&candidates),
            vec![
                PathBuf::from(r"C:\Program Files\PowerShell\10\pwsh.exe"),
                PathBuf::from(r"C:\Program Files\PowerShell\7\pwsh.exe"),
                PathBuf::from(r"C:\Program Files\PowerShell\6\pwsh.exe"),
            ]
        );
        assert!(candidates.iter().all(|c| c.display_name == "PowerShell (x64)"));
        assert!(candidates.iter().all(|c| c.supports_rich_arguments));

        let preview = Row::ProgramFiles {
            root_var: PROGRAM_FILES_VAR,
            bitness: Bitness::X64,
            channel: Channel::Preview,
        };
        let candidates = preview.resolve(&runtime, OsFamily::Windows, "pwsh");
        assert_eq!(
            exe_paths(&candidates),
            vec![
                PathBuf::from(r"C:\Program Files\PowerShell\8-preview\pwsh.exe"),
                PathBuf::from(r"C:\Program Files\PowerShell\7-preview\pwsh.exe"),
            ]
        );
        assert!(
            candidates
                .iter()
                .all(|c| c.display_name == "PowerShell Preview (x64)")
        );

        // Resolution lists directories but never checks executables
        assert!(probes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_program_files_without_install_dir_is_skipped() {
        // Nothing registered under Program Files: read_dir fails
        let (runtime, _) = Machine::windows_x64().into_runtime();

        let row = Row::ProgramFiles {
            root_var: PROGRAM_FILES_VAR,
            bitness: Bitness::X64,
            channel: Channel::Stable,
        };
        assert!(row.resolve(&runtime, OsFamily::Windows, "pwsh").is_empty());
    }

    #[test]
    fn test_program_files_without_matching_version_is_skipped() {
        let (runtime, _) = Machine::windows_x64()
            .dir(r"C:\Program Files\PowerShell", &["7-preview"])
            .into_runtime();

        let row = Row::ProgramFiles {
            root_var: PROGRAM_FILES_VAR,
            bitness: Bitness::X64,
            channel: Channel::Stable,
        };
        assert!(row.resolve(&runtime, OsFamily::Windows, "pwsh").is_empty());
    }

    #[test]
    fn test_missing_env_var_skips_only_that_row() {
        let (runtime, _) = Machine::default()
            .env("windir", r"C:\WINDOWS")
            .env("ProgramFiles", "")
            .into_runtime();

        let rows = platform_rows(&platform::windows_x64(), "pwsh");
        assert_eq!(
            display_names(&rows, &runtime, OsFamily::Windows),
            vec!["Windows PowerShell (x64)", "Windows PowerShell (x86)"]
        );
    }

    #[test]
    fn test_store_package_selection() {
        let (runtime, _) = Machine::windows_x64()
            .dir(
                r"C:\Users\user\AppData\Local\Microsoft\WindowsApps",
                &[
                    "python.exe",
                    "Microsoft.PowerShellPreview_8wekyb3d8bbwe",
                    "Microsoft.PowerShell_8wekyb3d8bbwe",
                    "Microsoft.PowerShell_aaaaaaaaaaaaa",
                ],
            )
            .into_runtime();

        let stable = Row::Store {
            channel: Channel::Stable,
        }
        .resolve(&runtime, OsFamily::Windows, "pwsh")
        .remove(0);
        assert_eq!(
            stable.exe_path,
            PathBuf::from(
                r"C:\Users\user\AppData\Local\Microsoft\WindowsApps\Microsoft.PowerShell_8wekyb3d8bbwe\pwsh.exe"
            )
        );
        assert_eq!(stable.display_name, "PowerShell (Store)");

        let preview = Row::Store {
            channel: Channel::Preview,
        }
        .resolve(&runtime, OsFamily::Windows, "pwsh")
        .remove(0);
        assert_eq!(
            preview.exe_path,
            PathBuf::from(
                r"C:\Users\user\AppData\Local\Microsoft\WindowsApps\Microsoft.PowerShellPreview_8wekyb3d8bbwe\pwsh.exe"
            )
        );
        assert_eq!(preview.display_name, "PowerShell Preview (Store)");
    }

    #[test]
    fn test_store_without_package_is_skipped() {
        let (runtime, _) = Machine::windows_x64()
            .dir(
                r"C:\Users\user\AppData\Local\Microsoft\WindowsApps",
                &["python.exe"],
            )
            .into_runtime();

        let row = Row::Store {
            channel: Channel::Stable,
        };
        assert!(row.resolve(&runtime, OsFamily::Windows, "pwsh").is_empty());
    }

    #[test]
    fn test_legacy_row() {
        let (runtime, _) = Machine::windows_x64().into_runtime();

        let row = Row::Legacy {
            system_dir: SYSNATIVE,
            bitness: Bitness::X64,
        };
        let candidate = row.resolve(&runtime, OsFamily::Windows, "pwsh").remove(0);
        assert_eq!(
            candidate.exe_path,
            PathBuf::from(r"C:\WINDOWS\Sysnative\WindowsPowerShell\v1.0\powershell.exe")
        );
        assert_eq!(candidate.display_name, "Windows PowerShell (x64)");
    }
}
