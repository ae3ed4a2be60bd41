use crate::finder::fix_windows_legacy_path;

/// Print the `System32` form of a Windows PowerShell path.
///
/// Runs the rewrite whatever the host is, so paths copied from a Windows
/// machine can be normalized anywhere.
#[tracing::instrument]
pub fn fix_path(path: &str) {
    println!("{}", fix_windows_legacy_path(path));
}
