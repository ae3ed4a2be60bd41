//! Canonical paths for the Windows system directory aliases.
//!
//! Windows redirects 32-bit processes from `System32` to `SysWOW64`, and lets
//! them reach the real 64-bit `System32` through the `Sysnative` alias. The
//! same legacy interpreter can therefore be reported under three names.

use std::iter;

pub(crate) const SYSTEM32: &str = "System32";
pub(crate) const SYSWOW64: &str = "SysWOW64";
pub(crate) const SYSNATIVE: &str = "Sysnative";

/// Rewrite a path under `SysWOW64` or `Sysnative` to the equivalent path under
/// `System32`, leaving every other character untouched.
///
/// Only the first system directory segment is considered, compared
/// case-insensitively. Paths already under `System32`, in any spelling, and
/// paths without a system directory are returned unchanged, so the function
/// is idempotent.
pub fn fix_windows_legacy_path(path: &str) -> String {
    let mut start = 0;
    let boundaries = path
        .match_indices(['\\', '/'])
        .map(|(idx, _)| idx)
        .chain(iter::once(path.len()));

    for end in boundaries {
        let segment = &path[start..end];
        if segment.eq_ignore_ascii_case(SYSTEM32) {
            break;
        }
        if segment.eq_ignore_ascii_case(SYSWOW64) || segment.eq_ignore_ascii_case(SYSNATIVE) {
            return format!("{}{}{}", &path[..start], SYSTEM32, &path[end..]);
        }
        start = end + 1;
    }

    path.to_string()
}
