use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Version from the nearest tag, e.g. `v1.2.0-3-gabc1234` -> `1.2.0-3-gabc1234`.
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let version = described.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    (!version.is_empty()).then(|| version.to_string())
}

fn build_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    // Local edits and source tarballs get a build time suffix
    let version = match git_version() {
        Some(v) if v.ends_with("-dirty") => format!("{v}+{}", build_time()),
        Some(v) => v,
        None => format!("{}+{}", env!("CARGO_PKG_VERSION"), build_time()),
    };

    println!("cargo:rustc-env=PWSHFIND_VERSION={version}");
}
