// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=OSD_COMPOSITOR_VERSION");

    // Packaging builds pin the version explicitly
    let version = match std::env::var("OSD_COMPOSITOR_VERSION") {
        Ok(v) => v,
        Err(_) => {
            let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
            match get_commit_hash() {
                Some(hash) => format!("{}-{}", pkg_version, hash),
                None => pkg_version,
            }
        }
    };

    println!("cargo::rustc-env=BUILD_VERSION={}", version);
}

fn get_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
