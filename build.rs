use std::process::Command;

fn main() {
    // Prefer WORKSTATION_VERSION if set (e.g., by a release pipeline),
    // otherwise fall back to git describe for local builds.
    if let Ok(version) = std::env::var("WORKSTATION_VERSION") {
        println!("cargo:rustc-env=WORKSTATION_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=WORKSTATION_VERSION={version}");
    } else {
        let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
        println!("cargo:rustc-env=WORKSTATION_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=WORKSTATION_VERSION");
}
