use std::process::Command;

fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs");

    println!("cargo:rustc-env=GIT_COMMIT={}", git(&["rev-list", "-1", "HEAD"]));

    // Only set when HEAD is tagged
    println!("cargo:rustc-env=RELEASE_VERSION={}", git(&["tag", "--points-at", "HEAD"]));
}
