fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // `v0.3.0` on a release tag, `v0.3.0-4-gabc1234` past one, `abc1234`
    // without tags, empty outside a checkout.
    let described = std::process::Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    let release =
        described.starts_with('v') && !described.contains("-g") && !described.ends_with("-dirty");

    println!("cargo:rustc-env=IMP_GIT_DESCRIBE={described}");
    println!("cargo:rustc-env=IMP_RELEASE_BUILD={release}");
}
