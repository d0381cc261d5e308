fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    // `git describe` gives the tag on release builds and tag-N-gHASH otherwise.
    let describe = std::process::Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    println!("cargo:rustc-env=GIT_DESCRIBE={describe}");
}
