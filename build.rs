use std::fs;

// Exposes package metadata as SUBTRACK_PKG_* for the log banner of both binaries.
fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");
    let cargo_toml = fs::read_to_string("Cargo.toml").expect("Failed to read Cargo.toml");
    let cargo: toml::Value = cargo_toml.parse().expect("Failed to parse Cargo.toml");

    let package = cargo.get("package");
    for key in ["name", "version", "description"] {
        let value = package
            .and_then(|pkg| pkg.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        println!(
            "cargo:rustc-env=SUBTRACK_PKG_{}={}",
            key.to_uppercase(),
            value
        );
    }
}
