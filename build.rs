use rustc_version::{version_meta, Channel};

// `rustc_nightly` gates the `#[bench]` harness, which needs `feature(test)`.
fn main() {
    let meta = version_meta().unwrap();
    assert!(meta.semver.major >= 1);

    if let Channel::Nightly = meta.channel {
        println!("cargo:rustc-cfg=rustc_nightly");
    }
}
