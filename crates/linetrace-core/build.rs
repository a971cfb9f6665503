//! Build script for linetrace-core
//!
//! Checks the compiler before building. The line interpreter relies on
//! `let`-`else` and `Option::is_none_or`, so anything older than Rust 1.82
//! fails with an explanation instead of a wall of syntax errors.

const MIN_RUST_VERSION: (u64, u64) = (1, 82);

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    match rustc_version::version() {
        Ok(version) => {
            if (version.major, version.minor) < MIN_RUST_VERSION {
                panic!(
                    "linetrace-core requires Rust {}.{} or newer, found {}",
                    MIN_RUST_VERSION.0, MIN_RUST_VERSION.1, version
                );
            }
        }
        // Some build environments hide rustc; don't fail the build for that
        Err(_) => println!("cargo:warning=could not verify Rust version"),
    }
}
