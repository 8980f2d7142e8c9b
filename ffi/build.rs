//! Generate `mailman.h` for C callers.
//!
//! The header lands in `OUT_DIR`. Generation problems are reported as
//! warnings so the Rust build itself never depends on cbindgen succeeding.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("MAILMAN_FFI_H".to_string()),
        enumeration: cbindgen::EnumConfig {
            prefix_with_name: true,
            ..Default::default()
        },
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("mailman.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
