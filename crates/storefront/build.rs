//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so `/static/css/derived/main.{hash}.css` can
//! be served with a long cache lifetime. The hash is exposed to templates
//! through `env!("CSS_HASH")`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"),
    );
    let static_dir = manifest_dir.join("static/css");
    let source = static_dir.join("main.css");

    println!("cargo:rerun-if-changed={}", source.display());

    match fingerprint(&source, &static_dir.join("derived")) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Stylesheet not fingerprinted: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Copy `source` into `derived_dir` as `main.{hash}.css`, removing copies
/// left by earlier builds.
fn fingerprint(source: &Path, derived_dir: &Path) -> io::Result<String> {
    let content = fs::read(source)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest).to_string();

    fs::create_dir_all(derived_dir)?;
    let target_name = format!("main.{hash}.css");

    for entry in fs::read_dir(derived_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("main.") && name.ends_with(".css") && name != target_name {
            fs::remove_file(entry.path())?;
        }
    }

    let target = derived_dir.join(&target_name);
    if !target.exists() {
        fs::write(&target, &content)?;
    }
    Ok(hash)
}
