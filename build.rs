//! Ships `assets/` next to the build output so native runs out of `target/` find it.

use std::{env, path::PathBuf};

use anyhow::Context;
use fs_extra::dir::{self, CopyOptions};

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let assets = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("assets");
    if !assets.is_dir() {
        println!("cargo:warning=no assets/ directory, the grove starts without textures and models");
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let options = CopyOptions::new().overwrite(true);
    dir::copy(&assets, &out_dir, &options).with_context(|| {
        format!("Could not copy {} into {}", assets.display(), out_dir.display())
    })?;
    Ok(())
}
