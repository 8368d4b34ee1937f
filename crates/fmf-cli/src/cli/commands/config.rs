//! `fmf config` subcommands.

use anyhow::{Context, Result};
use fmf_core::config::{Config, paths};

/// Prints where fmf reads its config from (honours `FMF_HOME`).
pub fn path() {
    println!("{}", paths::config_path().display());
}

/// Writes the commented default config into `FMF_HOME`.
pub fn init() -> Result<()> {
    let target = paths::config_path();
    Config::init(&target).context("write default fmf config")?;
    println!("Wrote default config to {}", target.display());
    println!("Set api.base_url there to point fmf at your ForkMyFolio backend.");
    Ok(())
}

/// Prints the template with built-in defaults, without touching disk.
pub fn generate() -> Result<()> {
    print!("{}", Config::generate().context("render fmf config")?);
    Ok(())
}
