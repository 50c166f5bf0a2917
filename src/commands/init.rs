// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Init command - writes the stock heuristic configuration

use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the default configuration template to `path`
pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it",
            path.display()
        );
    }

    let content = Config::default_template()
        .to_toml()
        .context("Failed to serialize default configuration")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    info!("Wrote default configuration to {}", path.display());
    println!("Created {}", path.display());
    println!("Edit data.* to point at your datasets, then run 'retrorank'");
    Ok(())
}
