// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rank command - runs the scoring pipeline and writes the rankings table

use crate::config::{self, Config};
use crate::{output, pipeline};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::info;

/// Arguments for a ranking run
#[derive(Debug, Clone, Default)]
pub struct RankArgs {
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Override for `output.rankings_file`
    pub output: Option<PathBuf>,
    /// Colorize the completion message
    pub color: bool,
}

/// Run the rank command
pub fn run(args: &RankArgs) -> Result<()> {
    let config_path = config::locate(args.config.as_deref());
    info!("Using configuration {}", config_path.display());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let ranking = pipeline::run(&config).context("Ranking pipeline failed")?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.rankings_path());
    output::write_ranking(&ranking, &output_path)
        .with_context(|| format!("Failed to write rankings to {}", output_path.display()))?;

    let summary = ranking.summary();
    let message = format!(
        "Ranking complete! Check '{}' for results.",
        output_path.display()
    );
    if args.color {
        println!("{}", message.green());
    } else {
        println!("{message}");
    }
    println!("  Ranked {} of {} projects", summary.ranked, summary.total);

    Ok(())
}
