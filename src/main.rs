// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Retrorank CLI - weighted heuristic ranking of candidate projects

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use retrorank::commands;
use retrorank::commands::rank::RankArgs;

#[derive(Parser)]
#[command(name = "retrorank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "RETRORANK_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and rank projects (the default when no command is given)
    Rank {
        /// Write rankings here instead of output.rankings_file
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Destination
        #[arg(default_value = "heuristics.toml")]
        path: std::path::PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        None => commands::rank::run(&RankArgs {
            config: cli.config,
            output: None,
            color: !cli.no_color,
        }),
        Some(Commands::Rank { output }) => commands::rank::run(&RankArgs {
            config: cli.config,
            output,
            color: !cli.no_color,
        }),
        Some(Commands::Init { path, force }) => commands::init::run(&path, force),
        Some(Commands::Completions { shell }) => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
