//! Command-line interface for Kiln
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: One-shot bundle
//! - `dev`: Watch mode with live reload
//! - `init`: Project scaffolding

mod build;
mod dev;
mod init;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::BuildCommand;
pub use dev::DevCommand;
pub use init::InitCommand;

/// Kiln - a build orchestrator that drives your bundler and keeps the browser hot
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory containing kiln.toml
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle the project once
    Build(BuildCommand),

    /// Watch the project and live-reload on rebuilds
    Dev(DevCommand),

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.project).await,
            Commands::Dev(cmd) => cmd.execute(&self.project).await,
            Commands::Init(cmd) => cmd.execute(&self.project).await,
        }
    }
}

/// Print the Kiln banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "∆".cyan(),
        "Kiln".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
