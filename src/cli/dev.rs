//! Dev command implementation
//!
//! Starts the live-reload endpoint, then keeps the bundler engine
//! watching the project until Ctrl+C.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use crate::build::{BuildMode, Orchestrator};
use crate::compiler::{ProcessCompiler, WatchOptions};
use crate::config::Config;
use crate::reload::{ReloadOptions, ReloadServer};

/// Watch the project and live-reload on rebuilds
#[derive(Args, Debug)]
pub struct DevCommand {
    /// Port for the live-reload endpoint
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind the live-reload endpoint to
    #[arg(long)]
    pub host: Option<String>,

    /// Public URL prefix announced to reload clients
    #[arg(long)]
    pub public_url: Option<String>,
}

impl DevCommand {
    pub async fn execute(&self, project: &Path) -> Result<()> {
        // Peek at the reload settings; the orchestrator owns the real
        // configuration lifecycle.
        let config = Config::load(project)?;
        let host = self.host.clone().unwrap_or_else(|| config.reload.host.clone());
        let port = self.port.unwrap_or(config.reload.port);

        let server = Arc::new(ReloadServer::new(&host, port));
        eprintln!(
            "{} Live-reload clients connect to {}\n",
            "→".blue(),
            server.endpoint().cyan().underline()
        );

        let endpoint = tokio::spawn(server.clone().serve());

        let orchestrator = Orchestrator::new(project.to_path_buf(), server.clone());
        let mut handle = orchestrator
            .bundle(
                BuildMode::Watch(WatchOptions::from(&config.watch)),
                Box::new(|| info!("initial build complete, watching for changes")),
                ReloadOptions {
                    public_url: self.public_url.clone(),
                },
                ProcessCompiler::new,
            )
            .await;

        handle.ready().await?;

        tokio::select! {
            _ = handle.finished() => {
                warn!("the bundler stopped watching");
            }
            result = endpoint => {
                if let Ok(Err(err)) = result {
                    return Err(err);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
            }
        }

        Ok(())
    }
}
