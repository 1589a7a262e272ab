//! Build command implementation

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::debug;

use crate::build::{BuildMode, Orchestrator};
use crate::compiler::ProcessCompiler;
use crate::reload::{Disconnected, ReloadOptions};
use crate::utils;

/// Bundle the project once
#[derive(Args, Debug)]
pub struct BuildCommand {}

impl BuildCommand {
    pub async fn execute(&self, project: &Path) -> Result<()> {
        let start = Instant::now();

        // A single build never reaches the notifier.
        let orchestrator =
            Orchestrator::new(project.to_path_buf(), Arc::new(Disconnected));

        let mut handle = orchestrator
            .bundle(
                BuildMode::Once,
                Box::new(|| debug!("initial build complete")),
                ReloadOptions::default(),
                ProcessCompiler::new,
            )
            .await;

        handle.ready().await?;

        let bundle = handle.bundle_path().to_path_buf();
        handle.finished().await;

        let shown = utils::relative_path(&utils::absolutize(project), &bundle)
            .unwrap_or_else(|| bundle.display().to_string());
        eprintln!(
            "\n{} Bundled {} in {}\n",
            "✓".green().bold(),
            shown.cyan(),
            utils::format_duration(start.elapsed()).dimmed()
        );

        Ok(())
    }
}
