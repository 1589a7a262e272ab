//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::CONFIG_FILE;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Bundler engine executable to configure
    #[arg(long, default_value = "kilnc")]
    pub engine: String,
}

impl InitCommand {
    pub async fn execute(&self, project: &Path) -> Result<()> {
        eprintln!("{} Initializing project...\n", "→".blue());

        fs::create_dir_all(project)
            .context("failed to create project directory")?;

        let config_path = project.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }

        fs::write(&config_path, self.generate_config())
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        eprintln!("  {} Created {}", "✓".green(), CONFIG_FILE.cyan());

        let src_dir = project.join("src");
        fs::create_dir_all(&src_dir).context("failed to create src directory")?;

        let entry = src_dir.join("index.js");
        if !entry.exists() {
            fs::write(&entry, "console.log('hello from kiln');\n")
                .context("failed to write src/index.js")?;
            eprintln!("  {} Created {}", "✓".green(), "src/index.js".cyan());
        }

        eprintln!("\n{} Project initialized!\n", "✓".green().bold());
        eprintln!("  Next steps:");
        eprintln!("    {} kiln dev", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
            r#"# Kiln configuration. Everything kiln does not recognize is handed
# to the bundler engine untouched.

[output]
dir = "dist"
filename = "bundle.js"

[engine]
command = "{}"

[watch]
debounce_ms = 150

[reload]
host = "localhost"
port = 35729
"#,
            self.engine
        )
    }
}
