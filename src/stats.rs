//! Build statistics reporting
//!
//! The engine reports every compile pass as a JSON stats document with
//! `errors` and `warnings` lists. Kiln deserializes the document, renders
//! it with a fixed presentation policy, and otherwise leaves the schema
//! to the engine.

use std::fmt;
use std::time::Duration;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::utils::{format_duration, format_size};

/// One compile pass as reported by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Compile errors (diagnostics, not invocation failures)
    #[serde(default)]
    pub errors: Vec<Diagnostic>,

    /// Compile warnings
    #[serde(default)]
    pub warnings: Vec<Diagnostic>,

    /// Per-module detail
    #[serde(default)]
    pub modules: Vec<ModuleStats>,

    /// Per-chunk detail
    #[serde(default)]
    pub chunks: Vec<ChunkStats>,

    /// Wall time of the pass, in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl BuildStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A compile diagnostic with an optional source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
                if let Some(column) = self.column {
                    write!(f, ":{}", column)?;
                }
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Per-module statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStats {
    /// Module name, as the engine resolved it
    pub name: String,

    /// Module size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Per-chunk statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStats {
    pub name: String,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub size: u64,
}

/// How a stats document is rendered
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Colorize the output
    pub colors: bool,

    /// Show per-module detail
    pub modules: bool,

    /// Show per-chunk detail
    pub chunks: bool,

    /// Hide modules whose name contains any of these fragments
    pub exclude: Vec<String>,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            colors: true,
            modules: true,
            chunks: false,
            exclude: vec!["node_modules".to_string()],
        }
    }
}

/// Render a stats document as text.
pub fn render(stats: &BuildStats, options: &StatsOptions) -> String {
    let paint = |text: String, painted: String| {
        if options.colors {
            painted
        } else {
            text
        }
    };

    let mut out = String::new();

    if options.modules {
        let mut hidden = 0usize;
        for module in &stats.modules {
            if is_excluded(&module.name, &options.exclude) {
                hidden += 1;
                continue;
            }
            let size = format_size(module.size);
            out.push_str(&format!(
                "  {}  {}\n",
                paint(module.name.clone(), module.name.cyan().to_string()),
                paint(size.clone(), size.dimmed().to_string()),
            ));
        }
        if hidden > 0 {
            let note = format!("  + {} hidden", hidden);
            out.push_str(&paint(note.clone(), note.dimmed().to_string()));
            out.push('\n');
        }
    }

    if options.chunks {
        for chunk in &stats.chunks {
            let files = chunk.files.join(", ");
            let size = format_size(chunk.size);
            out.push_str(&format!(
                "  {} [{}]  {}\n",
                paint(chunk.name.clone(), chunk.name.cyan().bold().to_string()),
                files,
                paint(size.clone(), size.dimmed().to_string()),
            ));
        }
    }

    if stats.has_errors() {
        let line = format!("  ✗ {} error(s)", stats.errors.len());
        out.push_str(&paint(line.clone(), line.red().bold().to_string()));
        out.push('\n');
    }
    if stats.has_warnings() {
        let line = format!("  ⚠ {} warning(s)", stats.warnings.len());
        out.push_str(&paint(line.clone(), line.yellow().to_string()));
        out.push('\n');
    }

    let duration = format_duration(Duration::from_millis(stats.duration_ms));
    let summary = format!("built {} module(s) in {}", stats.modules.len(), duration);
    out.push_str(&paint(summary.clone(), summary.green().to_string()));

    out
}

fn is_excluded(name: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|fragment| name.contains(fragment.as_str()))
}
