//! Configuration schema definitions
//!
//! Only the fields kiln reads or patches are typed here; the rest of the
//! file belongs to the bundler engine and is kept opaque.

use serde::{Deserialize, Serialize};

/// Conventional project-local directory searched for loader modules.
pub const DEFAULT_MODULES_DIR: &str = "loaders";

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Bundle filename inside the output directory
    #[serde(default = "default_output_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename: default_output_filename(),
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_output_filename() -> String {
    "bundle.js".to_string()
}

/// Loader resolution configuration
///
/// `modules_dirs` is a loader search path: the list of directories the
/// engine walks, in order, to find transformation plugins referenced by
/// the configuration. `None` means the project never declared one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveLoaderConfig {
    /// Directories searched for loader modules, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_dirs: Option<Vec<String>>,
}

/// Bundler engine selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable to drive
    #[serde(default = "default_engine_command")]
    pub command: String,

    /// Extra arguments passed to the engine verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
        }
    }
}

fn default_engine_command() -> String {
    "kilnc".to_string()
}

/// Watch behaviour forwarded to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce window for batching file-change events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Poll the filesystem instead of relying on native watch events
    #[serde(default)]
    pub poll: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll: false,
        }
    }
}

fn default_debounce_ms() -> u64 {
    150
}

/// Live-reload endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadConfig {
    /// Host to bind the reload endpoint to
    #[serde(default = "default_reload_host")]
    pub host: String,

    /// Port for the reload endpoint
    #[serde(default = "default_reload_port")]
    pub port: u16,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            host: default_reload_host(),
            port: default_reload_port(),
        }
    }
}

fn default_reload_host() -> String {
    "localhost".to_string()
}

fn default_reload_port() -> u16 {
    35729
}
