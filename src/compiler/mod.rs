//! Bundler engine interface
//!
//! Kiln never bundles anything itself. This module is the contract a
//! bundler engine has to satisfy: start a build (one-shot or watch) and
//! deliver one stats event per compile pass. Invocation failures travel
//! as `Err` events on the same stream, so callers can tell "the bundler
//! could not run" apart from "the code has diagnostics".

mod process;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::WatchConfig;
use crate::stats::BuildStats;

pub use process::ProcessCompiler;

/// One event per compile pass.
///
/// `Err` is an engine invocation failure, not a compile diagnostic;
/// diagnostics travel inside `BuildStats`.
pub type CompileEvent = Result<BuildStats, CompilerError>;

/// Stream of compile events, one per pass
pub type EventStream = mpsc::Receiver<CompileEvent>;

/// Engine invocation failures
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("bundler `{command}` not found on PATH")]
    EngineNotFound { command: String },

    #[error("failed to launch bundler `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode configuration for the bundler: {0}")]
    ConfigEncode(#[source] serde_json::Error),

    #[error("bundler emitted malformed stats: {0}")]
    MalformedStats(#[from] serde_json::Error),

    #[error("bundler exited with {0}")]
    Exited(std::process::ExitStatus),

    #[error("failed to read bundler output: {0}")]
    Output(#[from] std::io::Error),

    #[error("bundler stopped before reporting a build")]
    Interrupted,
}

/// Watch behaviour forwarded to the engine
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Debounce window for batching file-change events, in milliseconds
    pub debounce_ms: u64,

    /// Poll the filesystem instead of relying on native watch events
    pub poll: bool,
}

impl From<&WatchConfig> for WatchOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            debounce_ms: config.debounce_ms,
            poll: config.poll,
        }
    }
}

/// A bundler engine bound to a loaded configuration
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Run a single build. The stream yields exactly one event, then
    /// closes.
    async fn run(&self) -> EventStream;

    /// Build continuously. Yields an event per compile pass until the
    /// engine itself is torn down.
    async fn watch(&self, options: WatchOptions) -> EventStream;
}
