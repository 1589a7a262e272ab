//! External bundler engine driven over a child process
//!
//! Wire contract with the engine:
//! - the full configuration is written to the engine's stdin as one JSON
//!   document, then stdin is closed;
//! - the engine writes one JSON stats document per compile pass to
//!   stdout, newline-delimited;
//! - everything else the engine prints goes to stderr and is passed
//!   through to the user;
//! - the engine exits zero even when the pass contains compile errors
//!   (diagnostics are data, not failure); a nonzero exit is an
//!   invocation failure.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Config;
use crate::stats::BuildStats;

use super::{CompileEvent, Compiler, CompilerError, EventStream, WatchOptions};

/// Bundler engine invoked as a child process
#[derive(Debug)]
pub struct ProcessCompiler {
    command: PathBuf,
    args: Vec<String>,
    config: serde_json::Value,
}

impl ProcessCompiler {
    /// Bind the configured engine executable to a loaded configuration.
    pub fn new(config: &Config) -> Result<Self, CompilerError> {
        let command = which::which(&config.engine.command).map_err(|_| {
            CompilerError::EngineNotFound {
                command: config.engine.command.clone(),
            }
        })?;

        let config_json =
            serde_json::to_value(config).map_err(CompilerError::ConfigEncode)?;

        Ok(Self {
            command,
            args: config.engine.args.clone(),
            config: config_json,
        })
    }

    async fn spawn_events(&self, watch: Option<WatchOptions>) -> EventStream {
        let (tx, rx) = mpsc::channel::<CompileEvent>(16);

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--stats=json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(watch) = &watch {
            cmd.arg("--watch");
            cmd.arg(format!("--debounce={}", watch.debounce_ms));
            if watch.poll {
                cmd.arg("--poll");
            }
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let command = self.command.display().to_string();
                let _ = tx.send(Err(CompilerError::Launch { command, source })).await;
                return rx;
            }
        };

        let config = self.config.to_string();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();

        tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // An engine that dies before reading its configuration
                // surfaces through the stats stream, not here.
                if let Err(err) = stdin.write_all(config.as_bytes()).await {
                    debug!("could not hand configuration to the bundler: {err}");
                }
                let _ = stdin.write_all(b"\n").await;
            }

            let Some(stdout) = stdout else { return };
            let mut lines = BufReader::new(stdout).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<BuildStats>(line) {
                            Ok(stats) => {
                                if tx.send(Ok(stats)).await.is_err() {
                                    // Consumer went away; dropping the
                                    // child kills the engine.
                                    return;
                                }
                            }
                            Err(err) => {
                                let _ = tx
                                    .send(Err(CompilerError::MalformedStats(err)))
                                    .await;
                                return;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let _ = tx.send(Err(CompilerError::Output(err))).await;
                        return;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if !status.success() => {
                    let _ = tx.send(Err(CompilerError::Exited(status))).await;
                }
                Ok(_) => {}
                Err(err) => {
                    let _ = tx.send(Err(CompilerError::Output(err))).await;
                }
            }
        });

        rx
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    async fn run(&self) -> EventStream {
        self.spawn_events(None).await
    }

    async fn watch(&self, options: WatchOptions) -> EventStream {
        self.spawn_events(Some(options)).await
    }
}
