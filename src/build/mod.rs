//! Build orchestration
//!
//! Drives one engine invocation (single build or watch) and narrates its
//! result: loads the project configuration, patches the loader search
//! path, binds the engine, and on every compile pass formats the stats
//! and tells the live-reload notifier about fresh bundles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use colored::Colorize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::compiler::{Compiler, CompilerError, EventStream, WatchOptions};
use crate::config::{Config, CONFIG_FILE};
use crate::reload::{LiveReload, ReloadOptions};
use crate::stats::{self, BuildStats, StatsOptions};
use crate::utils::{ExitFailure, FatalHandler};

/// Single build or continuous rebuild
#[derive(Debug, Clone)]
pub enum BuildMode {
    Once,
    Watch(WatchOptions),
}

/// Callback invoked once the first compile pass completes.
///
/// `FnOnce` by construction: callers rely on exactly-once delivery even
/// when the engine keeps rebuilding under watch.
pub type OnFirstBuild = Box<dyn FnOnce() + Send>;

/// Pending-completion handle for a bundle invocation.
///
/// Resolves exactly once, on the first compile pass. The driver keeps
/// consuming rebuild events after that for as long as the engine
/// produces them; there is no cancellation here, stopping watch mode is
/// the engine's own lifecycle.
pub struct BundleHandle {
    ready: oneshot::Receiver<Result<(), CompilerError>>,
    driver: JoinHandle<()>,
    bundle_path: PathBuf,
}

impl BundleHandle {
    /// Wait for the first compile pass to finish.
    pub async fn ready(&mut self) -> Result<(), CompilerError> {
        match (&mut self.ready).await {
            Ok(result) => result,
            // Driver went away before the first pass reported anything.
            Err(_) => Err(CompilerError::Interrupted),
        }
    }

    /// Run until the engine tears the event stream down.
    pub async fn finished(self) {
        let _ = self.driver.await;
    }

    /// Absolute path of the bundle the engine writes.
    pub fn bundle_path(&self) -> &Path {
        &self.bundle_path
    }
}

/// The build orchestrator
pub struct Orchestrator {
    project_dir: PathBuf,
    loader_dir: PathBuf,
    reload: Arc<dyn LiveReload>,
    fatal: Arc<dyn FatalHandler>,
}

impl Orchestrator {
    pub fn new(project_dir: PathBuf, reload: Arc<dyn LiveReload>) -> Self {
        Self {
            project_dir,
            loader_dir: default_loader_dir(),
            reload,
            fatal: Arc::new(ExitFailure),
        }
    }

    /// Override the supplemental loader directory.
    pub fn with_loader_dir(mut self, dir: PathBuf) -> Self {
        self.loader_dir = dir;
        self
    }

    /// Override the fatal-failure handler.
    pub fn with_fatal_handler(mut self, fatal: Arc<dyn FatalHandler>) -> Self {
        self.fatal = fatal;
        self
    }

    /// Bundle the project.
    ///
    /// Loads the configuration (unloadable configuration is fatal, no
    /// engine is constructed), patches the loader search path, binds the
    /// engine via `compiler_for` and starts it in the requested mode.
    /// Returns a handle that resolves on the first compile pass while
    /// rebuild events keep being consumed in the background.
    pub async fn bundle<C, F>(
        &self,
        mode: BuildMode,
        on_first_build: OnFirstBuild,
        options: ReloadOptions,
        compiler_for: F,
    ) -> BundleHandle
    where
        C: Compiler + 'static,
        F: FnOnce(&Config) -> Result<C, CompilerError>,
    {
        eprintln!("{}", "∆ Compiling and bundling...".yellow().bold());

        let mut config = match Config::load(&self.project_dir) {
            Ok(config) => config,
            Err(err) => {
                error!("there was an error loading {}", CONFIG_FILE);
                self.fatal.fail(err);
            }
        };
        eprintln!(
            "{} Using {}",
            "✓".green().bold(),
            config.path().display().to_string().cyan()
        );

        config.add_loader_dir(&self.loader_dir);
        debug!(
            "loader search path: {:?}",
            config.resolve_loader.modules_dirs
        );

        let bundle_path = config.bundle_path();

        let compiler = match compiler_for(&config) {
            Ok(compiler) => compiler,
            Err(err) => self.fatal.fail(err.into()),
        };

        let events = match mode {
            BuildMode::Once => compiler.run().await,
            BuildMode::Watch(watch_options) => compiler.watch(watch_options).await,
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        let driver = tokio::spawn(drive(
            events,
            ready_tx,
            on_first_build,
            self.reload.clone(),
            self.fatal.clone(),
            bundle_path.clone(),
            options,
        ));

        BundleHandle {
            ready: ready_rx,
            driver,
            bundle_path,
        }
    }
}

/// Consume the engine's event stream, one event per compile pass.
async fn drive(
    mut events: EventStream,
    ready: oneshot::Sender<Result<(), CompilerError>>,
    on_first_build: OnFirstBuild,
    reload: Arc<dyn LiveReload>,
    fatal: Arc<dyn FatalHandler>,
    bundle_path: PathBuf,
    options: ReloadOptions,
) {
    let mut ready = Some(ready);
    // First-pass latch: rebuilds must not re-deliver completion.
    let mut on_first_build = Some(on_first_build);

    while let Some(event) = events.recv().await {
        let stats = match event {
            Ok(stats) => stats,
            Err(err) => {
                // Engine invocation failure, distinct from compile
                // diagnostics: the caller gets to handle it, the build
                // is over either way.
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(err));
                }
                return;
            }
        };

        if let Some(callback) = on_first_build.take() {
            handle_first_pass(&stats, callback, &mut ready, fatal.as_ref());
        } else {
            handle_rebuild(&stats, reload.as_ref(), &bundle_path, &options).await;
        }
    }
}

fn handle_first_pass(
    stats: &BuildStats,
    callback: OnFirstBuild,
    ready: &mut Option<oneshot::Sender<Result<(), CompilerError>>>,
    fatal: &dyn FatalHandler,
) {
    callback();

    if stats.has_errors() {
        let summary = stats
            .errors
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        // Hard stop on a broken first build. Revisit once rebuild error
        // surfacing is rich enough to rely on here instead.
        fatal.fail(anyhow!("the bundler reported errors:\n{summary}"));
    }

    print_stats(stats);

    if let Some(tx) = ready.take() {
        let _ = tx.send(Ok(()));
    }
}

async fn handle_rebuild(
    stats: &BuildStats,
    reload: &dyn LiveReload,
    bundle_path: &Path,
    options: &ReloadOptions,
) {
    if stats.has_errors() {
        error!("the bundler reported errors");
        for diagnostic in &stats.errors {
            error!("{diagnostic}");
        }
        return;
    }

    print_stats(stats);
    reload.print_command_tips();

    if let Err(err) = reload.notify(bundle_path, options).await {
        warn!("could not notify reload clients: {err:#}");
    }
}

/// Fixed presentation policy: colorized, per-module detail, no chunk
/// noise, third-party packages hidden. Warnings go out on the debug
/// tier before the stats text.
fn print_stats(stats: &BuildStats) {
    if stats.has_warnings() {
        debug!("there are some warnings");
        for warning in &stats.warnings {
            debug!("{warning}");
        }
    }

    info!("\n{}", stats::render(stats, &StatsOptions::default()));
}

/// Loaders ship next to the kiln binary so projects do not have to
/// install them.
fn default_loader_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("loaders")))
        .unwrap_or_else(|| PathBuf::from("loaders"))
}
