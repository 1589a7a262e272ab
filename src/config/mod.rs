//! Configuration handling for Kiln
//!
//! Parses and manages kiln.toml configuration files. The schema is owned
//! by the bundler engine; kiln types the fields it reads or patches and
//! forwards everything else untouched.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils;

pub use schema::*;

/// Conventional configuration file name inside a project directory.
pub const CONFIG_FILE: &str = "kiln.toml";

/// A project's bundler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Loader resolution configuration
    #[serde(default)]
    pub resolve_loader: ResolveLoaderConfig,

    /// Bundler engine selection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Watch behaviour forwarded to the engine
    #[serde(default)]
    pub watch: WatchConfig,

    /// Live-reload endpoint settings
    #[serde(default)]
    pub reload: ReloadConfig,

    /// Engine-owned settings kiln does not interpret
    #[serde(flatten)]
    pub rest: toml::Table,

    /// Project root (computed from the config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load the configuration from `<project_dir>/kiln.toml`.
    pub fn load<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let root = utils::absolutize(project_dir.as_ref());
        let path = root.join(CONFIG_FILE);

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        config.root = root;

        Ok(config)
    }

    /// Path of the configuration file for this project.
    pub fn path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Make kiln's bundled loaders discoverable without a per-project
    /// install.
    ///
    /// If the project already declares a loader search path, the
    /// supplemental directory is appended to it, once; existing entries
    /// are left alone. Otherwise the field is created with the
    /// conventional project-local directory followed by the supplemental
    /// one.
    pub fn add_loader_dir(&mut self, dir: &Path) {
        let dir = dir.display().to_string();

        match &mut self.resolve_loader.modules_dirs {
            Some(dirs) => {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
            None => {
                self.resolve_loader.modules_dirs =
                    Some(vec![DEFAULT_MODULES_DIR.to_string(), dir]);
            }
        }
    }

    /// Absolute path of the bundle the engine will write.
    pub fn bundle_path(&self) -> PathBuf {
        utils::absolutize(&self.root.join(&self.output.dir).join(&self.output.filename))
    }

    /// Absolute output directory path.
    pub fn output_dir(&self) -> PathBuf {
        utils::absolutize(&self.root.join(&self.output.dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_project(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), content).unwrap();
        dir
    }

    #[test]
    fn load_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn load_unparsable_config_fails() {
        let dir = write_project("[output\ndir = ???");
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn load_applies_defaults() {
        let dir = write_project("");
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.output.dir, "dist");
        assert_eq!(config.output.filename, "bundle.js");
        assert_eq!(config.engine.command, "kilnc");
        assert!(config.resolve_loader.modules_dirs.is_none());
    }

    #[test]
    fn engine_owned_settings_survive_untouched() {
        let dir = write_project(
            r#"
            [output]
            dir = "build"

            [minify]
            enabled = true
            passes = 2
            "#,
        );
        let config = Config::load(dir.path()).unwrap();

        let minify = config.rest.get("minify").unwrap();
        assert_eq!(minify.get("passes").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn add_loader_dir_creates_missing_list() {
        let dir = write_project("");
        let mut config = Config::load(dir.path()).unwrap();

        config.add_loader_dir(Path::new("/opt/kiln/loaders"));

        assert_eq!(
            config.resolve_loader.modules_dirs,
            Some(vec![
                "loaders".to_string(),
                "/opt/kiln/loaders".to_string()
            ])
        );
    }

    #[test]
    fn add_loader_dir_appends_to_declared_list() {
        let dir = write_project(
            r#"
            [resolve_loader]
            modules_dirs = ["loaders", "../shared-loaders"]
            "#,
        );
        let mut config = Config::load(dir.path()).unwrap();

        config.add_loader_dir(Path::new("/opt/kiln/loaders"));

        assert_eq!(
            config.resolve_loader.modules_dirs,
            Some(vec![
                "loaders".to_string(),
                "../shared-loaders".to_string(),
                "/opt/kiln/loaders".to_string()
            ])
        );
    }

    #[test]
    fn add_loader_dir_is_idempotent() {
        let dir = write_project("");
        let mut config = Config::load(dir.path()).unwrap();

        config.add_loader_dir(Path::new("/opt/kiln/loaders"));
        config.add_loader_dir(Path::new("/opt/kiln/loaders"));

        let dirs = config.resolve_loader.modules_dirs.unwrap();
        let count = dirs.iter().filter(|d| *d == "/opt/kiln/loaders").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn bundle_path_is_absolute() {
        let dir = write_project(
            r#"
            [output]
            dir = "www/build"
            filename = "app.bundle.js"
            "#,
        );
        let config = Config::load(dir.path()).unwrap();

        let bundle = config.bundle_path();
        assert!(bundle.is_absolute());
        assert!(bundle.ends_with("www/build/app.bundle.js"));
    }
}
