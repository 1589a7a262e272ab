//! Utility functions and helpers

use std::path::{Component, Path, PathBuf};

use tracing::error;

/// Terminal failure sink. Implementations do not return.
///
/// The orchestrator escalates unrecoverable situations (unloadable
/// configuration, compile errors on the very first build) through this
/// seam instead of calling `process::exit` directly.
pub trait FatalHandler: Send + Sync {
    fn fail(&self, err: anyhow::Error) -> !;
}

/// Default fatal handler: log the error and exit the process.
pub struct ExitFailure;

impl FatalHandler for ExitFailure {
    fn fail(&self, err: anyhow::Error) -> ! {
        error!("{err:#}");
        std::process::exit(1);
    }
}

/// Lexically absolutize a path.
///
/// `.` and `..` components are resolved without touching the filesystem,
/// so this works for output files that do not exist yet. Relative paths
/// are resolved against the current directory.
pub fn absolutize(path: &Path) -> PathBuf {
    let mut out = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Get relative path from base to target
pub fn relative_path(from: &Path, to: &Path) -> Option<String> {
    pathdiff::diff_paths(to, from)
        .map(|p| p.display().to_string())
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize(Path::new("/foo/./bar/../baz")),
            PathBuf::from("/foo/baz")
        );
        assert_eq!(
            absolutize(Path::new("/dist/bundle.js")),
            PathBuf::from("/dist/bundle.js")
        );
    }

    #[test]
    fn test_absolutize_relative() {
        let out = absolutize(Path::new("dist/bundle.js"));
        assert!(out.is_absolute());
        assert!(out.ends_with("dist/bundle.js"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_format_duration() {
        use std::time::Duration;

        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs_f64(1.5)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5.00s");
    }
}
