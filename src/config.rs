use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from gc-report.toml.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
}

/// Artifact locations. Everything except `root` is relative to `root`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub latency_dir: PathBuf,
    pub gc_report: PathBuf,
    pub final_report: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions (without the dot) treated as GC logs.
    pub extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("out"),
            latency_dir: PathBuf::from("lat"),
            gc_report: PathBuf::from("gc_report.csv"),
            final_report: PathBuf::from("final_report.csv"),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["log".to_string()],
        }
    }
}

impl ReportConfig {
    /// Replace the artifact root, e.g. from a CLI argument.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// Directory holding `<collector>-*.json` latency results.
    pub fn latency_dir(&self) -> PathBuf {
        self.paths.root.join(&self.paths.latency_dir)
    }

    /// Intermediate per-file GC summary written by the scanner.
    pub fn gc_report(&self) -> PathBuf {
        self.paths.root.join(&self.paths.gc_report)
    }

    /// Consolidated report written by the merger.
    pub fn final_report(&self) -> PathBuf {
        self.paths.root.join(&self.paths.final_report)
    }
}

/// Errors from loading a config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<ReportConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(ReportConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
