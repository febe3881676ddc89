//! Cache configuration.

use std::path::{Path, PathBuf};

/// Overrides the cache root directory.
pub const CACHE_DIR_ENV: &str = "NCEP_WAVE_CACHE";
/// Opens the cache without ever writing to it when set to `true` or `1`.
pub const READ_ONLY_ENV: &str = "NCEP_WAVE_CACHE_READ_ONLY";

/// Where the cache lives and how it is laid out.
///
/// ```text
/// <root>/
///   index.json
///   gfs.20200115/06/...          fetched data, one dir per batch and run
///   forecast/<station>/<run>/    rendered artifacts
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub root: PathBuf,
    /// Subdirectory of `root` holding rendered forecasts
    pub image_dir_name: String,
    /// File name of the index under `root`
    pub index_file_name: String,
    /// Name prefix that marks a fetched-data batch directory
    pub batch_prefix: String,
    pub read_only: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            image_dir_name: "forecast".to_string(),
            index_file_name: "index.json".to_string(),
            batch_prefix: "gfs.".to_string(),
            read_only: false,
        }
    }
}

impl CacheConfig {
    /// Default layout under an explicit root.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup(CACHE_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(|v| expand_home(v.trim()))
            .unwrap_or_else(default_root);

        let read_only = lookup(READ_ONLY_ENV)
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Self {
            root,
            read_only,
            ..Default::default()
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn image_root(&self) -> PathBuf {
        self.root.join(&self.image_dir_name)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file_name)
    }

    /// Whether a directory under the root holds fetched data.
    pub fn is_batch_dir(&self, name: &str) -> bool {
        name.starts_with(&self.batch_prefix)
    }
}

fn default_root() -> PathBuf {
    home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".cache")
        .join("ncep-wave")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => Path::new(path).to_path_buf(),
    }
}
