//! Resolution of input and output locations
//!
//! Each location comes from the command line flag if given, otherwise from an
//! environment variable, otherwise from a default relative to the working
//! directory.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the RL evaluation results root
pub const RESULTS_ROOT_ENV: &str = "RL_RESULTS_ROOT";

/// Environment variable naming the directory figures and summaries are written to
pub const ASSETS_DIR_ENV: &str = "JOURNAL_ASSETS_DIR";

pub const DEFAULT_RESULTS_ROOT: &str = "rl_eval_results";
pub const DEFAULT_ASSETS_DIR: &str = "journal/data";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Picks the flag, then a non-empty environment value, then the default
pub fn resolve_with(flag: Option<PathBuf>, env_value: Option<OsString>, default: &str) -> PathBuf {
    flag.or_else(|| env_value.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Results root from `--results-root`, `RL_RESULTS_ROOT` or the default
pub fn results_root(flag: Option<PathBuf>) -> PathBuf {
    resolve_with(flag, env::var_os(RESULTS_ROOT_ENV), DEFAULT_RESULTS_ROOT)
}

/// Output directory from the flag, `JOURNAL_ASSETS_DIR` or the default
pub fn assets_dir(flag: Option<PathBuf>) -> PathBuf {
    resolve_with(flag, env::var_os(ASSETS_DIR_ENV), DEFAULT_ASSETS_DIR)
}

/// Fails unless `path` is an existing directory
pub fn require_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingDirectory(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}
