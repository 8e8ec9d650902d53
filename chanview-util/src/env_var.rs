use std::env;
use std::path::PathBuf;

use crate::config::DEFAULT_DIR;

/// The data directory, from `CHANVIEW_DATADIR` or `$HOME/.chanview`
pub fn datadir() -> PathBuf {
    if let Ok(dir) = env::var("CHANVIEW_DATADIR") {
        return PathBuf::from(dir);
    }
    env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".")).join(DEFAULT_DIR)
}

/// The log level override, from `CHANVIEW_LOG_LEVEL`
pub fn log_level() -> Option<String> {
    env::var("CHANVIEW_LOG_LEVEL").ok()
}

pub fn compare_env_var(key: &str, value: &str) -> bool {
    match env::var(key) {
        Ok(val) => val == value,
        Err(_) => false,
    }
}
