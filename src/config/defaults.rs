//! Default value functions for configuration.

use std::path::PathBuf;

pub fn default_bot_name() -> String {
    "disbot".to_string()
}

pub fn default_data_dir() -> PathBuf {
    PathBuf::from(".data")
}

pub fn default_log_level() -> String {
    "info".to_string()
}
