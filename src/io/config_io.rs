use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::model::config::Config;

/// Error type for config file handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot determine a config directory for this platform")]
    NoConfigDir,
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config file already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Default config path: `~/.config/ticklist/config.toml` (platform-adjusted)
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("", "", "ticklist").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Directory for runtime artifacts (the TUI log file)
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("", "", "ticklist").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Read the config file. A missing file is not an error: defaults apply
/// until the user runs `tk init` or `tk login`.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    Ok(toml::from_str(&text)?)
}

/// Write the config, creating parent directories as needed.
pub fn write_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    let text = toml::to_string_pretty(config)?;
    fs::write(path, text).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
