//! Optional `pathgen.toml` run configuration

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "pathgen.toml";

pub const DEFAULT_PROTOCOL: &str = "action";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Extractor used when `--protocol` is not given.
    pub protocol: String,
    /// Draw progress bars.
    pub progress: bool,
    /// `tracing` filter directive, e.g. `"pathgen=debug"`.
    pub log_filter: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            protocol: DEFAULT_PROTOCOL.to_string(),
            progress: true,
            log_filter: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl RunConfig {
    /// Load `explicit`, or `./pathgen.toml` if it exists, or the defaults.
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = RunConfig::parse("protocol = \"raft\"\n").unwrap();
        assert_eq!(config.protocol, "raft");
        assert!(config.progress);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(RunConfig::parse("step_limit = 3\n").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = RunConfig::load(Some(Path::new("/nonexistent/pathgen.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
