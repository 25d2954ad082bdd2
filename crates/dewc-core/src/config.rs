use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration for the dewc CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Build mode forwarded to the transform worker. Selects the value
    /// substituted for `process.env.NODE_ENV`.
    pub production: bool,

    /// Whether optional dependencies count as declared dependencies.
    pub include_optional: bool,
}

/// On-disk config file. Every key is optional and overrides the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    production: Option<bool>,
    include_optional: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            production: false,
            include_optional: false,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set production build mode.
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Include optional dependencies in the dependency set.
    #[must_use]
    pub fn with_include_optional(mut self, include_optional: bool) -> Self {
        self.include_optional = include_optional;
        self
    }

    /// Merge settings from a JSON config file.
    ///
    /// Keys missing from the file keep their current value.
    pub fn load_file(mut self, path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(production) = file.production {
            self.production = production;
        }
        if let Some(include_optional) = file.include_optional {
            self.include_optional = include_optional;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builder() {
        let config = Config::new(PathBuf::from("/tmp"))
            .with_verbosity(2)
            .with_json_logs(true)
            .with_production(true)
            .with_include_optional(true);

        assert_eq!(config.cwd, PathBuf::from("/tmp"));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
        assert!(config.production);
        assert!(config.include_optional);
    }

    #[test]
    fn test_load_file_overrides_present_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dewc.json");
        std::fs::write(&path, r#"{"production": true}"#).unwrap();

        let config = Config::new(dir.path().to_path_buf())
            .with_include_optional(true)
            .load_file(&path)
            .unwrap();

        assert!(config.production);
        assert!(config.include_optional);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempdir().unwrap();
        let err = Config::default()
            .load_file(&dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_file_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dewc.json");
        std::fs::write(&path, "{ production").unwrap();

        let err = Config::default().load_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
