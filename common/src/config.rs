//! Runtime settings, read from an optional JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::radsens::DEFAULT_ADDRESS;

/// Environment variable naming a config file to use instead of the default
/// location.
pub const CONFIG_ENV: &str = "RADSENS_CONFIG";

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the sensor bus and the sampling and plotting loops.
///
/// Missing keys take their default value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// I2C character device the sensor is attached to.
    pub bus_path: PathBuf,
    /// 7-bit device address.
    pub address: u8,
    /// Use the in-memory sensor instead of the bus.
    pub simulate: bool,
    pub sample_interval_ms: u64,
    pub redraw_interval_ms: u64,
    /// Registration interval for the activity formula.
    pub elapsed_seconds: f64,
    /// Samples kept for the plot.
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_path: PathBuf::from("/dev/i2c-1"),
            address: DEFAULT_ADDRESS,
            simulate: false,
            sample_interval_ms: 250,
            redraw_interval_ms: 10,
            elapsed_seconds: 1.0,
            history_capacity: 600,
        }
    }
}

impl Config {
    /// Load from `$RADSENS_CONFIG`, else from `config.json` in the platform
    /// config directory, else fall back to defaults.
    ///
    /// Returns the config and the file it came from, if any.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let default_path = directories::ProjectDirs::from("", "", "radsens")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME));
        Self::load_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from), default_path)
    }

    /// Lookup behind [`Config::load`].
    ///
    /// An explicit path must exist; the default path is only used if it does.
    pub fn load_from(
        explicit: Option<PathBuf>,
        default_path: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(&path)?, Some(path)));
        }
        match default_path {
            Some(path) if path.is_file() => Ok((Self::from_file(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::Invalid(format!(
                "address 0x{:02X} is not a 7-bit address",
                self.address
            )));
        }
        if self.sample_interval_ms == 0 || self.redraw_interval_ms == 0 {
            return Err(ConfigError::Invalid("intervals must be positive".into()));
        }
        if !self.elapsed_seconds.is_finite() || self.elapsed_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "elapsed_seconds must be a positive number".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }
}

#[test]
fn empty_object_gives_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.address, 0x66);
    assert_eq!(config.sample_interval(), Duration::from_millis(250));
    assert_eq!(config.redraw_interval(), Duration::from_millis(10));
}

#[test]
fn partial_override() {
    let config = Config::from_json(r#"{ "simulate": true, "history_capacity": 120 }"#).unwrap();
    assert!(config.simulate);
    assert_eq!(config.history_capacity, 120);
    assert_eq!(config.bus_path, PathBuf::from("/dev/i2c-1"));
}

#[test]
fn rejects_invalid_values() {
    for json in [
        r#"{ "address": 200 }"#,
        r#"{ "sample_interval_ms": 0 }"#,
        r#"{ "redraw_interval_ms": 0 }"#,
        r#"{ "elapsed_seconds": 0.0 }"#,
        r#"{ "history_capacity": 0 }"#,
    ] {
        assert!(
            matches!(Config::from_json(json), Err(ConfigError::Invalid(_))),
            "{json}"
        );
    }
}

#[cfg(test)]
fn temp_config(name: &str, json: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("radsens-{}-{name}.json", std::process::id()));
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn explicit_path_wins_over_the_default_location() {
    let explicit = temp_config("explicit", r#"{ "sample_interval_ms": 500 }"#);
    let default = temp_config("default", r#"{ "sample_interval_ms": 750 }"#);

    let (config, source) = Config::load_from(Some(explicit.clone()), Some(default.clone())).unwrap();
    assert_eq!(config.sample_interval_ms, 500);
    assert_eq!(source, Some(explicit.clone()));

    let (config, source) = Config::load_from(None, Some(default.clone())).unwrap();
    assert_eq!(config.sample_interval_ms, 750);
    assert_eq!(source, Some(default.clone()));

    std::fs::remove_file(explicit).unwrap();
    std::fs::remove_file(default).unwrap();
}

#[test]
fn missing_default_location_gives_defaults() {
    let missing = std::env::temp_dir().join("radsens-no-such-dir").join(CONFIG_FILE_NAME);
    let (config, source) = Config::load_from(None, Some(missing)).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(source, None);

    assert_eq!(Config::load_from(None, None).unwrap(), (Config::default(), None));
}

#[test]
fn missing_explicit_path_is_an_error() {
    let missing = std::env::temp_dir().join("radsens-no-such-file.json");
    assert!(matches!(
        Config::load_from(Some(missing), None),
        Err(ConfigError::Io { .. })
    ));
}

// The only test touching the process environment.
#[test]
fn load_reads_the_file_named_by_the_environment() {
    let path = temp_config("env", r#"{ "simulate": true }"#);

    std::env::set_var(CONFIG_ENV, &path);
    let loaded = Config::load();
    std::env::set_var(CONFIG_ENV, path.with_extension("missing"));
    let missing = Config::load();
    std::env::remove_var(CONFIG_ENV);
    std::fs::remove_file(&path).unwrap();

    let (config, source) = loaded.unwrap();
    assert!(config.simulate);
    assert_eq!(source, Some(path));
    match missing {
        Err(ConfigError::Io { path: reported, .. }) => {
            assert_eq!(reported.extension().unwrap(), "missing")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn reports_parse_errors_with_the_file_name() {
    let path = std::env::temp_dir().join(format!("radsens-config-{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").unwrap();

    let error = Config::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();

    match error {
        ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}
