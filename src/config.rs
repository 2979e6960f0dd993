//! Layered settings for the command-line front end.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `FLEETWATCH_*` environment variables. Command-line flags are applied
//! on top by the caller.
//!
//! ```toml
//! endpoint = "http://monitor.local:8080"
//! request_timeout_secs = 5
//! log_level = "debug"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const ENV_PREFIX: &str = "FLEETWATCH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL.
    pub endpoint: String,
    /// Timeout of request/response calls. Streams are not affected.
    pub request_timeout_secs: u64,
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            request_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(env.try_parsing(true))
            .build()
            .with_context(|| match path {
                Some(path) => format!("failed to read config {}", path.display()),
                None => "failed to read configuration".to_string(),
            })?
            .try_deserialize()
            .context("invalid configuration")?;

        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file("endpoint = \"http://monitor.local:9000\"\nrequest_timeout_secs = 3\n");

        let settings = Settings::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.endpoint, "http://monitor.local:9000");
        assert_eq!(settings.request_timeout_secs, 3);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file("endpoint = \"http://monitor.local:9000\"\nlog_level = \"warn\"\n");

        let settings = Settings::load_with(
            Some(file.path()),
            env(&[
                ("FLEETWATCH_ENDPOINT", "http://10.0.0.2:8080"),
                ("FLEETWATCH_REQUEST_TIMEOUT_SECS", "30"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.endpoint, "http://10.0.0.2:8080");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load_with(Some(&path), env(&[])).is_err());
    }
}
