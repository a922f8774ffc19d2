//! Configuration loading and endpoint resolution

use crate::message::TrackRef;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default remote channel endpoint when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8050/websocket";

/// Player configuration, loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote channel endpoint (persistent socket), resolved once at startup
    pub endpoint: String,

    /// Initial master volume, 0-100
    pub master_volume: f64,

    /// Initial noise fraction, 0-100
    pub noise_fraction: f64,

    /// Ambient noise track seeded into the noise queue at startup
    pub noise_track: Option<NoiseTrackConfig>,
}

/// Noise track reference as it appears in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct NoiseTrackConfig {
    pub id: u64,
    pub provider_id: String,
}

impl From<&NoiseTrackConfig> for TrackRef {
    fn from(config: &NoiseTrackConfig) -> Self {
        TrackRef::new(config.id, config.provider_id.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            master_volume: 100.0,
            noise_fraction: 0.0,
            noise_track: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicitly given path must exist and parse; otherwise the
    /// platform config file is used if present, and compiled defaults as
    /// the final fallback.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            return toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)));
        }

        if let Some(path) = default_config_file() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                return toml::from_str(&contents)
                    .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)));
            }
        }

        Ok(Self::default())
    }

    /// Noise track as a playable reference, if one is configured
    pub fn noise_track_ref(&self) -> Option<TrackRef> {
        self.noise_track.as_ref().map(TrackRef::from)
    }
}

/// Resolve the remote channel endpoint, priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Compiled default (fallback)
pub fn resolve_endpoint(cli_arg: Option<&str>, env_var_name: &str, config: &Config) -> String {
    if let Some(endpoint) = cli_arg {
        return endpoint.to_string();
    }

    if let Ok(endpoint) = std::env::var(env_var_name) {
        if !endpoint.is_empty() {
            return endpoint;
        }
    }

    config.endpoint.clone()
}

/// Default configuration file path for the platform
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cloudradio").join("config.toml"));

    if let Some(path) = &user_config {
        if path.exists() {
            return user_config;
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cloudradio/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.master_volume, 100.0);
        assert_eq!(config.noise_fraction, 0.0);
        assert!(config.noise_track.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "ws://10.0.0.5:8050/websocket"
noise_fraction = 20.0

[noise_track]
id = 28907786
provider_id = "soundcloud"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, "ws://10.0.0.5:8050/websocket");
        assert_eq!(config.noise_fraction, 20.0);
        // Unspecified fields keep their defaults
        assert_eq!(config.master_volume, 100.0);

        let track = config.noise_track_ref().unwrap();
        assert_eq!(track.id, 28907786);
        assert_eq!(track.provider_id, "soundcloud");
    }

    #[test]
    fn test_load_explicit_file_missing() {
        let result = Config::load(Some(Path::new("/nonexistent/cloudradio.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_endpoint_priority() {
        let config = Config {
            endpoint: "ws://from-config:8050/websocket".to_string(),
            ..Config::default()
        };

        // CLI wins over everything
        let endpoint = resolve_endpoint(
            Some("ws://from-cli:8050/websocket"),
            "CLOUDRADIO_TEST_ENDPOINT_UNSET",
            &config,
        );
        assert_eq!(endpoint, "ws://from-cli:8050/websocket");

        // Config file when CLI and env are absent
        let endpoint = resolve_endpoint(None, "CLOUDRADIO_TEST_ENDPOINT_UNSET", &config);
        assert_eq!(endpoint, "ws://from-config:8050/websocket");
    }
}
