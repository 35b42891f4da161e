//! Server configuration.
//!
//! Loaded from an optional YAML file. Every section has defaults, so an empty
//! file (or no file) yields a working local setup.
//!
//! # Example YAML
//!
//! ```yaml
//! bind: 0.0.0.0:8000
//! database:
//!   connect_timeout_secs: 5
//! generator:
//!   model: gemini-1.5-flash
//!   timeout_secs: 60
//! ```

use std::io::{BufReader, BufWriter};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use askdb_db::ConnectOptions;
use askdb_generator::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

/// Address used when none is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Environment variables checked, in order, for the model API key.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_PRO_API_KEY", "GOOGLE_API_KEY"];

/// Settings for connections to user databases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Seconds to wait for a networked database to accept a connection.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
        }
    }
}

impl DatabaseSection {
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Settings for the generative model.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    /// API key. Falls back to the environment when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for GeneratorSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorSection")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl GeneratorSection {
    /// Returns the configured key, or the first non-blank key in the
    /// environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key
            .clone()
            .into_iter()
            .chain(API_KEY_VARS.iter().filter_map(|name| lookup(name)))
            .find(|key| !key.trim().is_empty())
    }

    /// Builds the Gemini client settings with the given key.
    pub fn gemini_config(&self, api_key: String) -> GeminiConfig {
        GeminiConfig::new(api_key)
            .with_endpoint(self.endpoint.clone())
            .with_model(self.model.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Top-level server configuration.
///
/// # Examples
///
/// ```
/// use askdb_server::ServerConfig;
///
/// let config: ServerConfig = serde_yaml::from_str("bind: 0.0.0.0:9000").unwrap();
/// assert_eq!(config.bind, "0.0.0.0:9000");
/// assert_eq!(config.generator.model, "gemini-pro");
/// assert_eq!(config.database.connect_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    pub database: DatabaseSection,
    pub generator: GeneratorSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database: DatabaseSection::default(),
            generator: GeneratorSection::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](ServerError::Io) if the file cannot be read, or
    /// [`Yaml`](ServerError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses [`bind`](Self::bind) as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|_| ServerError::InvalidBind(self.bind.clone()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
        assert_eq!(
            config.database.connect_options().connect_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_partial_section() {
        let yaml = "generator:\n  model: gemini-1.5-flash\n";
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.generator.model, "gemini-1.5-flash");
        assert_eq!(config.generator.timeout_secs, 30);
        assert_eq!(config.generator.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("askdb.yml");

        let mut config = ServerConfig::default();
        config.bind = "0.0.0.0:9001".into();
        config.database.connect_timeout_secs = 3;
        config.save(&path).unwrap();

        assert_eq!(ServerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load("/nonexistent/askdb.yml").unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    fn test_invalid_bind() {
        let config = ServerConfig {
            bind: "not an address".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.bind_addr().unwrap_err(),
            ServerError::InvalidBind(_)
        ));
    }

    #[test]
    fn test_api_key_precedence() {
        let mut section = GeneratorSection::default();
        let env = |name: &str| match name {
            "GOOGLE_PRO_API_KEY" => Some("  ".to_string()),
            "GOOGLE_API_KEY" => Some("from-env".to_string()),
            _ => None,
        };
        assert_eq!(section.resolve_api_key_with(env).as_deref(), Some("from-env"));

        section.api_key = Some("from-file".into());
        assert_eq!(section.resolve_api_key_with(env).as_deref(), Some("from-file"));

        section.api_key = None;
        assert_eq!(section.resolve_api_key_with(|_| None), None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let section = GeneratorSection {
            api_key: Some("secret-key".into()),
            ..GeneratorSection::default()
        };
        assert!(!format!("{section:?}").contains("secret-key"));
    }
}
