//! Server configuration

use anyhow::{Context, Result};
use printability_lib::RemarkConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name used as the log source
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for the prediction, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the trained model artifact
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Remark thresholds (`PRINTABILITY_REMARKS__MIN_EXTRUSION_PSI`, ...)
    #[serde(default)]
    pub remarks: RemarkConfig,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "printability-server".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            remarks: RemarkConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `printability.toml` and
    /// `PRINTABILITY_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("printability").required(false))
            .add_source(
                config::Environment::with_prefix("PRINTABILITY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert!(!config.node_name.is_empty());
    }

    #[test]
    fn test_empty_source_falls_back_to_defaults() {
        let config: ServerConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_overrides_apply() {
        let config: ServerConfig = config::Config::builder()
            .set_override("api_port", 9191)
            .unwrap()
            .set_override("model_dir", "/srv/models")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_port, 9191);
        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.remarks, RemarkConfig::default());
    }

    #[test]
    fn test_remark_thresholds_override() {
        let config: ServerConfig = config::Config::builder()
            .set_override("remarks.min_extrusion_psi", 4.5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.remarks.min_extrusion_psi, 4.5);
        assert_eq!(
            config.remarks.excellent_probability,
            RemarkConfig::default().excellent_probability
        );
    }
}
