//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files: bind address, uploads root, sandbox
//! worker path and timeout, extractor rule table, and the physiotherapist
//! roster.

use fisiopay_domain::{ContractType, Physiotherapist};
use fisiopay_extractor::ExtractorConfig;
use fisiopay_sandbox::SandboxConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Root directory for uploaded payment documents
    #[serde(default = "default_uploads_root")]
    pub uploads_root: PathBuf,

    /// Text-extraction sandbox settings
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Financial-field extractor rule table
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Physiotherapist roster
    #[serde(default)]
    pub physiotherapists: Vec<PhysiotherapistConfig>,
}

/// One physiotherapist roster entry
#[derive(Debug, Clone, Deserialize)]
pub struct PhysiotherapistConfig {
    /// Registry identifier
    pub id: u32,

    /// Full name
    pub name: String,

    /// Contact e-mail
    #[serde(default)]
    pub email: Option<String>,

    /// Contract type ("PJ", "RPA" or "NO_CONTRACT")
    pub contract_type: ContractType,

    /// Whether the physiotherapist is active (default: true)
    #[serde(default = "default_true")]
    pub active: bool,
}

impl PhysiotherapistConfig {
    /// Convert to the domain type
    pub fn to_physiotherapist(&self) -> Physiotherapist {
        Physiotherapist {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            contract_type: self.contract_type,
            active: self.active,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8080
}

fn default_uploads_root() -> PathBuf {
    PathBuf::from("uploads/payments")
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            uploads_root: default_uploads_root(),
            sandbox: SandboxConfig::default(),
            extractor: ExtractorConfig::default(),
            physiotherapists: vec![PhysiotherapistConfig {
                id: 1,
                name: "Ana Souza".to_string(),
                email: Some("ana@example.com".to_string()),
                contract_type: ContractType::Rpa,
                active: true,
            }],
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
