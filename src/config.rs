//! Configuration management for dna-identity.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::security::{OriginPolicy, SecurityConfig};
use crate::session::{Address, ChainId, ChainMetadata, NativeCurrency, SessionConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger contract configuration.
    pub contract: ContractSection,
    /// Required network configuration.
    pub network: NetworkSection,
    /// Wallet provider configuration.
    pub wallet: WalletSection,
    /// Server configuration.
    pub server: ServerSection,
    /// API security configuration.
    pub security: SecuritySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Ledger contract section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractSection {
    /// Contract address, `0x`-prefixed hex.
    pub address: String,
}

impl Default for ContractSection {
    fn default() -> Self {
        Self {
            address: Address::ZERO.to_string(),
        }
    }
}

/// Required network section. Everything but the id only feeds the
/// add-network fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub required_network_id: ChainId,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_url: String,
    pub block_explorer_url: String,
}

impl Default for NetworkSection {
    fn default() -> Self {
        let sepolia = ChainMetadata::sepolia();
        Self {
            required_network_id: sepolia.chain_id,
            chain_name: sepolia.chain_name,
            currency_name: sepolia.native_currency.name,
            currency_symbol: sepolia.native_currency.symbol,
            currency_decimals: sepolia.native_currency.decimals,
            rpc_url: sepolia.rpc_url,
            block_explorer_url: sepolia.block_explorer_url,
        }
    }
}

/// Which wallet provider the binary talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletBackend {
    /// JSON-RPC wallet bridge over HTTP.
    #[default]
    Http,
    /// In-process demo wallet.
    Memory,
}

impl FromStr for WalletBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "memory" => Ok(Self::Memory),
            other => Err(other.to_string()),
        }
    }
}

/// Wallet provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSection {
    pub backend: WalletBackend,
    /// Endpoint of the HTTP wallet.
    pub url: String,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            backend: WalletBackend::Http,
            url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Security configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Authentication settings.
    pub auth: AuthSection,
    /// Browser origins allowed to call the API, e.g. `https://app.example`.
    pub allowed_origins: Vec<String>,
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Enable authentication.
    pub enabled: bool,
    /// API keys.
    pub api_keys: Vec<String>,
}

impl AuthSection {
    fn add_key(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.enabled = true;
        if !self.api_keys.iter().any(|k| k == key) {
            self.api_keys.push(key.to_string());
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_env_from<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = var("DNA_IDENTITY_CONTRACT_ADDRESS") {
            self.contract.address = address;
        }

        if let Some(id) = var("DNA_IDENTITY_REQUIRED_NETWORK_ID") {
            self.network.required_network_id = id
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DNA_IDENTITY_REQUIRED_NETWORK_ID", id))?;
        }

        if let Some(url) = var("DNA_IDENTITY_RPC_URL") {
            self.network.rpc_url = url;
        }

        if let Some(url) = var("DNA_IDENTITY_BLOCK_EXPLORER_URL") {
            self.network.block_explorer_url = url;
        }

        if let Some(backend) = var("DNA_IDENTITY_WALLET") {
            self.wallet.backend = backend
                .parse()
                .map_err(|v| ConfigError::InvalidValue("DNA_IDENTITY_WALLET", v))?;
        }

        if let Some(url) = var("DNA_IDENTITY_WALLET_URL") {
            self.wallet.url = url;
        }

        if let Some(host) = var("DNA_IDENTITY_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("DNA_IDENTITY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DNA_IDENTITY_PORT", port))?;
        }

        if let Some(key) = var("DNA_IDENTITY_API_KEY") {
            self.security.auth.add_key(&key);
        }

        if let Some(origins) = var("DNA_IDENTITY_ALLOWED_ORIGINS") {
            self.security.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(level) = var("DNA_IDENTITY_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref address) = args.contract {
            self.contract.address = address.clone();
        }
        if let Some(chain_id) = args.chain_id {
            self.network.required_network_id = chain_id;
        }
        if let Some(ref url) = args.rpc_url {
            self.network.rpc_url = url.clone();
        }
        if let Some(ref url) = args.explorer_url {
            self.network.block_explorer_url = url.clone();
        }
        if let Some(backend) = args.wallet {
            self.wallet.backend = backend;
        }
        if let Some(ref url) = args.wallet_url {
            self.wallet.url = url.clone();
        }
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref key) = args.api_key {
            self.security.auth.add_key(key);
        }
        if args.no_auth {
            self.security.auth.enabled = false;
        }
        if !args.allowed_origins.is_empty() {
            self.security.allowed_origins = args.allowed_origins.clone();
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);

        Ok(config)
    }

    /// Chain metadata for the required network.
    pub fn chain_metadata(&self) -> ChainMetadata {
        ChainMetadata {
            chain_id: self.network.required_network_id,
            chain_name: self.network.chain_name.clone(),
            native_currency: NativeCurrency {
                name: self.network.currency_name.clone(),
                symbol: self.network.currency_symbol.clone(),
                decimals: self.network.currency_decimals,
            },
            rpc_url: self.network.rpc_url.clone(),
            block_explorer_url: self.network.block_explorer_url.clone(),
        }
    }

    /// Convert to a SessionConfig, validating the contract address.
    pub fn to_session_config(&self) -> Result<SessionConfig, ConfigError> {
        let address: Address = self
            .contract
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.contract.address.clone()))?;
        Ok(SessionConfig::new(address, self.chain_metadata()))
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let origins = OriginPolicy::new(&self.security.allowed_origins)
            .map_err(|origin| ConfigError::InvalidValue("allowed_origins", origin))?;

        let mut security = SecurityConfig::development().with_origins(origins);
        for key in &self.security.auth.api_keys {
            security = security.with_api_key(key.clone());
        }
        security.auth.enabled = self.security.auth.enabled;

        Ok(ServerConfig::new(host.to_string(), self.server.port).with_security(security))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Invalid contract address.
    InvalidAddress(String),
    /// An environment variable held an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidAddress(address) => write!(f, "invalid contract address: {}", address),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}
