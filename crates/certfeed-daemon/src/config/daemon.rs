use certfeed_types::{CertfeedError, CertfeedResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::admission::AdmissionConfig;
use super::api::ApiConfig;
use super::constants::{DATABASE_DIR_NAME, FEEDBACK_PUBLIC_INPUTS};
use super::logging::LoggingConfig;
use super::security::SecurityConfig;
use super::storage::StorageSection;
use super::types::{LogLevel, StorageBackend};
use super::verifier::VerifierConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub storage: StorageSection,
    pub verifier: VerifierConfig,
    pub admission: AdmissionConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".certfeed"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/certfeed"))
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageSection::default(),
            verifier: VerifierConfig::default(),
            admission: AdmissionConfig::default(),
            api: ApiConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> CertfeedResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CertfeedError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| CertfeedError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> CertfeedResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CertfeedError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CertfeedError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| CertfeedError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("CERTFEED_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(port) = std::env::var("CERTFEED_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(bind) = std::env::var("CERTFEED_API_BIND") {
            if let Ok(addr) = bind.parse() {
                self.api.bind_address = addr;
                if bind != "127.0.0.1" && bind != "::1" {
                    warn!(
                        "API server binding to non-localhost address: {}. Ensure proper firewall rules.",
                        bind
                    );
                }
            }
        }

        if let Ok(path) = std::env::var("CERTFEED_VK_PATH") {
            self.verifier.verifying_key = Some(PathBuf::from(path));
        }

        if let Ok(token) = std::env::var("CERTFEED_ADMIN_TOKEN") {
            if !token.is_empty() {
                self.security.admin_token = Some(token);
            }
        }

        if let Ok(level) = std::env::var("CERTFEED_LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&level);
        }

        if std::env::var("CERTFEED_LOG_JSON").is_ok() {
            self.logging.json = true;
        }

        if let Ok(backend) = std::env::var("CERTFEED_STORAGE") {
            self.storage.backend = match backend.to_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                _ => StorageBackend::Sled,
            };
        }
    }

    pub fn validate(&self) -> CertfeedResult<()> {
        if self.api.enabled && self.api.port == 0 {
            return Err(CertfeedError::Config("API port cannot be 0".into()));
        }

        if self.api.max_body_size < 1024 {
            return Err(CertfeedError::Config(
                "Max body size must be at least 1024 bytes".into(),
            ));
        }

        if self.verifier.public_inputs != FEEDBACK_PUBLIC_INPUTS {
            return Err(CertfeedError::Config(format!(
                "Feedback circuit takes {} public inputs, config says {}",
                FEEDBACK_PUBLIC_INPUTS, self.verifier.public_inputs
            )));
        }

        if self.admission.max_content_id_len == 0 {
            return Err(CertfeedError::Config(
                "max_content_id_len must be at least 1".into(),
            ));
        }

        if self.admission.max_ring_size == 0 {
            return Err(CertfeedError::Config("max_ring_size must be at least 1".into()));
        }

        if self.admission.max_page_size == 0 {
            return Err(CertfeedError::Config("max_page_size must be at least 1".into()));
        }

        if self.security.admin_token.is_none() {
            warn!("No admin token set; root publication over HTTP is disabled. Set CERTFEED_ADMIN_TOKEN.");
        }

        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_DIR_NAME)
    }

    pub fn api_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.api.bind_address, self.api.port)
    }

    pub fn api_is_localhost_only(&self) -> bool {
        match self.api.bind_address {
            IpAddr::V4(addr) => addr.is_loopback(),
            IpAddr::V6(addr) => addr.is_loopback(),
        }
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            data_dir: self.data_dir.clone(),
            backend: self.storage.backend,
            verifying_key: self.verifier.verifying_key.clone(),
            api_enabled: self.api.enabled,
            api_bind: self.api.bind_address,
            api_port: self.api.port,
            admin_token_set: self.security.admin_token.is_some(),
            max_content_id_len: self.admission.max_content_id_len,
            max_ring_size: self.admission.max_ring_size,
            max_page_size: self.admission.max_page_size,
            log_level: self.logging.level,
        }
    }
}

#[derive(Debug)]
pub struct RedactedConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub verifying_key: Option<PathBuf>,
    pub api_enabled: bool,
    pub api_bind: IpAddr,
    pub api_port: u16,
    pub admin_token_set: bool,
    pub max_content_id_len: usize,
    pub max_ring_size: usize,
    pub max_page_size: u64,
    pub log_level: LogLevel,
}

impl std::fmt::Display for RedactedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Certfeed Configuration")?;
        writeln!(f, "======================")?;
        writeln!(f, "Data dir: {:?}", self.data_dir)?;
        writeln!(f, "Storage: {}", self.backend)?;
        match &self.verifying_key {
            Some(path) => writeln!(f, "Verifying key: {:?}", path)?,
            None => writeln!(f, "Verifying key: (none, zk mode disabled)")?,
        }
        if self.api_enabled {
            writeln!(f, "API: {}:{}", self.api_bind, self.api_port)?;
        } else {
            writeln!(f, "API: disabled")?;
        }
        writeln!(f, "Admin token: {}", if self.admin_token_set { "set" } else { "not set" })?;
        writeln!(f, "Max content id length: {}", self.max_content_id_len)?;
        writeln!(f, "Max ring size: {}", self.max_ring_size)?;
        writeln!(f, "Max page size: {}", self.max_page_size)?;
        write!(f, "Log level: {}", self.log_level)
    }
}
