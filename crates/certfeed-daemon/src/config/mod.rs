mod admission;
mod api;
mod constants;
mod daemon;
mod logging;
mod security;
mod storage;
mod types;
mod verifier;

pub use admission::AdmissionConfig;
pub use api::ApiConfig;
pub use constants::*;
pub use daemon::{default_data_dir, DaemonConfig, RedactedConfig};
pub use logging::LoggingConfig;
pub use security::SecurityConfig;
pub use storage::StorageSection;
pub use types::*;
pub use verifier::VerifierConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_default_config_validation() {
        let config = DaemonConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_defaults_to_localhost() {
        let config = DaemonConfig::default();
        assert!(config.api_is_localhost_only());
        assert_eq!(config.api.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.api.port, DEFAULT_API_PORT);
    }

    #[test]
    fn test_invalid_port() {
        let mut config = DaemonConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_public_input_count_is_fixed() {
        let mut config = DaemonConfig::default();
        config.verifier.public_inputs = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = DaemonConfig::default();
        config.admission.max_ring_size = 0;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.admission.max_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = DaemonConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.security.admin_token = Some("secret".into());
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
        assert!(!toml_str.contains("secret"));

        let parsed: DaemonConfig = toml::from_str(&toml_str).expect("Failed to parse");
        assert_eq!(parsed.api.port, config.api.port);
        assert_eq!(parsed.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: DaemonConfig = toml::from_str("[admission]\nmax_ring_size = 8\n").unwrap();
        assert_eq!(parsed.admission.max_ring_size, 8);
        assert_eq!(parsed.admission.max_page_size, DEFAULT_MAX_PAGE_SIZE as u64);
        assert_eq!(parsed.verifier.public_inputs, FEEDBACK_PUBLIC_INPUTS);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load(dir.path().join("config.toml")).unwrap();
        assert_eq!(config.admission.max_content_id_len, DEFAULT_MAX_CONTENT_ID_LEN);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = DaemonConfig::default();
        config.admission.max_page_size = 50;
        config.save(&path).unwrap();

        let loaded = DaemonConfig::load(&path).unwrap();
        assert_eq!(loaded.admission.max_page_size, 50);
    }

    #[test]
    fn test_redacted_config() {
        let mut config = DaemonConfig::default();
        config.security.admin_token = Some("hunter2".into());
        let shown = format!("{}", config.redacted());
        assert!(shown.contains("API:"));
        assert!(!shown.contains("hunter2"));
    }
}
