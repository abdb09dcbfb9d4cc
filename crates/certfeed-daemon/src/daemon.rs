use std::sync::Arc;

use certfeed_crypto::{DisabledVerifier, Groth16Verifier, PairingVerifier};
use certfeed_types::{CertfeedError, CertfeedResult};
use tracing::{info, warn};

use crate::config::{DaemonConfig, StorageBackend, VerifierConfig};
use crate::registry::{AdmissionController, MemoryLedger, MemoryRootRegistry, RootRegistry};
use crate::storage::{SledLedger, StorageConfig, StorageMetricsSnapshot};

/// Assembled admission engine: storage, root registry, verifier and
/// controller, built from one [`DaemonConfig`].
pub struct Daemon {
    config: DaemonConfig,
    controller: Arc<AdmissionController>,
    roots: Arc<dyn RootRegistry>,
    storage: Option<Arc<SledLedger>>,
    verifier_enabled: bool,
}

impl Daemon {
    pub fn open(config: DaemonConfig) -> CertfeedResult<Self> {
        config.validate()?;
        let (verifier, verifier_enabled) = load_verifier(&config.verifier)?;
        Self::assemble(config, verifier, verifier_enabled)
    }

    /// Builds with an explicit verifier, bypassing `[verifier]`.
    pub fn with_verifier(config: DaemonConfig, verifier: Arc<dyn PairingVerifier>) -> CertfeedResult<Self> {
        config.validate()?;
        Self::assemble(config, verifier, true)
    }

    fn assemble(
        config: DaemonConfig,
        verifier: Arc<dyn PairingVerifier>,
        verifier_enabled: bool,
    ) -> CertfeedResult<Self> {
        let limits = config.admission.clone();
        let (controller, roots, storage): (_, Arc<dyn RootRegistry>, _) = match config.storage.backend {
            StorageBackend::Sled => {
                let path = config.database_path();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        CertfeedError::Storage(format!("Failed to create data dir: {}", e))
                    })?;
                }
                let store = Arc::new(SledLedger::open(StorageConfig {
                    path,
                    cache_capacity_bytes: config.storage.cache_capacity_bytes,
                    flush_every_ms: config.storage.flush_every_ms,
                })?);
                let controller = AdmissionController::new(store.clone(), store.clone(), verifier, limits);
                (controller, store.clone(), Some(store))
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; admitted feedback is lost on exit");
                let roots = Arc::new(MemoryRootRegistry::new());
                let controller =
                    AdmissionController::new(Arc::new(MemoryLedger::new()), roots.clone(), verifier, limits);
                (controller, roots, None)
            }
        };

        info!(
            backend = ?config.storage.backend,
            zk = verifier_enabled,
            "Admission engine ready"
        );

        Ok(Self {
            config,
            controller: Arc::new(controller),
            roots,
            storage,
            verifier_enabled,
        })
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn controller(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.controller)
    }

    pub fn roots(&self) -> Arc<dyn RootRegistry> {
        Arc::clone(&self.roots)
    }

    pub fn storage(&self) -> Option<Arc<SledLedger>> {
        self.storage.clone()
    }

    pub fn storage_metrics(&self) -> Option<StorageMetricsSnapshot> {
        self.storage.as_ref().map(|s| s.storage_metrics().snapshot())
    }

    pub fn verifier_enabled(&self) -> bool {
        self.verifier_enabled
    }

    pub fn flush(&self) -> CertfeedResult<()> {
        match &self.storage {
            Some(store) => store.flush(),
            None => Ok(()),
        }
    }

    pub async fn flush_async(&self) -> CertfeedResult<()> {
        match &self.storage {
            Some(store) => store.flush_async().await,
            None => Ok(()),
        }
    }
}

/// Groth16 verifier from the configured key file, or the disabled verifier
/// when none is set.
pub fn load_verifier(config: &VerifierConfig) -> CertfeedResult<(Arc<dyn PairingVerifier>, bool)> {
    let Some(path) = &config.verifying_key else {
        warn!("No verifying key configured; zk submissions will be refused");
        return Ok((Arc::new(DisabledVerifier), false));
    };

    let verifier = Groth16Verifier::from_file(path)
        .map_err(|e| CertfeedError::Config(format!("Failed to load verifying key: {}", e)))?;
    if verifier.num_public_inputs() != config.public_inputs {
        return Err(CertfeedError::Config(format!(
            "Verifying key expects {} public inputs, configured for {}",
            verifier.num_public_inputs(),
            config.public_inputs
        )));
    }
    Ok((Arc::new(verifier), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{course, rng, zk_keys, CertificateSet, IPFS};
    use certfeed_crypto::verifying_key_to_bytes;

    fn memory_config() -> DaemonConfig {
        let mut config = DaemonConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config
    }

    #[test]
    fn test_memory_daemon_without_key() {
        let daemon = Daemon::open(memory_config()).unwrap();
        assert!(!daemon.verifier_enabled());
        assert!(daemon.storage().is_none());
        assert!(daemon.flush().is_ok());
    }

    #[test]
    fn test_sled_daemon_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DaemonConfig::default();
        config.data_dir = dir.path().to_path_buf();

        let mut rng = rng(50);
        let set = CertificateSet::active(1, &mut rng);
        {
            let daemon = Daemon::open(config.clone()).unwrap();
            daemon.roots().publish(&course(), set.root()).unwrap();
            let submission = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);
            daemon.controller().submit(submission).unwrap();
            daemon.flush().unwrap();
            assert!(daemon.storage_metrics().is_some());
        }

        let daemon = Daemon::open(config).unwrap();
        assert_eq!(daemon.controller().feedback_count(&course()).unwrap(), 1);
        assert_eq!(daemon.roots().root(&course()).unwrap(), set.root());
    }

    #[tokio::test]
    async fn test_flush_async_counts_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DaemonConfig::default();
        config.data_dir = dir.path().to_path_buf();
        let daemon = Daemon::open(config).unwrap();

        let before = daemon.storage_metrics().unwrap().flushes;
        daemon.flush_async().await.unwrap();
        assert_eq!(daemon.storage_metrics().unwrap().flushes, before + 1);

        let memory = Daemon::open(memory_config()).unwrap();
        assert!(memory.flush_async().await.is_ok());
    }

    #[test]
    fn test_load_verifier_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.vk");
        std::fs::write(&path, verifying_key_to_bytes(&zk_keys().1).unwrap()).unwrap();

        let config = VerifierConfig {
            verifying_key: Some(path.clone()),
            ..Default::default()
        };
        let (_, enabled) = load_verifier(&config).unwrap();
        assert!(enabled);

        let wrong = VerifierConfig {
            verifying_key: Some(path),
            public_inputs: 3,
        };
        assert!(matches!(load_verifier(&wrong), Err(CertfeedError::Config(_))));
    }

    #[test]
    fn test_missing_key_file_is_config_error() {
        let config = VerifierConfig {
            verifying_key: Some("/nonexistent/feedback.vk".into()),
            ..Default::default()
        };
        assert!(matches!(load_verifier(&config), Err(CertfeedError::Config(_))));
    }
}
