use serde::{Deserialize, Serialize};
use super::types::StorageBackend;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub cache_capacity_bytes: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            cache_capacity_bytes: 64 * 1024 * 1024,
            flush_every_ms: Some(1000),
        }
    }
}
