use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_MAX_CONTENT_ID_LEN, DEFAULT_MAX_PAGE_SIZE, DEFAULT_MAX_RING_SIZE};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub max_content_id_len: usize,
    pub max_ring_size: usize,
    /// Query limits above this are clamped.
    pub max_page_size: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_content_id_len: DEFAULT_MAX_CONTENT_ID_LEN,
            max_ring_size: DEFAULT_MAX_RING_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE as u64,
        }
    }
}
