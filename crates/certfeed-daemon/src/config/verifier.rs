use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use super::constants::FEEDBACK_PUBLIC_INPUTS;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Groth16 verifying key (arkworks compressed, raw or base64). When
    /// unset, zk submissions fail as verifier-unavailable.
    pub verifying_key: Option<PathBuf>,
    pub public_inputs: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verifying_key: None,
            public_inputs: FEEDBACK_PUBLIC_INPUTS,
        }
    }
}
