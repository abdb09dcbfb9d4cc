use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer token for root publication. Without it the publish endpoint
    /// refuses every request.
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
}
