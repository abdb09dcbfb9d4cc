use serde::{Deserialize, Serialize};

use crate::word::Word;

/// Status stored as the value of a certificate leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialStatus {
    Active,
    Revoked,
    Pending,
    Other(u64),
}

impl CredentialStatus {
    pub const ACTIVE_CODE: u64 = 1;
    pub const REVOKED_CODE: u64 = 2;
    pub const PENDING_CODE: u64 = 3;

    pub fn code(&self) -> u64 {
        match self {
            CredentialStatus::Active => Self::ACTIVE_CODE,
            CredentialStatus::Revoked => Self::REVOKED_CODE,
            CredentialStatus::Pending => Self::PENDING_CODE,
            CredentialStatus::Other(c) => *c,
        }
    }

    pub fn from_code(code: u64) -> Self {
        match code {
            Self::ACTIVE_CODE => CredentialStatus::Active,
            Self::REVOKED_CODE => CredentialStatus::Revoked,
            Self::PENDING_CODE => CredentialStatus::Pending,
            other => CredentialStatus::Other(other),
        }
    }

    /// Interprets a leaf value. Values that do not fit in a u64 are never
    /// active.
    pub fn from_word(word: &Word) -> Self {
        let bytes = word.as_bytes();
        if bytes[..24].iter().any(|b| *b != 0) {
            return CredentialStatus::Other(u64::MAX);
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[24..]);
        Self::from_code(u64::from_be_bytes(low))
    }

    pub fn to_word(&self) -> Word {
        Word::from_u64(self.code())
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CredentialStatus::Active)
    }
}
