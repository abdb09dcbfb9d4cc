use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::COURSE_ID_SIZE;
use crate::error::{CertfeedError, CertfeedResult};

/// 20-byte course identifier, written as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CourseId(pub [u8; COURSE_ID_SIZE]);

impl CourseId {
    pub const fn from_bytes(bytes: [u8; COURSE_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; COURSE_ID_SIZE] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> CertfeedResult<Self> {
        let arr: [u8; COURSE_ID_SIZE] = bytes.try_into().map_err(|_| {
            CertfeedError::InvalidInput(format!(
                "course id must be {} bytes, got {}",
                COURSE_ID_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> CertfeedResult<Self> {
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CertfeedError::InvalidInput(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// The course as a left-padded 32-byte big-endian word.
    pub fn to_word_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[32 - COURSE_ID_SIZE..].copy_from_slice(&self.0);
        out
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.to_hex())
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for CourseId {
    type Err = CertfeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CourseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CourseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
