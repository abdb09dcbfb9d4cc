use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::WORD_SIZE;
use crate::error::{CertfeedError, CertfeedResult};

/// Parses a `0x`-prefixed (or bare) hex string of at most 64 digits into a
/// big-endian 32-byte word, left-padding short values with zeros.
pub(crate) fn parse_word_hex(s: &str) -> CertfeedResult<[u8; WORD_SIZE]> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err(CertfeedError::InvalidInput("empty hex word".into()));
    }
    if digits.len() > WORD_SIZE * 2 {
        return Err(CertfeedError::InvalidInput(format!(
            "hex word has {} digits, at most {} allowed",
            digits.len(),
            WORD_SIZE * 2
        )));
    }

    let padded = format!("{:0>width$}", digits, width = WORD_SIZE * 2);
    let bytes = hex::decode(&padded).map_err(|e| CertfeedError::InvalidInput(e.to_string()))?;
    let mut out = [0u8; WORD_SIZE];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! word_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; WORD_SIZE]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; WORD_SIZE]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
                &self.0
            }

            pub fn zero() -> Self {
                Self([0u8; WORD_SIZE])
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            pub fn from_u64(value: u64) -> Self {
                let mut bytes = [0u8; WORD_SIZE];
                bytes[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
                Self(bytes)
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            pub fn from_hex(s: &str) -> CertfeedResult<Self> {
                parse_word_hex(s).map(Self)
            }

            /// Leading digits only, for logs.
            pub fn short_hex(&self) -> String {
                self.to_hex()[..10].to_string()
            }

            pub fn from_slice(bytes: &[u8]) -> CertfeedResult<Self> {
                let arr: [u8; WORD_SIZE] = bytes.try_into().map_err(|_| {
                    CertfeedError::InvalidInput(format!(
                        "expected {} bytes, got {}",
                        WORD_SIZE,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}…)", stringify!($name), &self.to_hex()[..12])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CertfeedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

word_type!(
    /// Raw 256-bit value as carried on the wire. Field canonicity is checked
    /// where the word is decoded into a field element.
    Word
);

word_type!(
    /// Root of a course's certificate sparse Merkle tree.
    CertificateRoot
);

word_type!(
    /// Per-course single-use tag derived from a credential.
    Nullifier
);

impl From<Word> for CertificateRoot {
    fn from(w: Word) -> Self {
        Self(w.0)
    }
}

impl From<Word> for Nullifier {
    fn from(w: Word) -> Self {
        Self(w.0)
    }
}

impl From<CertificateRoot> for Word {
    fn from(r: CertificateRoot) -> Self {
        Self(r.0)
    }
}

impl From<Nullifier> for Word {
    fn from(n: Nullifier) -> Self {
        Self(n.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_hex_left_pads() {
        let w = Word::from_hex("0x1").unwrap();
        assert_eq!(w, Word::from_u64(1));
        assert_eq!(
            w.to_hex(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_word_hex_rejects_overlong() {
        let s = format!("0x{}", "1".repeat(65));
        assert!(Word::from_hex(&s).is_err());
        assert!(Word::from_hex("0x").is_err());
        assert!(Word::from_hex("0xzz").is_err());
    }

    #[test]
    fn test_word_accepts_bare_hex() {
        assert_eq!(Word::from_hex("ff").unwrap(), Word::from_u64(255));
    }

    #[test]
    fn test_word_serde_is_hex_string() {
        let n = Nullifier::from_u64(0xabcd);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("0x"));
        let back: Nullifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn test_zero() {
        assert!(CertificateRoot::zero().is_zero());
        assert!(!CertificateRoot::from_u64(7).is_zero());
        assert_eq!(CertificateRoot::default(), CertificateRoot::zero());
    }
}
