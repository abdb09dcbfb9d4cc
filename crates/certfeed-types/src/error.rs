use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a feedback submission was refused. Every kind is terminal for the
/// submission and leaves ledger state untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("proof array is empty")]
    EmptyProof,

    #[error("proof does not match the certificate root")]
    ProofMismatch,

    #[error("wrong ring signature")]
    WrongSignature,

    #[error("invalid proof")]
    InvalidProof,

    #[error("failed to call verifyProof")]
    VerifierUnavailable,

    #[error("nullifier already consumed for this course")]
    DuplicateNullifier,

    #[error("malformed input")]
    MalformedInput,

    #[error("credential is not active")]
    InactiveCredential,
}

impl RejectReason {
    pub const ALL: [RejectReason; 8] = [
        RejectReason::EmptyProof,
        RejectReason::ProofMismatch,
        RejectReason::WrongSignature,
        RejectReason::InvalidProof,
        RejectReason::VerifierUnavailable,
        RejectReason::DuplicateNullifier,
        RejectReason::MalformedInput,
        RejectReason::InactiveCredential,
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::EmptyProof => "EmptyProof",
            RejectReason::ProofMismatch => "ProofMismatch",
            RejectReason::WrongSignature => "WrongSignature",
            RejectReason::InvalidProof => "InvalidProof",
            RejectReason::VerifierUnavailable => "VerifierUnavailable",
            RejectReason::DuplicateNullifier => "DuplicateNullifier",
            RejectReason::MalformedInput => "MalformedInput",
            RejectReason::InactiveCredential => "InactiveCredential",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            RejectReason::EmptyProof => 0,
            RejectReason::ProofMismatch => 1,
            RejectReason::WrongSignature => 2,
            RejectReason::InvalidProof => 3,
            RejectReason::VerifierUnavailable => 4,
            RejectReason::DuplicateNullifier => 5,
            RejectReason::MalformedInput => 6,
            RejectReason::InactiveCredential => 7,
        }
    }
}

#[derive(Error, Debug)]
pub enum CertfeedError {
    #[error("Submission rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CertfeedError {
    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            CertfeedError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.rejection().is_some()
    }
}

pub type CertfeedResult<T> = Result<T, CertfeedError>;
