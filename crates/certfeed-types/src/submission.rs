use serde::{Deserialize, Serialize};

use crate::course::CourseId;
use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofMode {
    Ring,
    Zk,
}

/// A feedback submission as received from a client.
///
/// `content_id` is kept as a raw string so that length and emptiness
/// violations surface as admission rejections rather than decode errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub course: CourseId,
    pub content_id: String,
    #[serde(flatten)]
    pub proof: SubmissionProof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmissionProof {
    Ring(RingSubmission),
    Zk(ZkSubmission),
}

impl SubmissionProof {
    pub fn mode(&self) -> ProofMode {
        match self {
            SubmissionProof::Ring(_) => ProofMode::Ring,
            SubmissionProof::Zk(_) => ProofMode::Zk,
        }
    }
}

/// Linkable ring signature over the ring of certificate public keys, with
/// one sparse Merkle membership proof per ring member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSubmission {
    /// Key image `I` as affine `[x, y]`.
    pub key_image: [Word; 2],
    pub challenges: Vec<Word>,
    pub responses: Vec<Word>,
    pub public_keys_x: Vec<Word>,
    pub public_keys_y: Vec<Word>,
    pub smt_proofs: Vec<Vec<Word>>,
    pub leaf_keys: Vec<Word>,
    pub leaf_values: Vec<Word>,
}

impl RingSubmission {
    pub fn ring_size(&self) -> usize {
        self.public_keys_x.len()
    }
}

/// Groth16 proof in EIP-197 layout: `b` coordinates are `[c1, c0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkSubmission {
    pub a: [Word; 2],
    pub b: [[Word; 2]; 2],
    pub c: [Word; 2],
    pub public_inputs: Vec<Word>,
}
